//! Download target derivation.
//!
//! The target filename is a pure function of the resolved resource URL, so the
//! same location always lands in the same file and a second run can compare
//! sizes against what the first run left behind.

use std::path::{Component, Path};

use tracing::debug;
use url::Url;

/// Derives the local filename for a resolved download URL.
///
/// Uses the last non-empty path segment, percent-decoded and sanitized for
/// common filesystems. Returns `None` when the URL has no usable segment
/// (e.g. `https://host/`).
#[must_use]
pub fn target_filename(url: &Url) -> Option<String> {
    let last = url
        .path_segments()?
        .rev()
        .find(|segment| !segment.is_empty())?;

    let decoded = urlencoding::decode(last).unwrap_or_else(|e| {
        debug!(
            segment = %last,
            error = %e,
            "URL decoding failed, using raw segment"
        );
        last.into()
    });

    Some(sanitize_filename(&decoded))
}

/// Sanitizes filename for filesystem safety.
///
/// Replaces characters that are invalid on common filesystems:
/// / \ : * ? " < > |
pub(crate) fn sanitize_filename(name: &str) -> String {
    let sanitized: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    if sanitized.is_empty() {
        return "_".to_string();
    }

    if is_safe_filename_segment(&sanitized) {
        sanitized
    } else {
        sanitized
            .chars()
            .map(|c| if c == '.' { '_' } else { c })
            .collect()
    }
}

fn is_safe_filename_segment(name: &str) -> bool {
    !Path::new(name).components().any(|component| {
        matches!(
            component,
            Component::CurDir | Component::ParentDir | Component::RootDir | Component::Prefix(_)
        )
    })
}
