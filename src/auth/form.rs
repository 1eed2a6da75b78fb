//! Sign-in form extraction.

use scraper::{Html, Selector};

use super::AuthError;

/// Collects the `name`/`value` pair of every `<input>` inside a `<form>`.
///
/// Hidden inputs such as the anti-forgery token are included, so the form is
/// posted back as the server rendered it. Inputs without
/// a `name` are not submitted by browsers and are skipped; a missing `value`
/// becomes the empty string. A repeated name keeps its first position and
/// its last value.
///
/// # Errors
///
/// Returns [`AuthError::Selector`] if the built-in selector fails to parse.
pub(crate) fn extract_form_fields(html: &str) -> Result<Vec<(String, String)>, AuthError> {
    const FORM_INPUTS: &str = "form input";

    let selector = Selector::parse(FORM_INPUTS).map_err(|_| AuthError::Selector {
        selector: FORM_INPUTS,
    })?;
    let document = Html::parse_document(html);

    let mut fields = Vec::new();
    for input in document.select(&selector) {
        let Some(name) = input.value().attr("name") else {
            continue;
        };
        let value = input.value().attr("value").unwrap_or_default();
        set_field(&mut fields, name, value);
    }
    Ok(fields)
}

/// Sets `name` to `value`, replacing an existing entry in place.
pub(crate) fn set_field(fields: &mut Vec<(String, String)>, name: &str, value: &str) {
    if let Some(existing) = fields.iter_mut().find(|(n, _)| n == name) {
        existing.1 = value.to_string();
    } else {
        fields.push((name.to_string(), value.to_string()));
    }
}
