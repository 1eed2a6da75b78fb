//! User-Agent string sent with every session request.

/// Project URL advertised in the User-Agent.
const PROJECT_UA_URL: &str = "https://github.com/fierce/catalog-fetch";

/// Default User-Agent for session traffic (identifies the tool).
#[must_use]
pub(crate) fn default_session_user_agent() -> String {
    let version = env!("CARGO_PKG_VERSION");
    format!("catalog-fetch/{version} (+{PROJECT_UA_URL})")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ua_contains_project_url_and_version() {
        let ua = default_session_user_agent();
        assert!(ua.contains(PROJECT_UA_URL), "UA must contain project URL");
        assert_eq!(
            ua.strip_prefix("catalog-fetch/")
                .and_then(|s| s.split(' ').next()),
            Some(env!("CARGO_PKG_VERSION")),
            "UA must contain crate version: {ua}"
        );
    }
}
