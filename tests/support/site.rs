//! A fake screencast site served by wiremock.

use std::path::Path;
use std::time::Duration;

use catalog_fetch::{Credentials, RunConfig, SiteConfig};
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const ACCOUNT: &str = "me@example.com";
pub const CREDENTIAL: &str = "hunter2";
pub const SESSION_COOKIE: &str = "_session_id=s3cr3t";

pub const SIGN_IN_PAGE: &str = r#"
<html><body>
  <form action="/screencasts/users/sign_in" method="post">
    <input type="hidden" name="authenticity_token" value="tok123">
    <input type="email" name="user[email]" value="">
    <input type="password" name="user[password]">
    <input type="submit" name="commit" value="Sign in">
  </form>
</body></html>
"#;

/// Mounts the sign-in form and a post handler that accepts [`ACCOUNT`]/[`CREDENTIAL`].
///
/// Any other post gets a 200 page without the confirmation phrase.
pub async fn mount_sign_in(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/screencasts/users/sign_in"))
        .respond_with(ResponseTemplate::new(200).set_body_string(SIGN_IN_PAGE))
        .mount(server)
        .await;

    Mock::given(method("POST"))
        .and(path("/screencasts/users/sign_in"))
        .and(body_string_contains("authenticity_token=tok123"))
        .and(body_string_contains("user%5Bemail%5D=me%40example.com"))
        .and(body_string_contains("user%5Bpassword%5D=hunter2"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("set-cookie", format!("{SESSION_COOKIE}; path=/").as_str())
                .set_body_string("<p class=\"notice\">Signed in successfully.</p>"),
        )
        .with_priority(1)
        .mount(server)
        .await;

    Mock::given(method("POST"))
        .and(path("/screencasts/users/sign_in"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string("<p class=\"alert\">Invalid email or password.</p>"),
        )
        .with_priority(10)
        .mount(server)
        .await;
}

/// Builds a catalog page linking to every slug, plus a few unrelated links.
pub fn catalog_page(slugs: &[&str]) -> String {
    let mut page = String::from("<html><body><a href=\"/screencasts\">Home</a>\n");
    for slug in slugs {
        page.push_str(&format!(
            "<div class=\"screencast\"><a href=\"/screencasts/catalog/{slug}\">{slug}</a></div>\n"
        ));
    }
    page.push_str("<a href=\"https://example.org/elsewhere\">Elsewhere</a></body></html>");
    page
}

/// Mounts the catalog page listing `slugs`.
pub async fn mount_catalog(server: &MockServer, slugs: &[&str]) {
    Mock::given(method("GET"))
        .and(path("/screencasts/catalog"))
        .respond_with(ResponseTemplate::new(200).set_body_string(catalog_page(slugs)))
        .mount(server)
        .await;
}

/// Mounts `/screencasts/catalog/{slug}/download` redirecting to `/files/{slug}.mov`,
/// which serves `body` to requests carrying the session cookie.
pub async fn mount_item(server: &MockServer, slug: &str, body: &[u8]) {
    mount_item_with(server, slug, ResponseTemplate::new(200).set_body_bytes(body.to_vec())).await;
}

/// Like [`mount_item`] with a custom response for the file itself.
pub async fn mount_item_with(server: &MockServer, slug: &str, file: ResponseTemplate) {
    Mock::given(method("GET"))
        .and(path(format!("/screencasts/catalog/{slug}/download")))
        .respond_with(
            ResponseTemplate::new(302).insert_header("location", format!("/files/{slug}.mov").as_str()),
        )
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path(format!("/files/{slug}.mov")))
        .and(header("cookie", SESSION_COOKIE))
        .respond_with(file)
        .mount(server)
        .await;
}

/// A run configuration pointed at `server`, writing into `output_dir`.
pub fn run_config(server: &MockServer, output_dir: &Path, credential: &str) -> RunConfig {
    let site = SiteConfig::with_base_url(&server.uri()).expect("mock server uri is a valid URL");
    let credentials = Credentials {
        account: ACCOUNT.to_string(),
        credential: credential.to_string(),
    };
    let mut config = RunConfig::new(site, credentials);
    config.workers = 2;
    config.queue_capacity = 2;
    config.output_dir = output_dir.to_path_buf();
    config.connect_timeout = Duration::from_secs(5);
    config.request_timeout = Duration::from_secs(5);
    config
}
