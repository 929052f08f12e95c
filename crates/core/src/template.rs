//! Format-template locator rewriting.

/// Rewrite a repository file URL into its raw-content equivalent.
///
/// GitHub web URLs (`github.com/.../blob/...`) are rewritten to
/// `raw.githubusercontent.com` so the template body can be fetched directly.
/// Locators that already point at raw content pass through unchanged.
pub fn raw_content_url(url: &str) -> String {
    url.replace("github.com", "raw.githubusercontent.com")
        .replace("/blob/", "/")
}
