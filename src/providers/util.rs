use crate::core::config::HttpConfig;
use crate::core::{QuoteError, Resource};
use regex::Regex;
use reqwest::{Client, RequestBuilder, redirect};
use std::sync::LazyLock;
use tracing::debug;
use unicode_normalization::{UnicodeNormalization, char::is_combining_mark};

/// Runs of whitespace and the symbols fund names tend to carry.
static SEPARATORS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\s€%&()+\-]+").expect("separator regex must compile"));

/// Builds the outbound client shared by all providers.
///
/// Timeouts and the redirect limit are set explicitly so upstream behaviour
/// does not depend on library defaults.
pub fn build_client(config: &HttpConfig) -> reqwest::Result<Client> {
    Client::builder()
        .user_agent(&config.user_agent)
        .timeout(config.timeout())
        .connect_timeout(config.connect_timeout())
        .redirect(redirect::Policy::limited(config.max_redirects))
        .build()
}

/// Sends `request` and returns the body of a successful response.
///
/// Transport errors and non-success statuses both surface as
/// [`QuoteError::Upstream`] for `resource`.
pub async fn fetch_body(request: RequestBuilder, resource: Resource) -> Result<String, QuoteError> {
    let response = request
        .send()
        .await
        .map_err(|e| QuoteError::upstream(resource, e))?;
    debug!(status = %response.status(), url = %response.url(), "Upstream responded");

    response
        .error_for_status()
        .map_err(|e| QuoteError::upstream(resource, e))?
        .text()
        .await
        .map_err(|e| QuoteError::upstream(resource, e))
}

/// Lowercases and hyphenates spaces: `"BND Wereld Indexfonds"` becomes
/// `"bnd-wereld-indexfonds"`.
pub fn slugify(name: &str) -> String {
    name.to_lowercase().replace(' ', "-")
}

/// Stricter slug for names scraped from display text: accents are stripped
/// and runs of whitespace or symbols collapse into one hyphen.
pub fn clean_fund_name(name: &str) -> String {
    let stripped: String = name.nfkd().filter(|c| !is_combining_mark(*c)).collect();
    SEPARATORS
        .replace_all(&stripped.to_lowercase(), "-")
        .into_owned()
}
