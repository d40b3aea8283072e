use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE};
use reqwest::redirect::Policy;
use reqwest::Client;

use crate::config::HttpConfig;

const MAX_REDIRECTS: usize = 10;

/// Build the HTTP session shared by every request of one resolution call.
///
/// Mobile browser headers, a cookie jar and gzip decoding are set once here so that the
/// strategies only add what is specific to them.
pub fn build_client(http: &HttpConfig) -> reqwest::Result<Client> {
    let mut headers = HeaderMap::new();
    headers.insert(
        ACCEPT,
        HeaderValue::from_static("text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8"),
    );

    match HeaderValue::from_str(&http.accept_language) {
        Ok(value) => {
            headers.insert(ACCEPT_LANGUAGE, value);
        }
        Err(_) => tracing::warn!(value = %http.accept_language, "Ignoring invalid Accept-Language"),
    }

    Client::builder()
        .user_agent(http.user_agent.as_str())
        .default_headers(headers)
        .cookie_store(true)
        .gzip(true)
        .redirect(Policy::limited(MAX_REDIRECTS))
        .connect_timeout(http.connect_timeout())
        .build()
}
