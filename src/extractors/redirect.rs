use reqwest::Client;
use std::time::Duration;

/// Whether the link points at one of the redirecting short-link hosts
pub fn is_short_link(link: &str, short_link_hosts: &[String]) -> bool {
    short_link_hosts
        .iter()
        .any(|host| !host.is_empty() && link.contains(host.as_str()))
}

/// Follow the redirects of a short link and return where they end.
///
/// Links that are not short links are returned untouched without any request. When the
/// request fails the original link is returned as well: identifier extraction still gets a
/// chance on whatever URL is available.
pub async fn resolve_short_link(
    client: &Client,
    link: &str,
    short_link_hosts: &[String],
    timeout: Duration,
) -> String {
    if !is_short_link(link, short_link_hosts) {
        return link.to_string();
    }

    tracing::info!(link, "Short link detected, following redirects");

    match client.get(link).timeout(timeout).send().await {
        Ok(response) => {
            let resolved = response.url().to_string();
            tracing::info!(link, resolved = %resolved, status = %response.status(), "Short link resolved");
            resolved
        }
        Err(e) => {
            tracing::warn!(link, error = %e, "Failed to resolve short link, using it as-is");
            link.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_short_link() {
        let hosts = vec!["v.douyin.com".to_string()];
        assert!(is_short_link("https://v.douyin.com/iRNBho6u/", &hosts));
        assert!(!is_short_link("https://www.douyin.com/video/7301234567890123456", &hosts));
        assert!(!is_short_link("https://v.douyin.com/x", &[String::new()]));
    }
}
