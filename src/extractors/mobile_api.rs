use async_trait::async_trait;
use reqwest::header::{ACCEPT, ORIGIN, REFERER};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::time::Duration;

use super::{ResolutionCandidate, SourceStrategy, StrategyResult, VideoId};
use crate::config::{render_endpoint, Config};
use crate::Result;

/// `iteminfo` response, only the parts we read
#[derive(Debug, Deserialize)]
struct ItemInfoResponse {
    status_code: Option<i64>,
    item_list: Option<Vec<Item>>,
}

#[derive(Debug, Deserialize)]
struct Item {
    desc: Option<String>,
    author: Option<Author>,
    video: Option<Video>,
}

#[derive(Debug, Deserialize)]
struct Author {
    nickname: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Video {
    play_addr: Option<UrlList>,
    cover: Option<UrlList>,
}

#[derive(Debug, Deserialize)]
struct UrlList {
    #[serde(default)]
    url_list: Vec<String>,
}

impl UrlList {
    fn first(&self) -> Option<&str> {
        self.url_list.first().map(String::as_str)
    }
}

/// Structured JSON API used by the mobile web client
pub struct MobileApiStrategy {
    client: Client,
    endpoint: String,
    referer: String,
    origin: String,
    timeout: Duration,
}

impl MobileApiStrategy {
    pub fn new(client: Client, config: &Config) -> Self {
        Self {
            client,
            endpoint: config.endpoints.mobile_api.clone(),
            referer: config.endpoints.referer.clone(),
            origin: config.endpoints.origin.clone(),
            timeout: config.http.api_timeout(),
        }
    }

    async fn query(&self, id: &VideoId) -> Result<Option<ResolutionCandidate>> {
        let url = render_endpoint(&self.endpoint, id.as_str());

        let response = self
            .client
            .get(&url)
            .header(ACCEPT, "application/json, text/plain, */*")
            .header(REFERER, &self.referer)
            .header(ORIGIN, &self.origin)
            .timeout(self.timeout)
            .send()
            .await?;

        let status = response.status();
        tracing::debug!(video_id = %id, status = %status, "Mobile API response");

        if status != StatusCode::OK {
            return Ok(None);
        }

        let body = response.text().await?;
        if body.trim().is_empty() {
            tracing::debug!(video_id = %id, "Mobile API returned an empty body");
            return Ok(None);
        }

        let info: ItemInfoResponse = match serde_json::from_str(&body) {
            Ok(info) => info,
            Err(e) => {
                tracing::debug!(video_id = %id, error = %e, "Mobile API body is not the expected JSON");
                return Ok(None);
            }
        };

        Ok(candidate_from_response(info))
    }
}

fn candidate_from_response(info: ItemInfoResponse) -> Option<ResolutionCandidate> {
    if info.status_code != Some(0) {
        return None;
    }

    let item = info.item_list?.into_iter().next()?;
    let video = item.video?;
    let play_url = video.play_addr.as_ref()?.first()?;

    let candidate = ResolutionCandidate::from_source_url(play_url)?
        .with_title(item.desc)
        .with_author(item.author.and_then(|a| a.nickname))
        .with_cover(video.cover.as_ref().and_then(UrlList::first).map(str::to_string));

    Some(candidate)
}

#[async_trait]
impl SourceStrategy for MobileApiStrategy {
    fn name(&self) -> &'static str {
        "mobile-api"
    }

    async fn attempt(&self, id: &VideoId) -> StrategyResult {
        match self.query(id).await {
            Ok(Some(candidate)) => StrategyResult::Resolved(candidate),
            Ok(None) => StrategyResult::NotApplicable,
            Err(e) => StrategyResult::TransientError(e),
        }
    }
}
