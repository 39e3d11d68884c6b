use crate::api::TextSource;
use crate::error::PipelineError;
use crate::models::QuerySpec;
use crate::Result;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

const TWITTER_API_BASE: &str = "https://api.twitter.com";
const SERVICE: &str = "twitter";
const TWEET_FIELDS: &str = "id,text,created_at,author_id";

/// X (Twitter) v2 recent-search client
#[derive(Clone)]
pub struct TwitterClient {
    client: Client,
    bearer_token: String,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    data: Vec<Tweet>,
    #[serde(default)]
    meta: Option<SearchMeta>,
}

#[derive(Debug, Deserialize)]
struct Tweet {
    #[allow(dead_code)]
    id: String,
    text: String,
}

#[derive(Debug, Deserialize)]
struct SearchMeta {
    next_token: Option<String>,
}

impl TwitterClient {
    pub fn new(bearer_token: String) -> Self {
        Self::with_base_url(bearer_token, TWITTER_API_BASE.to_string())
    }

    pub fn with_base_url(bearer_token: String, base_url: String) -> Self {
        Self {
            client: Client::new(),
            bearer_token,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    async fn search_page(
        &self,
        query: &str,
        max_results: u32,
        next_token: Option<&str>,
    ) -> Result<SearchResponse> {
        let url = format!("{}/2/tweets/search/recent", self.base_url);
        let max_results = max_results.to_string();

        let mut params = vec![
            ("query", query),
            ("max_results", max_results.as_str()),
            ("tweet.fields", TWEET_FIELDS),
            ("sort_order", "recency"),
        ];
        if let Some(token) = next_token {
            params.push(("next_token", token));
        }

        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.bearer_token)
            .query(&params)
            .send()
            .await
            .map_err(|e| PipelineError::external(SERVICE, e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(PipelineError::external(
                SERVICE,
                format!("search failed ({}): {}", status, body),
            ));
        }

        response
            .json()
            .await
            .map_err(|e| PipelineError::external(SERVICE, format!("bad search response: {}", e)))
    }
}

#[async_trait]
impl TextSource for TwitterClient {
    /// Most recent matching posts; follows `next_token` for one extra page
    async fn fetch(&self, filter: &QuerySpec) -> Result<Vec<String>> {
        let query = filter.to_query().ok_or_else(|| {
            PipelineError::InvalidInput("specify at least one account or keyword".to_string())
        })?;

        if !(10..=100).contains(&filter.max_results) {
            return Err(PipelineError::InvalidInput(format!(
                "max_results must be between 10 and 100, got {}",
                filter.max_results
            )));
        }

        tracing::debug!(%query, "Searching recent posts");

        let first = self.search_page(&query, filter.max_results, None).await?;
        let mut texts: Vec<String> = first.data.into_iter().map(|t| t.text).collect();

        if let Some(token) = first.meta.and_then(|m| m.next_token) {
            let second = self
                .search_page(&query, filter.max_results, Some(&token))
                .await?;
            texts.extend(second.data.into_iter().map(|t| t.text));
        }

        tracing::debug!(count = texts.len(), "Fetched posts");

        Ok(texts)
    }
}
