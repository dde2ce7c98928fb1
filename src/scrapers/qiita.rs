//! Qiita API v2 scraper.
//!
//! Reads the first page of `/api/v2/items`, optionally filtered by the
//! source's search `query`. The list endpoint carries no article bodies.

use crate::config::SourceConfig;
use crate::models::RawArticle;
use chrono::DateTime;
use reqwest::Client;
use serde::Deserialize;
use std::error::Error;
use tracing::{info, instrument};

/// Default items endpoint, used when the source has no `url`.
pub const QIITA_ITEMS_URL: &str = "https://qiita.com/api/v2/items";

/// Largest page size the API accepts.
const MAX_PER_PAGE: usize = 100;

#[derive(Debug, Deserialize)]
pub struct QiitaItem {
    pub title: Option<String>,
    pub url: Option<String>,
    pub created_at: Option<String>,
}

/// Build the request URL for the first page of items.
pub fn items_url(source: &SourceConfig) -> String {
    let base = if source.url.trim().is_empty() {
        QIITA_ITEMS_URL
    } else {
        source.url.trim()
    };
    let per_page = source.max_articles().clamp(1, MAX_PER_PAGE);
    let mut url = format!("{}?page=1&per_page={}", base, per_page);
    if let Some(query) = source.query.as_deref().filter(|q| !q.is_empty()) {
        url.push_str("&query=");
        url.push_str(&urlencoding::encode(query));
    }
    url
}

/// Fetch the first page of items for `source`.
#[instrument(level = "info", skip_all, fields(source = %source.name))]
pub async fn scrape(client: &Client, source: &SourceConfig) -> Result<Vec<RawArticle>, Box<dyn Error>> {
    let url = items_url(source);
    let items: Vec<QiitaItem> = client
        .get(&url)
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;
    let articles = items_to_articles(items, &source.name, source.max_articles());
    info!(count = articles.len(), "Fetched Qiita items");
    Ok(articles)
}

/// Convert API items into articles; items without a URL are dropped.
pub fn items_to_articles(items: Vec<QiitaItem>, source_name: &str, max: usize) -> Vec<RawArticle> {
    items
        .into_iter()
        .filter_map(|item| {
            let url = item.url.filter(|u| !u.is_empty())?;
            let title = item
                .title
                .filter(|t| !t.trim().is_empty())
                .unwrap_or_else(|| super::html::NO_TITLE.to_string());
            let mut article = RawArticle::new(source_name, url, title);
            article.published_at = item
                .created_at
                .as_deref()
                .and_then(|d| DateTime::parse_from_rfc3339(d).ok());
            Some(article)
        })
        .take(max)
        .collect()
}
