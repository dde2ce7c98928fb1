//! Article collection from the configured sources.
//!
//! Each source resolves to one strategy (see [`SourceConfig::strategy`]):
//!
//! | Strategy | Module | Method |
//! |----------|--------|--------|
//! | Qiita API | [`qiita`] | JSON list endpoint |
//! | Feed | [`feed`] | RSS 2.0 / Atom |
//! | HTML | [`html`] | CSS selectors over a listing page |
//!
//! # Common Patterns
//!
//! - Every fetch goes through the shared retry policy
//! - A failing source is logged and contributes no articles
//! - Sources are fetched concurrently up to the configured ceiling
//! - Articles older than the lookback window are dropped after gathering

pub mod feed;
pub mod html;
pub mod qiita;

use crate::config::{ScrapingSettings, SourceConfig, SourceMethod, Strategy};
use crate::models::RawArticle;
use crate::retry::{RetryPolicy, retry_with_backoff};
use chrono::{DateTime, TimeDelta, Utc};
use futures::stream::{self, StreamExt};
use itertools::Itertools;
use reqwest::Client;
use std::error::Error;
use std::time::Duration;
use tracing::{debug, error, info, instrument, warn};

/// Build the HTTP client shared by all scrapers.
pub fn build_client(settings: &ScrapingSettings) -> Result<Client, Box<dyn Error>> {
    Ok(Client::builder()
        .user_agent(settings.user_agent.clone())
        .timeout(Duration::from_secs(settings.timeout_secs))
        .build()?)
}

/// Fetch one source with the strategy it resolves to.
pub async fn scrape_source(client: &Client, source: &SourceConfig) -> Result<Vec<RawArticle>, Box<dyn Error>> {
    match source.strategy() {
        Strategy::QiitaApi => qiita::scrape(client, source).await,
        Strategy::Feed => feed::scrape(client, source).await,
        Strategy::Html => {
            if source.method == SourceMethod::Playwright {
                warn!(source = %source.name, "Headless browser not available; scraping static HTML");
            }
            html::scrape(client, source).await
        }
    }
}

/// Collect one source, retrying transient failures. Never fails: a source
/// that keeps failing yields no articles.
#[instrument(level = "info", skip_all, fields(source = %source.name))]
pub async fn collect_from_source(
    client: &Client,
    source: &SourceConfig,
    retry: &RetryPolicy,
) -> Vec<RawArticle> {
    if !source.enabled {
        info!("Skipping disabled source");
        return Vec::new();
    }

    match retry_with_backoff(retry, &source.name, || scrape_source(client, source)).await {
        Ok(articles) => {
            info!(count = articles.len(), "Collected articles");
            articles
        }
        Err(e) => {
            error!(error = %e, "Source collection failed");
            Vec::new()
        }
    }
}

/// Collect every source with at most `settings.max_concurrent` in flight,
/// then drop duplicates (by URL) and articles outside the lookback window.
#[instrument(level = "info", skip_all, fields(sources = sources.len()))]
pub async fn collect_all(
    client: &Client,
    sources: &[SourceConfig],
    settings: &ScrapingSettings,
    retry: &RetryPolicy,
) -> Vec<RawArticle> {
    info!(max_concurrent = settings.max_concurrent, "Starting collection");

    let all: Vec<RawArticle> = stream::iter(sources)
        .map(|source| collect_from_source(client, source, retry))
        .buffered(settings.max_concurrent.max(1))
        .collect::<Vec<Vec<RawArticle>>>()
        .await
        .into_iter()
        .flatten()
        .collect();
    let total = all.len();

    let unique: Vec<RawArticle> = all.into_iter().unique_by(|a| a.url.clone()).collect();
    let cutoff = Utc::now() - TimeDelta::hours(settings.hours_lookback);
    let recent = filter_recent(unique, cutoff);

    info!(
        total,
        kept = recent.len(),
        cutoff = %cutoff.format("%Y-%m-%d %H:%M %Z"),
        "Collection complete"
    );
    recent
}

/// Keep undated articles and those published at or after `cutoff`.
pub fn filter_recent(articles: Vec<RawArticle>, cutoff: DateTime<Utc>) -> Vec<RawArticle> {
    articles
        .into_iter()
        .filter(|article| match article.published_at {
            None => true,
            Some(published) if published.with_timezone(&Utc) >= cutoff => true,
            Some(published) => {
                debug!(title = %article.title, %published, "Filtered out old article");
                false
            }
        })
        .collect()
}
