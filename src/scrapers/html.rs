//! Static HTML listing scraper.
//!
//! Fetches a listing page and extracts one article per element matching the
//! source's `article_list` selector. Links are resolved against the page URL,
//! so relative `href`s work.

use crate::config::{Selectors, SourceConfig};
use crate::models::RawArticle;
use reqwest::Client;
use scraper::{ElementRef, Html, Selector};
use std::error::Error;
use tracing::{debug, info, instrument, warn};
use url::Url;

/// Title used when an article element has no non-empty title element.
pub const NO_TITLE: &str = "No Title";

/// Fetch the source page and extract its article list.
#[instrument(level = "info", skip_all, fields(source = %source.name, url = %source.url))]
pub async fn scrape(client: &Client, source: &SourceConfig) -> Result<Vec<RawArticle>, Box<dyn Error>> {
    let html = client
        .get(&source.url)
        .send()
        .await?
        .error_for_status()?
        .text()
        .await?;
    let articles = parse_listing(
        &html,
        &source.url,
        &source.name,
        &source.selectors,
        source.max_articles(),
    )?;
    info!(count = articles.len(), "Parsed HTML listing");
    Ok(articles)
}

fn selector(css: &str) -> Result<Selector, Box<dyn Error>> {
    Selector::parse(css).map_err(|e| format!("invalid selector {:?}: {:?}", css, e).into())
}

/// Collapse runs of whitespace (including newlines inside headings).
fn element_text(element: ElementRef<'_>) -> String {
    element.text().collect::<Vec<_>>().join(" ").split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Extract up to `max` articles from a listing page.
///
/// Elements without a usable link are skipped. When an article element is
/// itself an `<a>`, it serves as its own link.
pub fn parse_listing(
    html: &str,
    page_url: &str,
    source_name: &str,
    selectors: &Selectors,
    max: usize,
) -> Result<Vec<RawArticle>, Box<dyn Error>> {
    let base = Url::parse(page_url)?;
    let list_selector = selector(&selectors.article_list)?;
    let link_selector = selector(&selectors.article_link)?;
    let title_selector = selector(&selectors.article_title)?;

    let document = Html::parse_document(html);
    let mut articles = Vec::new();

    for element in document.select(&list_selector).take(max) {
        let link = if element.value().name() == "a" {
            Some(element)
        } else {
            element.select(&link_selector).next()
        };
        let Some(href) = link.and_then(|a| a.value().attr("href")) else {
            debug!(source = source_name, "Article element without link; skipping");
            continue;
        };
        let url = match base.join(href) {
            Ok(url) => url,
            Err(e) => {
                warn!(source = source_name, href, error = %e, "Unresolvable article link");
                continue;
            }
        };

        let title = element
            .select(&title_selector)
            .next()
            .map(element_text)
            .or_else(|| link.map(element_text))
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| NO_TITLE.to_string());

        articles.push(RawArticle::new(source_name, url.to_string(), title));
    }

    Ok(articles)
}
