//! RSS 2.0 and Atom feed scraper.
//!
//! Feeds are deserialized with `quick-xml`'s serde support. RSS is tried
//! first; a document without an RSS `<channel>` is parsed as Atom.

use crate::config::SourceConfig;
use crate::models::RawArticle;
use chrono::{DateTime, FixedOffset};
use reqwest::Client;
use scraper::Html;
use serde::Deserialize;
use std::error::Error;
use tracing::{debug, info, instrument};

#[derive(Debug, Deserialize)]
struct Rss {
    channel: RssChannel,
}

#[derive(Debug, Deserialize)]
struct RssChannel {
    #[serde(rename = "item", default)]
    items: Vec<RssItem>,
}

#[derive(Debug, Deserialize)]
struct RssItem {
    title: Option<String>,
    link: Option<String>,
    description: Option<String>,
    #[serde(rename = "pubDate")]
    pub_date: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AtomFeed {
    #[serde(rename = "entry", default)]
    entries: Vec<AtomEntry>,
}

#[derive(Debug, Deserialize)]
struct AtomEntry {
    title: Option<AtomText>,
    #[serde(rename = "link", default)]
    links: Vec<AtomLink>,
    summary: Option<AtomText>,
    content: Option<AtomText>,
    published: Option<String>,
    updated: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AtomText {
    #[serde(rename = "$text", default)]
    value: String,
}

#[derive(Debug, Deserialize)]
struct AtomLink {
    #[serde(rename = "@href")]
    href: String,
    #[serde(rename = "@rel")]
    rel: Option<String>,
}

impl AtomEntry {
    /// The `alternate` link, or the first link when none is marked.
    fn url(&self) -> Option<&str> {
        self.links
            .iter()
            .find(|l| l.rel.as_deref().is_none_or(|r| r == "alternate"))
            .or_else(|| self.links.first())
            .map(|l| l.href.as_str())
    }
}

/// Fetch and parse the source's feed.
#[instrument(level = "info", skip_all, fields(source = %source.name, url = %source.url))]
pub async fn scrape(client: &Client, source: &SourceConfig) -> Result<Vec<RawArticle>, Box<dyn Error>> {
    let xml = client
        .get(&source.url)
        .send()
        .await?
        .error_for_status()?
        .text()
        .await?;
    let articles = parse_feed(&xml, &source.name, source.max_articles())?;
    info!(count = articles.len(), "Parsed feed");
    Ok(articles)
}

/// Parse an RSS 2.0 or Atom document into at most `max` articles.
///
/// Entries without a link are skipped. Dates are read from `pubDate`
/// (RFC 2822) or `published`/`updated` (RFC 3339); unparseable dates are
/// treated as absent.
pub fn parse_feed(xml: &str, source_name: &str, max: usize) -> Result<Vec<RawArticle>, Box<dyn Error>> {
    if let Ok(rss) = quick_xml::de::from_str::<Rss>(xml) {
        let articles = rss
            .channel
            .items
            .into_iter()
            .filter_map(|item| {
                let url = item.link.map(|l| l.trim().to_string()).filter(|l| !l.is_empty())?;
                let mut article = RawArticle::new(source_name, url, clean_title(item.title.as_deref()));
                article.content = item.description.as_deref().map(html_to_text).filter(|c| !c.is_empty());
                article.published_at = item
                    .pub_date
                    .as_deref()
                    .and_then(|d| DateTime::parse_from_rfc2822(d.trim()).ok());
                Some(article)
            })
            .take(max)
            .collect();
        return Ok(articles);
    }

    debug!(source = source_name, "Not an RSS channel; trying Atom");
    let feed: AtomFeed = quick_xml::de::from_str(xml)?;
    let articles = feed
        .entries
        .into_iter()
        .filter_map(|entry| {
            let url = entry.url()?.trim().to_string();
            let title = entry.title.as_ref().map(|t| t.value.as_str());
            let mut article = RawArticle::new(source_name, url, clean_title(title));
            article.content = entry
                .content
                .as_ref()
                .or(entry.summary.as_ref())
                .map(|t| html_to_text(&t.value))
                .filter(|c| !c.is_empty());
            article.published_at = entry
                .published
                .as_deref()
                .or(entry.updated.as_deref())
                .and_then(parse_rfc3339);
            Some(article)
        })
        .take(max)
        .collect();
    Ok(articles)
}

fn parse_rfc3339(value: &str) -> Option<DateTime<FixedOffset>> {
    DateTime::parse_from_rfc3339(value.trim()).ok()
}

fn clean_title(title: Option<&str>) -> String {
    title
        .map(|t| t.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| super::html::NO_TITLE.to_string())
}

/// Strip markup from feed descriptions, which are frequently HTML.
fn html_to_text(fragment: &str) -> String {
    Html::parse_fragment(fragment)
        .root_element()
        .text()
        .collect::<Vec<_>>()
        .join(" ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    const RSS: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0">
  <channel>
    <title>Example Tech</title>
    <link>https://tech.example/</link>
    <item>
      <title>Rust &amp; WebAssembly</title>
      <link>https://tech.example/rust-wasm</link>
      <description><![CDATA[<p>Fast <b>and</b> safe.</p>]]></description>
      <pubDate>Tue, 06 May 2025 09:30:00 +0900</pubDate>
    </item>
    <item>
      <title>No date</title>
      <link>https://tech.example/undated</link>
    </item>
    <item>
      <title>No link</title>
    </item>
    <item>
      <title>Bad date</title>
      <link>https://tech.example/bad</link>
      <pubDate>yesterday</pubDate>
    </item>
  </channel>
</rss>"#;

    const ATOM: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <title>Example Atom</title>
  <entry>
    <title type="html">Kubernetes 2.0</title>
    <link rel="replies" href="https://atom.example/k8s#comments"/>
    <id>tag:atom.example,2025:1</id>
    <link rel="alternate" href="https://atom.example/k8s"/>
    <published>2025-05-06T01:00:00Z</published>
    <summary>Big release.</summary>
  </entry>
  <entry>
    <title>Updated only</title>
    <link href="https://atom.example/updated"/>
    <updated>2025-05-05T12:00:00+09:00</updated>
  </entry>
</feed>"#;

    #[test]
    fn test_parse_rss() {
        let articles = parse_feed(RSS, "Example", 10).unwrap();
        assert_eq!(articles.len(), 3);

        let first = &articles[0];
        assert_eq!(first.title, "Rust & WebAssembly");
        assert_eq!(first.url, "https://tech.example/rust-wasm");
        assert_eq!(first.content.as_deref(), Some("Fast and safe."));
        assert_eq!(
            first.published_at,
            DateTime::parse_from_rfc3339("2025-05-06T09:30:00+09:00").ok()
        );

        assert!(articles[1].published_at.is_none());
        assert!(articles[1].content.is_none());
        assert_eq!(articles[2].title, "Bad date");
        assert!(articles[2].published_at.is_none());
    }

    #[test]
    fn test_parse_rss_respects_max() {
        assert_eq!(parse_feed(RSS, "Example", 1).unwrap().len(), 1);
    }

    #[test]
    fn test_parse_atom() {
        let articles = parse_feed(ATOM, "Atom", 10).unwrap();
        assert_eq!(articles.len(), 2);
        assert_eq!(articles[0].title, "Kubernetes 2.0");
        assert_eq!(articles[0].url, "https://atom.example/k8s");
        assert_eq!(articles[0].content.as_deref(), Some("Big release."));
        assert_eq!(
            articles[0].published_at,
            DateTime::parse_from_rfc3339("2025-05-06T01:00:00Z").ok()
        );
        assert_eq!(articles[1].url, "https://atom.example/updated");
        assert!(articles[1].published_at.is_some());
    }
}
