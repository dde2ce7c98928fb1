//! YAML configuration for sources and pipeline tunables.
//!
//! Secrets and endpoints come from the CLI (or their environment variables);
//! everything else lives in a YAML file so that sources can be edited without
//! touching the binary.
//!
//! ```yaml
//! scraping:
//!   timeout_secs: 30
//!   max_concurrent: 5
//!   hours_lookback: 24
//! analysis:
//!   max_concurrent: 3
//! report:
//!   top_n: 10
//!   timezone: Asia/Tokyo
//!   language: ja
//! retry:
//!   max_retries: 3
//!   base_delay_ms: 1000
//! sources:
//!   - name: Zenn
//!     url: https://zenn.dev/feed
//!     type: rss
//! ```

use crate::retry::RetryPolicy;
use chrono_tz::Tz;
use serde::Deserialize;
use std::error::Error;
use tokio::fs;
use tracing::{info, instrument};

/// Everything the pipeline reads from the YAML file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub sources: Vec<SourceConfig>,
    pub scraping: ScrapingSettings,
    pub analysis: AnalysisSettings,
    pub report: ReportSettings,
    pub retry: RetryPolicy,
}

/// Settings shared by every scraper.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ScrapingSettings {
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
    /// Maximum number of sources fetched at the same time.
    pub max_concurrent: usize,
    pub user_agent: String,
    /// Articles published longer ago than this are dropped. Undated articles are kept.
    pub hours_lookback: i64,
}

impl Default for ScrapingSettings {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            max_concurrent: 5,
            user_agent: "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36"
                .to_string(),
            hours_lookback: 24,
        }
    }
}

/// LLM analysis tunables.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AnalysisSettings {
    /// Maximum number of in-flight LLM calls.
    pub max_concurrent: usize,
    pub max_tokens: u32,
    pub temperature: f32,
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            max_concurrent: 3,
            max_tokens: 4096,
            temperature: 0.7,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ReportSettings {
    /// Number of articles kept in the published digest.
    pub top_n: usize,
    /// Zone the report date is taken in; it decides the page title and file name.
    pub timezone: Tz,
    /// Language of the published page and of the requested summaries.
    pub language: Language,
}

impl Default for ReportSettings {
    fn default() -> Self {
        Self {
            top_n: 10,
            timezone: chrono_tz::Asia::Tokyo,
            language: Language::default(),
        }
    }
}

/// Output language of the digest.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    Ja,
    En,
}

impl Language {
    /// English name of the language, as used in the analysis prompt.
    pub fn name(self) -> &'static str {
        match self {
            Language::Ja => "Japanese",
            Language::En => "English",
        }
    }
}

/// Where the article list of a source comes from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    #[default]
    Html,
    Rss,
    Api,
}

/// How a source is fetched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceMethod {
    #[default]
    Requests,
    Playwright,
    Feedparser,
    QiitaApi,
}

/// The scraping strategy a source resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Paginated REST API returning JSON items.
    QiitaApi,
    /// RSS 2.0 or Atom feed.
    Feed,
    /// Static HTML page with CSS selectors.
    Html,
}

/// CSS selectors used by the HTML strategy.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Selectors {
    /// Selector matching one element per article.
    pub article_list: String,
    /// Selector for the link, relative to an article element.
    pub article_link: String,
    /// Selector for the headline, relative to an article element.
    pub article_title: String,
}

impl Default for Selectors {
    fn default() -> Self {
        Self {
            article_list: "article".to_string(),
            article_link: "a".to_string(),
            article_title: "h2, h3".to_string(),
        }
    }
}

/// One configured news source.
#[derive(Debug, Clone, Deserialize)]
pub struct SourceConfig {
    pub name: String,
    #[serde(default)]
    pub url: String,
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default, rename = "type")]
    pub kind: SourceKind,
    #[serde(default)]
    pub method: SourceMethod,
    #[serde(default)]
    pub selectors: Selectors,
    /// Upper bound on articles taken from this source.
    pub max_articles: Option<usize>,
    /// Search query forwarded to API sources.
    pub query: Option<String>,
}

fn default_true() -> bool {
    true
}

impl SourceConfig {
    /// Resolve `type` and `method` into the strategy used to fetch this source.
    ///
    /// API sources win over feeds, feeds over HTML.
    pub fn strategy(&self) -> Strategy {
        if self.kind == SourceKind::Api || self.method == SourceMethod::QiitaApi {
            Strategy::QiitaApi
        } else if self.kind == SourceKind::Rss || self.method == SourceMethod::Feedparser {
            Strategy::Feed
        } else {
            Strategy::Html
        }
    }

    /// Configured article limit, or the strategy's default (20 for the API, 10 otherwise).
    pub fn max_articles(&self) -> usize {
        self.max_articles.unwrap_or(match self.strategy() {
            Strategy::QiitaApi => 20,
            _ => 10,
        })
    }
}

/// Parse a configuration document.
pub fn parse_config(yaml: &str) -> Result<Config, Box<dyn Error>> {
    Ok(serde_yaml::from_str(yaml)?)
}

/// Load the configuration file at `path`.
#[instrument(level = "info", skip_all, fields(%path))]
pub async fn load_config(path: &str) -> Result<Config, Box<dyn Error>> {
    let yaml = fs::read_to_string(path).await?;
    let config = parse_config(&yaml)?;
    info!(
        sources = config.sources.len(),
        enabled = config.sources.iter().filter(|s| s.enabled).count(),
        "Loaded configuration"
    );
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_for_empty_document() {
        let config = parse_config("{}").unwrap();
        assert!(config.sources.is_empty());
        assert_eq!(config.scraping.max_concurrent, 5);
        assert_eq!(config.scraping.hours_lookback, 24);
        assert_eq!(config.analysis.max_concurrent, 3);
        assert_eq!(config.report.top_n, 10);
        assert_eq!(config.report.timezone, chrono_tz::Asia::Tokyo);
        assert_eq!(config.report.language, Language::Ja);
        assert_eq!(config.retry.max_retries, 3);
    }

    #[test]
    fn test_report_timezone_and_language() {
        let config = parse_config("report:\n  timezone: Europe/Berlin\n  language: en\n").unwrap();
        assert_eq!(config.report.timezone, chrono_tz::Europe::Berlin);
        assert_eq!(config.report.language, Language::En);
        assert_eq!(config.report.top_n, 10);
        assert!(parse_config("report:\n  timezone: Mars/Olympus\n").is_err());
    }

    #[test]
    fn test_source_defaults() {
        let config = parse_config("sources:\n  - name: Example\n    url: https://example.com\n").unwrap();
        let source = &config.sources[0];
        assert!(source.enabled);
        assert_eq!(source.kind, SourceKind::Html);
        assert_eq!(source.method, SourceMethod::Requests);
        assert_eq!(source.selectors.article_title, "h2, h3");
        assert_eq!(source.strategy(), Strategy::Html);
        assert_eq!(source.max_articles(), 10);
    }

    #[test]
    fn test_strategy_resolution() {
        let yaml = r#"
sources:
  - name: Qiita
    type: api
    query: "stocks:>10"
  - name: Qiita by method
    method: qiita_api
  - name: Zenn
    url: https://zenn.dev/feed
    type: rss
  - name: Feed by method
    url: https://example.com/rss
    method: feedparser
  - name: Dynamic
    url: https://example.com
    method: playwright
    enabled: false
    max_articles: 3
    selectors:
      article_list: "div.item"
"#;
        let config = parse_config(yaml).unwrap();
        let strategies: Vec<Strategy> = config.sources.iter().map(SourceConfig::strategy).collect();
        assert_eq!(
            strategies,
            vec![
                Strategy::QiitaApi,
                Strategy::QiitaApi,
                Strategy::Feed,
                Strategy::Feed,
                Strategy::Html,
            ]
        );
        assert_eq!(config.sources[0].max_articles(), 20);
        assert_eq!(config.sources[0].query.as_deref(), Some("stocks:>10"));
        let dynamic = &config.sources[4];
        assert!(!dynamic.enabled);
        assert_eq!(dynamic.max_articles(), 3);
        assert_eq!(dynamic.selectors.article_list, "div.item");
        assert_eq!(dynamic.selectors.article_link, "a");
    }

    #[test]
    fn test_bundled_sources_file_parses() {
        let config = parse_config(include_str!("../config/sources.yaml")).unwrap();
        assert!(!config.sources.is_empty());
        assert!(config.sources.iter().all(|s| !s.name.is_empty()));
    }

    #[test]
    fn test_unknown_source_type_is_rejected() {
        assert!(parse_config("sources:\n  - name: X\n    type: gopher\n").is_err());
    }
}
