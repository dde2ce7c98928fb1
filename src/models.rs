//! Data models for collected articles, their analysis, and the daily report.
//!
//! This module defines the core data structures used throughout the pipeline:
//! - [`RawArticle`]: An article as collected from a source, before analysis
//! - [`AnalyzedArticle`]: An article after the LLM has summarized and ranked it
//! - [`Importance`]: The three-tier ranking assigned by the LLM
//! - [`DailyReport`]: The ranked selection of articles published for one day

use chrono::{DateTime, FixedOffset, Local};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Importance level assigned to an article by the analysis stage.
///
/// Variants are declared from most to least important, so the derived
/// ordering sorts `S` first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize, Serialize)]
pub enum Importance {
    /// Industry-shaping news: major releases, critical vulnerabilities, new standards.
    S,
    /// Practical trends and updates engineers should know about.
    A,
    /// General information and personal write-ups.
    B,
}

impl Importance {
    /// All levels, most important first.
    pub const ALL: [Importance; 3] = [Importance::S, Importance::A, Importance::B];

    /// Parse a level from an LLM response; anything unrecognized is `None`.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "S" => Some(Importance::S),
            "A" => Some(Importance::A),
            "B" => Some(Importance::B),
            _ => None,
        }
    }
}

impl fmt::Display for Importance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Importance::S => "S",
            Importance::A => "A",
            Importance::B => "B",
        };
        f.write_str(s)
    }
}

/// An article as collected from a source.
///
/// Only `source`, `url`, and `title` are guaranteed; feed and API sources may
/// also provide a body and a publication timestamp.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawArticle {
    /// Name of the configured source this article came from.
    pub source: String,
    /// Absolute URL of the article.
    pub url: String,
    /// Article headline.
    pub title: String,
    /// Body or summary text, when the source provides one.
    pub content: Option<String>,
    /// Publication timestamp, when the source provides one.
    pub published_at: Option<DateTime<FixedOffset>>,
    /// When this crate collected the article.
    pub collected_at: DateTime<Local>,
}

impl RawArticle {
    pub fn new(source: impl Into<String>, url: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            url: url.into(),
            title: title.into(),
            content: None,
            published_at: None,
            collected_at: Local::now(),
        }
    }
}

/// An article after LLM analysis.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AnalyzedArticle {
    pub source: String,
    pub url: String,
    pub title: String,
    pub published_at: Option<DateTime<FixedOffset>>,
    /// Short summary written for engineers.
    pub summary: String,
    /// Technology tags (languages, frameworks, platforms).
    pub tags: Vec<String>,
    pub importance: Importance,
    pub analyzed_at: DateTime<Local>,
}

impl AnalyzedArticle {
    /// Combine a collected article with its analysis results.
    pub fn from_raw(raw: &RawArticle, summary: String, tags: Vec<String>, importance: Importance) -> Self {
        Self {
            source: raw.source.clone(),
            url: raw.url.clone(),
            title: raw.title.clone(),
            published_at: raw.published_at,
            summary,
            tags,
            importance,
            analyzed_at: Local::now(),
        }
    }
}

/// The ranked selection of articles published for one day.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DailyReport {
    /// When the report was generated, in the configured report timezone.
    pub report_date: DateTime<FixedOffset>,
    /// Number of articles in `articles`.
    pub total_articles: usize,
    /// Count of selected articles per importance level (every level present).
    pub articles_by_importance: BTreeMap<Importance, usize>,
    /// Selected articles, most important first.
    pub articles: Vec<AnalyzedArticle>,
}

impl DailyReport {
    /// Number of selected articles at `level`.
    pub fn count(&self, level: Importance) -> usize {
        self.articles_by_importance.get(&level).copied().unwrap_or(0)
    }

    /// Selected articles at `level`, in report order.
    pub fn articles_at(&self, level: Importance) -> impl Iterator<Item = &AnalyzedArticle> {
        self.articles.iter().filter(move |a| a.importance == level)
    }

    /// Render the archival markdown report saved to disk.
    pub fn to_markdown(&self) -> String {
        let mut lines = vec![
            "# 📊 IT Trend Daily Report".to_string(),
            format!("**Date:** {}", self.report_date.format("%Y-%m-%d %H:%M")),
            format!("**Total Articles:** {}", self.total_articles),
            String::new(),
            "## 📈 Summary".to_string(),
            String::new(),
        ];

        for level in Importance::ALL {
            lines.push(format!("- **{} Rank:** {} articles", level, self.count(level)));
        }
        lines.extend([String::new(), "---".to_string(), String::new()]);

        for level in Importance::ALL {
            let articles: Vec<&AnalyzedArticle> = self.articles_at(level).collect();
            if articles.is_empty() {
                continue;
            }

            lines.push(format!("## {} Rank Articles ({})", level, articles.len()));
            lines.push(String::new());

            for article in articles {
                lines.push(format!("### [{}]({})", article.title, article.url));
                lines.push(format!("**Source:** {}", article.source));
                if let Some(published) = article.published_at {
                    lines.push(format!("**Published:** {}", published.format("%Y-%m-%d %H:%M")));
                }
                lines.push(String::new());
                lines.push("**Summary:**".to_string());
                lines.push(article.summary.clone());
                lines.push(String::new());
                if !article.tags.is_empty() {
                    lines.push(format!("**Tags:** {}", code_tags(&article.tags)));
                }
                lines.extend([String::new(), "---".to_string(), String::new()]);
            }
        }

        lines.join("\n")
    }
}

/// Render tags as comma-separated inline code: `` `Rust`, `Go` ``.
pub fn code_tags(tags: &[String]) -> String {
    tags.iter()
        .map(|t| format!("`{}`", t))
        .collect::<Vec<_>>()
        .join(", ")
}
