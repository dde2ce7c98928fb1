//! Article analysis: prompt construction, response parsing, and bounded fan-out.
//!
//! Every article gets exactly one [`AnalyzedArticle`] back. Failures never
//! propagate: a failed call degrades to importance `B`, no tags, and a fixed
//! failure summary, so one bad article cannot sink the batch.

use crate::api::AskAsync;
use crate::config::Language;
use crate::models::{AnalyzedArticle, Importance, RawArticle};
use crate::utils::{looks_truncated, truncate_for_log};
use futures::stream::{self, StreamExt};
use serde_json::Value;
use tracing::{debug, error, info, instrument, warn};

/// Summary used when the LLM call itself fails.
pub const ANALYSIS_FAILED: &str = "Analysis failed.";
/// Summary used when the reply is not valid JSON.
pub const PARSE_FAILED: &str = "Failed to parse the analysis result.";
/// Summary used when the reply is JSON but carries no summary.
pub const SUMMARY_MISSING: &str = "Summary generation failed.";
/// Tags kept per article.
pub const MAX_TAGS: usize = 5;

/// Fields extracted from one LLM reply.
#[derive(Debug, Clone, PartialEq)]
pub struct Analysis {
    pub summary: String,
    pub tags: Vec<String>,
    pub importance: Importance,
}

impl Analysis {
    /// The result recorded when an article could not be analyzed.
    pub fn degraded(summary: &str) -> Self {
        Self {
            summary: summary.to_string(),
            tags: Vec::new(),
            importance: Importance::B,
        }
    }
}

/// Build the user prompt for one article, asking for a summary in `language`.
pub fn analysis_prompt(article: &RawArticle, language: Language) -> String {
    let mut prompt = format!(
        "You are an expert analyst of IT and software engineering trends. Analyze the following article.\n\n\
         Title: {}\nSource: {}\nURL: {}\n",
        article.title, article.source, article.url
    );
    if let Some(content) = article.content.as_deref().filter(|c| !c.trim().is_empty()) {
        prompt.push_str(&format!("Excerpt: {}\n", truncate_for_log(content.trim(), 2000)));
    }
    prompt.push_str(&format!(
        "\nWrite the summary in {}. Keep tags in their usual technical spelling.\n",
        language.name()
    ));
    prompt.push_str(
        r#"
Reply with JSON only, in this shape:

{
  "summary": "At most three lines summarizing the technical content for engineers.",
  "tags": ["tag1", "tag2", "tag3"],
  "importance": "S",
  "reasoning": "Why this importance level was chosen"
}

**Importance criteria:**
- **S**: News with a large impact on the industry
  - New major versions, breaking changes
  - Critical security vulnerabilities or threats
  - New standards, protocols, or frameworks
  - Significant updates from major platforms (GitHub, AWS, Google, ...)
  - Breakthrough AI/ML announcements
- **A**: Trends and practical information engineers should know (default)
  - New features and updates
  - Hands-on tutorials and best practices
  - Performance and optimization techniques
  - New tools and libraries
- **B**: General technical information or personal experience write-ups

**Tag rules:**
- Programming languages (e.g. Python, Rust, TypeScript)
- Frameworks and libraries (e.g. React, Next.js, Django)
- Cloud and infrastructure (e.g. AWS, Docker, Kubernetes)
- Other technical keywords (e.g. AI/ML, Security, Performance)
- At most 5 tags

Always answer in JSON."#,
    );
    prompt
}

/// Remove a surrounding markdown code fence (```` ```json ```` or ```` ``` ````).
fn strip_code_fence(reply: &str) -> &str {
    let mut s = reply.trim();
    if let Some(rest) = s.strip_prefix("```json") {
        s = rest;
    } else if let Some(rest) = s.strip_prefix("```") {
        s = rest;
    }
    if let Some(rest) = s.strip_suffix("```") {
        s = rest;
    }
    s.trim()
}

/// Parse an LLM reply into an [`Analysis`].
///
/// Missing or malformed fields fall back to defaults. Returns the JSON error
/// when the reply is not a JSON document at all, so the caller can decide
/// whether to re-ask.
pub fn parse_analysis(reply: &str) -> Result<Analysis, serde_json::Error> {
    let value: Value = serde_json::from_str(strip_code_fence(reply))?;

    let summary = value
        .get("summary")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(SUMMARY_MISSING)
        .to_string();

    let tags: Vec<String> = value
        .get("tags")
        .and_then(Value::as_array)
        .map(|tags| {
            tags.iter()
                .filter_map(Value::as_str)
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .take(MAX_TAGS)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();

    let importance = value
        .get("importance")
        .and_then(Value::as_str)
        .and_then(Importance::parse)
        .unwrap_or(Importance::B);

    Ok(Analysis {
        summary,
        tags,
        importance,
    })
}

/// Analyze one article. Never fails; see the module docs for the fallbacks.
#[instrument(level = "info", skip_all, fields(title = %article.title))]
pub async fn analyze_article<A: AskAsync>(
    llm: &A,
    article: &RawArticle,
    language: Language,
) -> AnalyzedArticle {
    let prompt = analysis_prompt(article, language);

    let analysis = match llm.ask(&prompt).await {
        Ok(reply) => match parse_analysis(&reply) {
            Ok(analysis) => analysis,
            Err(e) if looks_truncated(&e) => {
                warn!(error = %e, "Reply ended early; re-asking once");
                match llm.ask(&prompt).await {
                    Ok(second) => parse_analysis(&second).unwrap_or_else(|e| {
                        warn!(error = %e, "Second reply unparseable");
                        Analysis::degraded(PARSE_FAILED)
                    }),
                    Err(e) => {
                        error!(error = %e, "Re-ask failed");
                        Analysis::degraded(ANALYSIS_FAILED)
                    }
                }
            }
            Err(e) => {
                warn!(
                    error = %e,
                    response_preview = %truncate_for_log(&reply, 300),
                    "Model returned non-conforming JSON"
                );
                Analysis::degraded(PARSE_FAILED)
            }
        },
        Err(e) => {
            error!(error = %e, "API call failed; using degraded analysis");
            Analysis::degraded(ANALYSIS_FAILED)
        }
    };

    info!(importance = %analysis.importance, tags = analysis.tags.len(), "Analyzed article");
    AnalyzedArticle::from_raw(article, analysis.summary, analysis.tags, analysis.importance)
}

/// Analyze all articles with at most `max_concurrent` calls in flight.
///
/// Output order matches input order.
#[instrument(level = "info", skip_all, fields(count = articles.len(), max_concurrent = max_concurrent))]
pub async fn analyze_batch<A: AskAsync>(
    llm: &A,
    articles: &[RawArticle],
    max_concurrent: usize,
    language: Language,
) -> Vec<AnalyzedArticle> {
    info!("Starting batch analysis");
    let analyzed: Vec<AnalyzedArticle> = stream::iter(articles.iter().enumerate())
        .map(|(i, article)| async move {
            debug!(index = i, source = %article.source, "Analyzing article");
            analyze_article(llm, article, language).await
        })
        .buffered(max_concurrent.max(1))
        .collect()
        .await;

    let degraded = analyzed
        .iter()
        .filter(|a| a.summary == ANALYSIS_FAILED || a.summary == PARSE_FAILED)
        .count();
    info!(analyzed = analyzed.len(), degraded, "Completed batch analysis");
    analyzed
}
