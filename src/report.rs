//! Report assembly: ranking, top-N selection, and the page body markdown.

use crate::config::Language;
use crate::models::{AnalyzedArticle, DailyReport, Importance, code_tags};
use chrono::{DateTime, FixedOffset, Utc};
use chrono_tz::Tz;
use std::collections::BTreeMap;
use std::fmt::Write;
use tracing::{info, instrument};

/// Rank articles and keep the `top_n` most important.
///
/// Ordering is importance (S first), then source name, then title.
#[instrument(level = "info", skip_all, fields(count = articles.len(), top_n = top_n))]
pub fn generate_report(
    mut articles: Vec<AnalyzedArticle>,
    top_n: usize,
    report_date: DateTime<FixedOffset>,
) -> DailyReport {
    articles.sort_by(|a, b| {
        a.importance
            .cmp(&b.importance)
            .then_with(|| a.source.cmp(&b.source))
            .then_with(|| a.title.cmp(&b.title))
    });
    articles.truncate(top_n);

    let mut articles_by_importance: BTreeMap<Importance, usize> =
        Importance::ALL.iter().map(|level| (*level, 0)).collect();
    for article in &articles {
        *articles_by_importance.entry(article.importance).or_default() += 1;
    }

    let report = DailyReport {
        report_date,
        total_articles: articles.len(),
        articles_by_importance,
        articles,
    };

    let s = report.count(Importance::S);
    let a = report.count(Importance::A);
    info!(
        total = report.total_articles,
        s,
        a,
        b = report.count(Importance::B),
        s_plus_a = s + a,
        "Report generated"
    );
    report
}

/// Wall-clock time of `instant` in the report's timezone.
///
/// The offset is kept, so titles and file names do not depend on the host.
pub fn report_date_at(instant: DateTime<Utc>, timezone: Tz) -> DateTime<FixedOffset> {
    instant.with_timezone(&timezone).fixed_offset()
}

/// Fixed wording of the published page.
struct Labels {
    date_format: &'static str,
    heading: &'static str,
    rank_section: fn(Importance) -> String,
    rank_count: fn(Importance, usize) -> String,
}

fn labels(language: Language) -> Labels {
    match language {
        Language::Ja => Labels {
            date_format: "%Y年%m月%d日",
            heading: "今日の記事",
            rank_section: |level| format!("{} ランク記事", level),
            rank_count: |level, count| format!("{} ランク記事： {} 件", level, count),
        },
        Language::En => Labels {
            date_format: "%Y-%m-%d",
            heading: "Today's Articles",
            rank_section: |level| format!("{} Rank Articles", level),
            rank_count: |level, count| format!("{} rank: {} articles", level, count),
        },
    }
}

/// Page title for the published digest.
pub fn page_title(report: &DailyReport, language: Language) -> String {
    report.report_date.format(labels(language).date_format).to_string()
}

fn article_section(out: &mut String, article: &AnalyzedArticle) {
    let _ = writeln!(out, "### [{}]({})\n", article.title, article.url);
    let _ = write!(out, "**{}**", article.source);
    if let Some(published) = article.published_at {
        let _ = write!(out, " | {}", published.format("%Y-%m-%d %H:%M"));
    }
    out.push_str("\n\n");
    let _ = writeln!(out, "> {}\n", article.summary);
    if !article.tags.is_empty() {
        let _ = writeln!(out, "{}\n", code_tags(&article.tags));
    }
    out.push_str("---\n\n");
}

/// Render the markdown body that is transpiled into the published page.
///
/// Layout: a heading with per-rank counts, a divider, then one section per
/// non-empty rank with each article's linked title, source line, quoted
/// summary, and code-styled tags.
pub fn page_markdown(report: &DailyReport, language: Language) -> String {
    let labels = labels(language);
    let mut out = format!("# {}\n\n", labels.heading);
    for level in Importance::ALL {
        let _ = writeln!(out, "- {}", (labels.rank_count)(level, report.count(level)));
    }
    out.push_str("\n---\n\n");

    for level in Importance::ALL {
        let mut articles = report.articles_at(level).peekable();
        if articles.peek().is_none() {
            continue;
        }
        let _ = writeln!(out, "## {}\n", (labels.rank_section)(level));
        for article in articles {
            article_section(&mut out, article);
        }
    }
    out
}
