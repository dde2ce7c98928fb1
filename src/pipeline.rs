//! End-to-end run: collect, analyze, report, publish.

use crate::analyst::analyze_batch;
use crate::api::AskAsync;
use crate::config::Config;
use crate::models::{DailyReport, Importance};
use crate::notion::NotionClient;
use crate::outputs;
use crate::report::{generate_report, report_date_at};
use crate::scrapers::collect_all;
use chrono::Utc;
use reqwest::Client;
use std::error::Error;
use std::path::PathBuf;
use std::time::Instant;
use tracing::{error, info, instrument, warn};

/// Everything a run needs, assembled once in `main`.
pub struct Context<A> {
    pub config: Config,
    /// Client used by the scrapers.
    pub http: Client,
    pub llm: A,
    /// Where report files go; `None` skips them.
    pub output_dir: Option<PathBuf>,
    /// Where the page goes; `None` skips Notion.
    pub notion: Option<NotionClient>,
}

/// Run every stage once and return the report.
///
/// Fails when no article is collected or none survives analysis. Publishing
/// failures are logged and do not fail the run.
#[instrument(level = "info", skip_all, fields(sources = ctx.config.sources.len()))]
pub async fn run<A: AskAsync>(ctx: &Context<A>) -> Result<DailyReport, Box<dyn Error>> {
    let start_time = Instant::now();

    info!("Step 1/3: collecting articles");
    let raw = collect_all(&ctx.http, &ctx.config.sources, &ctx.config.scraping, &ctx.config.retry).await;
    if raw.is_empty() {
        warn!("No articles collected; aborting");
        return Err("no articles collected".into());
    }
    info!(count = raw.len(), "Collected articles");

    info!("Step 2/3: analyzing articles");
    let analyzed = analyze_batch(
        &ctx.llm,
        &raw,
        ctx.config.analysis.max_concurrent,
        ctx.config.report.language,
    )
    .await;
    if analyzed.is_empty() {
        warn!("No articles analyzed; aborting");
        return Err("no articles analyzed".into());
    }

    info!("Step 3/3: generating and publishing report");
    let report_date = report_date_at(Utc::now(), ctx.config.report.timezone);
    let report = generate_report(analyzed, ctx.config.report.top_n, report_date);
    publish(ctx, &report).await;

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        secs = elapsed.as_secs(),
        millis = elapsed.subsec_millis(),
        total = report.total_articles,
        s = report.count(Importance::S),
        "Pipeline complete"
    );
    Ok(report)
}

async fn publish<A>(ctx: &Context<A>, report: &DailyReport) {
    match &ctx.output_dir {
        Some(dir) => match outputs::save_all(report, dir).await {
            Ok(path) => info!(path = %path.display(), "Saved report files"),
            Err(e) => error!(error = %e, "Failed to save report files"),
        },
        None => info!("File output disabled"),
    }

    match &ctx.notion {
        Some(notion) => match notion.publish_report(report, ctx.config.report.language).await {
            Some(url) => info!(%url, "Published to Notion"),
            None => warn!("Notion publishing produced no page"),
        },
        None => info!("Notion publishing disabled"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::parse_config;
    use crate::scrapers::build_client;

    struct NeverCalled;

    impl AskAsync for NeverCalled {
        async fn ask(&self, _text: &str) -> Result<String, Box<dyn Error>> {
            panic!("no article should reach analysis");
        }
    }

    #[tokio::test]
    async fn test_run_aborts_when_nothing_is_collected() {
        let config = parse_config(
            "retry:\n  max_retries: 0\nsources:\n  - name: Down\n    url: http://127.0.0.1:9/feed\n    type: rss\n",
        )
        .unwrap();
        let ctx = Context {
            http: build_client(&config.scraping).unwrap(),
            config,
            llm: NeverCalled,
            output_dir: None,
            notion: None,
        };

        let err = run(&ctx).await.unwrap_err();
        assert_eq!(err.to_string(), "no articles collected");
    }
}
