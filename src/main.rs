//! # Tech News Digest
//!
//! A pipeline that collects technology news from configured sources, ranks
//! and summarizes each article with an LLM, and publishes a daily digest as a
//! Notion page.
//!
//! ## Features
//!
//! - Collects from RSS/Atom feeds, HTML listings, and the Qiita API
//! - Analyzes articles through an OpenAI-compatible chat endpoint
//! - Transpiles the digest's markdown into typed Notion blocks
//! - Writes an archival markdown report and a JSON snapshot
//!
//! ## Usage
//!
//! ```sh
//! tech_news_digest run -c config/sources.yaml -o ./output
//! tech_news_digest transpile report.md
//! tech_news_digest transpile report.md --blocks
//! tech_news_digest check-notion
//! ```
//!
//! ## Architecture
//!
//! 1. **Collecting**: Fetch each enabled source, dedupe, drop stale articles
//! 2. **Analyzing**: Summarize, tag, and rank articles (bounded concurrency)
//! 3. **Reporting**: Keep the top articles by importance
//! 4. **Publishing**: Write report files and create the Notion page

use clap::Parser;
use reqwest::Client;
use serde_json::json;
use std::error::Error;
use std::path::Path;
use tracing::{debug, error, info, warn};

mod analyst;
mod api;
mod cli;
mod config;
mod logging;
mod models;
mod notion;
mod outputs;
mod pipeline;
mod report;
mod retry;
mod scrapers;
mod transpile;
mod utils;

use api::{ChatClient, LlmSettings, RetryAsk};
use cli::{Cli, Command, NotionArgs, RunArgs, TranspileArgs};
use notion::{NotionClient, NotionSettings, build_page_request};
use utils::ensure_writable_dir;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let args = Cli::parse();

    // --- Tracing init (console + daily file) ---
    let _log_guard = logging::init(&args.log_level, &args.log_dir)?;

    match args.into_command() {
        Command::Run(run) => run_pipeline(run).await,
        Command::Transpile(transpile) => print_transpiled(transpile).await,
        Command::CheckNotion(notion_args) => check_notion(notion_args).await,
    }
}

/// Notion settings when both the token and the parent page are configured.
fn notion_settings(args: &NotionArgs) -> Option<NotionSettings> {
    match (&args.notion_api_key, &args.notion_parent_page_id) {
        (Some(api_key), Some(parent_page_id)) if !api_key.is_empty() && !parent_page_id.is_empty() => {
            Some(NotionSettings {
                api_base: args.notion_api_base.clone(),
                api_key: api_key.clone(),
                parent_page_id: parent_page_id.clone(),
            })
        }
        _ => None,
    }
}

async fn run_pipeline(args: RunArgs) -> Result<(), Box<dyn Error>> {
    info!(version = env!("CARGO_PKG_VERSION"), "tech_news_digest starting up");
    debug!(config = %args.config, output_dir = %args.output_dir.display(), "Parsed CLI arguments");

    let config = config::load_config(&args.config).await?;

    // Early check: ensure the output dir is writable before spending LLM calls
    let output_dir = if args.no_file {
        None
    } else {
        let dir = args.output_dir.to_string_lossy().to_string();
        if let Err(e) = ensure_writable_dir(&dir).await {
            error!(
                path = %dir,
                error = %e,
                "Output directory is not writable (fix perms or choose a different path)"
            );
            return Err(e);
        }
        Some(args.output_dir.clone())
    };

    let api_key = args
        .llm
        .llm_api_key
        .clone()
        .filter(|k| !k.is_empty())
        .ok_or("LLM_API_KEY is not set")?;
    let llm_http = Client::builder()
        .timeout(std::time::Duration::from_secs(120))
        .build()?;
    let llm = RetryAsk::new(
        ChatClient::new(
            llm_http,
            LlmSettings {
                api_base: args.llm.llm_api_base.clone(),
                api_key,
                model: args.llm.llm_model.clone(),
                max_tokens: config.analysis.max_tokens,
                temperature: config.analysis.temperature,
            },
        ),
        config.retry.clone(),
    );

    let notion = if args.no_notion {
        None
    } else {
        match notion_settings(&args.notion) {
            Some(settings) => Some(NotionClient::new(Client::new(), settings)),
            None => {
                warn!("NOTION_API_KEY or NOTION_PARENT_PAGE_ID missing; skipping Notion");
                None
            }
        }
    };

    let ctx = pipeline::Context {
        http: scrapers::build_client(&config.scraping)?,
        config,
        llm,
        output_dir,
        notion,
    };

    let report = pipeline::run(&ctx).await?;
    info!(total_articles = report.total_articles, "Digest completed successfully");
    Ok(())
}

async fn print_transpiled(args: TranspileArgs) -> Result<(), Box<dyn Error>> {
    let markdown = tokio::fs::read_to_string(&args.file).await?;
    let title = args.title.clone().unwrap_or_else(|| {
        Path::new(&args.file)
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default()
    });

    let blocks = transpile::scan(&markdown);
    for (index, block) in blocks.iter().enumerate() {
        debug!(index, text = %utils::truncate_for_log(&block.plain_text(), 80), "Block");
    }
    if args.blocks {
        info!(blocks = blocks.len(), "Transpiled document");
        println!("{}", serde_json::to_string_pretty(&blocks)?);
        return Ok(());
    }
    let request = build_page_request(&args.parent_page_id, &title, &blocks);
    info!(blocks = blocks.len(), overflow = request.overflow.len(), "Transpiled document");

    let output = json!({
        "create": request.body,
        "append": request.overflow,
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

async fn check_notion(args: NotionArgs) -> Result<(), Box<dyn Error>> {
    let api_key = args
        .notion_api_key
        .clone()
        .filter(|k| !k.is_empty())
        .ok_or("NOTION_API_KEY is not set")?;
    let client = NotionClient::new(
        Client::new(),
        NotionSettings {
            api_base: args.notion_api_base.clone(),
            api_key,
            parent_page_id: args.notion_parent_page_id.clone().unwrap_or_default(),
        },
    );
    let bot = client.check_connection().await?;
    println!("Connected to Notion as {}", bot);
    Ok(())
}
