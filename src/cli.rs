//! Command-line interface definitions for Tech News Digest.
//!
//! This module defines the CLI arguments and options using the `clap` crate.
//! Credentials and endpoints can be provided via flags or environment variables.

use crate::notion::DEFAULT_API_BASE;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Command-line arguments for Tech News Digest.
///
/// Without a subcommand the full pipeline runs, as with `run`.
///
/// # Examples
///
/// ```sh
/// # Collect, analyze, and publish with credentials from the environment
/// tech_news_digest
///
/// # Write the report files only
/// tech_news_digest run --no-notion -o ./reports
///
/// # Show the Notion request a markdown file would produce
/// tech_news_digest transpile report.md
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Log level used when RUST_LOG is unset
    #[arg(long, env = "LOG_LEVEL", default_value = "info", global = true)]
    pub log_level: String,

    /// Directory for the daily rotating log files
    #[arg(long, env = "LOG_DIR", default_value = "logs", global = true)]
    pub log_dir: PathBuf,

    #[command(subcommand)]
    pub command: Option<Command>,

    #[command(flatten)]
    pub run: RunArgs,
}

impl Cli {
    /// The subcommand to execute; a bare invocation means `run`.
    pub fn into_command(self) -> Command {
        self.command.unwrap_or(Command::Run(self.run))
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Collect, analyze, and publish today's digest
    Run(RunArgs),
    /// Transpile a markdown file and print the page request JSON (or the blocks)
    Transpile(TranspileArgs),
    /// Verify the Notion token
    CheckNotion(NotionArgs),
}

#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    /// Path to the sources YAML file
    #[arg(short, long, env = "DIGEST_CONFIG", default_value = "config/sources.yaml")]
    pub config: String,

    /// Output directory for the report files
    #[arg(short, long, env = "OUTPUT_DIR", default_value = "output")]
    pub output_dir: PathBuf,

    /// Don't save report files
    #[arg(long)]
    pub no_file: bool,

    /// Don't publish to Notion
    #[arg(long)]
    pub no_notion: bool,

    #[command(flatten)]
    pub llm: LlmArgs,

    #[command(flatten)]
    pub notion: NotionArgs,
}

#[derive(Args, Debug, Clone)]
pub struct LlmArgs {
    /// API key for the OpenAI-compatible endpoint
    #[arg(long, env = "LLM_API_KEY", hide_env_values = true)]
    pub llm_api_key: Option<String>,

    /// Base URL of the OpenAI-compatible endpoint
    #[arg(long, env = "LLM_API_BASE", default_value = "https://api.openai.com/v1")]
    pub llm_api_base: String,

    /// Model name sent with each request
    #[arg(long, env = "LLM_MODEL", default_value = "gpt-4o-mini")]
    pub llm_model: String,
}

#[derive(Args, Debug, Clone)]
pub struct NotionArgs {
    /// Notion integration token
    #[arg(long, env = "NOTION_API_KEY", hide_env_values = true)]
    pub notion_api_key: Option<String>,

    /// Page that digest pages are created under
    #[arg(long, env = "NOTION_PARENT_PAGE_ID")]
    pub notion_parent_page_id: Option<String>,

    /// Notion API base URL
    #[arg(long, env = "NOTION_API_BASE", default_value = DEFAULT_API_BASE)]
    pub notion_api_base: String,
}

#[derive(Args, Debug, Clone)]
pub struct TranspileArgs {
    /// Markdown file to transpile
    pub file: PathBuf,

    /// Page title; defaults to the file stem
    #[arg(short, long)]
    pub title: Option<String>,

    /// Parent page id written into the request
    #[arg(long, env = "NOTION_PARENT_PAGE_ID", default_value = "PARENT_PAGE_ID")]
    pub parent_page_id: String,

    /// Print the intermediate block list instead of the page request
    #[arg(long)]
    pub blocks: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bare_invocation_runs_pipeline() {
        let cli = Cli::parse_from(["tech_news_digest", "--no-notion", "-o", "/tmp/reports"]);
        match cli.into_command() {
            Command::Run(args) => {
                assert!(args.no_notion);
                assert!(!args.no_file);
                assert_eq!(args.output_dir, PathBuf::from("/tmp/reports"));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_run_subcommand_flags() {
        let cli = Cli::parse_from([
            "tech_news_digest",
            "run",
            "--no-file",
            "--config",
            "custom.yaml",
            "--llm-model",
            "local-model",
        ]);
        match cli.into_command() {
            Command::Run(args) => {
                assert!(args.no_file);
                assert_eq!(args.config, "custom.yaml");
                assert_eq!(args.llm.llm_model, "local-model");
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_transpile_subcommand() {
        let cli = Cli::parse_from([
            "tech_news_digest",
            "--log-level",
            "debug",
            "transpile",
            "report.md",
            "--title",
            "Today",
        ]);
        assert_eq!(cli.log_level, "debug");
        assert_eq!(cli.log_dir, PathBuf::from("logs"));
        match cli.into_command() {
            Command::Transpile(args) => {
                assert_eq!(args.file, PathBuf::from("report.md"));
                assert_eq!(args.title.as_deref(), Some("Today"));
                assert!(!args.blocks);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_check_notion_subcommand() {
        let cli = Cli::parse_from([
            "tech_news_digest",
            "check-notion",
            "--notion-api-base",
            "http://localhost:8080",
        ]);
        match cli.into_command() {
            Command::CheckNotion(args) => assert_eq!(args.notion_api_base, "http://localhost:8080"),
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_transpile_blocks_and_log_dir() {
        let cli = Cli::parse_from([
            "tech_news_digest",
            "transpile",
            "report.md",
            "--blocks",
            "--log-dir",
            "/var/log/digest",
        ]);
        assert_eq!(cli.log_dir, PathBuf::from("/var/log/digest"));
        match cli.into_command() {
            Command::Transpile(args) => assert!(args.blocks),
            other => panic!("unexpected command: {:?}", other),
        }
    }
}
