//! Publishing to Notion.
//!
//! - [`page`]: maps transpiled blocks to the page-creation request body
//! - [`client`]: REST calls (create page, append children, connectivity check)

pub mod client;
pub mod page;

pub use client::{DEFAULT_API_BASE, NotionClient, NotionSettings};
pub use page::build_page_request;
