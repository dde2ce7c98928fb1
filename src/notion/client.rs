use super::page::{MAX_CHILDREN_PER_REQUEST, build_page_request};
use crate::config::Language;
use crate::models::DailyReport;
use crate::report::{page_markdown, page_title};
use crate::transpile::scan;
use crate::utils::truncate_for_log;
use reqwest::{Client, RequestBuilder};
use serde_json::{Value, json};
use std::error::Error;
use std::fmt;
use std::time::Instant;
use tracing::{error, info, instrument, warn};

pub const DEFAULT_API_BASE: &str = "https://api.notion.com";
pub const NOTION_VERSION: &str = "2022-06-28";

#[derive(Clone)]
pub struct NotionSettings {
    pub api_base: String,
    pub api_key: String,
    /// Page the digest pages are created under.
    pub parent_page_id: String,
}

impl fmt::Debug for NotionSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NotionSettings")
            .field("api_base", &self.api_base)
            .field("parent_page_id", &self.parent_page_id)
            .finish_non_exhaustive()
    }
}

/// Thin REST client for the endpoints the digest needs.
#[derive(Debug, Clone)]
pub struct NotionClient {
    http: Client,
    settings: NotionSettings,
}

/// URL of a created page: the response's `url`, else one derived from `id`.
pub fn page_url(response: &Value) -> Option<String> {
    if let Some(url) = response["url"].as_str().filter(|u| !u.is_empty()) {
        return Some(url.to_string());
    }
    response["id"]
        .as_str()
        .filter(|id| !id.is_empty())
        .map(|id| format!("https://www.notion.so/{}", id.replace('-', "")))
}

impl NotionClient {
    pub fn new(http: Client, settings: NotionSettings) -> Self {
        Self { http, settings }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/v1/{}", self.settings.api_base.trim_end_matches('/'), path)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .bearer_auth(&self.settings.api_key)
            .header("Notion-Version", NOTION_VERSION)
    }

    /// Send a request and return its JSON body, turning API errors into `Err`
    /// carrying the response text.
    async fn send(&self, request: RequestBuilder) -> Result<Value, Box<dyn Error>> {
        let response = self.authorized(request).send().await?;
        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(format!("Notion API returned {}: {}", status, truncate_for_log(&detail, 500)).into());
        }
        Ok(response.json().await?)
    }

    /// Verify the token by fetching the integration's bot user. Returns its name.
    #[instrument(level = "info", skip_all)]
    pub async fn check_connection(&self) -> Result<String, Box<dyn Error>> {
        let me = self.send(self.http.get(self.endpoint("users/me"))).await?;
        let name = me["name"].as_str().unwrap_or("unnamed integration").to_string();
        info!(bot = %name, "Notion connection OK");
        Ok(name)
    }

    /// Append `children` to an existing block, [`MAX_CHILDREN_PER_REQUEST`] at a time.
    #[instrument(level = "info", skip_all, fields(block_id = %block_id, count = children.len()))]
    pub async fn append_children(&self, block_id: &str, children: &[Value]) -> Result<(), Box<dyn Error>> {
        let mut appended = 0;
        for (batch, chunk) in children.chunks(MAX_CHILDREN_PER_REQUEST).enumerate() {
            let url = self.endpoint(&format!("blocks/{}/children", block_id));
            if let Err(e) = self.send(self.http.patch(url).json(&json!({ "children": chunk }))).await {
                return Err(format!("{} of {} blocks appended: {}", appended, children.len(), e).into());
            }
            appended += chunk.len();
            info!(batch, appended = chunk.len(), "Appended blocks");
        }
        Ok(())
    }

    /// Create a page titled `title` from a markdown body. Returns the page URL.
    ///
    /// Once the page exists its URL is returned even if appending the
    /// overflow blocks fails; the page is then incomplete and a warning is
    /// logged with the URL.
    #[instrument(level = "info", skip_all, fields(title = %title))]
    pub async fn create_page(&self, title: &str, markdown: &str) -> Result<String, Box<dyn Error>> {
        let t0 = Instant::now();
        let blocks = scan(markdown);
        let request = build_page_request(&self.settings.parent_page_id, title, &blocks);
        info!(blocks = blocks.len(), overflow = request.overflow.len(), "Creating page");

        let created = self.send(self.http.post(self.endpoint("pages")).json(&request.body)).await?;
        let url = page_url(&created).ok_or("Notion response carried neither url nor id")?;

        if !request.overflow.is_empty() {
            match created["id"].as_str() {
                Some(page_id) => {
                    if let Err(e) = self.append_children(page_id, &request.overflow).await {
                        warn!(
                            %url,
                            page_id = %page_id,
                            error = %e,
                            "Page created but incomplete; remaining blocks were not appended"
                        );
                    }
                }
                None => warn!(
                    %url,
                    pending = request.overflow.len(),
                    "Page created without an id; overflow blocks were not appended"
                ),
            }
        }

        info!(elapsed_ms = t0.elapsed().as_millis() as u64, %url, "Page created");
        Ok(url)
    }

    /// Publish a report as a page. Failures are logged and yield `None`.
    #[instrument(level = "info", skip_all, fields(articles = report.total_articles))]
    pub async fn publish_report(&self, report: &DailyReport, language: Language) -> Option<String> {
        if report.articles.is_empty() {
            warn!("Report has no articles; nothing to publish");
            return None;
        }
        let title = page_title(report, language);
        match self.create_page(&title, &page_markdown(report, language)).await {
            Ok(url) => Some(url),
            Err(e) => {
                error!(error = %e, "Failed to publish to Notion");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Local;
    use std::collections::BTreeMap;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};

    fn client(api_base: &str) -> NotionClient {
        NotionClient::new(
            Client::new(),
            NotionSettings {
                api_base: api_base.to_string(),
                api_key: "secret_token".to_string(),
                parent_page_id: "parent".to_string(),
            },
        )
    }

    #[test]
    fn test_page_url_prefers_url_field() {
        let response = json!({ "id": "abc-def", "url": "https://www.notion.so/Report-abcdef" });
        assert_eq!(page_url(&response).as_deref(), Some("https://www.notion.so/Report-abcdef"));
    }

    #[test]
    fn test_page_url_derived_from_id() {
        let response = json!({ "id": "1234-5678-90ab" });
        assert_eq!(page_url(&response).as_deref(), Some("https://www.notion.so/1234567890ab"));
        assert_eq!(page_url(&json!({})), None);
    }

    #[test]
    fn test_endpoint_joins_base() {
        assert_eq!(client("https://api.notion.com/").endpoint("pages"), "https://api.notion.com/v1/pages");
    }

    #[test]
    fn test_settings_debug_hides_key() {
        let rendered = format!("{:?}", client(DEFAULT_API_BASE));
        assert!(!rendered.contains("secret_token"));
    }

    #[tokio::test]
    async fn test_publish_failure_yields_none() {
        let report = DailyReport {
            report_date: Local::now().fixed_offset(),
            total_articles: 1,
            articles_by_importance: BTreeMap::new(),
            articles: vec![crate::models::AnalyzedArticle::from_raw(
                &crate::models::RawArticle::new("Zenn", "https://zenn.dev/a", "A"),
                "summary".to_string(),
                vec![],
                crate::models::Importance::A,
            )],
        };
        assert_eq!(client("http://127.0.0.1:9").publish_report(&report, Language::Ja).await, None);
    }

    /// Read one HTTP request and return its request line.
    async fn read_request(stream: &mut TcpStream) -> String {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 4096];
        loop {
            let n = stream.read(&mut chunk).await.unwrap();
            if n == 0 {
                break;
            }
            buf.extend_from_slice(&chunk[..n]);
            let text = String::from_utf8_lossy(&buf);
            if let Some(end) = text.find("\r\n\r\n") {
                let length = text[..end]
                    .lines()
                    .find_map(|line| {
                        line.to_ascii_lowercase()
                            .strip_prefix("content-length:")
                            .map(|v| v.trim().parse::<usize>().unwrap_or(0))
                    })
                    .unwrap_or(0);
                if buf.len() >= end + 4 + length {
                    break;
                }
            }
        }
        String::from_utf8_lossy(&buf).lines().next().unwrap_or_default().to_string()
    }

    /// Local server answering one request per connection with the scripted
    /// `(status, body)` pairs in order. Yields the request lines it saw.
    async fn scripted_server(
        responses: Vec<(u16, &'static str)>,
    ) -> (String, tokio::task::JoinHandle<Vec<String>>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        let handle = tokio::spawn(async move {
            let mut seen = Vec::new();
            for (status, body) in responses {
                let (mut stream, _) = listener.accept().await.unwrap();
                seen.push(read_request(&mut stream).await);
                let reply = format!(
                    "HTTP/1.1 {} Scripted\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    status,
                    body.len(),
                    body
                );
                stream.write_all(reply.as_bytes()).await.unwrap();
                let _ = stream.shutdown().await;
            }
            seen
        });
        (base, handle)
    }

    fn bullets(count: usize) -> String {
        (0..count).map(|i| format!("- item {}", i)).collect::<Vec<_>>().join("\n")
    }

    #[tokio::test]
    async fn test_create_page_appends_overflow_in_batches() {
        let (base, server) = scripted_server(vec![
            (200, r#"{"id":"abc-123","url":"https://www.notion.so/Digest-abc123"}"#),
            (200, "{}"),
            (200, "{}"),
        ])
        .await;

        let url = client(&base).create_page("Digest", &bullets(250)).await.unwrap();
        assert_eq!(url, "https://www.notion.so/Digest-abc123");

        let seen = server.await.unwrap();
        assert!(seen[0].starts_with("POST /v1/pages "));
        assert!(seen[1].starts_with("PATCH /v1/blocks/abc-123/children "));
        assert!(seen[2].starts_with("PATCH /v1/blocks/abc-123/children "));
    }

    #[tokio::test]
    async fn test_create_page_keeps_url_when_append_fails() {
        let (base, server) = scripted_server(vec![
            (200, r#"{"id":"abc-123","url":"https://www.notion.so/Digest-abc123"}"#),
            (500, r#"{"message":"internal error"}"#),
        ])
        .await;

        let url = client(&base).create_page("Digest", &bullets(150)).await.unwrap();
        assert_eq!(url, "https://www.notion.so/Digest-abc123");
        assert_eq!(server.await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_append_children_reports_progress_on_failure() {
        let (base, server) = scripted_server(vec![(200, "{}"), (500, "{}")]).await;
        let children: Vec<Value> = (0..150).map(|i| json!({ "n": i })).collect();

        let err = client(&base).append_children("abc-123", &children).await.unwrap_err();
        assert!(err.to_string().starts_with("100 of 150 blocks appended: Notion API returned 500"));
        assert_eq!(server.await.unwrap().len(), 2);
    }
}
