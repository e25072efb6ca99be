use crate::domain::ports::{BrowsingContext, PageRenderer, RenderedPage};
use crate::utils::error::{Result, ScoutError};
use async_trait::async_trait;
use once_cell::sync::Lazy;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use reqwest::Client;
use scraper::{Html, Selector};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use url::Url;

const E: &str = "static selector is valid";

static BODY: Lazy<Selector> = Lazy::new(|| Selector::parse("body").expect(E));
static TITLE: Lazy<Selector> = Lazy::new(|| Selector::parse("title").expect(E));
static LINK: Lazy<Selector> = Lazy::new(|| Selector::parse("a[href]").expect(E));

const HIDDEN_ELEMENTS: [&str; 5] = ["script", "style", "noscript", "template", "svg"];

/// 以 HTTP 取得頁面並以 `scraper` 萃取可見文字的渲染器。
///
/// 每個瀏覽工作階段都建立自己的 `reqwest::Client`，cookie 與連線池不會跨製造商共用。
pub struct HttpPageRenderer {
    user_agent: String,
    next_context_id: AtomicU64,
}

impl HttpPageRenderer {
    pub fn new(user_agent: impl Into<String>) -> Self {
        Self {
            user_agent: user_agent.into(),
            next_context_id: AtomicU64::new(1),
        }
    }
}

#[async_trait]
impl PageRenderer for HttpPageRenderer {
    async fn open_context(&self) -> Result<Box<dyn BrowsingContext>> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&self.user_agent).map_err(|e| ScoutError::ConfigError {
                message: format!("Invalid user agent: {}", e),
            })?,
        );

        let client = Client::builder()
            .default_headers(headers)
            .cookie_store(true)
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()?;

        let id = self.next_context_id.fetch_add(1, Ordering::Relaxed);
        tracing::debug!("🌐 Opened browsing context #{}", id);

        Ok(Box::new(HttpBrowsingContext {
            id,
            client: Some(client),
        }))
    }
}

pub struct HttpBrowsingContext {
    id: u64,
    client: Option<Client>,
}

impl HttpBrowsingContext {
    async fn fetch(client: &Client, url: &Url) -> Result<(Url, String)> {
        let response = client.get(url.clone()).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ScoutError::RenderError {
                url: url.to_string(),
                message: format!("HTTP status {}", status),
            });
        }

        let final_url = response.url().clone();
        let body = response.text().await?;
        Ok((final_url, body))
    }
}

#[async_trait]
impl BrowsingContext for HttpBrowsingContext {
    async fn navigate(&mut self, url: &Url, timeout: Duration) -> Result<RenderedPage> {
        let client = self.client.as_ref().ok_or_else(|| ScoutError::RenderError {
            url: url.to_string(),
            message: "browsing context already closed".to_string(),
        })?;

        tracing::debug!("🌐 Context #{} navigating to {}", self.id, url);

        let (final_url, body) = match tokio::time::timeout(timeout, Self::fetch(client, url)).await
        {
            Ok(Ok(fetched)) => fetched,
            Ok(Err(ScoutError::ApiError(e))) => {
                return Err(ScoutError::RenderError {
                    url: url.to_string(),
                    message: e.to_string(),
                })
            }
            Ok(Err(e)) => return Err(e),
            Err(_) => {
                return Err(ScoutError::RenderError {
                    url: url.to_string(),
                    message: format!("navigation timed out after {:?}", timeout),
                })
            }
        };

        Ok(render_html(&final_url, &body))
    }

    async fn close(self: Box<Self>) {
        let HttpBrowsingContext { id, client } = *self;
        drop(client);
        tracing::debug!("🌐 Closed browsing context #{}", id);
    }
}

/// 把 HTML 縮減為標題、可見文字與絕對連結
pub fn render_html(base: &Url, html: &str) -> RenderedPage {
    let document = Html::parse_document(html);

    let title = document
        .select(&TITLE)
        .next()
        .map(|t| collapse_whitespace(&t.text().collect::<String>()))
        .filter(|t| !t.is_empty());

    let mut chunks = Vec::new();
    if let Some(body) = document.select(&BODY).next() {
        for node in body.descendants() {
            let Some(text) = node.value().as_text() else {
                continue;
            };
            let hidden = node
                .parent()
                .and_then(|parent| parent.value().as_element().map(|el| el.name().to_string()))
                .is_some_and(|name| HIDDEN_ELEMENTS.contains(&name.as_str()));
            if hidden {
                continue;
            }
            let chunk = collapse_whitespace(text);
            if !chunk.is_empty() {
                chunks.push(chunk);
            }
        }
    }

    let mut links: Vec<String> = Vec::new();
    for anchor in document.select(&LINK) {
        let Some(href) = anchor.value().attr("href") else {
            continue;
        };
        if let Ok(resolved) = base.join(href) {
            if matches!(resolved.scheme(), "http" | "https") {
                let resolved = resolved.to_string();
                if !links.contains(&resolved) {
                    links.push(resolved);
                }
            }
        }
    }

    RenderedPage {
        url: base.to_string(),
        title,
        text: chunks.join("\n"),
        links,
    }
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
