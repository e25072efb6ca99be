use crate::domain::model::RawExtractedItem;
use crate::domain::ports::{ExtractionOracle, RenderedPage};
use crate::utils::error::{Result, ScoutError};
use serde::Deserialize;

const MAX_PROMPT_LINKS: usize = 200;

#[derive(Debug, Deserialize)]
struct OracleReply {
    components: Vec<RawExtractedItem>,
}

/// 模型回覆的唯一解析入口：整段文字必須是含 `components` 陣列的 JSON 物件
pub fn parse_oracle_reply(reply: &str) -> Result<Vec<RawExtractedItem>> {
    serde_json::from_str::<OracleReply>(reply.trim())
        .map(|parsed| parsed.components)
        .map_err(|e| ScoutError::ExtractionError {
            message: format!("oracle reply is not a valid components document: {}", e),
        })
}

pub fn build_prompt(page: &RenderedPage, type_names: &[String], max_page_chars: usize) -> String {
    let vocabulary = type_names
        .iter()
        .map(|name| format!("- {}", name))
        .collect::<Vec<_>>()
        .join("\n");

    let page_text: String = page.text.chars().take(max_page_chars).collect();
    let links = page
        .links
        .iter()
        .take(MAX_PROMPT_LINKS)
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        r#"You are analysing the website of an HVAC manufacturer.
Identify every HVAC product listed on the page below.

Only report products whose type is one of these component types:
{vocabulary}

For each product return: name, modelNumber, type (exactly one of the component types above),
specifications (object with optional string fields dimensions, weight, capacity,
powerRequirements, operatingConditions), features (array of strings), description, and url
(absolute URL of the product page).

Respond with a single JSON object and nothing else, in this shape:
{{"components": [{{"name": "", "modelNumber": "", "type": "", "specifications": {{}}, "features": [], "description": "", "url": ""}}]}}
If there are no products, respond with {{"components": []}}.

Page URL: {url}
Page title: {title}

Page content:
{page_text}

Links on the page:
{links}
"#,
        vocabulary = vocabulary,
        url = page.url,
        title = page.title.as_deref().unwrap_or(""),
        page_text = page_text,
        links = links,
    )
}

/// 一個製造商只送出一次請求、只解析一次
pub struct ExtractionAdapter<O: ExtractionOracle> {
    oracle: O,
    max_tokens: u32,
    max_page_chars: usize,
}

impl<O: ExtractionOracle> ExtractionAdapter<O> {
    pub fn new(oracle: O, max_tokens: u32, max_page_chars: usize) -> Self {
        Self {
            oracle,
            max_tokens,
            max_page_chars,
        }
    }

    pub async fn extract(
        &self,
        page: &RenderedPage,
        type_names: &[String],
    ) -> Result<Vec<RawExtractedItem>> {
        let prompt = build_prompt(page, type_names, self.max_page_chars);
        let reply = self
            .oracle
            .complete(&prompt, self.max_tokens)
            .await
            .map_err(|e| match e {
                ScoutError::ExtractionError { .. } => e,
                other => ScoutError::ExtractionError {
                    message: other.to_string(),
                },
            })?;

        let items = parse_oracle_reply(&reply)?;
        tracing::debug!("🤖 Oracle proposed {} candidate components", items.len());
        Ok(items)
    }
}
