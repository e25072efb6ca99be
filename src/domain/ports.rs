use crate::utils::error::Result;
use async_trait::async_trait;
use std::time::Duration;
use url::Url;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
    /// 檔案在此儲存體中的完整位置，用於日誌
    fn location(&self, path: &str) -> String;
}

/// 已渲染頁面的內容快照
#[derive(Debug, Clone, Default)]
pub struct RenderedPage {
    pub url: String,
    pub title: Option<String>,
    pub text: String,
    pub links: Vec<String>,
}

/// 一個獨立的瀏覽工作階段，不與其他製造商共用
#[async_trait]
pub trait BrowsingContext: Send {
    async fn navigate(&mut self, url: &Url, timeout: Duration) -> Result<RenderedPage>;

    /// 釋放工作階段；每條離開路徑都必須呼叫
    async fn close(self: Box<Self>);
}

#[async_trait]
pub trait PageRenderer: Send + Sync {
    async fn open_context(&self) -> Result<Box<dyn BrowsingContext>>;
}

#[async_trait]
pub trait ExtractionOracle: Send + Sync {
    /// 送出提示詞並取回模型的原始文字回覆
    async fn complete(&self, prompt: &str, max_tokens: u32) -> Result<String>;
}
