use crate::domain::model::SearchQuery;
use crate::utils::error::Result;
use async_trait::async_trait;

/// 一次供應商呼叫的結果。失敗也是資料，不會以 `Err` 回傳
#[derive(Debug, Clone, PartialEq)]
pub struct SearchResponse {
    /// 傳輸層失敗時沒有 HTTP 狀態碼
    pub http_status: Option<u16>,
    /// 尚未解碼的原始 offer JSON
    pub offers: Vec<serde_json::Value>,
    pub error: Option<String>,
}

impl SearchResponse {
    pub fn success(http_status: u16, offers: Vec<serde_json::Value>) -> Self {
        Self {
            http_status: Some(http_status),
            offers,
            error: None,
        }
    }

    pub fn failure(http_status: Option<u16>, detail: impl Into<String>) -> Self {
        Self {
            http_status,
            offers: Vec::new(),
            error: Some(detail.into()),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

#[async_trait]
pub trait SearchProvider: Send + Sync {
    async fn search(&self, query: &SearchQuery) -> SearchResponse;
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, text: &str) -> Result<()>;
}

#[async_trait]
impl<T: Notifier + ?Sized> Notifier for Box<T> {
    async fn send(&self, text: &str) -> Result<()> {
        (**self).send(text).await
    }
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    type Extracted: Send;
    type Transformed: Send;

    async fn extract(&self) -> Result<Self::Extracted>;
    async fn transform(&self, data: Self::Extracted) -> Result<Self::Transformed>;
    async fn load(&self, result: Self::Transformed) -> Result<String>;
}
