mod request;

pub use request::RequestFetcher;

use crate::error::ExtractError;
use async_trait::async_trait;

/// Source of raw page HTML. Deadlines are imposed by the caller.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &str, user_agent: &str) -> Result<String, ExtractError>;
}
