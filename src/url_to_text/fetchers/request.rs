use super::PageFetcher;
use crate::error::ExtractError;
use async_trait::async_trait;
use log::debug;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, USER_AGENT};
use reqwest::Client;
use std::time::Duration;

/// Plain HTTP fetcher built on a shared reqwest client
pub struct RequestFetcher {
    client: Client,
}

impl RequestFetcher {
    pub fn new(timeout: Option<Duration>) -> Result<Self, ExtractError> {
        let timeout = timeout.unwrap_or(Duration::from_secs(30));
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self { client })
    }
}

#[async_trait]
impl PageFetcher for RequestFetcher {
    async fn fetch(&self, url: &str, user_agent: &str) -> Result<String, ExtractError> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_str(user_agent)?);
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("text/html,application/xhtml+xml;q=0.9,*/*;q=0.8"),
        );

        let response = self.client.get(url).headers(headers).send().await?;
        let status = response.status();
        debug!("Fetched {} with status {}", url, status);

        if !status.is_success() {
            return Err(ExtractError::Fetch {
                status: status.as_u16(),
                status_text: status.canonical_reason().unwrap_or("Unknown").to_string(),
            });
        }

        Ok(response.text().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Server;

    #[tokio::test]
    async fn test_fetch_sends_user_agent() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/recipe")
            .match_header("user-agent", "test-agent/1.0")
            .with_status(200)
            .with_header("content-type", "text/html")
            .with_body("<html><body><h1>Soup</h1></body></html>")
            .create_async()
            .await;

        let fetcher = RequestFetcher::new(None).unwrap();
        let html = fetcher
            .fetch(&format!("{}/recipe", server.url()), "test-agent/1.0")
            .await
            .unwrap();

        assert!(html.contains("<h1>Soup</h1>"));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_non_success_status_is_fetch_error() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/missing")
            .with_status(404)
            .create_async()
            .await;

        let fetcher = RequestFetcher::new(None).unwrap();
        let err = fetcher
            .fetch(&format!("{}/missing", server.url()), "test-agent/1.0")
            .await
            .unwrap_err();

        match err {
            ExtractError::Fetch {
                status,
                status_text,
            } => {
                assert_eq!(status, 404);
                assert_eq!(status_text, "Not Found");
            }
            other => panic!("expected fetch error, got {other:?}"),
        }
    }
}
