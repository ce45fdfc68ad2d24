//! HTTP board store client for native platforms.

use super::{
    check_acknowledgement, encode_batch, parse_board, BoardService, BoxFuture, ServiceError,
    ServiceResult,
};
use crate::board::BoardRows;
use crate::config::ClientConfig;
use crate::pending::PixelEdit;
use reqwest::Client;
use std::time::Duration;
use url::Url;

/// Request timeout for both reads and submissions.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Board store reached over HTTP.
///
/// Futures must be polled from within a tokio runtime.
pub struct HttpBoardService {
    client: Client,
    fetch_url: Url,
    submit_url: Url,
}

impl HttpBoardService {
    pub fn new(config: &ClientConfig) -> ServiceResult<Self> {
        let fetch_url = config
            .fetch_url()
            .map_err(|e| ServiceError::Config(e.to_string()))?;
        let submit_url = config
            .submit_url()
            .map_err(|e| ServiceError::Config(e.to_string()))?;
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| ServiceError::Network(format!("Failed to build client: {}", e)))?;
        Ok(Self {
            client,
            fetch_url,
            submit_url,
        })
    }

    /// URL used for full-board reads.
    pub fn fetch_url(&self) -> &Url {
        &self.fetch_url
    }
}

impl BoardService for HttpBoardService {
    fn fetch_board(&self) -> BoxFuture<'_, ServiceResult<BoardRows>> {
        Box::pin(async move {
            log::debug!("Fetching board from {}", self.fetch_url);
            let response = self
                .client
                .get(self.fetch_url.clone())
                .send()
                .await
                .map_err(|e| ServiceError::Network(e.to_string()))?;

            let status = response.status();
            if !status.is_success() {
                return Err(ServiceError::Status(status.as_u16()));
            }

            let body = response
                .text()
                .await
                .map_err(|e| ServiceError::Network(e.to_string()))?;
            parse_board(&body)
        })
    }

    fn submit_edits(&self, edits: &[PixelEdit]) -> BoxFuture<'_, ServiceResult<()>> {
        let payload = encode_batch(edits);
        let count = edits.len();
        Box::pin(async move {
            let payload = payload?;
            log::debug!("Submitting {} edits to {}", count, self.submit_url);

            // Plain text body, as spreadsheet script endpoints expect.
            let response = self
                .client
                .post(self.submit_url.clone())
                .header(reqwest::header::CONTENT_TYPE, "text/plain;charset=utf-8")
                .body(payload)
                .send()
                .await
                .map_err(|e| ServiceError::Network(e.to_string()))?;

            let status = response.status();
            let body = response
                .text()
                .await
                .map_err(|e| ServiceError::Network(e.to_string()))?;
            check_acknowledgement(status.is_success(), status.as_u16(), &body)
        })
    }
}
