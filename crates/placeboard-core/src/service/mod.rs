//! Remote board store abstraction.
//!
//! The store is reachable through two operations: read the whole encoded
//! board, and submit a batch of pixel edits. A submission only counts as
//! accepted when the response body is exactly [`ACK_BODY`].

mod memory;

#[cfg(not(target_arch = "wasm32"))]
mod http;

#[cfg(target_arch = "wasm32")]
mod fetch;

pub use memory::MemoryBoardService;

#[cfg(not(target_arch = "wasm32"))]
pub use http::HttpBoardService;

#[cfg(target_arch = "wasm32")]
pub use fetch::FetchBoardService;

use crate::board::BoardRows;
use crate::pending::PixelEdit;
use std::future::Future;
use std::pin::Pin;
use thiserror::Error;

/// Body the store replies with when it accepted a batch.
pub const ACK_BODY: &str = "OK";

/// Board service errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ServiceError {
    #[error("Network error: {0}")]
    Network(String),
    #[error("Unexpected status: {0}")]
    Status(u16),
    #[error("Submission not acknowledged: {0:?}")]
    NotAcknowledged(String),
    #[error("Malformed response: {0}")]
    Malformed(String),
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type for board service operations.
pub type ServiceResult<T> = Result<T, ServiceError>;

/// Boxed future for async operations (compatible with WASM).
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + 'a>>;

/// Trait for board store backends.
///
/// Note: On native platforms, implementations must be Send + Sync.
/// On WASM, these bounds are relaxed since it's single-threaded.
#[cfg(not(target_arch = "wasm32"))]
pub trait BoardService: Send + Sync {
    /// Fetch the full encoded board, `rows[tile_y][tile_x]`.
    fn fetch_board(&self) -> BoxFuture<'_, ServiceResult<BoardRows>>;

    /// Submit a batch of edits. `Ok` only when the store acknowledged it.
    fn submit_edits(&self, edits: &[PixelEdit]) -> BoxFuture<'_, ServiceResult<()>>;
}

/// Trait for board store backends (WASM version without Send + Sync).
#[cfg(target_arch = "wasm32")]
pub trait BoardService {
    /// Fetch the full encoded board, `rows[tile_y][tile_x]`.
    fn fetch_board(&self) -> BoxFuture<'_, ServiceResult<BoardRows>>;

    /// Submit a batch of edits. `Ok` only when the store acknowledged it.
    fn submit_edits(&self, edits: &[PixelEdit]) -> BoxFuture<'_, ServiceResult<()>>;
}

/// Interpret a submit response.
///
/// Anything other than a successful status with the exact body `OK` is a
/// failure, including bodies that merely contain it.
pub fn check_acknowledgement(status_ok: bool, status: u16, body: &str) -> ServiceResult<()> {
    if !status_ok {
        return Err(ServiceError::Status(status));
    }
    if body != ACK_BODY {
        return Err(ServiceError::NotAcknowledged(body.to_string()));
    }
    Ok(())
}

/// Parse a full-board response body.
pub fn parse_board(body: &str) -> ServiceResult<BoardRows> {
    serde_json::from_str(body).map_err(|e| ServiceError::Malformed(e.to_string()))
}

/// Serialize an edit batch for the wire.
pub fn encode_batch(edits: &[PixelEdit]) -> ServiceResult<String> {
    serde_json::to_string(edits).map_err(|e| ServiceError::Malformed(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::PixelKey;
    use crate::color::ColorCode;

    #[test]
    fn test_acknowledgement_exact() {
        assert!(check_acknowledgement(true, 200, "OK").is_ok());
        assert_eq!(
            check_acknowledgement(true, 200, "OK\n"),
            Err(ServiceError::NotAcknowledged("OK\n".to_string()))
        );
        assert_eq!(
            check_acknowledgement(true, 200, "ok"),
            Err(ServiceError::NotAcknowledged("ok".to_string()))
        );
        assert_eq!(check_acknowledgement(false, 500, "OK"), Err(ServiceError::Status(500)));
    }

    #[test]
    fn test_parse_board() {
        let rows = parse_board(r#"[["100B100Z","AZ"],["C"]]"#).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0][1], "AZ");
        assert!(matches!(parse_board("<html>"), Err(ServiceError::Malformed(_))));
    }

    #[test]
    fn test_encode_batch() {
        let edits = vec![PixelEdit::new(PixelKey::new(1, 2).unwrap(), ColorCode::C)];
        assert_eq!(encode_batch(&edits).unwrap(), r#"[{"x":1,"y":2,"code":"C"}]"#);
    }
}
