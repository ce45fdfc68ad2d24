//! In-process board store.

use super::{check_acknowledgement, BoardService, BoxFuture, ServiceError, ServiceResult};
use crate::board::{Board, BoardRows};
use crate::color::ColorCode;
use crate::pending::PixelEdit;
use std::sync::RwLock;

/// In-memory board store for testing and offline use.
///
/// Applies submitted edits last-write-wins and serves the board through the
/// same RLE encoding a remote store uses. Failures can be injected to
/// exercise the client's retry paths.
pub struct MemoryBoardService {
    board: RwLock<Board>,
    offline: RwLock<bool>,
    ack_body: RwLock<String>,
    submissions: RwLock<Vec<Vec<PixelEdit>>>,
}

impl Default for MemoryBoardService {
    fn default() -> Self {
        Self::new(Board::filled(ColorCode::B))
    }
}

impl MemoryBoardService {
    pub fn new(board: Board) -> Self {
        Self {
            board: RwLock::new(board),
            offline: RwLock::new(false),
            ack_body: RwLock::new(super::ACK_BODY.to_string()),
            submissions: RwLock::new(Vec::new()),
        }
    }

    /// Make every request fail with a network error.
    pub fn set_offline(&self, offline: bool) {
        if let Ok(mut flag) = self.offline.write() {
            *flag = offline;
        }
    }

    /// Body returned for accepted submissions.
    pub fn set_ack_body(&self, body: &str) {
        if let Ok(mut ack) = self.ack_body.write() {
            *ack = body.to_string();
        }
    }

    /// Copy of the stored board.
    pub fn board(&self) -> Board {
        self.board.read().map(|b| b.clone()).unwrap_or_default()
    }

    /// Batches received so far, in order.
    pub fn submissions(&self) -> Vec<Vec<PixelEdit>> {
        self.submissions.read().map(|s| s.clone()).unwrap_or_default()
    }

    /// Apply edits directly, as another client would.
    pub fn apply_remote(&self, edits: &[PixelEdit]) {
        if let Ok(mut board) = self.board.write() {
            board.apply_edits(edits);
        }
    }

    fn check_online(&self) -> ServiceResult<()> {
        let offline = self
            .offline
            .read()
            .map_err(|e| ServiceError::Network(format!("Lock error: {}", e)))?;
        if *offline {
            return Err(ServiceError::Network("Store unreachable".to_string()));
        }
        Ok(())
    }
}

impl BoardService for MemoryBoardService {
    fn fetch_board(&self) -> BoxFuture<'_, ServiceResult<BoardRows>> {
        Box::pin(async move {
            self.check_online()?;
            let board = self
                .board
                .read()
                .map_err(|e| ServiceError::Network(format!("Lock error: {}", e)))?;
            Ok(board.encode_rows())
        })
    }

    fn submit_edits(&self, edits: &[PixelEdit]) -> BoxFuture<'_, ServiceResult<()>> {
        let edits = edits.to_vec();
        Box::pin(async move {
            self.check_online()?;
            {
                let mut board = self
                    .board
                    .write()
                    .map_err(|e| ServiceError::Network(format!("Lock error: {}", e)))?;
                board.apply_edits(&edits);
            }
            if let Ok(mut submissions) = self.submissions.write() {
                submissions.push(edits);
            }
            let body = self
                .ack_body
                .read()
                .map(|b| b.clone())
                .map_err(|e| ServiceError::Network(format!("Lock error: {}", e)))?;
            check_acknowledgement(true, 200, &body)
        })
    }
}
