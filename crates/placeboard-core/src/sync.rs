//! Board session: authoritative board, local surface and pending edits.
//!
//! Loading and submitting are split into phases so that the caller can keep
//! painting while a request is in flight:
//!
//! ```text
//! begin_load() ── fetch ──> apply_board(rows) | fail_load(err)
//! begin_submit() ── send ──> finish_submit(result) ── then reload
//! ```
//!
//! `load` and `submit` drive the phases end to end for callers that do not
//! need to interleave edits.

use crate::board::{Board, BoardRows, PixelKey};
use crate::color::ColorCode;
use crate::pending::{EditBatch, PaintOutcome, PendingEdits};
use crate::service::{BoardService, ServiceError, ServiceResult};
use crate::surface::Surface;
use std::fmt;
use thiserror::Error;

/// Load lifecycle of the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    /// Nothing loaded yet.
    Idle,
    /// A full-board fetch is outstanding.
    Loading,
    /// The board has been loaded at least once.
    Ready,
}

/// What pointer input does. Independent of sync.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    #[default]
    Browsing,
    Drawing,
}

impl Mode {
    pub fn toggled(self) -> Self {
        match self {
            Mode::Browsing => Mode::Drawing,
            Mode::Drawing => Mode::Browsing,
        }
    }
}

/// Recoverable sync failures. Retry by calling the operation again.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SyncError {
    #[error("Failed to load board: {0}")]
    Load(ServiceError),
    #[error("Failed to submit edits: {0}")]
    Submit(ServiceError),
}

/// Events produced by the session for the UI to pick up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncEvent {
    /// A board was decoded and rendered.
    Loaded { tiles: usize, failed_tiles: usize },
    /// A board fetch failed; the previous board is still shown.
    LoadFailed { message: String },
    /// The store accepted a batch.
    Submitted { batch: usize, cleared: usize },
    /// A batch was not accepted; the buffer is unchanged.
    SubmitFailed { message: String },
}

impl fmt::Display for SyncEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncEvent::Loaded { tiles, failed_tiles: 0 } => write!(f, "Loaded {} tiles", tiles),
            SyncEvent::Loaded { tiles, failed_tiles } => {
                write!(f, "Loaded {} tiles, {} unreadable", tiles, failed_tiles)
            }
            SyncEvent::LoadFailed { message } => write!(f, "Load failed: {}", message),
            SyncEvent::Submitted { batch, .. } => write!(f, "Submitted {} pixels", batch),
            SyncEvent::SubmitFailed { message } => write!(f, "Submit failed: {}", message),
        }
    }
}

/// One client's view of the shared board.
pub struct Session<S: Surface> {
    board: Board,
    surface: S,
    pending: PendingEdits,
    state: SyncState,
    mode: Mode,
    loaded: bool,
    in_flight: Option<EditBatch>,
    submit_failed: bool,
    last_error: Option<SyncError>,
    events: Vec<SyncEvent>,
}

impl<S: Surface> Session<S> {
    pub fn new(surface: S, capacity: usize) -> Self {
        Self {
            board: Board::empty(),
            surface,
            pending: PendingEdits::new(capacity),
            state: SyncState::Idle,
            mode: Mode::default(),
            loaded: false,
            in_flight: None,
            submit_failed: false,
            last_error: None,
            events: Vec::new(),
        }
    }

    // --- Loading ---

    /// Mark a full-board fetch as started.
    pub fn begin_load(&mut self) {
        self.state = SyncState::Loading;
    }

    /// Decode and render a fetched board, then paint the remaining pending
    /// edits over it. Returns the number of tiles that failed to decode.
    pub fn apply_board(&mut self, rows: &BoardRows) -> usize {
        let (board, errors) = Board::from_rows(rows);
        board.render(&mut self.surface);
        self.board = board;
        self.pending.reapply(&mut self.surface);

        self.loaded = true;
        self.state = SyncState::Ready;
        if matches!(self.last_error, Some(SyncError::Load(_))) {
            self.last_error = None;
        }

        log::info!(
            "Board loaded: {} tiles, {} failed, {} pending edits",
            self.board.loaded_tiles(),
            errors.len(),
            self.pending.size()
        );
        self.events.push(SyncEvent::Loaded {
            tiles: self.board.loaded_tiles(),
            failed_tiles: errors.len(),
        });
        errors.len()
    }

    /// Record a failed fetch. The previously rendered board stays in place.
    pub fn fail_load(&mut self, error: ServiceError) -> SyncError {
        log::error!("Board load failed: {}", error);
        self.state = if self.loaded {
            SyncState::Ready
        } else {
            SyncState::Idle
        };
        self.events.push(SyncEvent::LoadFailed {
            message: error.to_string(),
        });
        let error = SyncError::Load(error);
        self.last_error = Some(error.clone());
        error
    }

    /// Fetch, decode and render the full board.
    pub async fn load<B: BoardService + ?Sized>(&mut self, service: &B) -> Result<(), SyncError> {
        self.begin_load();
        match service.fetch_board().await {
            Ok(rows) => {
                self.apply_board(&rows);
                Ok(())
            }
            Err(e) => Err(self.fail_load(e)),
        }
    }

    // --- Editing ---

    /// Paint a pixel into the pending buffer.
    ///
    /// Painting is refused until a board has been loaded, since originals
    /// are read back from the rendered surface.
    pub fn paint(&mut self, key: PixelKey, code: ColorCode) -> PaintOutcome {
        if !self.loaded {
            return PaintOutcome::Rejected;
        }
        self.pending.paint(&mut self.surface, key, code)
    }

    /// Revert every pending pixel and empty the buffer.
    pub fn clear(&mut self) {
        self.pending.clear(&mut self.surface);
    }

    // --- Submitting ---

    /// Snapshot the buffer for submission.
    ///
    /// Returns `None` when there is nothing to send or a previous batch has
    /// not resolved yet.
    pub fn begin_submit(&mut self) -> Option<EditBatch> {
        if self.in_flight.is_some() {
            log::debug!("Submit ignored: a batch is already in flight");
            return None;
        }
        if self.pending.is_empty() {
            return None;
        }
        let batch = self.pending.snapshot();
        self.in_flight = Some(batch.clone());
        Some(batch)
    }

    /// Resolve the in-flight batch.
    ///
    /// On success, clears the acknowledged edits whose live value still
    /// matches the snapshot and returns how many were cleared; the caller
    /// should reload the board next. On failure the buffer is left as is.
    pub fn finish_submit(&mut self, result: ServiceResult<()>) -> Result<usize, SyncError> {
        let batch = self.in_flight.take().unwrap_or_default();
        match result {
            Ok(()) => {
                let cleared = self.pending.acknowledge(&batch);
                self.submit_failed = false;
                if matches!(self.last_error, Some(SyncError::Submit(_))) {
                    self.last_error = None;
                }
                log::info!(
                    "Batch of {} accepted, {} cleared, {} still pending",
                    batch.len(),
                    cleared,
                    self.pending.size()
                );
                self.events.push(SyncEvent::Submitted {
                    batch: batch.len(),
                    cleared,
                });
                Ok(cleared)
            }
            Err(e) => {
                log::error!("Submit of {} edits failed: {}", batch.len(), e);
                self.submit_failed = true;
                self.events.push(SyncEvent::SubmitFailed {
                    message: e.to_string(),
                });
                let error = SyncError::Submit(e);
                self.last_error = Some(error.clone());
                Err(error)
            }
        }
    }

    /// Submit the pending buffer and refresh the board on success.
    ///
    /// A no-op when the buffer is empty.
    pub async fn submit<B: BoardService + ?Sized>(&mut self, service: &B) -> Result<(), SyncError> {
        let Some(batch) = self.begin_submit() else {
            return Ok(());
        };
        let result = service.submit_edits(&batch).await;
        self.finish_submit(result)?;
        self.load(service).await
    }

    // --- Accessors ---

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn pending(&self) -> &PendingEdits {
        &self.pending
    }

    pub fn state(&self) -> SyncState {
        self.state
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: Mode) {
        self.mode = mode;
    }

    pub fn toggle_mode(&mut self) -> Mode {
        self.mode = self.mode.toggled();
        log::info!("Mode: {:?}", self.mode);
        self.mode
    }

    /// Whether a batch is awaiting its response.
    pub fn is_submitting(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Whether the most recent submission failed.
    pub fn submit_failed(&self) -> bool {
        self.submit_failed
    }

    pub fn last_error(&self) -> Option<&SyncError> {
        self.last_error.as_ref()
    }

    /// Buffer fill level for the progress indicator.
    pub fn progress(&self) -> f32 {
        self.pending.progress()
    }

    /// Take queued events (drains the queue).
    pub fn take_events(&mut self) -> Vec<SyncEvent> {
        std::mem::take(&mut self.events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::BOARD_SIZE;
    use crate::pending::PixelEdit;
    use crate::service::MemoryBoardService;
    use crate::surface::PixelSurface;
    use pollster::block_on;

    fn key(x: usize, y: usize) -> PixelKey {
        PixelKey::new(x, y).unwrap()
    }

    fn session() -> Session<PixelSurface> {
        Session::new(PixelSurface::new(BOARD_SIZE, BOARD_SIZE), 256)
    }

    fn shown(session: &Session<PixelSurface>, k: PixelKey) -> ColorCode {
        let rgb = session.surface().pixel(k.x as usize, k.y as usize).unwrap();
        ColorCode::from_rgb_or_default(rgb)
    }

    #[test]
    fn test_load_renders_board() {
        let service = MemoryBoardService::new(Board::filled(ColorCode::G));
        let mut session = session();
        assert_eq!(session.state(), SyncState::Idle);

        block_on(session.load(&service)).unwrap();

        assert_eq!(session.state(), SyncState::Ready);
        assert_eq!(shown(&session, key(999, 999)), ColorCode::G);
        assert_eq!(
            session.take_events(),
            vec![SyncEvent::Loaded { tiles: 100, failed_tiles: 0 }]
        );
    }

    #[test]
    fn test_load_failure_is_recoverable() {
        let service = MemoryBoardService::default();
        service.set_offline(true);
        let mut session = session();

        let err = block_on(session.load(&service)).unwrap_err();
        assert!(matches!(err, SyncError::Load(ServiceError::Network(_))));
        assert_eq!(session.state(), SyncState::Idle);
        assert_eq!(session.paint(key(1, 1), ColorCode::A), PaintOutcome::Rejected);

        service.set_offline(false);
        block_on(session.load(&service)).unwrap();
        assert_eq!(session.state(), SyncState::Ready);
        assert!(session.last_error().is_none());
    }

    #[test]
    fn test_apply_board_skips_bad_tiles() {
        let mut rows = Board::filled(ColorCode::C).encode_rows();
        rows[0][0] = "3A2B10Z7A93Z".to_string();
        let mut session = session();

        assert_eq!(session.apply_board(&rows), 1);
        assert_eq!(session.board().loaded_tiles(), 99);
        assert_eq!(shown(&session, key(150, 0)), ColorCode::C);
    }

    #[test]
    fn test_submit_empty_is_noop() {
        let service = MemoryBoardService::default();
        let mut session = session();
        block_on(session.load(&service)).unwrap();

        block_on(session.submit(&service)).unwrap();
        assert!(service.submissions().is_empty());
    }

    #[test]
    fn test_submit_round_trip() {
        let service = MemoryBoardService::default();
        let mut session = session();
        block_on(session.load(&service)).unwrap();

        session.paint(key(10, 10), ColorCode::A);
        session.paint(key(20, 10), ColorCode::C);
        block_on(session.submit(&service)).unwrap();

        assert!(session.pending().is_empty());
        assert_eq!(service.board().code_at(key(10, 10)), Some(ColorCode::A));
        assert_eq!(session.board().code_at(key(20, 10)), Some(ColorCode::C));
        assert_eq!(shown(&session, key(20, 10)), ColorCode::C);
        assert!(!session.submit_failed());
    }

    #[test]
    fn test_reconcile_keeps_edits_made_in_flight() {
        let service = MemoryBoardService::new(Board::filled(ColorCode::A));
        let mut session = session();
        block_on(session.load(&service)).unwrap();

        session.paint(key(1, 1), ColorCode::B);
        session.paint(key(2, 2), ColorCode::C);

        let batch = session.begin_submit().unwrap();
        assert_eq!(
            batch,
            vec![
                PixelEdit::new(key(1, 1), ColorCode::B),
                PixelEdit::new(key(2, 2), ColorCode::C),
            ]
        );

        // The user keeps painting while the request is out.
        session.paint(key(2, 2), ColorCode::D);

        let result = block_on(service.submit_edits(&batch));
        assert_eq!(session.finish_submit(result), Ok(1));
        block_on(session.load(&service)).unwrap();

        assert_eq!(session.pending().get(key(1, 1)), None);
        assert_eq!(session.pending().get(key(2, 2)), Some(ColorCode::D));
        assert_eq!(session.pending().original(key(2, 2)), Some(ColorCode::A));
        assert_eq!(session.board().code_at(key(2, 2)), Some(ColorCode::C));
        assert_eq!(shown(&session, key(1, 1)), ColorCode::B);
        assert_eq!(shown(&session, key(2, 2)), ColorCode::D);
    }

    #[test]
    fn test_kept_edit_reverts_to_pre_submit_original() {
        let service = MemoryBoardService::new(Board::filled(ColorCode::A));
        let mut session = session();
        block_on(session.load(&service)).unwrap();

        session.paint(key(2, 2), ColorCode::C);
        let batch = session.begin_submit().unwrap();
        session.paint(key(2, 2), ColorCode::D);
        let result = block_on(service.submit_edits(&batch));
        session.finish_submit(result).unwrap();
        block_on(session.load(&service)).unwrap();

        // The store now holds C, but the kept edit still remembers A.
        assert_eq!(session.board().code_at(key(2, 2)), Some(ColorCode::C));
        assert_eq!(session.paint(key(2, 2), ColorCode::A), PaintOutcome::Reverted);
        assert!(session.pending().is_empty());
        assert_eq!(shown(&session, key(2, 2)), ColorCode::A);
    }

    #[test]
    fn test_event_messages() {
        let loaded = SyncEvent::Loaded { tiles: 99, failed_tiles: 1 };
        assert_eq!(loaded.to_string(), "Loaded 99 tiles, 1 unreadable");
        let submitted = SyncEvent::Submitted { batch: 3, cleared: 2 };
        assert_eq!(submitted.to_string(), "Submitted 3 pixels");
    }

    #[test]
    fn test_second_submit_blocked_while_in_flight() {
        let service = MemoryBoardService::default();
        let mut session = session();
        block_on(session.load(&service)).unwrap();

        session.paint(key(0, 0), ColorCode::A);
        let batch = session.begin_submit().unwrap();
        assert!(session.is_submitting());

        session.paint(key(1, 0), ColorCode::A);
        assert!(session.begin_submit().is_none());

        let result = block_on(service.submit_edits(&batch));
        session.finish_submit(result).unwrap();
        assert!(!session.is_submitting());
        assert_eq!(session.begin_submit().map(|b| b.len()), Some(1));
    }

    #[test]
    fn test_submit_failure_leaves_buffer() {
        let service = MemoryBoardService::default();
        let mut session = session();
        block_on(session.load(&service)).unwrap();

        session.paint(key(5, 5), ColorCode::E);
        service.set_offline(true);

        let err = block_on(session.submit(&service)).unwrap_err();
        assert!(matches!(err, SyncError::Submit(_)));
        assert!(session.submit_failed());
        assert_eq!(session.pending().get(key(5, 5)), Some(ColorCode::E));
        assert!(!session.is_submitting());

        service.set_offline(false);
        block_on(session.submit(&service)).unwrap();
        assert!(session.pending().is_empty());
        assert!(!session.submit_failed());
    }

    #[test]
    fn test_unexpected_ack_is_failure() {
        let service = MemoryBoardService::default();
        service.set_ack_body("<html>error</html>");
        let mut session = session();
        block_on(session.load(&service)).unwrap();

        session.paint(key(5, 5), ColorCode::E);
        let err = block_on(session.submit(&service)).unwrap_err();
        assert_eq!(
            err,
            SyncError::Submit(ServiceError::NotAcknowledged("<html>error</html>".to_string()))
        );
        assert_eq!(session.pending().size(), 1);
    }

    #[test]
    fn test_reload_shows_remote_edits_under_pending() {
        let service = MemoryBoardService::default();
        let mut session = session();
        block_on(session.load(&service)).unwrap();

        session.paint(key(300, 300), ColorCode::K);
        service.apply_remote(&[
            PixelEdit::new(key(300, 300), ColorCode::F),
            PixelEdit::new(key(301, 300), ColorCode::F),
        ]);

        block_on(session.load(&service)).unwrap();
        assert_eq!(shown(&session, key(300, 300)), ColorCode::K);
        assert_eq!(shown(&session, key(301, 300)), ColorCode::F);
    }

    #[test]
    fn test_clear_restores_board() {
        let service = MemoryBoardService::default();
        let mut session = session();
        block_on(session.load(&service)).unwrap();

        session.paint(key(9, 9), ColorCode::A);
        session.clear();
        assert!(session.pending().is_empty());
        assert_eq!(shown(&session, key(9, 9)), ColorCode::B);
    }

    #[test]
    fn test_mode_toggle() {
        let mut session = session();
        assert_eq!(session.mode(), Mode::Browsing);
        assert_eq!(session.toggle_mode(), Mode::Drawing);
        assert_eq!(session.toggle_mode(), Mode::Browsing);
    }
}
