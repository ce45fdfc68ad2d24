//! PlaceBoard Board Store Server
//!
//! A small HTTP store holding one shared board, used for local development
//! in place of the hosted endpoint.
//!
//! ## Protocol
//!
//! ```text
//! GET  /?secret_tunnel   -> [[String; 10]; 10] JSON, row-major RLE tiles
//! POST /                 <- [{"x": 10, "y": 20, "code": "C"}, ...]
//!                        -> "OK" on success, an error message otherwise
//! GET  /board.png        -> PNG snapshot of the board
//! GET  /health           -> "ok"
//! ```

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use placeboard_core::board::{Board, BoardRows, BOARD_SIZE};
use placeboard_core::color::ColorCode;
use placeboard_core::pending::PixelEdit;
use placeboard_core::service::ACK_BODY;
use placeboard_core::surface::PixelSurface;
use std::{net::SocketAddr, sync::Arc};
use tokio::sync::RwLock;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{error, info, warn};

/// Server configuration
const PORT: u16 = 3040;
/// Largest batch accepted in one request.
const MAX_BATCH: usize = 4096;

/// Why a submitted batch was refused.
#[derive(Debug, thiserror::Error)]
enum SubmitError {
    #[error("Invalid batch: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Batch of {0} edits exceeds the limit of {MAX_BATCH}")]
    TooLarge(usize),
    #[error("Pixel ({x}, {y}) is off the board")]
    OffBoard { x: u16, y: u16 },
    #[error("Color code {code} at ({x}, {y}) is not in the palette")]
    UnknownColor { x: u16, y: u16, code: ColorCode },
}

/// Shared application state
struct AppState {
    board: RwLock<Board>,
}

impl AppState {
    fn new(board: Board) -> Self {
        Self {
            board: RwLock::new(board),
        }
    }

    /// Current board as encoded tile rows.
    async fn rows(&self) -> BoardRows {
        self.board.read().await.encode_rows()
    }

    /// Validate and apply a batch body. The whole batch is refused if any
    /// edit is invalid. Returns how many edits were applied.
    async fn submit(&self, body: &str) -> Result<usize, SubmitError> {
        let edits: Vec<PixelEdit> = serde_json::from_str(body)?;
        if edits.len() > MAX_BATCH {
            return Err(SubmitError::TooLarge(edits.len()));
        }
        for edit in &edits {
            if edit.key().is_none() {
                return Err(SubmitError::OffBoard {
                    x: edit.x,
                    y: edit.y,
                });
            }
            if !edit.code.is_palette() {
                return Err(SubmitError::UnknownColor {
                    x: edit.x,
                    y: edit.y,
                    code: edit.code,
                });
            }
        }
        Ok(self.board.write().await.apply_edits(&edits))
    }

    async fn snapshot_png(&self) -> Result<Vec<u8>, placeboard_core::surface::ExportError> {
        let mut surface = PixelSurface::new(BOARD_SIZE, BOARD_SIZE);
        self.board.read().await.render(&mut surface);
        surface.encode_png()
    }
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "placeboard_server=info,tower_http=info".into()),
        )
        .init();

    let state = Arc::new(AppState::new(Board::filled(ColorCode::B)));
    let app = router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], PORT));
    info!("PlaceBoard store listening on {}", addr);
    info!("Board endpoint: http://localhost:{}/", PORT);

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to bind {}: {}", addr, e);
            return;
        }
    };
    if let Err(e) = axum::serve(listener, app).await {
        error!("Server error: {}", e);
    }
}

fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(get_board).post(post_edits))
        .route("/board.png", get(board_png))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Full board; the `secret_tunnel` flag is accepted and ignored.
async fn get_board(State(state): State<Arc<AppState>>) -> Json<BoardRows> {
    Json(state.rows().await)
}

/// Apply an edit batch. The body is read as text since clients send it as
/// `text/plain`.
async fn post_edits(State(state): State<Arc<AppState>>, body: String) -> impl IntoResponse {
    match state.submit(&body).await {
        Ok(applied) => {
            info!("Applied {} edits", applied);
            (StatusCode::OK, ACK_BODY.to_string())
        }
        Err(e) => {
            warn!("Rejected batch: {}", e);
            (StatusCode::BAD_REQUEST, e.to_string())
        }
    }
}

async fn board_png(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match state.snapshot_png().await {
        Ok(bytes) => (StatusCode::OK, [(header::CONTENT_TYPE, "image/png")], bytes).into_response(),
        Err(e) => {
            error!("PNG export failed: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
        }
    }
}

/// Health check
async fn health() -> &'static str {
    "ok"
}
