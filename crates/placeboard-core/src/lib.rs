//! PlaceBoard Core Library
//!
//! Platform-agnostic board model, RLE codec, pending edit buffer and sync
//! session for the PlaceBoard shared pixel canvas.

pub mod board;
pub mod camera;
pub mod color;
pub mod config;
pub mod pending;
pub mod rle;
pub mod service;
pub mod surface;
pub mod sync;

pub use board::{Board, BoardRows, PixelKey, Tile, BOARD_SIZE, TILES_PER_SIDE, TILE_SIZE};
pub use camera::Camera;
pub use color::{ColorCode, Rgb, PALETTE};
pub use config::ClientConfig;
pub use pending::{EditBatch, PaintOutcome, PendingEdits, PixelEdit};
pub use rle::RleError;
pub use service::{BoardService, MemoryBoardService, ServiceError};
pub use surface::{PixelSurface, Surface};
pub use sync::{Mode, Session, SyncError, SyncEvent, SyncState};
