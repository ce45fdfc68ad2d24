//! Board model: the full grid of decoded tiles.

use crate::color::ColorCode;
use crate::pending::PixelEdit;
use crate::rle::{self, RleError};
use crate::surface::Surface;
use serde::{Deserialize, Serialize};

/// Width and height of the board in pixels.
pub const BOARD_SIZE: usize = 1000;
/// Width and height of one tile in pixels.
pub const TILE_SIZE: usize = 100;
/// Number of tiles along each side of the board.
pub const TILES_PER_SIDE: usize = BOARD_SIZE / TILE_SIZE;

/// Encoded board as exchanged with the store: `rows[tile_y][tile_x]`.
pub type BoardRows = Vec<Vec<String>>;

/// Identity of a single board pixel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PixelKey {
    pub x: u16,
    pub y: u16,
}

impl PixelKey {
    /// Create a key, returning `None` when outside the board.
    pub fn new(x: usize, y: usize) -> Option<Self> {
        (x < BOARD_SIZE && y < BOARD_SIZE).then_some(Self {
            x: x as u16,
            y: y as u16,
        })
    }

    /// Tile grid coordinate containing this pixel.
    pub fn tile(self) -> (usize, usize) {
        (self.x as usize / TILE_SIZE, self.y as usize / TILE_SIZE)
    }

    /// Position of this pixel inside its tile.
    pub fn within_tile(self) -> (usize, usize) {
        (self.x as usize % TILE_SIZE, self.y as usize % TILE_SIZE)
    }
}

/// One `TILE_SIZE` x `TILE_SIZE` block of color codes.
///
/// Rows are stored independently so that a per-pixel edit never touches
/// another row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tile {
    rows: Vec<Vec<ColorCode>>,
}

impl Tile {
    /// A tile with every pixel set to `code`.
    pub fn filled(code: ColorCode) -> Self {
        Self {
            rows: vec![vec![code; TILE_SIZE]; TILE_SIZE],
        }
    }

    /// Build a tile from decoded rows, checking its dimensions.
    pub fn from_rows(rows: Vec<Vec<ColorCode>>) -> Result<Self, RleError> {
        if rows.len() != TILE_SIZE {
            return Err(RleError::RowCount {
                expected: TILE_SIZE,
                found: rows.len(),
            });
        }
        if let Some((row, found)) = rows
            .iter()
            .map(Vec::len)
            .enumerate()
            .find(|(_, len)| *len != TILE_SIZE)
        {
            return Err(RleError::RowWidth {
                row,
                expected: TILE_SIZE,
                found,
            });
        }
        Ok(Self { rows })
    }

    /// Decode a tile from its wire string.
    pub fn decode(cell: &str) -> Result<Self, RleError> {
        rle::decode_tile(cell)
    }

    /// Encode this tile to its wire string.
    pub fn encode(&self) -> String {
        rle::encode_tile(self)
    }

    pub fn rows(&self) -> &[Vec<ColorCode>] {
        &self.rows
    }

    /// Code at a position inside the tile. Panics when out of range.
    pub fn get(&self, x: usize, y: usize) -> ColorCode {
        self.rows[y][x]
    }

    /// Set the code at a position inside the tile. Panics when out of range.
    pub fn set(&mut self, x: usize, y: usize, code: ColorCode) {
        self.rows[y][x] = code;
    }
}

/// A tile string that failed to decode while building a board.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileError {
    pub tile_x: usize,
    pub tile_y: usize,
    pub source: String,
    pub error: RleError,
}

/// The decoded board.
///
/// Tiles that are missing or failed to decode are `None` and are left
/// untouched when rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    tiles: Vec<Option<Tile>>,
}

impl Default for Board {
    fn default() -> Self {
        Self::empty()
    }
}

impl Board {
    /// A board with no decoded tiles.
    pub fn empty() -> Self {
        Self {
            tiles: vec![None; TILES_PER_SIDE * TILES_PER_SIDE],
        }
    }

    /// A board with every pixel set to `code`.
    pub fn filled(code: ColorCode) -> Self {
        Self {
            tiles: vec![Some(Tile::filled(code)); TILES_PER_SIDE * TILES_PER_SIDE],
        }
    }

    /// Decode a board from encoded rows.
    ///
    /// A tile that fails to decode is logged and left empty; decoding carries
    /// on with the remaining tiles. Rows or columns beyond the tile grid are
    /// ignored.
    pub fn from_rows(rows: &[Vec<String>]) -> (Self, Vec<TileError>) {
        let mut board = Self::empty();
        let mut errors = Vec::new();

        if rows.len() > TILES_PER_SIDE {
            log::warn!("Board has {} tile rows, ignoring extras", rows.len());
        }

        for (tile_y, row) in rows.iter().take(TILES_PER_SIDE).enumerate() {
            if row.len() > TILES_PER_SIDE {
                log::warn!("Tile row {} has {} cells, ignoring extras", tile_y, row.len());
            }
            for (tile_x, cell) in row.iter().take(TILES_PER_SIDE).enumerate() {
                match Tile::decode(cell) {
                    Ok(tile) => board.set_tile(tile_x, tile_y, Some(tile)),
                    Err(error) => {
                        log::error!(
                            "Invalid tile string at ({}, {}): {:?} ({})",
                            tile_x,
                            tile_y,
                            cell,
                            error
                        );
                        errors.push(TileError {
                            tile_x,
                            tile_y,
                            source: cell.clone(),
                            error,
                        });
                    }
                }
            }
        }

        (board, errors)
    }

    /// Encode every tile, in `rows[tile_y][tile_x]` order.
    ///
    /// Missing tiles encode as an empty string.
    pub fn encode_rows(&self) -> BoardRows {
        (0..TILES_PER_SIDE)
            .map(|tile_y| {
                (0..TILES_PER_SIDE)
                    .map(|tile_x| self.tile(tile_x, tile_y).map(Tile::encode).unwrap_or_default())
                    .collect()
            })
            .collect()
    }

    fn index(tile_x: usize, tile_y: usize) -> usize {
        tile_y * TILES_PER_SIDE + tile_x
    }

    pub fn tile(&self, tile_x: usize, tile_y: usize) -> Option<&Tile> {
        if tile_x >= TILES_PER_SIDE || tile_y >= TILES_PER_SIDE {
            return None;
        }
        self.tiles[Self::index(tile_x, tile_y)].as_ref()
    }

    pub fn set_tile(&mut self, tile_x: usize, tile_y: usize, tile: Option<Tile>) {
        if tile_x < TILES_PER_SIDE && tile_y < TILES_PER_SIDE {
            self.tiles[Self::index(tile_x, tile_y)] = tile;
        }
    }

    /// Number of tiles that decoded successfully.
    pub fn loaded_tiles(&self) -> usize {
        self.tiles.iter().filter(|t| t.is_some()).count()
    }

    /// Code stored at a pixel, if its tile is loaded.
    pub fn code_at(&self, key: PixelKey) -> Option<ColorCode> {
        let (tile_x, tile_y) = key.tile();
        let (x, y) = key.within_tile();
        self.tile(tile_x, tile_y).map(|tile| tile.get(x, y))
    }

    /// Apply a batch of edits, last write wins. Edits landing on a missing
    /// tile are dropped. Returns how many were applied.
    pub fn apply_edits(&mut self, edits: &[PixelEdit]) -> usize {
        let mut applied = 0;
        for edit in edits {
            let Some(key) = edit.key() else { continue };
            let (tile_x, tile_y) = key.tile();
            let (x, y) = key.within_tile();
            if let Some(tile) = self.tiles[Self::index(tile_x, tile_y)].as_mut() {
                tile.set(x, y, edit.code);
                applied += 1;
            }
        }
        applied
    }

    /// Paint one tile onto the surface at its grid offset.
    pub fn render_tile<S: Surface + ?Sized>(&self, surface: &mut S, tile_x: usize, tile_y: usize) {
        let Some(tile) = self.tile(tile_x, tile_y) else { return };
        let (ox, oy) = (tile_x * TILE_SIZE, tile_y * TILE_SIZE);
        for (y, row) in tile.rows().iter().enumerate() {
            for (x, code) in row.iter().enumerate() {
                surface.fill_pixel(ox + x, oy + y, code.rgb());
            }
        }
    }

    /// Paint every loaded tile.
    pub fn render<S: Surface + ?Sized>(&self, surface: &mut S) {
        for tile_y in 0..TILES_PER_SIDE {
            for tile_x in 0..TILES_PER_SIDE {
                self.render_tile(surface, tile_x, tile_y);
            }
        }
    }
}
