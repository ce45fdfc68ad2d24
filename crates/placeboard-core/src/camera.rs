//! Camera module for pan/zoom over the board.

use crate::board::{PixelKey, BOARD_SIZE};
use kurbo::{Affine, Point, Size, Vec2};
use serde::{Deserialize, Serialize};

/// Smallest zoom level; the board is never shown below this scale.
pub const MIN_ZOOM: f64 = 1.25;
/// Largest zoom level.
pub const MAX_ZOOM: f64 = 4.0;
/// Zoom multiplier for one wheel step towards the user.
pub const WHEEL_ZOOM_IN: f64 = 1.1;
/// Zoom multiplier for one wheel step away from the user.
pub const WHEEL_ZOOM_OUT: f64 = 0.9;

/// Camera manages the view transform for the board.
///
/// It handles panning (translation) and zooming (scaling) operations,
/// converting between screen coordinates and board coordinates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Camera {
    /// Current translation offset (pan), in screen pixels
    pub offset: Vec2,
    /// Current zoom level (screen pixels per board pixel)
    pub zoom: f64,
    /// Minimum allowed zoom level
    pub min_zoom: f64,
    /// Maximum allowed zoom level
    pub max_zoom: f64,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            offset: Vec2::ZERO,
            zoom: MIN_ZOOM,
            min_zoom: MIN_ZOOM,
            max_zoom: MAX_ZOOM,
        }
    }
}

impl Camera {
    /// Create a new camera with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the affine transform for rendering.
    ///
    /// This transform converts board coordinates to screen coordinates.
    pub fn transform(&self) -> Affine {
        Affine::translate(self.offset) * Affine::scale(self.zoom)
    }

    /// Get the inverse transform for input handling.
    pub fn inverse_transform(&self) -> Affine {
        Affine::scale(1.0 / self.zoom) * Affine::translate(-self.offset)
    }

    pub fn screen_to_world(&self, screen_point: Point) -> Point {
        self.inverse_transform() * screen_point
    }

    pub fn world_to_screen(&self, world_point: Point) -> Point {
        self.transform() * world_point
    }

    /// Board pixel under a screen point, if any.
    pub fn screen_to_pixel(&self, screen_point: Point) -> Option<PixelKey> {
        let world = self.screen_to_world(screen_point);
        let (x, y) = (world.x.floor(), world.y.floor());
        if x < 0.0 || y < 0.0 {
            return None;
        }
        PixelKey::new(x as usize, y as usize)
    }

    /// Pan the camera by a delta in screen coordinates.
    pub fn pan(&mut self, delta: Vec2) {
        self.offset += delta;
    }

    /// Zoom the camera, keeping the given screen point fixed.
    pub fn zoom_at(&mut self, screen_point: Point, factor: f64) {
        let new_zoom = (self.zoom * factor).clamp(self.min_zoom, self.max_zoom);
        if (new_zoom - self.zoom).abs() < f64::EPSILON {
            return;
        }

        let world_point = self.screen_to_world(screen_point);
        self.zoom = new_zoom;

        // Adjust offset so world_point stays at screen_point
        let new_screen = self.world_to_screen(world_point);
        self.offset += screen_point - new_screen;
    }

    /// Apply one wheel step, anchored at the viewport centre.
    ///
    /// Positive `delta_y` (scrolling down) zooms out.
    pub fn wheel(&mut self, delta_y: f64, viewport: Size) {
        let factor = if delta_y > 0.0 {
            WHEEL_ZOOM_OUT
        } else if delta_y < 0.0 {
            WHEEL_ZOOM_IN
        } else {
            return;
        };
        let centre = Point::new(viewport.width / 2.0, viewport.height / 2.0);
        self.zoom_at(centre, factor);
    }

    /// Put the centre of the board in the middle of the viewport.
    pub fn centre_on_board(&mut self, viewport: Size) {
        let half = BOARD_SIZE as f64 / 2.0;
        self.offset = Vec2::new(
            viewport.width / 2.0 - half * self.zoom,
            viewport.height / 2.0 - half * self.zoom,
        );
    }

    /// Reset camera to the minimum zoom, centred.
    pub fn reset(&mut self, viewport: Size) {
        self.zoom = self.min_zoom;
        self.centre_on_board(viewport);
    }
}
