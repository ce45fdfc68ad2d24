//! Pointer handling: panning in browse mode, painting in draw mode.

use kurbo::Point;
use placeboard_core::camera::Camera;
use placeboard_core::color::ColorCode;
use placeboard_core::pending::PaintOutcome;
use placeboard_core::surface::Surface;
use placeboard_core::sync::{Mode, Session};
use placeboard_core::PixelKey;

/// An active pointer drag.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Drag {
    /// Moving the camera; `last` is the previous pointer position.
    Pan { last: Point },
    /// Painting; `last` is the last pixel painted during this stroke.
    Paint { last: Option<PixelKey> },
}

/// Translates pointer events into camera moves and paint requests.
#[derive(Debug, Default)]
pub struct EventHandler {
    drag: Option<Drag>,
}

impl EventHandler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_panning(&self) -> bool {
        matches!(self.drag, Some(Drag::Pan { .. }))
    }

    /// Start a drag. In draw mode the pixel under the pointer is painted
    /// immediately.
    pub fn pointer_down<S: Surface>(
        &mut self,
        point: Point,
        camera: &Camera,
        session: &mut Session<S>,
        color: ColorCode,
    ) -> Option<PaintOutcome> {
        match session.mode() {
            Mode::Browsing => {
                self.drag = Some(Drag::Pan { last: point });
                None
            }
            Mode::Drawing => {
                self.drag = Some(Drag::Paint { last: None });
                self.paint_at(point, camera, session, color)
            }
        }
    }

    /// Continue a drag. Does nothing when no drag is active.
    pub fn pointer_move<S: Surface>(
        &mut self,
        point: Point,
        camera: &mut Camera,
        session: &mut Session<S>,
        color: ColorCode,
    ) -> Option<PaintOutcome> {
        match self.drag {
            Some(Drag::Pan { last }) => {
                camera.pan(point - last);
                self.drag = Some(Drag::Pan { last: point });
                None
            }
            Some(Drag::Paint { .. }) => self.paint_at(point, camera, session, color),
            None => None,
        }
    }

    pub fn pointer_up(&mut self) {
        self.drag = None;
    }

    fn paint_at<S: Surface>(
        &mut self,
        point: Point,
        camera: &Camera,
        session: &mut Session<S>,
        color: ColorCode,
    ) -> Option<PaintOutcome> {
        let key = camera.screen_to_pixel(point)?;
        if let Some(Drag::Paint { last }) = &mut self.drag {
            // Holding the pointer on one pixel must not toggle it back and forth.
            if *last == Some(key) {
                return None;
            }
            *last = Some(key);
        }
        let outcome = session.paint(key, color);
        if outcome == PaintOutcome::Rejected {
            log::debug!("Paint at ({}, {}) rejected", key.x, key.y);
        }
        Some(outcome)
    }
}
