//! Core application state, independent of the windowing platform.

use kurbo::{Point, Size};
use placeboard_core::camera::Camera;
use placeboard_core::color::ColorCode;
use placeboard_core::config::ClientConfig;
use placeboard_core::pending::PaintOutcome;
use placeboard_core::surface::Surface;
use placeboard_core::sync::{Mode, Session, SyncEvent, SyncState};

use crate::event_handler::EventHandler;
use crate::shortcuts::{KeyAction, ShortcutRegistry};

/// Application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub client: ClientConfig,
    /// Color selected at start-up.
    pub initial_color: ColorCode,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            client: ClientConfig::default(),
            initial_color: ColorCode::A,
        }
    }
}

/// Snapshot of everything the UI chrome displays.
#[derive(Debug, Clone, PartialEq)]
pub struct Status {
    pub state: SyncState,
    pub mode: Mode,
    pub pending: usize,
    pub capacity: usize,
    /// Fill level of the batch, `pending / capacity`.
    pub progress: f32,
    pub submitting: bool,
    pub submit_failed: bool,
    pub error: Option<String>,
    /// Message for the most recent sync event.
    pub notice: Option<String>,
    pub selected: ColorCode,
    pub zoom: f64,
}

impl Status {
    /// CSS cursor for the board area.
    pub fn cursor(&self, panning: bool) -> &'static str {
        match self.mode {
            Mode::Drawing => "crosshair",
            Mode::Browsing if panning => "grabbing",
            Mode::Browsing => "grab",
        }
    }
}

/// The board client: session, camera and input state.
pub struct App<S: Surface> {
    session: Session<S>,
    camera: Camera,
    events: EventHandler,
    selected: ColorCode,
    viewport: Size,
    notice: Option<String>,
}

impl<S: Surface> App<S> {
    pub fn new(config: AppConfig, surface: S) -> Self {
        let session = Session::new(surface, config.client.capacity);
        Self {
            session,
            camera: Camera::new(),
            events: EventHandler::new(),
            selected: config.initial_color,
            viewport: Size::ZERO,
            notice: None,
        }
    }

    pub fn session(&self) -> &Session<S> {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut Session<S> {
        &mut self.session
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    /// Update the viewport size. The first call centres the board.
    pub fn set_viewport(&mut self, viewport: Size) {
        let first = self.viewport == Size::ZERO;
        self.viewport = viewport;
        if first {
            self.camera.centre_on_board(viewport);
        }
    }

    pub fn selected_color(&self) -> ColorCode {
        self.selected
    }

    /// Choose the paint color. Only palette colors can be selected.
    pub fn select_color(&mut self, code: ColorCode) -> bool {
        if !code.is_palette() {
            return false;
        }
        self.selected = code;
        true
    }

    // --- Input ---

    pub fn on_pointer_down(&mut self, point: Point) -> Option<PaintOutcome> {
        self.events
            .pointer_down(point, &self.camera, &mut self.session, self.selected)
    }

    pub fn on_pointer_move(&mut self, point: Point) -> Option<PaintOutcome> {
        self.events
            .pointer_move(point, &mut self.camera, &mut self.session, self.selected)
    }

    pub fn on_pointer_up(&mut self) {
        self.events.pointer_up();
    }

    pub fn on_wheel(&mut self, delta_y: f64) {
        self.camera.wheel(delta_y, self.viewport);
    }

    /// Handle a key press.
    ///
    /// Local actions are applied here. `Submit` is returned to the caller,
    /// which owns the service and runs the request.
    pub fn on_key(&mut self, key: &str) -> Option<KeyAction> {
        let action = ShortcutRegistry::action_for(key)?;
        match action {
            KeyAction::ToggleMode => {
                self.events.pointer_up();
                self.session.toggle_mode();
            }
            KeyAction::Clear => self.session.clear(),
            KeyAction::ResetView => self.camera.reset(self.viewport),
            KeyAction::Submit => {}
        }
        Some(action)
    }

    /// Drain the session's sync events. The last one becomes the status notice.
    pub fn poll_events(&mut self) -> Vec<SyncEvent> {
        let events = self.session.take_events();
        for event in &events {
            log::debug!("Sync event: {}", event);
        }
        if let Some(last) = events.last() {
            self.notice = Some(last.to_string());
        }
        events
    }

    pub fn is_panning(&self) -> bool {
        self.events.is_panning()
    }

    pub fn status(&self) -> Status {
        let pending = self.session.pending();
        Status {
            state: self.session.state(),
            mode: self.session.mode(),
            pending: pending.size(),
            capacity: pending.capacity(),
            progress: pending.progress(),
            submitting: self.session.is_submitting(),
            submit_failed: self.session.submit_failed(),
            error: self.session.last_error().map(|e| e.to_string()),
            notice: self.notice.clone(),
            selected: self.selected,
            zoom: self.camera.zoom,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kurbo::Vec2;
    use placeboard_core::board::{Board, PixelKey, BOARD_SIZE};
    use placeboard_core::service::MemoryBoardService;
    use placeboard_core::surface::PixelSurface;
    use pollster::block_on;

    fn loaded_app() -> App<PixelSurface> {
        let service = MemoryBoardService::new(Board::filled(ColorCode::B));
        let mut app = App::new(AppConfig::default(), PixelSurface::new(BOARD_SIZE, BOARD_SIZE));
        app.set_viewport(Size::new(1000.0, 1000.0));
        block_on(app.session_mut().load(&service)).unwrap();
        app
    }

    /// Screen point over the centre of a board pixel.
    fn screen_point(app: &App<PixelSurface>, x: usize, y: usize) -> Point {
        app.camera()
            .world_to_screen(Point::new(x as f64 + 0.5, y as f64 + 0.5))
    }

    #[test]
    fn test_browse_drag_pans() {
        let mut app = loaded_app();
        let before = app.camera().offset;

        assert_eq!(app.on_pointer_down(Point::new(100.0, 100.0)), None);
        assert!(app.is_panning());
        app.on_pointer_move(Point::new(130.0, 90.0));
        app.on_pointer_up();

        assert_eq!(app.camera().offset, before + Vec2::new(30.0, -10.0));
        assert!(app.session().pending().is_empty());
    }

    #[test]
    fn test_draw_mode_paints_selected_color() {
        let mut app = loaded_app();
        assert_eq!(app.on_key("a"), Some(KeyAction::ToggleMode));
        assert!(app.select_color(ColorCode::C));

        let p = screen_point(&app, 500, 500);
        assert_eq!(app.on_pointer_down(p), Some(PaintOutcome::Painted));

        let q = screen_point(&app, 501, 500);
        assert_eq!(app.on_pointer_move(q), Some(PaintOutcome::Painted));
        // Staying on the same pixel does not repaint it.
        assert_eq!(app.on_pointer_move(q), None);
        app.on_pointer_up();

        let key = PixelKey::new(501, 500).unwrap();
        assert_eq!(app.session().pending().get(key), Some(ColorCode::C));
        assert_eq!(app.status().pending, 2);
    }

    #[test]
    fn test_move_without_press_does_nothing() {
        let mut app = loaded_app();
        app.on_key("A");
        let p = screen_point(&app, 10, 10);
        assert_eq!(app.on_pointer_move(p), None);
        assert!(app.session().pending().is_empty());
    }

    #[test]
    fn test_select_color_rejects_off_palette() {
        let mut app = loaded_app();
        assert!(!app.select_color(ColorCode::from_char('X').unwrap()));
        assert_eq!(app.selected_color(), ColorCode::A);
    }

    #[test]
    fn test_escape_clears_pending() {
        let mut app = loaded_app();
        app.on_key("a");
        let p = screen_point(&app, 42, 42);
        app.on_pointer_down(p);
        app.on_pointer_up();
        assert_eq!(app.status().pending, 1);

        assert_eq!(app.on_key("Escape"), Some(KeyAction::Clear));
        assert_eq!(app.status().pending, 0);
    }

    #[test]
    fn test_submit_key_is_returned() {
        let mut app = loaded_app();
        assert_eq!(app.on_key("Enter"), Some(KeyAction::Submit));
        assert_eq!(app.on_key("q"), None);
    }

    #[test]
    fn test_status_progress_and_cursor() {
        let mut app = loaded_app();
        let status = app.status();
        assert_eq!(status.state, SyncState::Ready);
        assert_eq!(status.capacity, 256);
        assert_eq!(status.cursor(false), "grab");
        assert_eq!(status.cursor(true), "grabbing");

        app.on_key("a");
        for x in 0..64 {
            let p = screen_point(&app, 300 + x, 300);
            app.on_pointer_down(p);
            app.on_pointer_up();
        }
        let status = app.status();
        assert_eq!(status.pending, 64);
        assert!((status.progress - 0.25).abs() < f32::EPSILON);
        assert_eq!(status.cursor(false), "crosshair");
    }

    #[test]
    fn test_poll_events_drains_queue() {
        let service = MemoryBoardService::new(Board::filled(ColorCode::B));
        let mut app = App::new(AppConfig::default(), PixelSurface::new(BOARD_SIZE, BOARD_SIZE));
        app.set_viewport(Size::new(1000.0, 1000.0));
        app.on_key("a");

        for i in 0..50 {
            block_on(app.session_mut().load(&service)).unwrap();
            let p = screen_point(&app, 100 + i, 100);
            app.on_pointer_down(p);
            app.on_pointer_up();
            block_on(app.session_mut().submit(&service)).unwrap();
            assert_eq!(app.poll_events().len(), 3);
        }

        assert!(app.poll_events().is_empty());
        assert!(app.session_mut().take_events().is_empty());
        assert_eq!(app.status().notice.as_deref(), Some("Loaded 100 tiles"));
    }

    #[test]
    fn test_failed_submit_sets_notice() {
        let service = MemoryBoardService::default();
        let mut app = loaded_app();
        app.poll_events();
        app.on_key("a");
        let p = screen_point(&app, 7, 7);
        app.on_pointer_down(p);
        app.on_pointer_up();

        service.set_offline(true);
        assert!(block_on(app.session_mut().submit(&service)).is_err());
        assert_eq!(
            app.poll_events(),
            vec![SyncEvent::SubmitFailed {
                message: "Network error: Store unreachable".to_string()
            }]
        );
        assert_eq!(
            app.status().notice.as_deref(),
            Some("Submit failed: Network error: Store unreachable")
        );
    }

    #[test]
    fn test_wheel_zooms_and_reset() {
        let mut app = loaded_app();
        app.on_wheel(-1.0);
        assert!(app.status().zoom > placeboard_core::camera::MIN_ZOOM);
        app.on_key("0");
        assert!((app.status().zoom - placeboard_core::camera::MIN_ZOOM).abs() < f64::EPSILON);
    }
}
