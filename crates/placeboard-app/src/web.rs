//! WebAssembly entry point and browser bindings.
//!
//! Expects a page with these element ids:
//!
//! - `viewport`: full-window container receiving pointer and wheel input
//! - `board`: the `<canvas>` inside it
//! - `palette`: container that palette buttons are added to
//! - `submit`, `clear`: buttons
//! - `progress`: `<progress>` showing the batch fill level
//! - `status`: text line for mode and errors

use std::cell::RefCell;
use std::rc::Rc;

use kurbo::{Point, Size};
use placeboard_core::board::BOARD_SIZE;
use placeboard_core::color::PALETTE;
use placeboard_core::config::{ClientConfig, DEFAULT_ENDPOINT};
use placeboard_core::service::{BoardService, FetchBoardService};
use placeboard_core::surface::CanvasSurface;
use placeboard_core::sync::{Mode, SyncState};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{
    AddEventListenerOptions, CanvasRenderingContext2d, Document, Element, HtmlCanvasElement,
    HtmlElement, KeyboardEvent, MouseEvent, WheelEvent, Window,
};

use crate::app::{App, AppConfig};
use crate::params::parse_endpoint;
use crate::shortcuts::KeyAction;

type SharedApp = Rc<RefCell<App<CanvasSurface>>>;

/// Handles to the page elements the shell updates.
#[derive(Clone)]
struct Dom {
    document: Document,
    canvas: HtmlCanvasElement,
}

/// Read the store endpoint from `?endpoint=` or `#endpoint=`.
pub fn get_endpoint_from_url() -> Option<String> {
    let location = web_sys::window()?.location();
    let search = location.search().ok().and_then(|s| parse_endpoint(&s));
    search.or_else(|| location.hash().ok().and_then(|h| parse_endpoint(&h)))
}

fn js_err(message: &str) -> JsValue {
    JsValue::from_str(message)
}

fn element(document: &Document, id: &str) -> Result<Element, JsValue> {
    document
        .get_element_by_id(id)
        .ok_or_else(|| js_err(&format!("Missing element #{}", id)))
}

fn viewport_size(window: &Window) -> Size {
    let width = window.inner_width().ok().and_then(|v| v.as_f64()).unwrap_or(0.0);
    let height = window.inner_height().ok().and_then(|v| v.as_f64()).unwrap_or(0.0);
    Size::new(width, height)
}

/// Drain sync events, then push camera and status into the DOM.
fn refresh(dom: &Dom, app: &SharedApp) {
    app.borrow_mut().poll_events();
    let app = app.borrow();
    let camera = app.camera();
    let status = app.status();
    let style = dom.canvas.style();
    let _ = style.set_property(
        "transform",
        &format!(
            "translate({}px, {}px) scale({})",
            camera.offset.x, camera.offset.y, camera.zoom
        ),
    );
    let _ = style.set_property("cursor", status.cursor(app.is_panning()));

    if let Some(progress) = dom.document.get_element_by_id("progress") {
        let _ = progress.set_attribute("max", "1");
        let _ = progress.set_attribute("value", &status.progress.to_string());
    }

    if let Some(submit) = dom.document.get_element_by_id("submit") {
        let _ = submit.set_attribute("data-failed", if status.submit_failed { "true" } else { "false" });
        if status.submitting || status.pending == 0 {
            let _ = submit.set_attribute("disabled", "");
        } else {
            let _ = submit.remove_attribute("disabled");
        }
    }

    if let Some(line) = dom.document.get_element_by_id("status") {
        let mode = match status.mode {
            Mode::Browsing => "Browsing",
            Mode::Drawing => "Drawing",
        };
        let text = match (&status.error, status.state) {
            (Some(error), _) => format!("{} | {}", mode, error),
            (None, SyncState::Loading) => format!("{} | Loading...", mode),
            (None, SyncState::Idle) => format!("{} | Not loaded", mode),
            (None, SyncState::Ready) => match &status.notice {
                Some(notice) => format!(
                    "{} | {}/{} pixels | {}",
                    mode, status.pending, status.capacity, notice
                ),
                None => format!("{} | {}/{} pixels", mode, status.pending, status.capacity),
            },
        };
        line.set_text_content(Some(&text));
    }

    for (code, _) in PALETTE {
        if let Some(button) = dom.document.get_element_by_id(&format!("color-{}", code)) {
            let selected = code == status.selected;
            let _ = button.set_attribute("data-selected", if selected { "true" } else { "false" });
        }
    }
}

/// Fetch the board and render it.
async fn load(app: SharedApp, service: Rc<FetchBoardService>, dom: Dom) {
    app.borrow_mut().session_mut().begin_load();
    refresh(&dom, &app);

    let result = service.fetch_board().await;
    {
        let mut app = app.borrow_mut();
        match result {
            Ok(rows) => {
                app.session_mut().apply_board(&rows);
            }
            Err(e) => {
                app.session_mut().fail_load(e);
            }
        }
    }
    refresh(&dom, &app);
}

/// Submit the pending batch; on success reload the board.
///
/// Pointer input keeps working while the request is outstanding.
fn spawn_submit(app: SharedApp, service: Rc<FetchBoardService>, dom: Dom) {
    let Some(batch) = app.borrow_mut().session_mut().begin_submit() else {
        return;
    };
    refresh(&dom, &app);

    wasm_bindgen_futures::spawn_local(async move {
        let result = service.submit_edits(&batch).await;
        let accepted = app.borrow_mut().session_mut().finish_submit(result).is_ok();
        refresh(&dom, &app);
        if accepted {
            load(app, service, dom).await;
        }
    });
}

fn build_palette(dom: &Dom, app: &SharedApp) -> Result<(), JsValue> {
    let container = element(&dom.document, "palette")?;
    for (code, rgb) in PALETTE {
        let button: HtmlElement = dom
            .document
            .create_element("button")?
            .dyn_into()
            .map_err(|_| js_err("button is not an HtmlElement"))?;
        button.set_id(&format!("color-{}", code));
        button.set_title(&rgb.to_css());
        button.style().set_property("background-color", &rgb.to_css())?;

        let app = app.clone();
        let dom_click = dom.clone();
        let on_click = Closure::<dyn FnMut()>::new(move || {
            app.borrow_mut().select_color(code);
            refresh(&dom_click, &app);
        });
        button.set_onclick(Some(on_click.as_ref().unchecked_ref()));
        on_click.forget();

        container.append_child(&button)?;
    }
    Ok(())
}

fn install_input(
    window: &Window,
    dom: &Dom,
    app: &SharedApp,
    service: &Rc<FetchBoardService>,
) -> Result<(), JsValue> {
    let viewport = element(&dom.document, "viewport")?;

    // mousedown on the board area
    {
        let app = app.clone();
        let dom = dom.clone();
        let handler = Closure::<dyn FnMut(MouseEvent)>::new(move |e: MouseEvent| {
            let point = Point::new(e.client_x() as f64, e.client_y() as f64);
            app.borrow_mut().on_pointer_down(point);
            refresh(&dom, &app);
        });
        viewport.add_event_listener_with_callback("mousedown", handler.as_ref().unchecked_ref())?;
        handler.forget();
    }

    // mousemove / mouseup anywhere in the window
    {
        let app = app.clone();
        let dom = dom.clone();
        let handler = Closure::<dyn FnMut(MouseEvent)>::new(move |e: MouseEvent| {
            let point = Point::new(e.client_x() as f64, e.client_y() as f64);
            let changed = {
                let mut app = app.borrow_mut();
                let panning = app.is_panning();
                app.on_pointer_move(point).is_some() || panning
            };
            if changed {
                refresh(&dom, &app);
            }
        });
        window.add_event_listener_with_callback("mousemove", handler.as_ref().unchecked_ref())?;
        handler.forget();
    }
    {
        let app = app.clone();
        let dom = dom.clone();
        let handler = Closure::<dyn FnMut(MouseEvent)>::new(move |_e: MouseEvent| {
            app.borrow_mut().on_pointer_up();
            refresh(&dom, &app);
        });
        window.add_event_listener_with_callback("mouseup", handler.as_ref().unchecked_ref())?;
        handler.forget();
    }

    // wheel zoom; non-passive so the page itself does not scroll
    {
        let app = app.clone();
        let dom = dom.clone();
        let handler = Closure::<dyn FnMut(WheelEvent)>::new(move |e: WheelEvent| {
            e.prevent_default();
            app.borrow_mut().on_wheel(e.delta_y());
            refresh(&dom, &app);
        });
        let options = AddEventListenerOptions::new();
        options.set_passive(false);
        viewport.add_event_listener_with_callback_and_add_event_listener_options(
            "wheel",
            handler.as_ref().unchecked_ref(),
            &options,
        )?;
        handler.forget();
    }

    // keyboard shortcuts
    {
        let app = app.clone();
        let dom = dom.clone();
        let service = service.clone();
        let handler = Closure::<dyn FnMut(KeyboardEvent)>::new(move |e: KeyboardEvent| {
            let action = app.borrow_mut().on_key(&e.key());
            if action == Some(KeyAction::Submit) {
                spawn_submit(app.clone(), service.clone(), dom.clone());
            }
            if action.is_some() {
                refresh(&dom, &app);
            }
        });
        dom.document
            .add_event_listener_with_callback("keydown", handler.as_ref().unchecked_ref())?;
        handler.forget();
    }

    // keep the viewport size current
    {
        let app = app.clone();
        let handler = Closure::<dyn FnMut()>::new(move || {
            if let Some(window) = web_sys::window() {
                app.borrow_mut().set_viewport(viewport_size(&window));
            }
        });
        window.add_event_listener_with_callback("resize", handler.as_ref().unchecked_ref())?;
        handler.forget();
    }

    Ok(())
}

fn install_buttons(dom: &Dom, app: &SharedApp, service: &Rc<FetchBoardService>) -> Result<(), JsValue> {
    let submit: HtmlElement = element(&dom.document, "submit")?
        .dyn_into()
        .map_err(|_| js_err("#submit is not an HtmlElement"))?;
    {
        let app = app.clone();
        let dom = dom.clone();
        let service = service.clone();
        let on_click = Closure::<dyn FnMut()>::new(move || {
            spawn_submit(app.clone(), service.clone(), dom.clone());
        });
        submit.set_onclick(Some(on_click.as_ref().unchecked_ref()));
        on_click.forget();
    }

    let clear: HtmlElement = element(&dom.document, "clear")?
        .dyn_into()
        .map_err(|_| js_err("#clear is not an HtmlElement"))?;
    {
        let app = app.clone();
        let dom = dom.clone();
        let on_click = Closure::<dyn FnMut()>::new(move || {
            app.borrow_mut().session_mut().clear();
            refresh(&dom, &app);
        });
        clear.set_onclick(Some(on_click.as_ref().unchecked_ref()));
        on_click.forget();
    }

    Ok(())
}

/// Initialize and run the WASM application.
#[wasm_bindgen(start)]
pub fn run_wasm() -> Result<(), JsValue> {
    // Set up panic hook for better error messages
    console_error_panic_hook::set_once();

    console_log::init_with_level(log::Level::Info).map_err(|e| js_err(&e.to_string()))?;
    log::info!("Starting PlaceBoard (WASM)");

    let window = web_sys::window().ok_or_else(|| js_err("No window"))?;
    let document = window.document().ok_or_else(|| js_err("No document"))?;

    let canvas: HtmlCanvasElement = element(&document, "board")?
        .dyn_into()
        .map_err(|_| js_err("#board is not a canvas"))?;
    canvas.set_width(BOARD_SIZE as u32);
    canvas.set_height(BOARD_SIZE as u32);
    let style = canvas.style();
    style.set_property("transform-origin", "0 0")?;
    style.set_property("image-rendering", "pixelated")?;

    let ctx: CanvasRenderingContext2d = canvas
        .get_context("2d")?
        .ok_or_else(|| js_err("2D context unavailable"))?
        .dyn_into()
        .map_err(|_| js_err("Unexpected context type"))?;

    let endpoint = get_endpoint_from_url().unwrap_or_else(|| DEFAULT_ENDPOINT.to_string());
    log::info!("Board endpoint: {}", endpoint);
    let config = AppConfig {
        client: ClientConfig::new(endpoint),
        ..AppConfig::default()
    };
    let service = Rc::new(FetchBoardService::new(&config.client).map_err(|e| js_err(&e.to_string()))?);

    let surface = CanvasSurface::new(ctx, BOARD_SIZE, BOARD_SIZE);
    let app: SharedApp = Rc::new(RefCell::new(App::new(config, surface)));
    app.borrow_mut().set_viewport(viewport_size(&window));

    let dom = Dom { document, canvas };
    build_palette(&dom, &app)?;
    install_input(&window, &dom, &app, &service)?;
    install_buttons(&dom, &app, &service)?;
    refresh(&dom, &app);

    wasm_bindgen_futures::spawn_local(load(app, service, dom));
    Ok(())
}
