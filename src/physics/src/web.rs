//! Browser host: canvas surface, frame loop, storage and theme lookups.

use std::cell::RefCell;
use std::rc::{ Rc, Weak };

use log::{ warn, Level, LevelFilter, Log, Metadata, Record };
use wasm_bindgen::prelude::*;
use wasm_bindgen::{ Clamped, JsCast };
use web_sys::{
    CanvasRenderingContext2d, Element, HtmlCanvasElement, ImageData, ImageSmoothingQuality, Performance, Storage,
    Window,
};

use crate::color::{ parse_css_color, Rgb, DEFAULT_ACCENT };
use crate::config::{ load_config, reset_config, save_field, ConfigStore, SimulationConfig };
use crate::error::{ FluidError, Result };
use crate::fit::Rect;
use crate::lifecycle::{ Clock, Controller, FrameScheduler, FrameToken };
use crate::render::RenderSurface;

const MAX_DPR: f64 = 2.0;

fn window() -> Option<Window> {
    web_sys::window()
}

fn surface_err(e: JsValue) -> FluidError {
    FluidError::Surface(format!("{e:?}"))
}

fn context_2d(canvas: &HtmlCanvasElement) -> Result<CanvasRenderingContext2d> {
    canvas
        .get_context("2d")
        .map_err(surface_err)?
        .ok_or_else(|| FluidError::Surface("no 2d context".into()))?
        .dyn_into::<CanvasRenderingContext2d>()
        .map_err(|_| FluidError::Surface("not CanvasRenderingContext2d".into()))
}

fn find_canvas(id: &str) -> Result<HtmlCanvasElement> {
    window()
        .and_then(|w| w.document())
        .and_then(|d| d.get_element_by_id(id))
        .ok_or_else(|| FluidError::MissingElement(format!("#{id}")))?
        .dyn_into::<HtmlCanvasElement>()
        .map_err(|_| FluidError::MissingElement(format!("#{id} is not a canvas")))
}

// ── Render surface ─────────────────────────────────────────────────────

/// Full-viewport display canvas plus an offscreen canvas at grid size.
pub struct CanvasSurface {
    canvas: HtmlCanvasElement,
    ctx: CanvasRenderingContext2d,
    source: HtmlCanvasElement,
    source_ctx: CanvasRenderingContext2d,
    css_w: f32,
    css_h: f32,
}

impl CanvasSurface {
    pub fn new(canvas: HtmlCanvasElement) -> Result<Self> {
        let ctx = context_2d(&canvas)?;
        let source = window()
            .and_then(|w| w.document())
            .ok_or_else(|| FluidError::MissingElement("document".into()))?
            .create_element("canvas")
            .map_err(surface_err)?
            .dyn_into::<HtmlCanvasElement>()
            .map_err(|_| FluidError::Surface("offscreen element is not a canvas".into()))?;
        let source_ctx = context_2d(&source)?;
        let css_w = canvas.client_width() as f32;
        let css_h = canvas.client_height() as f32;
        Ok(Self { canvas, ctx, source, source_ctx, css_w, css_h })
    }

    /// Size the backing store to `css * dpr` device pixels and draw in CSS pixels.
    pub fn fit_to_viewport(&mut self, css_w: f32, css_h: f32, dpr: f64) -> Result<()> {
        let dpr = if dpr.is_finite() && dpr > 0.0 { dpr.min(MAX_DPR) } else { 1.0 };
        self.canvas.set_width(((css_w as f64) * dpr).floor().max(0.0) as u32);
        self.canvas.set_height(((css_h as f64) * dpr).floor().max(0.0) as u32);
        self.ctx.set_transform(dpr, 0.0, 0.0, dpr, 0.0, 0.0).map_err(surface_err)?;
        self.css_w = css_w;
        self.css_h = css_h;
        Ok(())
    }
}

impl RenderSurface for CanvasSurface {
    fn display_size(&self) -> (f32, f32) {
        (self.css_w, self.css_h)
    }

    fn resize_source(&mut self, cols: u32, rows: u32) -> Result<()> {
        self.source.set_width(cols);
        self.source.set_height(rows);
        Ok(())
    }

    fn write_source(&mut self, rgba: &[u8], cols: u32, rows: u32) -> Result<()> {
        let data = ImageData::new_with_u8_clamped_array_and_sh(Clamped(rgba), cols, rows)
            .map_err(|e| FluidError::Pixels(format!("{e:?}")))?;
        self.source_ctx
            .put_image_data(&data, 0.0, 0.0)
            .map_err(|e| FluidError::Pixels(format!("{e:?}")))
    }

    fn draw_source(&mut self, dest: Rect) -> Result<()> {
        self.ctx.set_image_smoothing_enabled(true);
        self.ctx.set_image_smoothing_quality(ImageSmoothingQuality::High);
        self.ctx
            .draw_image_with_html_canvas_element_and_dw_and_dh(
                &self.source,
                dest.x as f64,
                dest.y as f64,
                dest.width as f64,
                dest.height as f64,
            )
            .map_err(surface_err)
    }

    fn clear(&mut self) -> Result<()> {
        self.ctx.save();
        let cleared = self.ctx.set_transform(1.0, 0.0, 0.0, 1.0, 0.0, 0.0).map(|()| {
            self.ctx.clear_rect(0.0, 0.0, self.canvas.width() as f64, self.canvas.height() as f64)
        });
        self.ctx.restore();
        cleared.map_err(surface_err)
    }
}

// ── Clock and frame loop ───────────────────────────────────────────────

pub struct PerformanceClock {
    performance: Option<Performance>,
}

impl PerformanceClock {
    pub fn new() -> Self {
        Self { performance: window().and_then(|w| w.performance()) }
    }
}

impl Clock for PerformanceClock {
    fn now(&self) -> f64 {
        self.performance.as_ref().map(|p| p.now() / 1000.0).unwrap_or(0.0)
    }
}

type FrameCallback = Rc<RefCell<Option<Closure<dyn FnMut()>>>>;

/// `requestAnimationFrame` with a single shared callback.
pub struct RafScheduler {
    callback: FrameCallback,
}

impl RafScheduler {
    pub fn new(callback: FrameCallback) -> Self {
        Self { callback }
    }
}

impl FrameScheduler for RafScheduler {
    fn request_step(&mut self) -> Option<FrameToken> {
        let window = window()?;
        let callback = self.callback.borrow();
        let f = callback.as_ref()?;
        let handle = window.request_animation_frame(f.as_ref().unchecked_ref()).ok();
        handle.map(FrameToken)
    }

    fn cancel_step(&mut self, token: FrameToken) {
        if let Some(w) = window() {
            w.cancel_animation_frame(token.0).ok();
        }
    }
}

// ── Persistence and theme ──────────────────────────────────────────────

pub struct LocalStorageStore {
    storage: Option<Storage>,
}

impl LocalStorageStore {
    pub fn new() -> Self {
        Self { storage: window().and_then(|w| w.local_storage().ok().flatten()) }
    }
}

impl ConfigStore for LocalStorageStore {
    fn get(&self, key: &str) -> Option<String> {
        self.storage.as_ref()?.get_item(key).ok().flatten()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let Some(s) = self.storage.as_ref() else {
            return Err(FluidError::Storage("localStorage unavailable".into()));
        };
        s.set_item(key, value).map_err(|e| FluidError::Storage(format!("{e:?}")))
    }
}

fn css_color_var(window: &Window, el: &Element, prop: &str) -> Option<Rgb> {
    let style = window.get_computed_style(el).ok().flatten()?;
    let value = style.get_property_value(prop).ok()?;
    parse_css_color(&value)
}

/// Accent from the active theme: `--cursor-color`, then `--primary`.
pub fn theme_accent() -> Rgb {
    let Some(window) = window() else {
        return DEFAULT_ACCENT;
    };
    let Some(document) = window.document() else {
        return DEFAULT_ACCENT;
    };
    document
        .document_element()
        .and_then(|root| css_color_var(&window, &root, "--cursor-color"))
        .or_else(|| document.body().and_then(|body| css_color_var(&window, &body, "--primary")))
        .unwrap_or(DEFAULT_ACCENT)
}

// ── Logging ────────────────────────────────────────────────────────────

struct ConsoleLogger;

static LOGGER: ConsoleLogger = ConsoleLogger;

impl Log for ConsoleLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let msg = JsValue::from_str(&format!("{}: {}", record.target(), record.args()));
        match record.level() {
            Level::Error => web_sys::console::error_1(&msg),
            Level::Warn => web_sys::console::warn_1(&msg),
            Level::Info => web_sys::console::log_1(&msg),
            Level::Debug | Level::Trace => web_sys::console::debug_1(&msg),
        }
    }

    fn flush(&self) {}
}

/// Route `log` records and panics to the browser console. Safe to call twice.
pub fn init_logging() {
    if log::set_logger(&LOGGER).is_ok() {
        log::set_max_level(LevelFilter::Info);
    }
    std::panic::set_hook(Box::new(|info| {
        web_sys::console::error_1(&info.to_string().into());
    }));
}

#[wasm_bindgen(start)]
pub fn main() {
    init_logging();
}

// ── Exported handle ────────────────────────────────────────────────────

type WebController = Controller<CanvasSurface, PerformanceClock, RafScheduler>;

/// The fluid backdrop as seen from page scripts.
#[wasm_bindgen]
pub struct FluidBackdrop {
    controller: Rc<RefCell<WebController>>,
    store: LocalStorageStore,
}

#[wasm_bindgen]
impl FluidBackdrop {
    /// Bind to the canvas with id `canvas_id`. A missing canvas leaves the
    /// backdrop inert rather than failing.
    #[wasm_bindgen(constructor)]
    pub fn new(canvas_id: &str) -> FluidBackdrop {
        let surface = match find_canvas(canvas_id).and_then(CanvasSurface::new) {
            Ok(s) => Some(s),
            Err(e) => {
                warn!("fluid backdrop disabled: {e}");
                None
            }
        };
        let store = LocalStorageStore::new();
        let frame: FrameCallback = Rc::new(RefCell::new(None));
        let mut controller = Controller::new(
            surface,
            PerformanceClock::new(),
            RafScheduler::new(frame.clone()),
            load_config(&store),
        );
        controller.set_accent(theme_accent());
        let controller = Rc::new(RefCell::new(controller));

        let weak: Weak<RefCell<WebController>> = Rc::downgrade(&controller);
        *frame.borrow_mut() = Some(Closure::wrap(Box::new(move || {
            if let Some(shared) = weak.upgrade() {
                if let Ok(mut c) = shared.try_borrow_mut() {
                    c.frame();
                };
            }
        }) as Box<dyn FnMut()>));

        FluidBackdrop { controller, store }
    }

    pub fn start(&self) {
        self.controller.borrow_mut().start();
    }

    pub fn stop(&self) {
        self.controller.borrow_mut().stop();
    }

    pub fn setup(&self) {
        self.controller.borrow_mut().setup();
    }

    pub fn is_running(&self) -> bool {
        self.controller.borrow().is_running()
    }

    pub fn pointer_down(&self, x: f32, y: f32) {
        self.controller.borrow_mut().pointer_down(x, y);
    }

    pub fn pointer_move(&self, x: f32, y: f32) {
        self.controller.borrow_mut().pointer_move(x, y);
    }

    /// Viewport changed. `overlay_active` suppresses the reseed while a
    /// section panel covers the page.
    pub fn resize(&self, css_w: f32, css_h: f32, device_pixel_ratio: f64, overlay_active: bool) {
        let mut c = self.controller.borrow_mut();
        if let Some(surface) = c.surface_mut() {
            if let Err(e) = surface.fit_to_viewport(css_w, css_h, device_pixel_ratio) {
                warn!("fluid resize: {e}");
            }
        }
        c.on_resize(overlay_active);
    }

    pub fn set_detail(&mut self, level: u32) {
        self.update(|c| c.detail_level = level);
    }

    pub fn set_inertia(&mut self, inertia: f32) {
        self.update(|c| c.inertia = inertia);
    }

    pub fn set_swirl(&mut self, swirl: f32) {
        self.update(|c| c.swirl = swirl);
    }

    pub fn set_flow(&mut self, flow: f32) {
        self.update(|c| c.flow = flow);
    }

    /// Restore and persist the default settings, then reseed.
    pub fn reset_config(&mut self) {
        let config = reset_config(&mut self.store).unwrap_or_else(|e| {
            warn!("fluid config reset: {e}");
            SimulationConfig::default()
        });
        self.controller.borrow_mut().restore_config(config);
    }

    /// Re-read the theme accent after a theme switch.
    pub fn refresh_accent(&self) {
        self.controller.borrow_mut().set_accent(theme_accent());
    }

    pub fn config(&self) -> JsValue {
        serde_wasm_bindgen::to_value(self.controller.borrow().config()).unwrap_or(JsValue::NULL)
    }
}

impl FluidBackdrop {
    fn update(&mut self, edit: impl FnOnce(&mut SimulationConfig)) {
        let mut c = self.controller.borrow_mut();
        let mut next = *c.config();
        edit(&mut next);
        let next = next.clamped();
        for field in c.config().changed_fields(&next) {
            if let Err(e) = save_field(&mut self.store, &next, field) {
                warn!("fluid config save: {e}");
            }
        }
        c.set_config(next);
    }
}

impl Drop for FluidBackdrop {
    fn drop(&mut self) {
        // A pending frame would otherwise call into a dropped closure.
        if let Ok(mut c) = self.controller.try_borrow_mut() {
            c.stop();
        }
    }
}
