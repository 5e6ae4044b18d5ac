use log::{ debug, info, warn };

use crate::color::{ Rgb, DEFAULT_ACCENT };
use crate::config::{ ConfigField, SimulationConfig };
use crate::field::FluidState;
use crate::fit::{ map_display_to_grid, Rect };
use crate::grid::compute_grid;
use crate::inject::PointerState;
use crate::render::{ Compositor, RenderSurface };

/// Monotonic time source in seconds.
pub trait Clock {
    fn now(&self) -> f64;
}

/// Opaque handle for a pending frame callback.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrameToken(pub i32);

/// The host frame loop. When a requested frame fires, the host calls
/// `Controller::frame`.
pub trait FrameScheduler {
    fn request_step(&mut self) -> Option<FrameToken>;
    fn cancel_step(&mut self, token: FrameToken);
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunState {
    Stopped,
    Running,
}

/// Owns one simulation and drives it from host callbacks.
///
/// Without a render surface every operation is a no-op.
pub struct Controller<S, C, F> {
    surface: Option<S>,
    clock: C,
    scheduler: F,
    config: SimulationConfig,
    accent: Rgb,
    state: Option<FluidState>,
    pointer: PointerState,
    compositor: Compositor,
    run_state: RunState,
    pending: Option<FrameToken>,
    last_time: f64,
}

impl<S: RenderSurface, C: Clock, F: FrameScheduler> Controller<S, C, F> {
    pub fn new(surface: Option<S>, clock: C, scheduler: F, config: SimulationConfig) -> Self {
        let last_time = clock.now();
        Self {
            surface,
            clock,
            scheduler,
            config,
            accent: DEFAULT_ACCENT,
            state: None,
            pointer: PointerState::default(),
            compositor: Compositor::new(),
            run_state: RunState::Stopped,
            pending: None,
            last_time,
        }
    }

    pub fn start(&mut self) {
        if self.run_state == RunState::Running {
            return;
        }
        let Some((w, h)) = self.surface.as_ref().map(|s| s.display_size()) else {
            return;
        };
        self.run_state = RunState::Running;
        self.setup();
        self.pointer.reset(w * 0.5, h * 0.5);
        self.last_time = self.clock.now();
        self.schedule();
        info!("fluid started");
    }

    pub fn stop(&mut self) {
        let Some(surface) = self.surface.as_mut() else {
            return;
        };
        self.run_state = RunState::Stopped;
        if let Some(token) = self.pending.take() {
            self.scheduler.cancel_step(token);
        }
        if let Err(e) = surface.clear() {
            warn!("fluid stop: {e}");
        }
        info!("fluid stopped");
    }

    /// Discard the current state and reseed for the surface's current size.
    pub fn setup(&mut self) {
        let Some(surface) = self.surface.as_ref() else {
            return;
        };
        let (w, h) = surface.display_size();
        let grid = compute_grid(w, h, self.config.detail_level);
        self.state = Some(FluidState::new(grid, self.accent));
        self.compositor.invalidate();
        debug!("fluid grid {}x{} for {}x{} viewport", grid.cols, grid.rows, w, h);
    }

    /// Host frame callback: step, draw, then ask for the next frame.
    pub fn frame(&mut self) {
        self.pending = None;
        if self.run_state != RunState::Running {
            return;
        }
        let (Some(surface), Some(state)) = (self.surface.as_mut(), self.state.as_mut()) else {
            return;
        };
        let now = self.clock.now();
        let dt = (now - self.last_time) as f32;
        self.last_time = now;

        state.step(&self.config, dt);
        if let Err(e) = self.compositor.render(surface, state) {
            warn!("fluid render: {e}");
        }
        self.schedule();
    }

    fn schedule(&mut self) {
        if self.pending.is_none() {
            self.pending = self.scheduler.request_step();
        }
    }

    pub fn pointer_down(&mut self, x: f32, y: f32) {
        self.pointer.reset(x, y);
    }

    pub fn pointer_move(&mut self, x: f32, y: f32) {
        self.apply_impulse(x, y);
    }

    /// Inject the displacement since the last pointer position at (x, y).
    /// The pointer position is recorded even when the point is cropped out.
    pub fn apply_impulse(&mut self, x: f32, y: f32) {
        let (dx, dy) = self.pointer.advance(x, y);
        let (Some(surface), Some(state)) = (self.surface.as_ref(), self.state.as_mut()) else {
            return;
        };
        let (w, h) = surface.display_size();
        let fit = map_display_to_grid(x, y, Rect::from_size(w, h), state.grid());
        if let Some((gx, gy)) = fit {
            state.apply_impulse(gx, gy, dx, dy, self.accent, &self.config);
        }
    }

    pub fn on_config_change(&mut self, field: ConfigField) {
        if field.requires_reseed() {
            self.setup();
        }
        // Slider drags can stall the loop; never let that show up as dt.
        self.last_time = self.clock.now();
    }

    /// Replace the live config, reseeding only if the detail level changed.
    pub fn set_config(&mut self, config: SimulationConfig) {
        let changed = self.config.changed_fields(&config);
        self.config = config;
        for field in changed {
            self.on_config_change(field);
        }
    }

    /// Replace the live config and reseed exactly once, whatever changed.
    pub fn restore_config(&mut self, config: SimulationConfig) {
        let reseeds = self.config.changed_fields(&config).iter().any(|f| f.requires_reseed());
        self.set_config(config);
        if !reseeds {
            self.setup();
        }
        self.last_time = self.clock.now();
    }

    /// Reseed after a viewport change, unless an overlay has the focus.
    pub fn on_resize(&mut self, overlay_active: bool) {
        if self.run_state == RunState::Running && !overlay_active {
            self.setup();
        }
    }

    /// New accent for subsequent impulses and reseeds.
    pub fn set_accent(&mut self, accent: Rgb) {
        self.accent = accent;
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn accent(&self) -> Rgb {
        self.accent
    }

    pub fn state(&self) -> Option<&FluidState> {
        self.state.as_ref()
    }

    pub fn state_mut(&mut self) -> Option<&mut FluidState> {
        self.state.as_mut()
    }

    pub fn pointer(&self) -> PointerState {
        self.pointer
    }

    pub fn run_state(&self) -> RunState {
        self.run_state
    }

    pub fn is_running(&self) -> bool {
        self.run_state == RunState::Running
    }

    pub fn pending_frame(&self) -> Option<FrameToken> {
        self.pending
    }

    pub fn surface(&self) -> Option<&S> {
        self.surface.as_ref()
    }

    pub fn surface_mut(&mut self) -> Option<&mut S> {
        self.surface.as_mut()
    }
}
