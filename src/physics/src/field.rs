use crate::color::Rgb;
use crate::grid::GridDimensions;

/// Peak alpha of the seeded glow at the grid center.
const SEED_ALPHA: f32 = 140.0;
/// Glow radius falloff; alpha reaches 0 at normalized distance 1/2.4.
const SEED_FALLOFF: f32 = 2.4;

/// Velocity and color fields for one simulation instance.
///
/// Each field has a second buffer of the same length. A step reads the
/// current buffers, writes the `new_*` ones, then swaps, so neighborhood
/// sampling never sees half-updated values.
pub struct FluidState {
    pub(crate) grid: GridDimensions,
    /// Velocity in grid cells per step.
    pub(crate) vx: Vec<f32>,
    pub(crate) vy: Vec<f32>,
    /// RGBA per cell.
    pub(crate) color: Vec<u8>,
    pub(crate) new_vx: Vec<f32>,
    pub(crate) new_vy: Vec<f32>,
    pub(crate) new_color: Vec<u8>,
    /// Scratch vorticity, rewritten every step.
    pub(crate) omega: Vec<f32>,
}

impl FluidState {
    /// Allocate a fresh state: zero velocity, accent-colored radial glow.
    pub fn new(grid: GridDimensions, accent: Rgb) -> FluidState {
        let n = grid.num_cells();
        FluidState {
            grid,
            vx: vec![0.0; n],
            vy: vec![0.0; n],
            color: seed_color(grid, accent),
            new_vx: vec![0.0; n],
            new_vy: vec![0.0; n],
            new_color: vec![0; n * 4],
            omega: vec![0.0; n],
        }
    }

    /// Empty state with a fully transparent black color field.
    pub fn transparent(grid: GridDimensions) -> FluidState {
        let mut state = FluidState::new(grid, Rgb::default());
        state.color.fill(0);
        state
    }

    pub fn grid(&self) -> GridDimensions {
        self.grid
    }

    pub fn vx(&self) -> &[f32] {
        &self.vx
    }

    pub fn vy(&self) -> &[f32] {
        &self.vy
    }

    /// RGBA bytes, row-major, `cols * rows * 4` long.
    pub fn color(&self) -> &[u8] {
        &self.color
    }

    pub fn velocity_at(&self, x: usize, y: usize) -> (f32, f32) {
        let k = self.grid.idx(x, y);
        (self.vx[k], self.vy[k])
    }

    pub fn rgba_at(&self, x: usize, y: usize) -> [u8; 4] {
        let di = self.grid.idx(x, y) * 4;
        [self.color[di], self.color[di + 1], self.color[di + 2], self.color[di + 3]]
    }

    pub fn set_velocity(&mut self, x: usize, y: usize, vx: f32, vy: f32) {
        let k = self.grid.idx(x, y);
        self.vx[k] = vx;
        self.vy[k] = vy;
    }

    pub fn set_rgba(&mut self, x: usize, y: usize, rgba: [u8; 4]) {
        let di = self.grid.idx(x, y) * 4;
        self.color[di..di + 4].copy_from_slice(&rgba);
    }

    pub(crate) fn swap_buffers(&mut self) {
        std::mem::swap(&mut self.vx, &mut self.new_vx);
        std::mem::swap(&mut self.vy, &mut self.new_vy);
        std::mem::swap(&mut self.color, &mut self.new_color);
    }
}

fn seed_color(grid: GridDimensions, accent: Rgb) -> Vec<u8> {
    let (w, h) = (grid.cols, grid.rows);
    let mut color = vec![0u8; w * h * 4];
    for y in 0..h {
        for x in 0..w {
            let dx = (x as f32 + 0.5) / w as f32 - 0.5;
            let dy = (y as f32 + 0.5) / h as f32 - 0.5;
            let a = (1.0 - dx.hypot(dy) * SEED_FALLOFF).max(0.0);
            let di = grid.idx(x, y) * 4;
            color[di] = accent.r;
            color[di + 1] = accent.g;
            color[di + 2] = accent.b;
            color[di + 3] = (SEED_ALPHA * a).floor() as u8;
        }
    }
    color
}
