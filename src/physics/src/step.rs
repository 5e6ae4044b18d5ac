//! Per-frame update of a `FluidState`.
//!
//! All stages read the fields as they were at the start of the step and
//! write the spare buffers; the swap at the end publishes both fields at
//! once. Diffusion and advection therefore do not see each other's output.
//! That is intentionally diffusion-heavy and defines the look of the effect.

use crate::color::clamp_byte;
use crate::config::SimulationConfig;
use crate::field::FluidState;

/// Upper bound on a single step, seconds.
pub const MAX_DT: f32 = 0.05;
/// Backtrace distance as a fraction of the cell velocity.
const ADVECT_SCALE: f32 = 0.5;
/// Clamp margin keeping bilinear taps inside the grid.
const EDGE_MARGIN: f32 = 1.001;
/// Alpha removed from every cell per step.
const ALPHA_DECAY: u8 = 1;

/// Clamp elapsed time into `[0, MAX_DT]`; negative or NaN means no time passed.
pub fn sanitize_dt(dt: f32) -> f32 {
    if dt.is_nan() || dt <= 0.0 {
        0.0
    } else {
        dt.min(MAX_DT)
    }
}

impl FluidState {
    /// Advance one frame. `dt` is wall-clock seconds since the previous step.
    pub fn step(&mut self, config: &SimulationConfig, dt: f32) {
        let dt = sanitize_dt(dt);
        self.compute_vorticity();
        self.advect_and_diffuse(config);
        self.confine_vorticity(config, dt);
        self.decay_alpha();
        self.swap_buffers();
    }

    /// Curl of the old velocity field on interior cells; the border is zero.
    fn compute_vorticity(&mut self) {
        let (w, h) = (self.grid.cols, self.grid.rows);
        self.omega.fill(0.0);
        for y in 1..h.saturating_sub(1) {
            for x in 1..w.saturating_sub(1) {
                let k = y * w + x;
                let dvx_dy = (self.vx[k + w] - self.vx[k - w]) * 0.5;
                let dvy_dx = (self.vy[k + 1] - self.vy[k - 1]) * 0.5;
                self.omega[k] = dvy_dx - dvx_dy;
            }
        }
    }

    /// Semi-Lagrangian color transport plus box-filter velocity diffusion.
    fn advect_and_diffuse(&mut self, config: &SimulationConfig) {
        let (w, h) = (self.grid.cols, self.grid.rows);
        let damp = 0.96 + (config.inertia / 100.0) * 0.04;
        let max_x = w as f32 - EDGE_MARGIN;
        let max_y = h as f32 - EDGE_MARGIN;

        for y in 0..h {
            for x in 0..w {
                let k = y * w + x;

                let px = (x as f32 - self.vx[k] * ADVECT_SCALE).max(0.0).min(max_x);
                let py = (y as f32 - self.vy[k] * ADVECT_SCALE).max(0.0).min(max_y);
                let x0 = px.floor() as usize;
                let y0 = py.floor() as usize;
                let x1 = (x0 + 1).min(w - 1);
                let y1 = (y0 + 1).min(h - 1);
                let sx = px - x0 as f32;
                let sy = py - y0 as f32;

                let i00 = (y0 * w + x0) * 4;
                let i10 = (y0 * w + x1) * 4;
                let i01 = (y1 * w + x0) * 4;
                let i11 = (y1 * w + x1) * 4;
                let di = k * 4;
                for c in 0..4 {
                    let v0 = self.color[i00 + c] as f32 * (1.0 - sx) + self.color[i10 + c] as f32 * sx;
                    let v1 = self.color[i01 + c] as f32 * (1.0 - sx) + self.color[i11 + c] as f32 * sx;
                    self.new_color[di + c] = clamp_byte(v0 * (1.0 - sy) + v1 * sy);
                }

                let mut sum_x = 0.0;
                let mut sum_y = 0.0;
                let mut count = 0u32;
                for yy in y.saturating_sub(1)..=(y + 1).min(h - 1) {
                    for xx in x.saturating_sub(1)..=(x + 1).min(w - 1) {
                        let kk = yy * w + xx;
                        sum_x += self.vx[kk];
                        sum_y += self.vy[kk];
                        count += 1;
                    }
                }
                let norm = damp / count.max(1) as f32;
                self.new_vx[k] = sum_x * norm;
                self.new_vy[k] = sum_y * norm;
            }
        }
    }

    /// Push velocity perpendicular to the |ω| gradient to restore swirl
    /// lost to diffusion. Scaled by `dt * 60` to stay frame-rate neutral.
    fn confine_vorticity(&mut self, config: &SimulationConfig, dt: f32) {
        let (w, h) = (self.grid.cols, self.grid.rows);
        let eps_v = (10.0 + config.swirl * 0.25) / (w.max(h) as f32).max(40.0);
        let gain = eps_v * dt * 60.0;

        for y in 1..h.saturating_sub(1) {
            for x in 1..w.saturating_sub(1) {
                let k = y * w + x;
                let dw_dx = (self.omega[k + 1].abs() - self.omega[k - 1].abs()) * 0.5;
                let dw_dy = (self.omega[k + w].abs() - self.omega[k - w].abs()) * 0.5;
                let mag = dw_dx.hypot(dw_dy) + 1e-6;
                let nx = dw_dx / mag;
                let ny = dw_dy / mag;
                let wv = self.omega[k];
                self.new_vx[k] += ny * wv * gain;
                self.new_vy[k] += -nx * wv * gain;
            }
        }
    }

    fn decay_alpha(&mut self) {
        for a in self.new_color.iter_mut().skip(3).step_by(4) {
            *a = a.saturating_sub(ALPHA_DECAY);
        }
    }
}
