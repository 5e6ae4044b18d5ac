use crate::color::{ clamp_byte, Rgb };
use crate::config::SimulationConfig;
use crate::field::FluidState;

/// Impulse kernel radius in cells.
pub const IMPULSE_RADIUS: i32 = 3;
const RADIUS_EPS: f32 = 0.001;
/// Velocity gain at flow = 100.
const MAX_FLOW_GAIN: f32 = 0.18;
/// Color blend weight at the kernel center.
const COLOR_MIX: f32 = 0.35;
/// Alpha added at the kernel center.
const ALPHA_BOOST: f32 = 34.0;

/// Last pointer position in display space.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PointerState {
    pub x: f32,
    pub y: f32,
}

impl PointerState {
    /// Forget the previous position so the next move starts from here.
    pub fn reset(&mut self, x: f32, y: f32) {
        self.x = x;
        self.y = y;
    }

    /// Record a new position and return the displacement since the last one.
    pub fn advance(&mut self, x: f32, y: f32) -> (f32, f32) {
        let delta = (x - self.x, y - self.y);
        self.reset(x, y);
        delta
    }
}

impl FluidState {
    /// Splat a displacement-driven impulse around grid position (gx, gy).
    ///
    /// Every cell within `IMPULSE_RADIUS` of the containing cell gains
    /// velocity along (dx, dy), is pulled toward `color` and brightens, all
    /// weighted by a linear falloff. Cells off the grid are skipped.
    pub fn apply_impulse(&mut self, gx: f32, gy: f32, dx: f32, dy: f32, color: Rgb, config: &SimulationConfig) {
        let cx = gx.floor() as i32;
        let cy = gy.floor() as i32;
        let flow = (config.flow / 100.0) * MAX_FLOW_GAIN;
        let tint = color.channels();
        let r = IMPULSE_RADIUS;

        for j in -r..=r {
            for i in -r..=r {
                let (x, y) = (cx + i, cy + j);
                if !self.grid.contains(x, y) {
                    continue;
                }
                let fall = 1.0 - ((i as f32).hypot(j as f32) / (r as f32 + RADIUS_EPS)).min(1.0);
                if fall <= 0.0 {
                    continue;
                }
                let k = self.grid.idx(x as usize, y as usize);
                self.vx[k] += dx * flow * fall;
                self.vy[k] += dy * flow * fall;

                let di = k * 4;
                let mix = COLOR_MIX * fall;
                for c in 0..3 {
                    let old = self.color[di + c] as f32;
                    self.color[di + c] = clamp_byte(old * (1.0 - mix) + tint[c] as f32 * mix);
                }
                let alpha = self.color[di + 3] as f32 + (ALPHA_BOOST * fall).floor();
                self.color[di + 3] = clamp_byte(alpha);
            }
        }
    }
}
