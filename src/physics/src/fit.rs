//! Cover-fit mapping between the display surface and the simulation grid.
//!
//! The grid is scaled uniformly until it covers the whole surface and the
//! overflow is cropped equally on both sides. Rendering uses the forward
//! direction, pointer input the inverse.

use serde::{ Serialize, Deserialize };

use crate::grid::GridDimensions;

#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self { x, y, width, height }
    }

    pub fn from_size(width: f32, height: f32) -> Self {
        Self::new(0.0, 0.0, width, height)
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CoverFit {
    /// Display pixels per grid cell.
    pub scale: f32,
    /// Where grid origin lands on the surface; negative when cropped.
    pub offset_x: f32,
    pub offset_y: f32,
    surface_w: f32,
    surface_h: f32,
    grid: GridDimensions,
}

impl CoverFit {
    pub fn new(surface_w: f32, surface_h: f32, grid: GridDimensions) -> Self {
        let cols = grid.cols as f32;
        let rows = grid.rows as f32;
        let scale = (surface_w / cols).max(surface_h / rows);
        Self {
            scale,
            offset_x: (surface_w - cols * scale) * 0.5,
            offset_y: (surface_h - rows * scale) * 0.5,
            surface_w,
            surface_h,
            grid,
        }
    }

    /// Grid coordinates (in cells, fractional) to surface coordinates.
    pub fn grid_to_display(&self, gx: f32, gy: f32) -> (f32, f32) {
        (self.offset_x + gx * self.scale, self.offset_y + gy * self.scale)
    }

    /// Surface coordinates to fractional grid coordinates, or `None` when the
    /// point is off the surface or lands outside the grid.
    pub fn display_to_grid(&self, x: f32, y: f32) -> Option<(f32, f32)> {
        if !(self.scale.is_finite() && self.scale > 0.0) {
            return None;
        }
        // Cropped cells lie beyond the surface edge and are never visible.
        let on_surface = x >= 0.0 && y >= 0.0 && x < self.surface_w && y < self.surface_h;
        if !on_surface {
            return None;
        }
        let gx = (x - self.offset_x) / self.scale;
        let gy = (y - self.offset_y) / self.scale;
        let inside = gx >= 0.0
            && gy >= 0.0
            && gx < self.grid.cols as f32
            && gy < self.grid.rows as f32;
        inside.then_some((gx, gy))
    }

    /// Destination rectangle for blitting the whole grid.
    pub fn dest_rect(&self) -> Rect {
        Rect::new(
            self.offset_x,
            self.offset_y,
            self.grid.cols as f32 * self.scale,
            self.grid.rows as f32 * self.scale,
        )
    }
}

/// Map a display-space point to grid coordinates through `surface`'s cover fit.
pub fn map_display_to_grid(x: f32, y: f32, surface: Rect, grid: GridDimensions) -> Option<(f32, f32)> {
    CoverFit::new(surface.width, surface.height, grid).display_to_grid(x - surface.x, y - surface.y)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_exact_aspect_has_no_offset() {
        let fit = CoverFit::new(1000.0, 600.0, GridDimensions::new(100, 60));
        assert_relative_eq!(fit.scale, 10.0);
        assert_relative_eq!(fit.offset_x, 0.0);
        assert_relative_eq!(fit.offset_y, 0.0);
    }

    #[test]
    fn test_wide_surface_crops_vertically() {
        // 2000/100 = 20 beats 600/60 = 10, so rows overflow.
        let fit = CoverFit::new(2000.0, 600.0, GridDimensions::new(100, 60));
        assert_relative_eq!(fit.scale, 20.0);
        assert_relative_eq!(fit.offset_x, 0.0);
        assert_relative_eq!(fit.offset_y, -300.0);
        let r = fit.dest_rect();
        assert_relative_eq!(r.width, 2000.0);
        assert_relative_eq!(r.height, 1200.0);
    }

    #[test]
    fn test_cropped_margin_is_out_of_bounds() {
        let grid = GridDimensions::new(100, 60);
        // Tall surface: scale = 900/60 = 15, width 1500 > 600, crop 450 each side.
        let fit = CoverFit::new(600.0, 900.0, grid);
        assert_relative_eq!(fit.offset_x, -450.0);
        let (gx, gy) = fit.display_to_grid(0.0, 450.0).unwrap();
        assert_relative_eq!(gx, 30.0);
        assert_relative_eq!(gy, 30.0);
        assert!(fit.display_to_grid(599.0, 450.0).is_some());
        // These land on real grid cells, but in the cropped strip.
        assert!(fit.display_to_grid(-1.0, 450.0).is_none());
        assert!(fit.display_to_grid(-400.0, 450.0).is_none());
        assert!(fit.display_to_grid(600.0, 450.0).is_none());
        assert!(fit.display_to_grid(300.0, 900.5).is_none());
    }

    #[test]
    fn test_map_display_rejects_points_left_of_surface() {
        let grid = GridDimensions::new(100, 60);
        let surface = Rect::from_size(600.0, 900.0);
        assert!(map_display_to_grid(-400.0, 450.0, surface, grid).is_none());
        assert!(map_display_to_grid(-1.0, 450.0, surface, grid).is_none());
        assert!(map_display_to_grid(1.0, 450.0, surface, grid).is_some());
    }

    #[test]
    fn test_round_trip_cell_centers() {
        let grid = GridDimensions::new(120, 67);
        let fit = CoverFit::new(1920.0, 1080.0, grid);
        for &(cx, cy) in &[(0usize, 0usize), (60, 33), (119, 66), (7, 50)] {
            let (x, y) = fit.grid_to_display(cx as f32 + 0.5, cy as f32 + 0.5);
            // 1080/67 wins, so only columns are cropped, by about 7px a side.
            assert!(x >= 0.0 && x < 1920.0 && y >= 0.0 && y < 1080.0);
            let (gx, gy) = fit
                .display_to_grid(x, y)
                .unwrap_or_else(|| panic!("visible cell ({}, {}) did not map back", cx, cy));
            assert_eq!(gx.floor() as usize, cx);
            assert_eq!(gy.floor() as usize, cy);
        }
    }

    #[test]
    fn test_map_display_respects_surface_origin() {
        let grid = GridDimensions::new(100, 60);
        let surface = Rect::new(50.0, 20.0, 1000.0, 600.0);
        let (gx, gy) = map_display_to_grid(555.0, 325.0, surface, grid).unwrap();
        assert_relative_eq!(gx, 50.5);
        assert_relative_eq!(gy, 30.5);
        assert!(map_display_to_grid(10.0, 325.0, surface, grid).is_none());
    }

    #[test]
    fn test_zero_surface_maps_nothing() {
        let fit = CoverFit::new(0.0, 0.0, GridDimensions::new(40, 30));
        assert!(fit.display_to_grid(0.0, 0.0).is_none());
    }
}
