use serde::{ Serialize, Deserialize };

pub const MIN_COLS: usize = 40;
pub const MAX_COLS: usize = 260;
pub const MIN_ROWS: usize = 30;
pub const MAX_ROWS: usize = 220;

/// Simulation grid size in cells.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct GridDimensions {
    pub cols: usize,
    pub rows: usize,
}

impl GridDimensions {
    pub fn new(cols: usize, rows: usize) -> Self {
        Self { cols, rows }
    }

    pub fn num_cells(&self) -> usize {
        self.cols * self.rows
    }

    /// Row-major index of cell (x, y).
    #[inline]
    pub fn idx(&self, x: usize, y: usize) -> usize {
        y * self.cols + x
    }

    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && (x as usize) < self.cols && (y as usize) < self.rows
    }
}

/// Display pixels covered by one grid cell at a given detail level.
pub fn detail_to_cell_size(detail_level: u32) -> f32 {
    match detail_level {
        0 | 1 => 26.0,
        2 => 20.0,
        3 => 16.0,
        _ => 12.0,
    }
}

/// Map a viewport size and detail level to grid dimensions.
pub fn compute_grid(viewport_w: f32, viewport_h: f32, detail_level: u32) -> GridDimensions {
    let cell = detail_to_cell_size(detail_level);
    GridDimensions {
        cols: cells_along(viewport_w, cell, MIN_COLS, MAX_COLS),
        rows: cells_along(viewport_h, cell, MIN_ROWS, MAX_ROWS),
    }
}

fn cells_along(extent: f32, cell: f32, min: usize, max: usize) -> usize {
    // NaN and negative extents saturate to 0 and land on the minimum.
    let n = (extent / cell).floor().max(0.0) as usize;
    n.clamp(min, max)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_size_table() {
        assert_eq!(detail_to_cell_size(1), 26.0);
        assert_eq!(detail_to_cell_size(2), 20.0);
        assert_eq!(detail_to_cell_size(3), 16.0);
        assert_eq!(detail_to_cell_size(4), 12.0);
        assert_eq!(detail_to_cell_size(9), 12.0);
    }

    #[test]
    fn test_compute_grid_typical_viewport() {
        let g = compute_grid(1920.0, 1080.0, 3);
        assert_eq!(g, GridDimensions::new(120, 67));
    }

    #[test]
    fn test_compute_grid_bounds_all_levels() {
        let viewports = [(0.0, 0.0), (320.0, 568.0), (1920.0, 1080.0), (7680.0, 4320.0)];
        for &(w, h) in &viewports {
            for level in 1..=10 {
                let g = compute_grid(w, h, level);
                assert!(
                    (MIN_COLS..=MAX_COLS).contains(&g.cols),
                    "cols {} out of range for {}x{} level {}",
                    g.cols, w, h, level
                );
                assert!(
                    (MIN_ROWS..=MAX_ROWS).contains(&g.rows),
                    "rows {} out of range for {}x{} level {}",
                    g.rows, w, h, level
                );
            }
        }
    }

    #[test]
    fn test_cell_count_non_increasing_as_detail_drops() {
        for &(w, h) in &[(800.0, 600.0), (1920.0, 1080.0), (2560.0, 1440.0)] {
            let mut prev = usize::MAX;
            for level in (1..=10).rev() {
                let n = compute_grid(w, h, level).num_cells();
                assert!(n <= prev, "level {} has {} cells, more than level above ({})", level, n, prev);
                prev = n;
            }
        }
    }

    #[test]
    fn test_compute_grid_degenerate_viewport() {
        assert_eq!(compute_grid(f32::NAN, -10.0, 3), GridDimensions::new(MIN_COLS, MIN_ROWS));
    }

    #[test]
    fn test_idx_row_major() {
        let g = GridDimensions::new(100, 60);
        assert_eq!(g.idx(0, 0), 0);
        assert_eq!(g.idx(1, 0), 1);
        assert_eq!(g.idx(0, 1), 100);
        assert_eq!(g.idx(99, 59), g.num_cells() - 1);
    }

    #[test]
    fn test_contains() {
        let g = GridDimensions::new(40, 30);
        assert!(g.contains(0, 0));
        assert!(g.contains(39, 29));
        assert!(!g.contains(-1, 0));
        assert!(!g.contains(40, 0));
        assert!(!g.contains(0, 30));
    }
}
