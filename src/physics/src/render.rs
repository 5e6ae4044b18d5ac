use crate::error::Result;
use crate::field::FluidState;
use crate::fit::{ CoverFit, Rect };
use crate::grid::GridDimensions;

/// Host drawing surface: a full-resolution display target plus a low-res
/// source raster the color field is uploaded into.
pub trait RenderSurface {
    /// Display size in the coordinate space pointer events arrive in.
    fn display_size(&self) -> (f32, f32);
    fn resize_source(&mut self, cols: u32, rows: u32) -> Result<()>;
    fn write_source(&mut self, rgba: &[u8], cols: u32, rows: u32) -> Result<()>;
    /// Blit the source raster into `dest` with bilinear filtering.
    fn draw_source(&mut self, dest: Rect) -> Result<()>;
    /// Clear the whole display in device coordinates, ignoring any transform.
    fn clear(&mut self) -> Result<()>;
}

/// Uploads the color field and scales it over the display.
#[derive(Default)]
pub struct Compositor {
    source: Option<GridDimensions>,
}

impl Compositor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cover fit for the surface's current size.
    pub fn fit<S: RenderSurface>(surface: &S, grid: GridDimensions) -> CoverFit {
        let (w, h) = surface.display_size();
        CoverFit::new(w, h, grid)
    }

    pub fn render<S: RenderSurface>(&mut self, surface: &mut S, state: &FluidState) -> Result<()> {
        let grid = state.grid();
        let (cols, rows) = (grid.cols as u32, grid.rows as u32);
        if self.source != Some(grid) {
            surface.resize_source(cols, rows)?;
            self.source = Some(grid);
        }
        surface.write_source(state.color(), cols, rows)?;
        let dest = Self::fit(surface, grid).dest_rect();
        // Translucent pixels would accumulate without a full clear.
        surface.clear()?;
        surface.draw_source(dest)
    }

    /// Forget the source size so the next render resizes it.
    pub fn invalidate(&mut self) {
        self.source = None;
    }
}
