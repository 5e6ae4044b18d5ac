//! Pointer-driven fluid backdrop.
//!
//! A low-resolution grid carries a velocity field and an RGBA color field.
//! Each frame the velocity is diffused and given back some swirl through
//! vorticity confinement, the color is advected semi-Lagrangian style and
//! fades, and the result is scaled over the page with a cover fit. Pointer
//! motion splats velocity and accent color into the grid.

pub mod color;
pub mod config;
pub mod error;
pub mod field;
pub mod fit;
pub mod grid;
pub mod inject;
pub mod lifecycle;
pub mod render;
pub mod step;

#[cfg(target_arch = "wasm32")]
pub mod web;

pub use color::{ parse_css_color, Rgb, DEFAULT_ACCENT };
pub use config::{ load_config, reset_config, save_config, ConfigField, ConfigStore, SimulationConfig };
pub use error::{ FluidError, Result };
pub use field::FluidState;
pub use fit::{ map_display_to_grid, CoverFit, Rect };
pub use grid::{ compute_grid, detail_to_cell_size, GridDimensions };
pub use inject::PointerState;
pub use lifecycle::{ Clock, Controller, FrameScheduler, FrameToken, RunState };
pub use render::{ Compositor, RenderSurface };
pub use step::{ sanitize_dt, MAX_DT };

#[cfg(target_arch = "wasm32")]
pub use web::FluidBackdrop;
