//! windraw: one drawing API over Direct2D or GDI+
//!
//! This crate re-exports [`windraw_core`] and, on Windows, wires the native
//! backends into a [`NativePlatform`]:
//!
//! ```ignore
//! let runtime = windraw::runtime()?;
//! let _session = runtime.session(ModuleSet::TEXT_LAYOUT)?;
//! let mut surface = DcSurface::for_window(hwnd)?;
//! let mut canvas = runtime.create_canvas(
//!     Target::Owned(surface),
//!     CanvasOptions::new(size).double_buffered(dirty).rtl(is_rtl),
//! )?;
//! canvas.begin_paint()?;
//! canvas.clear(Color::rgb(255, 255, 255))?;
//! canvas.end_paint()?;
//! canvas.release()?;
//! ```
//!
//! Elsewhere only the platform independent core is available.

pub use windraw_core::*;

#[cfg(windows)]
mod platform;

#[cfg(windows)]
pub use platform::{runtime, NativePlatform, NativeRuntime};
#[cfg(windows)]
pub use windraw_gdi::DcSurface;
#[cfg(windows)]
pub use {windraw_d2d as d2d, windraw_gdiplus as gdiplus};
