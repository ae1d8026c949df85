//! Legacy windraw backend on top of GDI+
//!
//! GDIPLUS.DLL is not linked. Its entry points are bound at runtime into a
//! [`GdiplusApi`] table by the windraw loader, so a missing or incomplete DLL
//! only disables this backend.

#![cfg(windows)]
#![allow(unsafe_code)]

mod api;
mod backend;

pub use api::{GdiplusApi, Status, GDIPLUS_DLL};
pub use backend::{GdiplusBackend, GdiplusContext};

use std::sync::Arc;

use windraw_core::{loader, LoadedLibrary, Result};
use windraw_gdi::{SystemLibraries, SystemLibrary};

/// A started GDI+ with its bound entry points.
pub type Gdiplus = LoadedLibrary<GdiplusApi, SystemLibrary>;

/// Binds and starts GDI+.
pub fn load(bundled_fallback: bool) -> Result<Arc<Gdiplus>> {
    let provider = SystemLibraries::new(bundled_fallback);
    let gdiplus = loader::load::<GdiplusApi, _>(&provider, GDIPLUS_DLL)?;
    log::info!("GDI+ bound from {}", gdiplus.library_name());
    Ok(Arc::new(gdiplus))
}

/// Whether GDI+ can be bound and started here.
pub fn probe(bundled_fallback: bool) -> bool {
    match load(bundled_fallback) {
        Ok(_) => true,
        Err(err) => {
            log::debug!("GDI+ unavailable: {}", err);
            false
        }
    }
}
