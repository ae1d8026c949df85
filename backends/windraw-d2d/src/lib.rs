//! Modern windraw backend on top of Direct2D
//!
//! `d2d1.dll` and `dwrite.dll` are bound at runtime through the windraw
//! loader, so systems without them fall back to GDI+ instead of failing to
//! start. Per-module factories live in [`D2dModules`]:
//!
//! | module | factory |
//! |---|---|
//! | core | `ID2D1Factory` |
//! | image codec | `IWICImagingFactory` |
//! | text layout | `IDWriteFactory` |

#![cfg(windows)]
#![allow(unsafe_code)]

mod api;
mod backend;
mod modules;

pub use api::{D2d1Api, DWriteApi, D2D1_DLL, DWRITE_DLL};
pub use backend::{D2dBackend, D2dContext};
pub use modules::{probe, D2dModules};

use windraw_core::WindrawError;

/// Maps a failed COM call.
pub(crate) fn hresult(call: &'static str) -> impl FnOnce(windows::core::Error) -> WindrawError {
    move |err| {
        log::error!("{} failed: {}", call, err);
        WindrawError::native(call, err.code().0)
    }
}
