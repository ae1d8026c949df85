//! windraw core: one drawing API over Direct2D or GDI+
//!
//! The backend is picked at runtime. Everything here is platform independent;
//! the native pieces live in the backend crates and plug in through three
//! traits:
//!
//! - [`Surface`] - a device context with a layout flag and off-screen buffers
//! - [`Backend`] / [`DrawContext`] - a rendering engine and its per-canvas state
//! - [`Platform`] - probing, module setup and backend lookup for a host
//!
//! ## Lifecycle
//!
//! ```text
//! Runtime::acquire(core | text)     init hooks run on 0 -> 1
//!   Runtime::create_canvas(...)     buffer, layout, context, resources, transform
//!     draw, transform, clip, rtl
//!   Canvas::release()               everything above, in reverse
//! Runtime::release(core | text)     fini hooks run on 1 -> 0
//! ```
//!
//! ## Right-to-left canvases
//!
//! The canvas forces its surface to left-to-right and mirrors through the
//! installed transform, see [`rtl`]. Text that lays itself out right-to-left
//! is drawn inside [`Canvas::without_rtl`].

pub mod backend;
pub mod canvas;
pub mod config;
pub mod error;
pub mod lifecycle;
pub mod loader;
pub mod probe;
pub mod rtl;
pub mod runtime;
pub mod surface;
pub mod transform;
pub mod types;

pub use backend::{Backend, DrawContext};
pub use canvas::{Canvas, CanvasOptions, Unmirrored};
pub use config::{BackendPreference, Config};
pub use error::{CanvasError, LoadError, Result, WindrawError};
pub use lifecycle::{Lifecycle, Module, ModuleHooks, ModuleSet};
pub use loader::{FunctionTable, Library, LibraryProvider, LoadedLibrary, SymbolSource};
pub use probe::Probe;
pub use rtl::{PixelBias, RtlCompositor};
pub use runtime::{Platform, PlatformHooks, Runtime, Session};
pub use surface::{Surface, Target};
pub use transform::Matrix;
pub use types::{BackendKind, Color, IPoint, IRect, Layout, Point, Rect, Size};
