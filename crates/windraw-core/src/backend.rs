//! Backend abstraction
//!
//! A [`Backend`] is selected once per runtime and shared by every canvas. Each
//! canvas gets its own [`DrawContext`] that talks to the native engine. The
//! context never sees RTL state; the canvas installs ready-made transforms.

use crate::error::Result;
use crate::rtl::PixelBias;
use crate::surface::Surface;
use crate::transform::Matrix;
use crate::types::{BackendKind, Color, IRect, Point, Rect};

/// A native rendering engine.
pub trait Backend<S: Surface>: Send + Sync {
    fn kind(&self) -> BackendKind;

    fn name(&self) -> &'static str {
        self.kind().name()
    }

    /// Device-space correction applied on top of every installed transform.
    fn pixel_bias(&self) -> PixelBias;

    /// Binds a drawing context to `target`. `bounds` is the device area the
    /// context covers.
    fn create_context(&self, target: &S, bounds: IRect) -> Result<Box<dyn DrawContext>>;
}

/// Per-canvas drawing state of a backend. Dropping it releases every native
/// resource it holds.
pub trait DrawContext {
    /// Allocates the resources reused across draw calls.
    fn prepare(&mut self) -> Result<()> {
        Ok(())
    }

    fn begin_paint(&mut self) -> Result<()> {
        Ok(())
    }

    /// Flushes pending drawing. [`WindrawError::RecreateTarget`] means the
    /// device was lost and the canvas must be created again.
    ///
    /// [`WindrawError::RecreateTarget`]: crate::error::WindrawError::RecreateTarget
    fn end_paint(&mut self) -> Result<()> {
        Ok(())
    }

    fn transform(&self) -> Result<Matrix>;

    fn set_transform(&mut self, matrix: &Matrix) -> Result<()>;

    /// Limits drawing to `clip` in current world coordinates, or lifts the
    /// limit.
    fn set_clip(&mut self, clip: Option<&Rect>) -> Result<()>;

    fn clear(&mut self, color: Color) -> Result<()>;

    fn fill_rect(&mut self, color: Color, rect: &Rect) -> Result<()>;

    fn draw_rect(&mut self, color: Color, rect: &Rect, width: f32) -> Result<()>;

    fn draw_line(&mut self, color: Color, from: Point, to: Point, width: f32) -> Result<()>;
}
