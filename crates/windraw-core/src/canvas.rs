//! Per-surface drawing context
//!
//! A [`Canvas`] owns everything acquired for drawing on one surface and gives
//! it back in exactly the reverse order:
//!
//! 1. optional off-screen double buffer
//! 2. target layout forced to left-to-right (the original flags are kept)
//! 3. backend drawing context
//! 4. cached backend resources
//! 5. base transform, with RTL compensation for right-to-left canvases
//!
//! A failure in any step unwinds the steps before it. [`Canvas::release`]
//! flushes the double buffer to the target, restores the target layout and
//! disposes of an owned target last.

use std::fmt;
use std::sync::Arc;

use crate::backend::{Backend, DrawContext};
use crate::error::{CanvasError, Result, WindrawError};
use crate::rtl::{PixelBias, RtlCompositor};
use crate::surface::{Surface, Target};
use crate::transform::Matrix;
use crate::types::{BackendKind, Color, IPoint, IRect, Layout, Point, Rect, Size};

/// Parameters of [`Canvas::new`].
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct CanvasOptions {
    /// Extent of the drawing area. The width is the mirroring axis of RTL
    /// canvases.
    pub size: Size,
    /// Draw into an off-screen buffer covering this rectangle of the target
    /// and copy it over at release.
    pub double_buffer: Option<IRect>,
    /// Mirror the canvas horizontally.
    pub rtl: bool,
}

impl CanvasOptions {
    pub fn new(size: Size) -> Self {
        Self {
            size,
            ..Default::default()
        }
    }

    pub fn double_buffered(mut self, area: IRect) -> Self {
        self.double_buffer = Some(area);
        self
    }

    pub fn rtl(mut self, rtl: bool) -> Self {
        self.rtl = rtl;
        self
    }
}

struct DoubleBuffer<S> {
    surface: S,
    /// Device rectangle of the target the buffer stands in for.
    area: IRect,
}

/// Places the requested buffer rectangle on the target. A mirrored target
/// counts x from its right edge. Any rectangle that is empty or whose device
/// coordinates leave the `i32` range is rejected.
fn buffer_area(rect: IRect, target_width: u32, mirrored: bool) -> Result<IRect> {
    let width = i64::from(rect.right) - i64::from(rect.left);
    let height = i64::from(rect.bottom) - i64::from(rect.top);
    let invalid = || CanvasError::InvalidBuffer { width, height };
    if width <= 0 || height <= 0 {
        return Err(invalid().into());
    }

    let x = if mirrored {
        i64::from(target_width) - i64::from(rect.right)
    } else {
        i64::from(rect.left)
    };
    let y = i64::from(rect.top);
    // the buffer origin is set to (-x, -y), so both ends must negate cleanly
    let fits = |v: i64| v > i64::from(i32::MIN) && v <= i64::from(i32::MAX);
    if !(fits(x) && fits(y) && fits(x + width) && fits(y + height)) {
        return Err(invalid().into());
    }
    Ok(IRect::new(
        x as i32,
        y as i32,
        (x + width) as i32,
        (y + height) as i32,
    ))
}

pub struct Canvas<'s, S: Surface> {
    backend: Arc<dyn Backend<S>>,
    target: Option<Target<'s, S>>,
    buffer: Option<DoubleBuffer<S>>,
    saved_layout: Option<Layout>,
    context: Option<Box<dyn DrawContext>>,
    bias: PixelBias,
    size: Size,
    user: Matrix,
    rtl: Option<RtlCompositor>,
    finished: bool,
}

impl<'s, S: Surface> Canvas<'s, S> {
    pub fn new(
        backend: Arc<dyn Backend<S>>,
        target: Target<'s, S>,
        options: CanvasOptions,
    ) -> Result<Self> {
        let bias = backend.pixel_bias();
        let mut canvas = Canvas {
            backend,
            target: Some(target),
            buffer: None,
            saved_layout: None,
            context: None,
            bias,
            size: options.size,
            user: Matrix::IDENTITY,
            rtl: options
                .rtl
                .then(|| RtlCompositor::new(options.size.width, bias)),
            finished: false,
        };

        if let Err(err) = canvas.allocate(options.double_buffer) {
            log::error!("Canvas allocation on {} failed: {}", canvas.backend.name(), err);
            if let Err(unwind_err) = canvas.unwind(false) {
                log::warn!("Unwinding the failed canvas: {}", unwind_err);
            }
            return Err(err);
        }

        log::debug!(
            "Created {} canvas {}x{}{}{}",
            canvas.backend.name(),
            options.size.width,
            options.size.height,
            if options.rtl { " rtl" } else { "" },
            if options.double_buffer.is_some() { " double-buffered" } else { "" }
        );
        Ok(canvas)
    }

    fn allocate(&mut self, double_buffer: Option<IRect>) -> Result<()> {
        let target = self.target.as_mut().ok_or(CanvasError::Released)?;

        if let Some(rect) = double_buffer {
            let area = buffer_area(rect, self.size.width, target.layout().is_rtl())?;
            let surface = target
                .create_buffer(Size::new(area.width() as u32, area.height() as u32))?;
            let buffer = self.buffer.insert(DoubleBuffer { surface, area });
            buffer.surface.set_layout(Layout::LEFT_TO_RIGHT)?;
            buffer.surface.set_origin(IPoint::new(-area.left, -area.top))?;
        }

        // Native RTL handling differs between engine versions; mirroring is
        // done by the installed transform instead.
        self.saved_layout = Some(target.set_layout(Layout::LEFT_TO_RIGHT)?);

        let (surface, bounds) = match &self.buffer {
            Some(buffer) => (&buffer.surface, buffer.area),
            None => (&**target, IRect::from_size(self.size)),
        };
        let context = self.context.insert(self.backend.create_context(surface, bounds)?);
        context.prepare()?;

        self.user = Matrix::IDENTITY;
        if self.rtl.is_some() {
            self.enable_rtl()
        } else {
            self.install()
        }
    }

    /// Gives back everything acquired, newest first. Every step runs even if
    /// an earlier one failed; the first error is returned.
    fn unwind(&mut self, commit: bool) -> Result<()> {
        self.finished = true;
        let mut first_err: Option<WindrawError> = None;
        let mut note = |step: &str, res: Result<()>| {
            if let Err(err) = res {
                log::error!("Canvas release: {} failed: {}", step, err);
                first_err.get_or_insert(err);
            }
        };

        drop(self.context.take());

        if let Some(buffer) = self.buffer.take() {
            if commit {
                if let Some(target) = self.target.as_mut() {
                    note("blit", target.blit(&buffer.surface, buffer.area));
                }
            }
            note("buffer dispose", buffer.surface.dispose());
        }

        if let Some(layout) = self.saved_layout.take() {
            if let Some(target) = self.target.as_mut() {
                note("layout restore", target.set_layout(layout).map(|_| ()));
            }
        }

        if let Some(Target::Owned(surface)) = self.target.take() {
            note("target dispose", surface.dispose());
        }

        first_err.map_or(Ok(()), Err)
    }

    /// Releases the canvas: the double buffer reaches the target and the
    /// target gets its original layout back.
    pub fn release(mut self) -> Result<()> {
        self.unwind(true)
    }

    fn context(&mut self) -> Result<&mut (dyn DrawContext + 'static)> {
        match self.context.as_deref_mut() {
            Some(context) => Ok(context),
            None => Err(CanvasError::Released.into()),
        }
    }

    /// Pushes `user` plus compensation to the backend.
    fn install(&mut self) -> Result<()> {
        let matrix = match &self.rtl {
            Some(rtl) if rtl.is_enabled() => rtl.compose(&self.user),
            _ => self.user.then(&self.bias.ltr_base()),
        };
        self.context()?.set_transform(&matrix)
    }

    pub fn backend_kind(&self) -> BackendKind {
        self.backend.kind()
    }

    pub fn size(&self) -> Size {
        self.size
    }

    /// Whether the canvas was created right-to-left.
    pub fn is_rtl(&self) -> bool {
        self.rtl.is_some()
    }

    pub fn is_rtl_enabled(&self) -> bool {
        self.rtl.as_ref().is_some_and(RtlCompositor::is_enabled)
    }

    /// Device rectangle of the target covered by the double buffer.
    pub fn buffer_area(&self) -> Option<IRect> {
        self.buffer.as_ref().map(|b| b.area)
    }

    pub fn begin_paint(&mut self) -> Result<()> {
        self.context()?.begin_paint()
    }

    pub fn end_paint(&mut self) -> Result<()> {
        self.context()?.end_paint()
    }

    /// The caller's transform, without any compensation.
    pub fn transform(&self) -> Matrix {
        self.user
    }

    /// The transform the backend actually holds.
    pub fn installed_transform(&self) -> Result<Matrix> {
        match self.context.as_deref() {
            Some(context) => context.transform(),
            None => Err(CanvasError::Released.into()),
        }
    }

    pub fn set_transform(&mut self, matrix: &Matrix) -> Result<()> {
        self.user = *matrix;
        if let Some(rtl) = self.rtl.as_mut().filter(|r| r.is_enabled()) {
            rtl.rebase(*matrix)?;
        }
        self.install()
    }

    /// Applies `matrix` before the current transform.
    pub fn apply_transform(&mut self, matrix: &Matrix) -> Result<()> {
        let combined = matrix.then(&self.user);
        self.set_transform(&combined)
    }

    /// Back to identity. RTL compensation stays as it is.
    pub fn reset_transform(&mut self) -> Result<()> {
        self.set_transform(&Matrix::IDENTITY)
    }

    pub fn translate(&mut self, dx: f32, dy: f32) -> Result<()> {
        self.apply_transform(&Matrix::translation(dx, dy))
    }

    pub fn scale(&mut self, sx: f32, sy: f32) -> Result<()> {
        self.apply_transform(&Matrix::scale(sx, sy))
    }

    pub fn rotate(&mut self, degrees: f32) -> Result<()> {
        self.apply_transform(&Matrix::rotation(degrees))
    }

    /// Installs the mirroring compensation on top of the current transform.
    pub fn enable_rtl(&mut self) -> Result<()> {
        let effective = self
            .rtl
            .as_mut()
            .ok_or(CanvasError::NotRtl)?
            .enable(self.user)?;

        if let Err(err) = self.context().and_then(|c| c.set_transform(&effective)) {
            if let Some(Err(rollback)) = self.rtl.as_mut().map(RtlCompositor::disable) {
                log::warn!("Rolling back RTL compensation: {}", rollback);
            }
            return Err(err);
        }
        Ok(())
    }

    /// Puts back the transform saved by [`enable_rtl`](Self::enable_rtl).
    pub fn disable_rtl(&mut self) -> Result<()> {
        self.user = self.rtl.as_mut().ok_or(CanvasError::NotRtl)?.disable()?;
        self.install()
    }

    /// Runs `f` with mirroring suspended, e.g. for text that lays itself out
    /// right-to-left. The suspended view cannot touch RTL state.
    pub fn without_rtl<T>(&mut self, f: impl FnOnce(Unmirrored<'_, 's, S>) -> T) -> Result<T> {
        let suspended = self.is_rtl_enabled();
        if suspended {
            self.disable_rtl()?;
        }
        let out = f(Unmirrored { canvas: self });
        if suspended {
            self.enable_rtl()?;
        }
        Ok(out)
    }

    pub fn set_clip(&mut self, rect: &Rect) -> Result<()> {
        self.context()?.set_clip(Some(rect))
    }

    pub fn reset_clip(&mut self) -> Result<()> {
        self.context()?.set_clip(None)
    }

    pub fn clear(&mut self, color: Color) -> Result<()> {
        self.context()?.clear(color)
    }

    pub fn fill_rect(&mut self, color: Color, rect: &Rect) -> Result<()> {
        self.context()?.fill_rect(color, rect)
    }

    pub fn draw_rect(&mut self, color: Color, rect: &Rect, width: f32) -> Result<()> {
        self.context()?.draw_rect(color, rect, width)
    }

    pub fn draw_line(&mut self, color: Color, from: Point, to: Point, width: f32) -> Result<()> {
        self.context()?.draw_line(color, from, to, width)
    }
}

impl<S: Surface> Drop for Canvas<'_, S> {
    fn drop(&mut self) {
        if !self.finished {
            log::warn!("Canvas dropped without release()");
            if let Err(err) = self.unwind(true) {
                log::error!("Releasing dropped canvas: {}", err);
            }
        }
    }
}

impl<S: Surface> fmt::Debug for Canvas<'_, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Canvas")
            .field("backend", &self.backend.kind())
            .field("size", &self.size)
            .field("rtl", &self.rtl)
            .field("buffer_area", &self.buffer_area())
            .field("transform", &self.user)
            .finish_non_exhaustive()
    }
}

/// Drawing view of a canvas while mirroring is suspended.
pub struct Unmirrored<'c, 's, S: Surface> {
    canvas: &'c mut Canvas<'s, S>,
}

impl<S: Surface> Unmirrored<'_, '_, S> {
    pub fn transform(&self) -> Matrix {
        self.canvas.transform()
    }

    pub fn clear(&mut self, color: Color) -> Result<()> {
        self.canvas.clear(color)
    }

    pub fn fill_rect(&mut self, color: Color, rect: &Rect) -> Result<()> {
        self.canvas.fill_rect(color, rect)
    }

    pub fn draw_rect(&mut self, color: Color, rect: &Rect, width: f32) -> Result<()> {
        self.canvas.draw_rect(color, rect, width)
    }

    pub fn draw_line(&mut self, color: Color, from: Point, to: Point, width: f32) -> Result<()> {
        self.canvas.draw_line(color, from, to, width)
    }
}
