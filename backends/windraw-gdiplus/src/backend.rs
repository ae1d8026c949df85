//! GDI+ drawing contexts

use std::ptr;
use std::sync::Arc;

use windraw_core::{
    Backend, BackendKind, Color, DrawContext, IRect, Matrix, PixelBias, Point, Rect, Result,
};
use windraw_gdi::DcSurface;

use crate::api::{
    check, GpGraphics, GpMatrix, GpPen, GpSolidFill, COMBINE_REPLACE, FLUSH_INTENTION_FLUSH,
    SMOOTHING_ANTIALIAS_8X8, SMOOTHING_HIGH_QUALITY, UNIT_PIXEL,
};
use crate::Gdiplus;

/// The legacy backend.
#[derive(Debug, Clone)]
pub struct GdiplusBackend {
    api: Arc<Gdiplus>,
}

impl GdiplusBackend {
    pub fn new(api: Arc<Gdiplus>) -> Self {
        Self { api }
    }
}

impl Backend<DcSurface> for GdiplusBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Legacy
    }

    fn pixel_bias(&self) -> PixelBias {
        PixelBias::GDIPLUS
    }

    fn create_context(&self, target: &DcSurface, _bounds: IRect) -> Result<Box<dyn DrawContext>> {
        // GDI+ honors the viewport origin of a buffer DC, so bounds need no
        // handling here.
        let api = &self.api;
        let mut graphics = ptr::null_mut();
        check("GdipCreateFromHDC", unsafe {
            (api.create_from_hdc)(target.hdc(), &mut graphics)
        })?;
        let context = GdiplusContext {
            api: Arc::clone(api),
            graphics,
            pen: ptr::null_mut(),
            brush: ptr::null_mut(),
        };

        check("GdipSetPageUnit", unsafe {
            (api.set_page_unit)(graphics, UNIT_PIXEL)
        })?;
        if unsafe { (api.set_smoothing_mode)(graphics, SMOOTHING_ANTIALIAS_8X8) } != 0 {
            log::debug!("GDI+ 1.0 detected, antialiasing degraded to high quality");
            unsafe { (api.set_smoothing_mode)(graphics, SMOOTHING_HIGH_QUALITY) };
        }
        Ok(Box::new(context))
    }
}

/// A `GpGraphics` plus the pen and brush reused by every draw call.
pub struct GdiplusContext {
    api: Arc<Gdiplus>,
    graphics: *mut GpGraphics,
    pen: *mut GpPen,
    brush: *mut GpSolidFill,
}

/// Temporary `GpMatrix`.
struct GpMatrixHandle<'a> {
    api: &'a Gdiplus,
    raw: *mut GpMatrix,
}

impl<'a> GpMatrixHandle<'a> {
    fn new(api: &'a Gdiplus, m: &Matrix) -> Result<Self> {
        let mut raw = ptr::null_mut();
        check("GdipCreateMatrix2", unsafe {
            (api.create_matrix2)(m.m11, m.m12, m.m21, m.m22, m.dx, m.dy, &mut raw)
        })?;
        Ok(Self { api, raw })
    }
}

impl Drop for GpMatrixHandle<'_> {
    fn drop(&mut self) {
        unsafe { (self.api.delete_matrix)(self.raw) };
    }
}

impl GdiplusContext {
    fn pen(&mut self, color: Color, width: f32) -> Result<*mut GpPen> {
        let api = &self.api;
        check("GdipSetPenColor", unsafe { (api.set_pen_color)(self.pen, color.0) })?;
        check("GdipSetPenWidth", unsafe { (api.set_pen_width)(self.pen, width) })?;
        Ok(self.pen)
    }

    fn brush(&mut self, color: Color) -> Result<*mut GpSolidFill> {
        check("GdipSetSolidFillColor", unsafe {
            (self.api.set_solid_fill_color)(self.brush, color.0)
        })?;
        Ok(self.brush)
    }
}

impl DrawContext for GdiplusContext {
    fn prepare(&mut self) -> Result<()> {
        let api = Arc::clone(&self.api);
        check("GdipCreatePen1", unsafe {
            (api.create_pen1)(0, 1.0, UNIT_PIXEL, &mut self.pen)
        })?;
        check("GdipCreateSolidFill", unsafe {
            (api.create_solid_fill)(0, &mut self.brush)
        })
    }

    fn end_paint(&mut self) -> Result<()> {
        check("GdipFlush", unsafe {
            (self.api.flush)(self.graphics, FLUSH_INTENTION_FLUSH)
        })
    }

    fn transform(&self) -> Result<Matrix> {
        let matrix = GpMatrixHandle::new(&self.api, &Matrix::IDENTITY)?;
        let mut elements = [0f32; 6];
        check("GdipGetWorldTransform", unsafe {
            (self.api.get_world_transform)(self.graphics, matrix.raw)
        })?;
        check("GdipGetMatrixElements", unsafe {
            (self.api.get_matrix_elements)(matrix.raw, elements.as_mut_ptr())
        })?;
        Ok(Matrix::from_array(elements))
    }

    fn set_transform(&mut self, m: &Matrix) -> Result<()> {
        let matrix = GpMatrixHandle::new(&self.api, m)?;
        check("GdipSetWorldTransform", unsafe {
            (self.api.set_world_transform)(self.graphics, matrix.raw)
        })
    }

    fn set_clip(&mut self, clip: Option<&Rect>) -> Result<()> {
        match clip {
            Some(r) => check("GdipSetClipRect", unsafe {
                (self.api.set_clip_rect)(
                    self.graphics,
                    r.x0,
                    r.y0,
                    r.width(),
                    r.height(),
                    COMBINE_REPLACE,
                )
            }),
            None => check("GdipResetClip", unsafe { (self.api.reset_clip)(self.graphics) }),
        }
    }

    fn clear(&mut self, color: Color) -> Result<()> {
        check("GdipGraphicsClear", unsafe {
            (self.api.graphics_clear)(self.graphics, color.0)
        })
    }

    fn fill_rect(&mut self, color: Color, r: &Rect) -> Result<()> {
        let brush = self.brush(color)?;
        check("GdipFillRectangle", unsafe {
            (self.api.fill_rectangle)(self.graphics, brush, r.x0, r.y0, r.width(), r.height())
        })
    }

    fn draw_rect(&mut self, color: Color, r: &Rect, width: f32) -> Result<()> {
        let pen = self.pen(color, width)?;
        check("GdipDrawRectangle", unsafe {
            (self.api.draw_rectangle)(self.graphics, pen, r.x0, r.y0, r.width(), r.height())
        })
    }

    fn draw_line(&mut self, color: Color, from: Point, to: Point, width: f32) -> Result<()> {
        let pen = self.pen(color, width)?;
        check("GdipDrawLine", unsafe {
            (self.api.draw_line)(self.graphics, pen, from.x, from.y, to.x, to.y)
        })
    }
}

impl Drop for GdiplusContext {
    fn drop(&mut self) {
        let api = &self.api;
        unsafe {
            if !self.brush.is_null() {
                (api.delete_brush)(self.brush);
            }
            if !self.pen.is_null() {
                (api.delete_pen)(self.pen);
            }
            (api.delete_graphics)(self.graphics);
        }
    }
}
