//! Direct2D drawing contexts on GDI device contexts

use std::sync::Arc;

use windows::Foundation::Numerics::Matrix3x2;
use windows::Win32::Foundation::RECT;
use windows::Win32::Graphics::Direct2D::Common::{
    D2D1_ALPHA_MODE_PREMULTIPLIED, D2D1_COLOR_F, D2D1_PIXEL_FORMAT, D2D_POINT_2F, D2D_RECT_F,
};
use windows::Win32::Graphics::Direct2D::{
    ID2D1DCRenderTarget, ID2D1Factory, ID2D1SolidColorBrush, D2D1_ANTIALIAS_MODE_ALIASED,
    D2D1_FEATURE_LEVEL_DEFAULT, D2D1_RENDER_TARGET_PROPERTIES, D2D1_RENDER_TARGET_TYPE_DEFAULT,
    D2D1_RENDER_TARGET_USAGE_NONE, D2DERR_RECREATE_TARGET,
};
use windows::Win32::Graphics::Dxgi::Common::DXGI_FORMAT_B8G8R8A8_UNORM;

use windraw_core::{
    Backend, BackendKind, Color, DrawContext, IRect, Matrix, PixelBias, Point, Rect, Result,
    WindrawError,
};
use windraw_gdi::DcSurface;

use crate::hresult;
use crate::modules::D2d1;

/// The modern backend. Keeps `d2d1.dll` loaded for as long as any canvas
/// uses it.
pub struct D2dBackend {
    factory: ID2D1Factory,
    _d2d1: Arc<D2d1>,
}

// The factory is created with D2D1_FACTORY_TYPE_MULTI_THREADED.
unsafe impl Send for D2dBackend {}
unsafe impl Sync for D2dBackend {}

impl D2dBackend {
    pub(crate) fn new(factory: ID2D1Factory, d2d1: Arc<D2d1>) -> Self {
        Self {
            factory,
            _d2d1: d2d1,
        }
    }
}

impl Backend<DcSurface> for D2dBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Modern
    }

    fn pixel_bias(&self) -> PixelBias {
        PixelBias::DIRECT2D
    }

    fn create_context(&self, target: &DcSurface, bounds: IRect) -> Result<Box<dyn DrawContext>> {
        let props = D2D1_RENDER_TARGET_PROPERTIES {
            r#type: D2D1_RENDER_TARGET_TYPE_DEFAULT,
            pixelFormat: D2D1_PIXEL_FORMAT {
                format: DXGI_FORMAT_B8G8R8A8_UNORM,
                alphaMode: D2D1_ALPHA_MODE_PREMULTIPLIED,
            },
            dpiX: 0.0,
            dpiY: 0.0,
            usage: D2D1_RENDER_TARGET_USAGE_NONE,
            minLevel: D2D1_FEATURE_LEVEL_DEFAULT,
        };
        let rect = RECT {
            left: 0,
            top: 0,
            right: bounds.width(),
            bottom: bounds.height(),
        };
        let render_target = unsafe {
            let rt = self
                .factory
                .CreateDCRenderTarget(&props)
                .map_err(hresult("ID2D1Factory::CreateDCRenderTarget"))?;
            rt.BindDC(target.hdc(), &rect)
                .map_err(hresult("ID2D1DCRenderTarget::BindDC"))?;
            rt
        };
        Ok(Box::new(D2dContext {
            target: render_target,
            origin: (bounds.left as f32, bounds.top as f32),
            brush: None,
            clip: None,
            clipped: false,
            drawing: false,
        }))
    }
}

/// A DC render target bound to the canvas surface.
///
/// The target ignores the viewport origin of a buffer DC, so the buffer
/// offset is folded into every transform it receives.
///
/// Direct2D clips only exist between `BeginDraw` and `EndDraw`. The requested
/// clip is kept with the transform it was given under and pushed again at
/// every `begin_paint`, so it lasts across paints like a GDI+ clip does.
pub struct D2dContext {
    target: ID2D1DCRenderTarget,
    origin: (f32, f32),
    brush: Option<ID2D1SolidColorBrush>,
    clip: Option<(D2D_RECT_F, Matrix3x2)>,
    clipped: bool,
    drawing: bool,
}

fn color_f(color: Color) -> D2D1_COLOR_F {
    let [r, g, b, a] = color.to_f32();
    D2D1_COLOR_F { r, g, b, a }
}

fn rect_f(r: &Rect) -> D2D_RECT_F {
    D2D_RECT_F {
        left: r.x0,
        top: r.y0,
        right: r.x1,
        bottom: r.y1,
    }
}

fn point_f(p: Point) -> D2D_POINT_2F {
    D2D_POINT_2F { x: p.x, y: p.y }
}

impl D2dContext {
    fn brush(&mut self, color: Color) -> Result<&ID2D1SolidColorBrush> {
        let color = color_f(color);
        match self.brush {
            Some(ref brush) => {
                unsafe { brush.SetColor(&color) };
            }
            None => {
                let brush = unsafe { self.target.CreateSolidColorBrush(&color, None) }
                    .map_err(hresult("ID2D1RenderTarget::CreateSolidColorBrush"))?;
                self.brush = Some(brush);
            }
        }
        self.brush.as_ref().ok_or(WindrawError::OutOfMemory)
    }

    fn push_clip(&mut self) {
        if let Some((rect, at)) = self.clip {
            unsafe {
                let mut current = Matrix3x2::default();
                self.target.GetTransform(&mut current);
                self.target.SetTransform(&at);
                self.target
                    .PushAxisAlignedClip(&rect, D2D1_ANTIALIAS_MODE_ALIASED);
                self.target.SetTransform(&current);
            }
            self.clipped = true;
        }
    }

    fn pop_clip(&mut self) {
        if self.clipped {
            unsafe { self.target.PopAxisAlignedClip() };
            self.clipped = false;
        }
    }
}

impl DrawContext for D2dContext {
    fn begin_paint(&mut self) -> Result<()> {
        unsafe { self.target.BeginDraw() };
        self.drawing = true;
        self.push_clip();
        Ok(())
    }

    fn end_paint(&mut self) -> Result<()> {
        self.pop_clip();
        self.drawing = false;
        match unsafe { self.target.EndDraw(None, None) } {
            Ok(()) => Ok(()),
            Err(err) if err.code() == D2DERR_RECREATE_TARGET => {
                log::warn!("Direct2D device lost");
                self.brush = None;
                Err(WindrawError::RecreateTarget)
            }
            Err(err) => Err(hresult("ID2D1RenderTarget::EndDraw")(err)),
        }
    }

    fn transform(&self) -> Result<Matrix> {
        let mut m = Matrix3x2::default();
        unsafe { self.target.GetTransform(&mut m) };
        let native = Matrix::new(m.M11, m.M12, m.M21, m.M22, m.M31, m.M32);
        Ok(native.offset(self.origin.0, self.origin.1))
    }

    fn set_transform(&mut self, matrix: &Matrix) -> Result<()> {
        let m = matrix.offset(-self.origin.0, -self.origin.1);
        let native = Matrix3x2 {
            M11: m.m11,
            M12: m.m12,
            M21: m.m21,
            M22: m.m22,
            M31: m.dx,
            M32: m.dy,
        };
        unsafe { self.target.SetTransform(&native) };
        Ok(())
    }

    fn set_clip(&mut self, clip: Option<&Rect>) -> Result<()> {
        self.pop_clip();
        self.clip = clip.map(|r| {
            let mut at = Matrix3x2::default();
            unsafe { self.target.GetTransform(&mut at) };
            (rect_f(r), at)
        });
        if self.drawing {
            self.push_clip();
        }
        Ok(())
    }

    fn clear(&mut self, color: Color) -> Result<()> {
        unsafe { self.target.Clear(Some(&color_f(color))) };
        Ok(())
    }

    fn fill_rect(&mut self, color: Color, rect: &Rect) -> Result<()> {
        let brush = self.brush(color)?.clone();
        unsafe { self.target.FillRectangle(&rect_f(rect), &brush) };
        Ok(())
    }

    fn draw_rect(&mut self, color: Color, rect: &Rect, width: f32) -> Result<()> {
        let brush = self.brush(color)?.clone();
        unsafe { self.target.DrawRectangle(&rect_f(rect), &brush, width, None) };
        Ok(())
    }

    fn draw_line(&mut self, color: Color, from: Point, to: Point, width: f32) -> Result<()> {
        let brush = self.brush(color)?.clone();
        unsafe {
            self.target
                .DrawLine(point_f(from), point_f(to), &brush, width, None)
        };
        Ok(())
    }
}

impl Drop for D2dContext {
    fn drop(&mut self) {
        if self.drawing {
            self.pop_clip();
            if let Err(err) = unsafe { self.target.EndDraw(None, None) } {
                log::warn!("EndDraw on drop failed: {}", err);
            }
        }
    }
}
