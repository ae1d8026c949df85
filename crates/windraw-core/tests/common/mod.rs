//! In-memory surface and backend shared by the integration tests
#![allow(dead_code)]

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

use parking_lot::Mutex;

use windraw_core::{
    Backend, BackendKind, Color, DrawContext, IPoint, IRect, Layout, Matrix, PixelBias, Point,
    Rect, Result, Size, Surface, WindrawError,
};

pub type EventLog = Rc<RefCell<Vec<String>>>;

/// Where allocation of a canvas is made to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    CreateBuffer,
    BufferOrigin,
    TargetLayout,
    CreateContext,
    Prepare,
    SetTransform,
}

struct Pixels {
    name: String,
    width: i32,
    height: i32,
    data: Vec<u32>,
    layout: Layout,
    origin: IPoint,
    fault: Option<Fault>,
    disposed: bool,
}

/// A device context backed by a pixel vector. Clones share the same pixels.
#[derive(Clone)]
pub struct MemSurface {
    pixels: Rc<RefCell<Pixels>>,
    log: EventLog,
}

impl MemSurface {
    pub fn new(name: &str, size: Size) -> Self {
        Self::with_log(name, size, Rc::default())
    }

    fn with_log(name: &str, size: Size, log: EventLog) -> Self {
        Self {
            pixels: Rc::new(RefCell::new(Pixels {
                name: name.to_string(),
                width: size.width as i32,
                height: size.height as i32,
                data: vec![0; (size.width * size.height) as usize],
                layout: Layout::LEFT_TO_RIGHT,
                origin: IPoint::default(),
                fault: None,
                disposed: false,
            })),
            log,
        }
    }

    pub fn with_layout(self, layout: Layout) -> Self {
        self.pixels.borrow_mut().layout = layout;
        self
    }

    pub fn inject(&self, fault: Fault) {
        self.pixels.borrow_mut().fault = Some(fault);
    }

    pub fn name(&self) -> String {
        self.pixels.borrow().name.clone()
    }

    pub fn events(&self) -> Vec<String> {
        self.log.borrow().clone()
    }

    pub fn record(&self, event: impl Into<String>) {
        self.log.borrow_mut().push(event.into());
    }

    pub fn is_disposed(&self) -> bool {
        self.pixels.borrow().disposed
    }

    /// Device pixel, ignoring the origin.
    pub fn pixel(&self, x: i32, y: i32) -> u32 {
        let p = self.pixels.borrow();
        p.data[(y * p.width + x) as usize]
    }

    /// Device coordinates of every pixel holding `color`.
    pub fn pixels_of(&self, color: Color) -> Vec<(i32, i32)> {
        let p = self.pixels.borrow();
        let mut out = Vec::new();
        for y in 0..p.height {
            for x in 0..p.width {
                if p.data[(y * p.width + x) as usize] == color.0 {
                    out.push((x, y));
                }
            }
        }
        out
    }

    /// Bounding box of every pixel holding `color`, right/bottom exclusive.
    pub fn bounds_of(&self, color: Color) -> Option<IRect> {
        let hits = self.pixels_of(color);
        if hits.is_empty() {
            return None;
        }
        let (mut r, mut b) = (i32::MIN, i32::MIN);
        let (mut l, mut t) = (i32::MAX, i32::MAX);
        for (x, y) in hits {
            l = l.min(x);
            t = t.min(y);
            r = r.max(x + 1);
            b = b.max(y + 1);
        }
        Some(IRect::new(l, t, r, b))
    }

    /// Sets every device pixel whose center, in logical coordinates, lies
    /// inside `area`.
    fn fill_logical(&self, color: Color, area: (f32, f32, f32, f32)) {
        let mut p = self.pixels.borrow_mut();
        let (x0, y0, x1, y1) = area;
        let origin = p.origin;
        for dy in 0..p.height {
            for dx in 0..p.width {
                let cx = (dx - origin.x) as f32 + 0.5;
                let cy = (dy - origin.y) as f32 + 0.5;
                if cx >= x0 && cx < x1 && cy >= y0 && cy < y1 {
                    let idx = (dy * p.width + dx) as usize;
                    p.data[idx] = color.0;
                }
            }
        }
    }

    fn check(&self, fault: Fault, call: &'static str) -> Result<()> {
        if self.pixels.borrow().fault == Some(fault) {
            return Err(WindrawError::native(call, -1));
        }
        Ok(())
    }
}

impl Surface for MemSurface {
    fn layout(&self) -> Layout {
        self.pixels.borrow().layout
    }

    fn set_layout(&mut self, layout: Layout) -> Result<Layout> {
        self.check(Fault::TargetLayout, "SetLayout")?;
        let name = self.name();
        let prev = std::mem::replace(&mut self.pixels.borrow_mut().layout, layout);
        self.record(format!("layout {} {:#x}", name, layout.0));
        Ok(prev)
    }

    fn create_buffer(&self, size: Size) -> Result<Self> {
        self.check(Fault::CreateBuffer, "CreateCompatibleDC")?;
        let name = format!("{}.buffer", self.name());
        let buffer = MemSurface::with_log(&name, size, self.log.clone());
        if self.pixels.borrow().fault == Some(Fault::BufferOrigin) {
            buffer.inject(Fault::BufferOrigin);
        }
        self.record(format!("create {}", name));
        Ok(buffer)
    }

    fn set_origin(&mut self, origin: IPoint) -> Result<()> {
        self.check(Fault::BufferOrigin, "SetViewportOrgEx")?;
        self.pixels.borrow_mut().origin = origin;
        Ok(())
    }

    fn blit(&mut self, source: &Self, area: IRect) -> Result<()> {
        self.record(format!("blit {} -> {}", source.name(), self.name()));
        let src = source.pixels.borrow();
        let mut dst = self.pixels.borrow_mut();
        for ly in area.top..area.bottom {
            for lx in area.left..area.right {
                let (sx, sy) = (lx + src.origin.x, ly + src.origin.y);
                let (dx, dy) = (lx + dst.origin.x, ly + dst.origin.y);
                if sx < 0 || sy < 0 || sx >= src.width || sy >= src.height {
                    continue;
                }
                if dx < 0 || dy < 0 || dx >= dst.width || dy >= dst.height {
                    continue;
                }
                let value = src.data[(sy * src.width + sx) as usize];
                let idx = (dy * dst.width + dx) as usize;
                dst.data[idx] = value;
            }
        }
        Ok(())
    }

    fn dispose(self) -> Result<()> {
        self.pixels.borrow_mut().disposed = true;
        self.record(format!("dispose {}", self.name()));
        Ok(())
    }
}

/// Backend drawing axis-aligned bounding boxes of transformed shapes.
pub struct MockBackend {
    kind: BackendKind,
    bias: PixelBias,
    fault: Arc<Mutex<Option<Fault>>>,
}

impl MockBackend {
    pub fn new(bias: PixelBias) -> Self {
        Self {
            kind: BackendKind::Legacy,
            bias,
            fault: Arc::default(),
        }
    }

    pub fn with_kind(mut self, kind: BackendKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn inject(&self, fault: Option<Fault>) {
        *self.fault.lock() = fault;
    }

    /// Handle that keeps injecting faults into contexts already created.
    pub fn fault_switch(&self) -> Arc<Mutex<Option<Fault>>> {
        self.fault.clone()
    }

    pub fn shared(self) -> Arc<dyn Backend<MemSurface>> {
        Arc::new(self)
    }
}

impl Backend<MemSurface> for MockBackend {
    fn kind(&self) -> BackendKind {
        self.kind
    }

    fn pixel_bias(&self) -> PixelBias {
        self.bias
    }

    fn create_context(&self, target: &MemSurface, _bounds: IRect) -> Result<Box<dyn DrawContext>> {
        if *self.fault.lock() == Some(Fault::CreateContext) {
            return Err(WindrawError::native("CreateFromHDC", 2));
        }
        target.record(format!("context {}", target.name()));
        Ok(Box::new(MockContext {
            surface: target.clone(),
            transform: Matrix::IDENTITY,
            clip: None,
            fault: self.fault.clone(),
        }))
    }
}

struct MockContext {
    surface: MemSurface,
    transform: Matrix,
    clip: Option<(f32, f32, f32, f32)>,
    fault: Arc<Mutex<Option<Fault>>>,
}

impl MockContext {
    fn bbox(&self, rect: &Rect) -> (f32, f32, f32, f32) {
        let corners = [
            Point::new(rect.x0, rect.y0),
            Point::new(rect.x1, rect.y0),
            Point::new(rect.x0, rect.y1),
            Point::new(rect.x1, rect.y1),
        ]
        .map(|p| self.transform.transform_point(p));
        let mut b = (f32::MAX, f32::MAX, f32::MIN, f32::MIN);
        for p in corners {
            b.0 = b.0.min(p.x);
            b.1 = b.1.min(p.y);
            b.2 = b.2.max(p.x);
            b.3 = b.3.max(p.y);
        }
        b
    }

    fn clipped(&self, b: (f32, f32, f32, f32)) -> (f32, f32, f32, f32) {
        match self.clip {
            Some(c) => (b.0.max(c.0), b.1.max(c.1), b.2.min(c.2), b.3.min(c.3)),
            None => b,
        }
    }
}

impl DrawContext for MockContext {
    fn prepare(&mut self) -> Result<()> {
        if *self.fault.lock() == Some(Fault::Prepare) {
            return Err(WindrawError::native("CreatePen1", 3));
        }
        Ok(())
    }

    fn transform(&self) -> Result<Matrix> {
        Ok(self.transform)
    }

    fn set_transform(&mut self, matrix: &Matrix) -> Result<()> {
        if *self.fault.lock() == Some(Fault::SetTransform) {
            return Err(WindrawError::native("SetWorldTransform", 2));
        }
        self.transform = *matrix;
        Ok(())
    }

    fn set_clip(&mut self, clip: Option<&Rect>) -> Result<()> {
        self.clip = clip.map(|r| self.bbox(r));
        Ok(())
    }

    fn clear(&mut self, color: Color) -> Result<()> {
        let everything = (f32::MIN, f32::MIN, f32::MAX, f32::MAX);
        self.surface.fill_logical(color, self.clipped(everything));
        Ok(())
    }

    fn fill_rect(&mut self, color: Color, rect: &Rect) -> Result<()> {
        self.surface.fill_logical(color, self.clipped(self.bbox(rect)));
        Ok(())
    }

    fn draw_rect(&mut self, color: Color, rect: &Rect, width: f32) -> Result<()> {
        let h = width / 2.0;
        let edges = [
            Rect::new(rect.x0 - h, rect.y0 - h, rect.x1 + h, rect.y0 + h),
            Rect::new(rect.x0 - h, rect.y1 - h, rect.x1 + h, rect.y1 + h),
            Rect::new(rect.x0 - h, rect.y0 - h, rect.x0 + h, rect.y1 + h),
            Rect::new(rect.x1 - h, rect.y0 - h, rect.x1 + h, rect.y1 + h),
        ];
        for edge in &edges {
            self.fill_rect(color, edge)?;
        }
        Ok(())
    }

    fn draw_line(&mut self, color: Color, from: Point, to: Point, width: f32) -> Result<()> {
        let h = width / 2.0;
        let rect = Rect::new(
            from.x.min(to.x) - h,
            from.y.min(to.y) - h,
            from.x.max(to.x) + h,
            from.y.max(to.y) + h,
        );
        self.fill_rect(color, &rect)
    }
}

impl Drop for MockContext {
    fn drop(&mut self) {
        self.surface.record(format!("drop context {}", self.surface.name()));
    }
}

pub const RED: Color = Color::rgb(255, 0, 0);
pub const BLUE: Color = Color::rgb(0, 0, 255);

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}
