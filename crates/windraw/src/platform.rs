//! The Windows platform: Direct2D first, GDI+ as the fallback

use std::fmt;
use std::sync::Arc;

use windraw_core::{Backend, BackendKind, Config, Module, Platform, Result, Runtime};
use windraw_d2d::D2dModules;
use windraw_gdi::DcSurface;
use windraw_gdiplus::{Gdiplus, GdiplusBackend};

/// Module setup for both native backends.
///
/// GDI+ has a single startup for everything, so only the core module loads
/// it; image codecs and text come with it.
pub struct NativePlatform {
    bundled_fallback: bool,
    d2d: D2dModules,
    gdiplus: Option<Arc<Gdiplus>>,
}

impl NativePlatform {
    pub fn new(config: &Config) -> Self {
        Self {
            bundled_fallback: config.bundled_fallback,
            d2d: D2dModules::new(),
            gdiplus: None,
        }
    }

    /// Direct2D factories, populated while the matching modules are held.
    pub fn d2d(&self) -> &D2dModules {
        &self.d2d
    }

    pub fn gdiplus(&self) -> Option<&Gdiplus> {
        self.gdiplus.as_deref()
    }
}

impl fmt::Debug for NativePlatform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativePlatform")
            .field("bundled_fallback", &self.bundled_fallback)
            .field("d2d", &self.d2d.backend().is_some())
            .field("gdiplus", &self.gdiplus)
            .finish()
    }
}

impl Platform for NativePlatform {
    type Surface = DcSurface;

    fn probe(&mut self, kind: BackendKind) -> bool {
        match kind {
            BackendKind::Modern => windraw_d2d::probe(),
            BackendKind::Legacy => windraw_gdiplus::probe(self.bundled_fallback),
        }
    }

    fn init(&mut self, kind: BackendKind, module: Module) -> Result<()> {
        match (kind, module) {
            (BackendKind::Modern, module) => self.d2d.init(module),
            (BackendKind::Legacy, Module::Core) => {
                self.gdiplus = Some(windraw_gdiplus::load(self.bundled_fallback)?);
                Ok(())
            }
            (BackendKind::Legacy, _) => Ok(()),
        }
    }

    fn fini(&mut self, kind: BackendKind, module: Module) {
        match (kind, module) {
            (BackendKind::Modern, module) => self.d2d.fini(module),
            (BackendKind::Legacy, Module::Core) => self.gdiplus = None,
            (BackendKind::Legacy, _) => {}
        }
    }

    fn backend(&self, kind: BackendKind) -> Option<Arc<dyn Backend<DcSurface>>> {
        match kind {
            BackendKind::Modern => self
                .d2d
                .backend()
                .map(|backend| backend as Arc<dyn Backend<DcSurface>>),
            BackendKind::Legacy => self
                .gdiplus
                .clone()
                .map(|api| Arc::new(GdiplusBackend::new(api)) as Arc<dyn Backend<DcSurface>>),
        }
    }
}

pub type NativeRuntime = Runtime<NativePlatform>;

/// A runtime configured from `WINDRAW_BACKEND` and
/// `WINDRAW_BUNDLED_FALLBACK`.
pub fn runtime() -> Result<NativeRuntime> {
    let config = Config::from_env()?;
    Ok(Runtime::new(NativePlatform::new(&config), config))
}
