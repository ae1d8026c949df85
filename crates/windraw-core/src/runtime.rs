//! Library-wide state: module lifecycle, backend verdict and configuration

use std::fmt;
use std::sync::Arc;

use lock_api::RawMutex;

use crate::backend::Backend;
use crate::canvas::{Canvas, CanvasOptions};
use crate::config::Config;
use crate::error::{Result, WindrawError};
use crate::lifecycle::{Lifecycle, Module, ModuleHooks, ModuleSet};
use crate::probe::Probe;
use crate::surface::{Surface, Target};
use crate::types::BackendKind;

/// What a host platform provides: capability checks, per-module setup of
/// each backend, and the backends themselves.
pub trait Platform: Send {
    type Surface: Surface;

    /// Whether `kind` can run here. Asked at most once per runtime.
    fn probe(&mut self, kind: BackendKind) -> bool;

    fn init(&mut self, kind: BackendKind, module: Module) -> Result<()>;

    fn fini(&mut self, kind: BackendKind, module: Module);

    /// The backend for `kind`; only called while the core module is up.
    fn backend(&self, kind: BackendKind) -> Option<Arc<dyn Backend<Self::Surface>>>;
}

/// Everything guarded by the runtime lock.
pub struct PlatformHooks<P> {
    platform: P,
    probe: Probe,
    config: Config,
}

impl<P: Platform> PlatformHooks<P> {
    fn detect(&mut self) -> Option<BackendKind> {
        let platform = &mut self.platform;
        self.probe
            .detect(self.config.backend, |kind| platform.probe(kind))
    }

    pub fn platform(&self) -> &P {
        &self.platform
    }

    pub fn platform_mut(&mut self) -> &mut P {
        &mut self.platform
    }
}

impl<P: Platform> ModuleHooks for PlatformHooks<P> {
    fn init(&mut self, module: Module) -> Result<()> {
        let kind = self.detect().ok_or(WindrawError::NoBackend)?;
        self.platform.init(kind, module)
    }

    fn fini(&mut self, module: Module) {
        match self.probe.cached() {
            Some(Some(kind)) => self.platform.fini(kind, module),
            _ => log::warn!("Finalizing {:?} without a selected backend", module),
        }
    }
}

/// Entry point of the library.
///
/// Modules are acquired and released in matching pairs; canvases can be
/// created while the core module is held.
pub struct Runtime<P: Platform, R: RawMutex = parking_lot::RawMutex> {
    lifecycle: Lifecycle<PlatformHooks<P>, R>,
}

impl<P: Platform, R: RawMutex> Runtime<P, R> {
    pub fn new(platform: P, config: Config) -> Self {
        log::debug!("Runtime configured with backend preference '{}'", config.backend);
        Self {
            lifecycle: Lifecycle::new(PlatformHooks {
                platform,
                probe: Probe::new(),
                config,
            }),
        }
    }

    /// Initializes `modules` (core is always included).
    pub fn acquire(&self, modules: ModuleSet) -> Result<()> {
        self.lifecycle.acquire(modules)
    }

    pub fn release(&self, modules: ModuleSet) {
        self.lifecycle.release(modules)
    }

    /// Acquires `modules` for the lifetime of the returned guard.
    pub fn session(&self, modules: ModuleSet) -> Result<Session<'_, P, R>> {
        let modules = modules.with(Module::Core);
        self.acquire(modules)?;
        Ok(Session {
            runtime: self,
            modules,
        })
    }

    pub fn ref_count(&self, module: Module) -> u32 {
        self.lifecycle.ref_count(module)
    }

    /// The backend in use, probing on first call. `None` means neither
    /// backend can run.
    pub fn backend(&self) -> Option<BackendKind> {
        self.lifecycle.with_hooks(PlatformHooks::detect)
    }

    pub fn config(&self) -> Config {
        self.lifecycle.with_hooks(|hooks| hooks.config.clone())
    }

    /// Runs `f` on the platform under the runtime lock.
    pub fn with_platform<T>(&self, f: impl FnOnce(&mut P) -> T) -> T {
        self.lifecycle.with_hooks(|hooks| f(&mut hooks.platform))
    }

    pub fn create_canvas<'s>(
        &self,
        target: Target<'s, P::Surface>,
        options: CanvasOptions,
    ) -> Result<Canvas<'s, P::Surface>> {
        let backend = self
            .lifecycle
            .with_active(Module::Core, |hooks| {
                let kind = hooks.detect().ok_or(WindrawError::NoBackend)?;
                hooks.platform.backend(kind).ok_or(WindrawError::NoBackend)
            })
            .ok_or(WindrawError::NotInitialized(Module::Core))??;
        Canvas::new(backend, target, options)
    }
}

impl<P: Platform, R: RawMutex> fmt::Debug for Runtime<P, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runtime")
            .field("core", &self.ref_count(Module::Core))
            .field("image_codec", &self.ref_count(Module::ImageCodec))
            .field("text_layout", &self.ref_count(Module::TextLayout))
            .finish()
    }
}

/// Module references held by a scope, released on drop.
pub struct Session<'r, P: Platform, R: RawMutex = parking_lot::RawMutex> {
    runtime: &'r Runtime<P, R>,
    modules: ModuleSet,
}

impl<P: Platform, R: RawMutex> Session<'_, P, R> {
    pub fn modules(&self) -> ModuleSet {
        self.modules
    }
}

impl<P: Platform, R: RawMutex> Drop for Session<'_, P, R> {
    fn drop(&mut self) {
        self.runtime.release(self.modules);
    }
}
