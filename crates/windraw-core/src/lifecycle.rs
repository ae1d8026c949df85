//! Reference-counted module initialization with rollback
//!
//! Three modules can be brought up independently: the core drawing API, the
//! image codec and the text layout engine. [`Lifecycle`] counts references per
//! module and runs the module hooks only on the 0→1 and 1→0 transitions. All
//! counting and all hook calls of one acquire or release happen under a single
//! lock, which keeps the rollback of a half-finished acquire atomic.

use std::fmt;
use std::ops::{BitOr, BitOrAssign};

use lock_api::{Mutex, RawMutex};

use crate::error::{Result, WindrawError};

/// An independently initializable subsystem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Module {
    Core,
    ImageCodec,
    TextLayout,
}

impl Module {
    /// Initialization order. Release walks it backwards.
    pub const PRIORITY: [Module; 3] = [Module::Core, Module::ImageCodec, Module::TextLayout];

    const fn index(self) -> usize {
        match self {
            Module::Core => 0,
            Module::ImageCodec => 1,
            Module::TextLayout => 2,
        }
    }

    const fn bit(self) -> u8 {
        1 << self.index()
    }
}

/// A set of [`Module`]s.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ModuleSet(u8);

impl ModuleSet {
    pub const EMPTY: ModuleSet = ModuleSet(0);
    pub const CORE: ModuleSet = ModuleSet(Module::Core.bit());
    pub const IMAGE_CODEC: ModuleSet = ModuleSet(Module::ImageCodec.bit());
    pub const TEXT_LAYOUT: ModuleSet = ModuleSet(Module::TextLayout.bit());
    pub const ALL: ModuleSet = ModuleSet(0b111);

    pub const fn contains(self, module: Module) -> bool {
        self.0 & module.bit() != 0
    }

    pub const fn with(self, module: Module) -> ModuleSet {
        ModuleSet(self.0 | module.bit())
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Members in initialization order.
    pub fn iter(self) -> impl DoubleEndedIterator<Item = Module> {
        Module::PRIORITY
            .into_iter()
            .filter(move |m| self.contains(*m))
    }
}

impl From<Module> for ModuleSet {
    fn from(module: Module) -> Self {
        ModuleSet(module.bit())
    }
}

impl BitOr for ModuleSet {
    type Output = ModuleSet;

    fn bitor(self, rhs: ModuleSet) -> ModuleSet {
        ModuleSet(self.0 | rhs.0)
    }
}

impl BitOrAssign for ModuleSet {
    fn bitor_assign(&mut self, rhs: ModuleSet) {
        self.0 |= rhs.0;
    }
}

impl FromIterator<Module> for ModuleSet {
    fn from_iter<I: IntoIterator<Item = Module>>(iter: I) -> Self {
        iter.into_iter().fold(ModuleSet::EMPTY, ModuleSet::with)
    }
}

impl fmt::Debug for ModuleSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

/// Initializer and finalizer of every module.
pub trait ModuleHooks: Send {
    fn init(&mut self, module: Module) -> Result<()>;
    fn fini(&mut self, module: Module);
}

struct State<H> {
    counts: [u32; 3],
    hooks: H,
}

/// Reference counts of all modules behind one lock.
///
/// The lock type is injected; `parking_lot::RawMutex` is the default.
pub struct Lifecycle<H, R: RawMutex = parking_lot::RawMutex> {
    state: Mutex<R, State<H>>,
}

impl<H: ModuleHooks, R: RawMutex> Lifecycle<H, R> {
    pub fn new(hooks: H) -> Self {
        Self {
            state: Mutex::new(State {
                counts: [0; 3],
                hooks,
            }),
        }
    }

    /// Takes a reference on every module in `modules`; the core module is
    /// always included.
    ///
    /// On failure no count changes and every module initialized by this call
    /// is finalized again, newest first.
    pub fn acquire(&self, modules: ModuleSet) -> Result<()> {
        let modules = modules.with(Module::Core);
        let mut state = self.state.lock();
        let state = &mut *state;

        let mut counted: Vec<Module> = Vec::with_capacity(3);
        let mut initialized: Vec<Module> = Vec::with_capacity(3);

        for module in modules.iter() {
            let slot = module.index();
            if state.counts[slot] == 0 {
                log::debug!("Initializing module {:?}", module);
                if let Err(err) = state.hooks.init(module) {
                    log::error!("Initialization of module {:?} failed: {}", module, err);
                    for done in initialized.iter().rev() {
                        log::debug!("Rolling back module {:?}", done);
                        state.hooks.fini(*done);
                    }
                    for done in counted.iter().rev() {
                        state.counts[done.index()] -= 1;
                    }
                    return Err(WindrawError::ModuleInit {
                        module,
                        source: Box::new(err),
                    });
                }
                initialized.push(module);
            }
            state.counts[slot] += 1;
            counted.push(module);
        }

        Ok(())
    }

    /// Drops a reference on every module in `modules`, newest first.
    ///
    /// Releasing a module that holds no reference is ignored. If the core
    /// module goes away while other modules are still referenced, those are
    /// torn down as well.
    pub fn release(&self, modules: ModuleSet) {
        let mut state = self.state.lock();
        let state = &mut *state;

        for module in modules.iter().rev() {
            let slot = module.index();
            match state.counts[slot] {
                0 => {
                    log::warn!("Module {:?} released more often than acquired", module);
                }
                1 => {
                    state.counts[slot] = 0;
                    log::debug!("Finalizing module {:?}", module);
                    state.hooks.fini(module);
                }
                _ => state.counts[slot] -= 1,
            }
        }

        if state.counts[Module::Core.index()] == 0 {
            for module in Module::PRIORITY.iter().rev() {
                let slot = module.index();
                if state.counts[slot] > 0 {
                    log::warn!(
                        "Core released while module {:?} still holds {} reference(s); forcing cleanup",
                        module,
                        state.counts[slot]
                    );
                    state.counts[slot] = 0;
                    state.hooks.fini(*module);
                }
            }
        }
    }

    pub fn ref_count(&self, module: Module) -> u32 {
        self.state.lock().counts[module.index()]
    }

    pub fn is_active(&self, module: Module) -> bool {
        self.ref_count(module) > 0
    }

    /// Runs `f` on the hooks if `module` holds a reference, checking and
    /// running under the same lock so a concurrent release cannot interleave.
    pub fn with_active<T>(&self, module: Module, f: impl FnOnce(&mut H) -> T) -> Option<T> {
        let mut state = self.state.lock();
        if state.counts[module.index()] == 0 {
            return None;
        }
        Some(f(&mut state.hooks))
    }

    /// Runs `f` on the hooks while holding the lifecycle lock.
    pub fn with_hooks<T>(&self, f: impl FnOnce(&mut H) -> T) -> T {
        let mut state = self.state.lock();
        f(&mut state.hooks)
    }
}

impl<H, R: RawMutex> fmt::Debug for Lifecycle<H, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Lifecycle").finish_non_exhaustive()
    }
}
