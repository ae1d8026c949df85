//! Dynamic binding of a whole function table from a shared library
//!
//! A [`FunctionTable`] is a struct of function pointers resolved from one
//! library. Binding is all-or-nothing: [`load`] either returns a
//! [`LoadedLibrary`] with every entry point resolved and the library started,
//! or an error after the library has been released again.
//!
//! Tables are declared with [`function_table!`](crate::function_table):
//!
//! ```ignore
//! function_table! {
//!     pub struct Api {
//!         startup: "Startup" => unsafe extern "system" fn(*mut usize) -> i32,
//!         shutdown: "Shutdown" => unsafe extern "system" fn(usize),
//!     }
//! }
//! ```

use std::ffi::c_void;
use std::fmt;
use std::ptr::NonNull;

use crate::error::LoadError;

/// Anything entry points can be looked up in.
pub trait SymbolSource {
    /// Name the library was loaded under, used in diagnostics.
    fn name(&self) -> &str;

    fn symbol(&self, name: &str) -> Option<NonNull<c_void>>;
}

/// A loaded library. Dropping it unloads the library.
pub trait Library: SymbolSource {}

/// Opens libraries by name.
pub trait LibraryProvider {
    type Library: Library;

    /// Loads the copy installed with the operating system.
    fn load_system(&self, name: &str) -> Result<Self::Library, LoadError>;

    /// Loads a copy shipped next to the application.
    fn load_bundled(&self, name: &str) -> Result<Self::Library, LoadError>;

    /// Whether [`load_bundled`](Self::load_bundled) may stand in for a
    /// missing system copy.
    fn allows_bundled_fallback(&self) -> bool;
}

/// Called once with the startup token when a [`LoadedLibrary`] goes away.
pub type ShutdownHook<T> = Box<dyn FnOnce(T) + Send + Sync>;

/// A fixed set of entry points resolved from one library.
pub trait FunctionTable: Sized + Send + Sync {
    /// Value produced by the library startup call and consumed by its
    /// shutdown call.
    type Token: Send;

    fn resolve(source: &dyn SymbolSource) -> Result<Self, LoadError>;

    /// Runs the library startup entry point, returning its status on failure.
    fn startup(&self) -> Result<Self::Token, i32>;

    /// Captures the shutdown entry point so it can run after the table is gone.
    fn shutdown_hook(&self) -> ShutdownHook<Self::Token>;
}

struct Shutdown<T> {
    pending: Option<(ShutdownHook<T>, T)>,
}

impl<T> Drop for Shutdown<T> {
    fn drop(&mut self) {
        if let Some((hook, token)) = self.pending.take() {
            hook(token);
        }
    }
}

/// A started library together with its resolved table.
///
/// Teardown order is fixed by field order: the table is released first, then
/// the library shutdown entry point runs, then the library is unloaded.
pub struct LoadedLibrary<T: FunctionTable, L: Library> {
    table: T,
    _shutdown: Shutdown<T::Token>,
    library: L,
}

impl<T: FunctionTable, L: Library> LoadedLibrary<T, L> {
    pub fn table(&self) -> &T {
        &self.table
    }

    pub fn library_name(&self) -> &str {
        self.library.name()
    }
}

impl<T: FunctionTable, L: Library> std::ops::Deref for LoadedLibrary<T, L> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.table
    }
}

impl<T: FunctionTable, L: Library> fmt::Debug for LoadedLibrary<T, L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoadedLibrary")
            .field("library", &self.library.name())
            .finish_non_exhaustive()
    }
}

/// Loads `name`, resolves `T` from it and starts it.
///
/// The system copy is tried first. When it is absent and the provider allows
/// it, a bundled copy is tried next. Any failure after the library was opened
/// releases it before returning.
pub fn load<T, P>(provider: &P, name: &str) -> Result<LoadedLibrary<T, P::Library>, LoadError>
where
    T: FunctionTable,
    P: LibraryProvider,
{
    let library = match provider.load_system(name) {
        Ok(library) => library,
        Err(err) if provider.allows_bundled_fallback() => {
            log::debug!("{}; trying the bundled copy", err);
            provider.load_bundled(name).map_err(|err| {
                log::error!("{}", err);
                err
            })?
        }
        Err(err) => {
            log::error!("{}", err);
            return Err(err);
        }
    };

    let table = T::resolve(&library).map_err(|err| {
        log::error!("{}", err);
        err
    })?;

    let token = table.startup().map_err(|status| {
        let err = LoadError::Startup {
            library: library.name().to_string(),
            status,
        };
        log::error!("{}", err);
        err
    })?;

    log::debug!("Loaded {}", library.name());
    let hook = table.shutdown_hook();
    Ok(LoadedLibrary {
        table,
        _shutdown: Shutdown {
            pending: Some((hook, token)),
        },
        library,
    })
}

/// Declares a struct of function pointers together with a `resolve_symbols`
/// constructor that looks every field up by its symbol name.
///
/// The declared pointer types must match the exported functions exactly.
#[macro_export]
macro_rules! function_table {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident {
            $( $(#[$field_meta:meta])* $field:ident : $symbol:literal => $ty:ty ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        $vis struct $name {
            $( $(#[$field_meta])* pub $field: $ty, )*
        }

        impl $name {
            /// Symbol names in declaration order.
            pub const SYMBOLS: &'static [&'static str] = &[$($symbol),*];

            /// Resolves every entry point; the first missing one fails the
            /// whole table.
            #[allow(unsafe_code)]
            pub fn resolve_symbols(
                source: &dyn $crate::loader::SymbolSource,
            ) -> ::std::result::Result<Self, $crate::error::LoadError> {
                Ok(Self {
                    $(
                        $field: {
                            let ptr = source.symbol($symbol).ok_or_else(|| {
                                $crate::error::LoadError::MissingSymbol {
                                    library: source.name().to_string(),
                                    symbol: $symbol,
                                }
                            })?;
                            // SAFETY: the declared type is the exported signature.
                            unsafe {
                                ::std::mem::transmute::<*mut ::std::ffi::c_void, $ty>(ptr.as_ptr())
                            }
                        },
                    )*
                })
            }
        }
    };
}
