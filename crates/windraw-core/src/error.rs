//! Error types for windraw

use thiserror::Error;

use crate::lifecycle::Module;

pub type Result<T> = std::result::Result<T, WindrawError>;

/// Main error type for windraw
#[derive(Debug, Error)]
pub enum WindrawError {
    #[error("Out of memory")]
    OutOfMemory,

    #[error("{call} failed with status {code:#x}")]
    Native { call: &'static str, code: i32 },

    #[error("Direct2D target must be recreated")]
    RecreateTarget,

    #[error("No usable rendering backend")]
    NoBackend,

    #[error("Module {0:?} is not initialized")]
    NotInitialized(Module),

    #[error("Initialization of module {module:?} failed: {source}")]
    ModuleInit {
        module: Module,
        #[source]
        source: Box<WindrawError>,
    },

    #[error("Library loading failed: {0}")]
    Load(#[from] LoadError),

    #[error("Canvas error: {0}")]
    Canvas(#[from] CanvasError),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl WindrawError {
    /// Shorthand for a failed native call.
    pub fn native(call: &'static str, code: i32) -> Self {
        Self::Native { call, code }
    }
}

/// Dynamic library binding errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LoadError {
    #[error("Library {library} could not be loaded: {detail}")]
    LibraryNotFound { library: String, detail: String },

    #[error("Symbol {symbol} missing from {library}")]
    MissingSymbol {
        library: String,
        symbol: &'static str,
    },

    #[error("{library} startup returned status {status}")]
    Startup { library: String, status: i32 },
}

/// Canvas misuse and geometry errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CanvasError {
    #[error("Canvas was not created with RTL layout")]
    NotRtl,

    #[error("RTL compensation is already enabled")]
    RtlAlreadyEnabled,

    #[error("RTL compensation is not enabled")]
    RtlNotEnabled,

    #[error("Invalid double-buffer rectangle: {width}x{height}")]
    InvalidBuffer { width: i64, height: i64 },

    #[error("Canvas resources were already released")]
    Released,
}
