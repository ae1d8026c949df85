//! Runtime-bound Direct2D and DirectWrite entry points

use std::ffi::c_void;

use windows::core::{GUID, HRESULT};
use windows::Win32::Graphics::Direct2D::{D2D1_FACTORY_OPTIONS, D2D1_FACTORY_TYPE};
use windows::Win32::Graphics::DirectWrite::DWRITE_FACTORY_TYPE;

use windraw_core::loader::ShutdownHook;
use windraw_core::{function_table, FunctionTable, LoadError, SymbolSource};

pub const D2D1_DLL: &str = "D2D1.DLL";
pub const DWRITE_DLL: &str = "DWRITE.DLL";

function_table! {
    pub struct D2d1Api {
        create_factory: "D2D1CreateFactory" => unsafe extern "system" fn(
            D2D1_FACTORY_TYPE,
            *const GUID,
            *const D2D1_FACTORY_OPTIONS,
            *mut *mut c_void,
        ) -> HRESULT,
    }
}

function_table! {
    pub struct DWriteApi {
        create_factory: "DWriteCreateFactory" => unsafe extern "system" fn(
            DWRITE_FACTORY_TYPE,
            *const GUID,
            *mut *mut c_void,
        ) -> HRESULT,
    }
}

// Neither library has a startup call; binding the table is all there is.
macro_rules! no_startup {
    ($($table:ident),*) => {
        $(
            impl FunctionTable for $table {
                type Token = ();

                fn resolve(source: &dyn SymbolSource) -> Result<Self, LoadError> {
                    Self::resolve_symbols(source)
                }

                fn startup(&self) -> Result<(), i32> {
                    Ok(())
                }

                fn shutdown_hook(&self) -> ShutdownHook<()> {
                    Box::new(|()| {})
                }
            }
        )*
    };
}

no_startup!(D2d1Api, DWriteApi);
