//! Win32 shared library loading

use std::ffi::{c_void, CString};
use std::mem;
use std::path::PathBuf;
use std::ptr::NonNull;

use windows::core::{HSTRING, PCSTR};
use windows::Win32::Foundation::{FreeLibrary, HMODULE};
use windows::Win32::System::LibraryLoader::{GetProcAddress, LoadLibraryW};
use windows::Win32::System::SystemInformation::{
    GetSystemDirectoryW, GetVersionExW, OSVERSIONINFOW,
};

use windraw_core::{Library, LibraryProvider, LoadError, SymbolSource};

/// A DLL loaded with `LoadLibraryW`, freed on drop.
#[derive(Debug)]
pub struct SystemLibrary {
    name: String,
    module: HMODULE,
}

// Module handles are process wide and usable from any thread.
unsafe impl Send for SystemLibrary {}
unsafe impl Sync for SystemLibrary {}

impl SystemLibrary {
    fn open(display: String, path: &HSTRING) -> Result<Self, LoadError> {
        let module = unsafe { LoadLibraryW(path) }.map_err(|e| LoadError::LibraryNotFound {
            library: display.clone(),
            detail: e.message(),
        })?;
        Ok(Self {
            name: display,
            module,
        })
    }
}

impl SymbolSource for SystemLibrary {
    fn name(&self) -> &str {
        &self.name
    }

    fn symbol(&self, name: &str) -> Option<NonNull<c_void>> {
        let name = CString::new(name).ok()?;
        let address = unsafe { GetProcAddress(self.module, PCSTR::from_raw(name.as_ptr().cast())) }?;
        NonNull::new(address as *mut c_void)
    }
}

impl Library for SystemLibrary {}

impl Drop for SystemLibrary {
    fn drop(&mut self) {
        if let Err(err) = unsafe { FreeLibrary(self.module) } {
            log::warn!("FreeLibrary({}) failed: {}", self.name, err);
        }
    }
}

/// Loads DLLs from the system directory only, so a same-named DLL next to
/// the executable or in the working directory is never picked up by
/// accident. The application-local copy is used only when allowed.
#[derive(Debug, Clone, Copy)]
pub struct SystemLibraries {
    bundled_fallback: bool,
}

impl SystemLibraries {
    /// `bundled_fallback` comes from configuration. Windows 2000 ships without
    /// GDI+, so there the bundled copy is always allowed.
    pub fn new(bundled_fallback: bool) -> Self {
        Self {
            bundled_fallback: bundled_fallback || is_windows_2000(),
        }
    }
}

impl LibraryProvider for SystemLibraries {
    type Library = SystemLibrary;

    fn load_system(&self, name: &str) -> Result<SystemLibrary, LoadError> {
        let path = system_directory()
            .ok_or_else(|| LoadError::LibraryNotFound {
                library: name.to_string(),
                detail: "system directory unknown".to_string(),
            })?
            .join(name);
        SystemLibrary::open(path.display().to_string(), &HSTRING::from(path.as_os_str()))
    }

    fn load_bundled(&self, name: &str) -> Result<SystemLibrary, LoadError> {
        SystemLibrary::open(name.to_string(), &HSTRING::from(name))
    }

    fn allows_bundled_fallback(&self) -> bool {
        self.bundled_fallback
    }
}

fn system_directory() -> Option<PathBuf> {
    let mut buffer = [0u16; 260];
    let len = unsafe { GetSystemDirectoryW(Some(&mut buffer)) } as usize;
    if len == 0 || len > buffer.len() {
        return None;
    }
    Some(PathBuf::from(String::from_utf16_lossy(&buffer[..len])))
}

fn is_windows_2000() -> bool {
    let mut info = OSVERSIONINFOW {
        dwOSVersionInfoSize: mem::size_of::<OSVERSIONINFOW>() as u32,
        ..Default::default()
    };
    match unsafe { GetVersionExW(&mut info) } {
        Ok(()) => info.dwMajorVersion == 5 && info.dwMinorVersion == 0,
        Err(_) => false,
    }
}
