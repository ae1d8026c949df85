//! Factories behind the core, image codec and text layout modules

use std::ptr;
use std::sync::Arc;
use std::thread::{self, ThreadId};

use windows::core::Interface;
use windows::Win32::Graphics::Direct2D::{ID2D1Factory, D2D1_FACTORY_TYPE_MULTI_THREADED};
use windows::Win32::Graphics::DirectWrite::{IDWriteFactory, DWRITE_FACTORY_TYPE_SHARED};
use windows::Win32::Graphics::Imaging::{CLSID_WICImagingFactory, IWICImagingFactory};
use windows::Win32::System::Com::{
    CoCreateInstance, CoInitializeEx, CoUninitialize, CLSCTX_INPROC_SERVER, COINIT_MULTITHREADED,
};

use windraw_core::{loader, LoadedLibrary, Module, Result};
use windraw_gdi::{SystemLibraries, SystemLibrary};

use crate::api::{D2d1Api, DWriteApi, D2D1_DLL, DWRITE_DLL};
use crate::backend::D2dBackend;
use crate::hresult;

pub(crate) type D2d1 = LoadedLibrary<D2d1Api, SystemLibrary>;
type DWrite = LoadedLibrary<DWriteApi, SystemLibrary>;

pub(crate) fn create_factory(d2d1: &D2d1) -> Result<ID2D1Factory> {
    let mut raw = ptr::null_mut();
    unsafe {
        (d2d1.create_factory)(
            D2D1_FACTORY_TYPE_MULTI_THREADED,
            &ID2D1Factory::IID,
            ptr::null(),
            &mut raw,
        )
        .ok()
        .map_err(hresult("D2D1CreateFactory"))?;
        Ok(ID2D1Factory::from_raw(raw))
    }
}

/// Whether Direct2D is usable here.
pub fn probe() -> bool {
    let result = loader::load::<D2d1Api, _>(&SystemLibraries::new(false), D2D1_DLL)
        .map_err(Into::into)
        .and_then(|d2d1| create_factory(&d2d1).map(drop));
    match result {
        Ok(()) => true,
        Err(err) => {
            log::debug!("Direct2D unavailable: {}", err);
            false
        }
    }
}

/// Balances a successful `CoInitializeEx`. COM counts apartment entries per
/// thread, so only the entering thread may leave again.
struct ComApartment {
    thread: ThreadId,
}

impl ComApartment {
    fn enter() -> Option<Self> {
        let hr = unsafe { CoInitializeEx(None, COINIT_MULTITHREADED) };
        if hr.is_ok() {
            Some(ComApartment {
                thread: thread::current().id(),
            })
        } else {
            // The thread already lives in another apartment; use that one.
            log::debug!("CoInitializeEx: {:?}", hr);
            None
        }
    }
}

impl Drop for ComApartment {
    fn drop(&mut self) {
        let current = thread::current().id();
        if current == self.thread {
            unsafe { CoUninitialize() };
        } else {
            log::warn!(
                "COM apartment entered on {:?} is released on {:?}; leaving it in place",
                self.thread,
                current
            );
        }
    }
}

struct Imaging {
    factory: IWICImagingFactory,
    _com: Option<ComApartment>,
}

struct Text {
    factory: IDWriteFactory,
    _dwrite: DWrite,
}

/// The Direct2D side of the module lifecycle.
#[derive(Default)]
pub struct D2dModules {
    core: Option<Arc<D2dBackend>>,
    imaging: Option<Imaging>,
    text: Option<Text>,
}

// Every factory is created multi-threaded, and all access goes through the
// runtime lock.
unsafe impl Send for D2dModules {}

impl D2dModules {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn init(&mut self, module: Module) -> Result<()> {
        match module {
            Module::Core => {
                let d2d1 = loader::load::<D2d1Api, _>(&SystemLibraries::new(false), D2D1_DLL)?;
                let factory = create_factory(&d2d1)?;
                self.core = Some(Arc::new(D2dBackend::new(factory, Arc::new(d2d1))));
            }
            Module::ImageCodec => {
                let com = ComApartment::enter();
                let factory: IWICImagingFactory = unsafe {
                    CoCreateInstance(&CLSID_WICImagingFactory, None, CLSCTX_INPROC_SERVER)
                }
                .map_err(hresult("CoCreateInstance(WICImagingFactory)"))?;
                self.imaging = Some(Imaging { factory, _com: com });
            }
            Module::TextLayout => {
                let dwrite = loader::load::<DWriteApi, _>(&SystemLibraries::new(false), DWRITE_DLL)?;
                let mut raw = ptr::null_mut();
                let factory = unsafe {
                    (dwrite.create_factory)(DWRITE_FACTORY_TYPE_SHARED, &IDWriteFactory::IID, &mut raw)
                        .ok()
                        .map_err(hresult("DWriteCreateFactory"))?;
                    IDWriteFactory::from_raw(raw)
                };
                self.text = Some(Text {
                    factory,
                    _dwrite: dwrite,
                });
            }
        }
        log::debug!("Direct2D module {:?} up", module);
        Ok(())
    }

    pub fn fini(&mut self, module: Module) {
        match module {
            Module::Core => self.core = None,
            Module::ImageCodec => self.imaging = None,
            Module::TextLayout => self.text = None,
        }
        log::debug!("Direct2D module {:?} down", module);
    }

    pub fn backend(&self) -> Option<Arc<D2dBackend>> {
        self.core.clone()
    }

    pub fn imaging_factory(&self) -> Option<&IWICImagingFactory> {
        self.imaging.as_ref().map(|i| &i.factory)
    }

    pub fn text_factory(&self) -> Option<&IDWriteFactory> {
        self.text.as_ref().map(|t| &t.factory)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use windows::Win32::Foundation::S_FALSE;

    #[test]
    fn test_apartment_left_only_on_entering_thread() {
        let com = ComApartment::enter().expect("fresh test thread enters the MTA");
        thread::spawn(move || drop(com)).join().unwrap();

        // still inside the apartment: entering again only bumps the count
        let again = unsafe { CoInitializeEx(None, COINIT_MULTITHREADED) };
        assert_eq!(again, S_FALSE);
        unsafe {
            CoUninitialize();
            CoUninitialize();
        }
    }

    #[test]
    fn test_apartment_balanced_on_same_thread() {
        thread::spawn(|| {
            drop(ComApartment::enter().expect("fresh thread enters the MTA"));
            let hr = unsafe { CoInitializeEx(None, COINIT_MULTITHREADED) };
            assert!(hr.is_ok());
            assert_ne!(hr, S_FALSE);
            unsafe { CoUninitialize() };
        })
        .join()
        .unwrap();
    }
}
