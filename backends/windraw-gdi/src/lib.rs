//! Win32 plumbing shared by the windraw backends
//!
//! [`DcSurface`] wraps an `HDC` and implements the layout flag, memory DC
//! double buffering and `BitBlt` the canvas needs. [`SystemLibraries`] opens
//! DLLs for the runtime loader.

#![cfg(windows)]
#![allow(unsafe_code)]

mod library;

pub use library::{SystemLibraries, SystemLibrary};

use windows::Win32::Foundation::HWND;
use windows::Win32::Graphics::Gdi::{
    BitBlt, CreateCompatibleBitmap, CreateCompatibleDC, DeleteDC, DeleteObject, GetDC, GetLayout,
    ReleaseDC, SelectObject, SetLayout, SetViewportOrgEx, DC_LAYOUT, HBITMAP, HDC, HGDIOBJ,
    SRCCOPY,
};

use windraw_core::{IPoint, IRect, Layout, Result, Size, Surface, WindrawError};

/// `GetLayout`/`SetLayout` report failure as `GDI_ERROR`.
const GDI_ERROR: u32 = u32::MAX;

/// Error for a GDI call that reports failure through `GetLastError`.
fn last_error(call: &'static str) -> WindrawError {
    let code = windows::core::Error::from_win32().code().0;
    log::error!("{} failed: {:#x}", call, code);
    WindrawError::native(call, code)
}

#[derive(Debug)]
enum Ownership {
    /// Owned by the caller; never released here.
    Borrowed,
    /// Obtained with `GetDC` and released with `ReleaseDC`.
    Window(HWND),
    /// Memory DC with a bitmap selected into it.
    Memory { bitmap: HBITMAP, previous: HGDIOBJ },
}

/// A GDI device context.
#[derive(Debug)]
pub struct DcSurface {
    dc: HDC,
    ownership: Ownership,
}

impl DcSurface {
    /// Wraps a device context owned by the caller.
    ///
    /// # Safety
    ///
    /// `dc` must be a valid device context that outlives the surface.
    pub unsafe fn from_raw(dc: HDC) -> Self {
        Self {
            dc,
            ownership: Ownership::Borrowed,
        }
    }

    /// Obtains the client area DC of `hwnd`. The DC is released by
    /// [`Surface::dispose`], so such a surface is usually handed to a canvas
    /// as an owned target.
    pub fn for_window(hwnd: HWND) -> Result<Self> {
        let dc = unsafe { GetDC(hwnd) };
        if dc.is_invalid() {
            return Err(last_error("GetDC"));
        }
        Ok(Self {
            dc,
            ownership: Ownership::Window(hwnd),
        })
    }

    pub fn hdc(&self) -> HDC {
        self.dc
    }

    pub fn is_memory(&self) -> bool {
        matches!(self.ownership, Ownership::Memory { .. })
    }
}

impl Surface for DcSurface {
    fn layout(&self) -> Layout {
        let layout = unsafe { GetLayout(self.dc) };
        if layout == GDI_ERROR {
            Layout::LEFT_TO_RIGHT
        } else {
            Layout(layout)
        }
    }

    fn set_layout(&mut self, layout: Layout) -> Result<Layout> {
        let previous = unsafe { SetLayout(self.dc, DC_LAYOUT(layout.0)) };
        if previous == GDI_ERROR {
            return Err(last_error("SetLayout"));
        }
        Ok(Layout(previous))
    }

    fn create_buffer(&self, size: Size) -> Result<Self> {
        unsafe {
            let dc = CreateCompatibleDC(self.dc);
            if dc.is_invalid() {
                return Err(last_error("CreateCompatibleDC"));
            }
            let bitmap = CreateCompatibleBitmap(self.dc, size.width as i32, size.height as i32);
            if bitmap.is_invalid() {
                let err = last_error("CreateCompatibleBitmap");
                let _ = DeleteDC(dc);
                return Err(err);
            }
            let previous = SelectObject(dc, bitmap);
            Ok(Self {
                dc,
                ownership: Ownership::Memory { bitmap, previous },
            })
        }
    }

    fn set_origin(&mut self, origin: IPoint) -> Result<()> {
        let ok = unsafe { SetViewportOrgEx(self.dc, origin.x, origin.y, None) };
        if !ok.as_bool() {
            return Err(last_error("SetViewportOrgEx"));
        }
        Ok(())
    }

    fn blit(&mut self, source: &Self, area: IRect) -> Result<()> {
        unsafe {
            BitBlt(
                self.dc,
                area.left,
                area.top,
                area.width(),
                area.height(),
                source.dc,
                area.left,
                area.top,
                SRCCOPY,
            )
        }
        .map_err(|e| {
            log::error!("BitBlt failed: {}", e);
            WindrawError::native("BitBlt", e.code().0)
        })
    }

    fn dispose(self) -> Result<()> {
        unsafe {
            match self.ownership {
                Ownership::Borrowed => Ok(()),
                Ownership::Window(hwnd) => {
                    if ReleaseDC(hwnd, self.dc) == 0 {
                        return Err(last_error("ReleaseDC"));
                    }
                    Ok(())
                }
                Ownership::Memory { bitmap, previous } => {
                    SelectObject(self.dc, previous);
                    let _ = DeleteObject(bitmap);
                    if !DeleteDC(self.dc).as_bool() {
                        return Err(last_error("DeleteDC"));
                    }
                    Ok(())
                }
            }
        }
    }
}
