//! GDI+ flat API entry points

use std::ffi::c_void;
use std::ptr;

use windows::Win32::Graphics::Gdi::HDC;

use windraw_core::loader::ShutdownHook;
use windraw_core::{function_table, FunctionTable, LoadError, SymbolSource, WindrawError};

pub const GDIPLUS_DLL: &str = "GDIPLUS.DLL";

/// `GpStatus`; zero is success.
pub type Status = i32;

pub(crate) const STATUS_OUT_OF_MEMORY: Status = 3;

pub(crate) const UNIT_PIXEL: i32 = 2;
pub(crate) const SMOOTHING_HIGH_QUALITY: i32 = 2;
/// Only understood by GDI+ 1.1.
pub(crate) const SMOOTHING_ANTIALIAS_8X8: i32 = 5;
pub(crate) const COMBINE_REPLACE: i32 = 0;
pub(crate) const FLUSH_INTENTION_FLUSH: i32 = 0;

macro_rules! opaque {
    ($($name:ident),*) => {
        $(
            #[repr(C)]
            pub struct $name {
                _opaque: [u8; 0],
            }
        )*
    };
}

opaque!(GpGraphics, GpMatrix, GpSolidFill, GpPen);

/// `GdiplusStartupInput`
#[repr(C)]
pub struct StartupInput {
    pub version: u32,
    pub debug_event_callback: *mut c_void,
    pub suppress_background_thread: i32,
    pub suppress_external_codecs: i32,
}

impl Default for StartupInput {
    fn default() -> Self {
        Self {
            version: 1,
            debug_event_callback: ptr::null_mut(),
            suppress_background_thread: 0,
            suppress_external_codecs: 1,
        }
    }
}

type Graphics = *mut GpGraphics;

function_table! {
    /// Every GDI+ entry point windraw uses. Binding fails unless all of them
    /// are exported.
    pub struct GdiplusApi {
        startup: "GdiplusStartup" =>
            unsafe extern "system" fn(*mut usize, *const StartupInput, *mut c_void) -> Status,
        shutdown: "GdiplusShutdown" => unsafe extern "system" fn(usize),

        create_from_hdc: "GdipCreateFromHDC" =>
            unsafe extern "system" fn(HDC, *mut Graphics) -> Status,
        delete_graphics: "GdipDeleteGraphics" => unsafe extern "system" fn(Graphics) -> Status,
        graphics_clear: "GdipGraphicsClear" => unsafe extern "system" fn(Graphics, u32) -> Status,
        set_page_unit: "GdipSetPageUnit" => unsafe extern "system" fn(Graphics, i32) -> Status,
        set_smoothing_mode: "GdipSetSmoothingMode" =>
            unsafe extern "system" fn(Graphics, i32) -> Status,
        flush: "GdipFlush" => unsafe extern "system" fn(Graphics, i32) -> Status,

        reset_clip: "GdipResetClip" => unsafe extern "system" fn(Graphics) -> Status,
        set_clip_rect: "GdipSetClipRect" =>
            unsafe extern "system" fn(Graphics, f32, f32, f32, f32, i32) -> Status,

        create_matrix2: "GdipCreateMatrix2" =>
            unsafe extern "system" fn(f32, f32, f32, f32, f32, f32, *mut *mut GpMatrix) -> Status,
        delete_matrix: "GdipDeleteMatrix" => unsafe extern "system" fn(*mut GpMatrix) -> Status,
        get_matrix_elements: "GdipGetMatrixElements" =>
            unsafe extern "system" fn(*const GpMatrix, *mut f32) -> Status,
        get_world_transform: "GdipGetWorldTransform" =>
            unsafe extern "system" fn(Graphics, *mut GpMatrix) -> Status,
        set_world_transform: "GdipSetWorldTransform" =>
            unsafe extern "system" fn(Graphics, *mut GpMatrix) -> Status,

        create_solid_fill: "GdipCreateSolidFill" =>
            unsafe extern "system" fn(u32, *mut *mut GpSolidFill) -> Status,
        delete_brush: "GdipDeleteBrush" => unsafe extern "system" fn(*mut GpSolidFill) -> Status,
        set_solid_fill_color: "GdipSetSolidFillColor" =>
            unsafe extern "system" fn(*mut GpSolidFill, u32) -> Status,

        create_pen1: "GdipCreatePen1" =>
            unsafe extern "system" fn(u32, f32, i32, *mut *mut GpPen) -> Status,
        delete_pen: "GdipDeletePen" => unsafe extern "system" fn(*mut GpPen) -> Status,
        set_pen_color: "GdipSetPenColor" => unsafe extern "system" fn(*mut GpPen, u32) -> Status,
        set_pen_width: "GdipSetPenWidth" => unsafe extern "system" fn(*mut GpPen, f32) -> Status,

        draw_line: "GdipDrawLine" =>
            unsafe extern "system" fn(Graphics, *mut GpPen, f32, f32, f32, f32) -> Status,
        draw_rectangle: "GdipDrawRectangle" =>
            unsafe extern "system" fn(Graphics, *mut GpPen, f32, f32, f32, f32) -> Status,
        fill_rectangle: "GdipFillRectangle" =>
            unsafe extern "system" fn(Graphics, *mut GpSolidFill, f32, f32, f32, f32) -> Status,
    }
}

impl FunctionTable for GdiplusApi {
    type Token = usize;

    fn resolve(source: &dyn SymbolSource) -> Result<Self, LoadError> {
        Self::resolve_symbols(source)
    }

    fn startup(&self) -> Result<usize, i32> {
        let input = StartupInput::default();
        let mut token = 0usize;
        match unsafe { (self.startup)(&mut token, &input, ptr::null_mut()) } {
            0 => Ok(token),
            status => Err(status),
        }
    }

    fn shutdown_hook(&self) -> ShutdownHook<usize> {
        let shutdown = self.shutdown;
        Box::new(move |token| unsafe { shutdown(token) })
    }
}

/// Maps a GDI+ status to a result.
pub(crate) fn check(call: &'static str, status: Status) -> windraw_core::Result<()> {
    match status {
        0 => Ok(()),
        STATUS_OUT_OF_MEMORY => {
            log::error!("{} ran out of memory", call);
            Err(WindrawError::OutOfMemory)
        }
        code => {
            log::error!("{} failed with status {}", call, code);
            Err(WindrawError::native(call, code))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_startup_input_layout() {
        let input = StartupInput::default();
        assert_eq!(input.version, 1);
        assert_eq!(input.suppress_external_codecs, 1);
        assert_eq!(
            std::mem::size_of::<StartupInput>(),
            if cfg!(target_pointer_width = "64") { 24 } else { 16 }
        );
    }

    #[test]
    fn test_symbol_table_starts_with_startup_pair() {
        assert_eq!(&GdiplusApi::SYMBOLS[..2], &["GdiplusStartup", "GdiplusShutdown"]);
        assert!(GdiplusApi::SYMBOLS.iter().skip(2).all(|s| s.starts_with("Gdip")));
    }

    #[test]
    fn test_status_mapping() {
        assert!(check("GdipFlush", 0).is_ok());
        assert!(matches!(check("GdipFlush", 3), Err(WindrawError::OutOfMemory)));
        assert!(matches!(
            check("GdipFlush", 2),
            Err(WindrawError::Native { call: "GdipFlush", code: 2 })
        ));
    }
}
