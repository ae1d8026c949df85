//! Right-to-left layout compensation
//!
//! Canvases force their surface into left-to-right mode and implement RTL
//! themselves by composing a reflection into the installed transform:
//!
//! ```text
//! E = U · R · T(bias)     R = [[-1, 0], [0, 1], [width, 0]]
//! ```
//!
//! `U` is the caller's transform and `R` is applied after it, so the caller
//! keeps positioning in unmirrored canvas coordinates. The compositor keeps
//! the exact `U` it saw on enable and hands it back on disable; `E` is never
//! inverted.

use crate::error::CanvasError;
use crate::transform::Matrix;

/// Direct2D addresses pixel edges while GDI addresses pixel centers; a
/// half-pixel shift makes a one pixel wide stroke on an integer coordinate
/// cover exactly one pixel column, as it does under GDI.
pub const D2D_BASE_DELTA_X: f32 = 0.5;
pub const D2D_BASE_DELTA_Y: f32 = 0.5;

/// GDI+ treats the right-most pixel column of a mirrored layout as `width - 1`
/// rather than `width`.
pub const GDIPLUS_RTL_DELTA_X: f32 = -1.0;

/// Device-space correction a backend needs so both engines round to the same
/// pixels, in normal and in mirrored mode.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct PixelBias {
    pub ltr: (f32, f32),
    pub rtl: (f32, f32),
}

impl PixelBias {
    pub const NONE: PixelBias = PixelBias {
        ltr: (0.0, 0.0),
        rtl: (0.0, 0.0),
    };

    /// Mirroring the half-pixel shift flips its horizontal sign.
    pub const DIRECT2D: PixelBias = PixelBias {
        ltr: (D2D_BASE_DELTA_X, D2D_BASE_DELTA_Y),
        rtl: (-D2D_BASE_DELTA_X, D2D_BASE_DELTA_Y),
    };

    pub const GDIPLUS: PixelBias = PixelBias {
        ltr: (0.0, 0.0),
        rtl: (GDIPLUS_RTL_DELTA_X, 0.0),
    };

    /// Base transform of a left-to-right canvas.
    pub fn ltr_base(&self) -> Matrix {
        Matrix::translation(self.ltr.0, self.ltr.1)
    }

    /// Reflection of a `width` pixel layout including the mirrored bias.
    pub fn rtl_base(&self, width: u32) -> Matrix {
        Matrix::mirror(width as f32).offset(self.rtl.0, self.rtl.1)
    }
}

/// Per-canvas RTL state with a single saved-transform slot.
#[derive(Debug, Clone)]
pub struct RtlCompositor {
    mirror: Matrix,
    saved: Option<Matrix>,
}

impl RtlCompositor {
    pub fn new(width: u32, bias: PixelBias) -> Self {
        Self {
            mirror: bias.rtl_base(width),
            saved: None,
        }
    }

    /// The reflection (with bias) composed after the user transform.
    pub fn mirror(&self) -> Matrix {
        self.mirror
    }

    pub fn is_enabled(&self) -> bool {
        self.saved.is_some()
    }

    /// The user transform saved by the last [`enable`](Self::enable).
    pub fn saved(&self) -> Option<Matrix> {
        self.saved
    }

    /// Saves `installed` verbatim and returns the compensated transform to
    /// install in its place.
    pub fn enable(&mut self, installed: Matrix) -> Result<Matrix, CanvasError> {
        if self.saved.is_some() {
            return Err(CanvasError::RtlAlreadyEnabled);
        }
        self.saved = Some(installed);
        Ok(self.compose(&installed))
    }

    /// Returns the transform saved at the matching [`enable`](Self::enable).
    pub fn disable(&mut self) -> Result<Matrix, CanvasError> {
        self.saved.take().ok_or(CanvasError::RtlNotEnabled)
    }

    /// Replaces the saved user transform while enabled and returns the new
    /// compensated transform.
    pub fn rebase(&mut self, user: Matrix) -> Result<Matrix, CanvasError> {
        match self.saved.as_mut() {
            Some(saved) => {
                *saved = user;
                Ok(self.compose(&user))
            }
            None => Err(CanvasError::RtlNotEnabled),
        }
    }

    pub fn compose(&self, user: &Matrix) -> Matrix {
        user.then(&self.mirror)
    }
}
