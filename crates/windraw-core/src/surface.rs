//! Native drawing surfaces

use std::ops::{Deref, DerefMut};

use crate::error::Result;
use crate::types::{IPoint, IRect, Layout, Size};

/// A device context a canvas can draw on.
pub trait Surface: Sized {
    fn layout(&self) -> Layout;

    /// Replaces the layout flags, returning the previous ones.
    fn set_layout(&mut self, layout: Layout) -> Result<Layout>;

    /// Creates an off-screen surface of `size` compatible with this one.
    /// The returned surface keeps whatever it displaced so that
    /// [`dispose`](Surface::dispose) can put it back.
    fn create_buffer(&self, size: Size) -> Result<Self>;

    /// Moves the logical origin so that logical `(0, 0)` lands on device
    /// pixel `origin`.
    fn set_origin(&mut self, origin: IPoint) -> Result<()>;

    /// Copies `area` of `source` onto the same logical area of `self`.
    fn blit(&mut self, source: &Self, area: IRect) -> Result<()>;

    /// Frees the surface. Off-screen buffers restore their prior content
    /// first.
    fn dispose(self) -> Result<()>;
}

/// The surface a canvas draws on, either borrowed from the caller or owned by
/// the canvas and disposed of at release.
#[derive(Debug)]
pub enum Target<'s, S> {
    Borrowed(&'s mut S),
    Owned(S),
}

impl<S> Target<'_, S> {
    pub fn is_owned(&self) -> bool {
        matches!(self, Target::Owned(_))
    }
}

impl<'s, S> From<&'s mut S> for Target<'s, S> {
    fn from(surface: &'s mut S) -> Self {
        Target::Borrowed(surface)
    }
}

impl<S> Deref for Target<'_, S> {
    type Target = S;

    fn deref(&self) -> &S {
        match self {
            Target::Borrowed(s) => s,
            Target::Owned(s) => s,
        }
    }
}

impl<S> DerefMut for Target<'_, S> {
    fn deref_mut(&mut self) -> &mut S {
        match self {
            Target::Borrowed(s) => s,
            Target::Owned(s) => s,
        }
    }
}
