//! Common types shared by the container writer and the animation layer.

use std::borrow::Cow;

use crate::quant::NeuQuant;

/// Disposal method
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[repr(u8)]
pub enum DisposalMethod {
    /// Decoder is not required to take any action.
    Any = 0,
    /// Do not dispose.
    Keep = 1,
    /// Restore to background color.
    Background = 2,
    /// Restore to previous.
    Previous = 3,
}

impl DisposalMethod {
    pub fn from_u8(n: u8) -> Option<DisposalMethod> {
        match n {
            0 => Some(DisposalMethod::Any),
            1 => Some(DisposalMethod::Keep),
            2 => Some(DisposalMethod::Background),
            3 => Some(DisposalMethod::Previous),
            _ => None,
        }
    }
}

/// Known block types
#[derive(Debug, Copy, Clone)]
#[repr(u8)]
pub enum Block {
    Image = 0x2C,
    Extension = 0x21,
    Trailer = 0x3B,
}

/// Known GIF extensions
#[derive(Debug, Copy, Clone)]
#[repr(u8)]
pub enum Extension {
    Text = 0x01,
    Control = 0xF9,
    Comment = 0xFE,
    Application = 0xFF,
}

/// How often the animation replays, carried by the Netscape application
/// extension. Omitting the extension altogether means play once.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Repeat {
    /// Loop forever (loop count 0 on the wire).
    Infinite,
    /// Replay `n` additional times.
    Finite(u16),
}

/// A GIF frame: palette-indexed pixels plus its control-block settings.
#[derive(Debug, Clone)]
pub struct Frame<'a> {
    /// Display delay in centiseconds.
    pub delay: u16,
    pub dispose: DisposalMethod,
    /// Palette index treated as transparent, if any.
    pub transparent: Option<u8>,
    pub needs_user_input: bool,
    pub top: u16,
    pub left: u16,
    pub width: u16,
    pub height: u16,
    /// Local color table as packed RGB bytes; `None` uses the global table.
    pub palette: Option<Vec<u8>>,
    /// One palette index per pixel, row-major.
    pub buffer: Cow<'a, [u8]>,
}

impl<'a> Default for Frame<'a> {
    fn default() -> Frame<'a> {
        Frame {
            delay: 0,
            dispose: DisposalMethod::Any,
            transparent: None,
            needs_user_input: false,
            top: 0,
            left: 0,
            width: 0,
            height: 0,
            palette: None,
            buffer: Cow::Borrowed(&[]),
        }
    }
}

impl Frame<'static> {
    /// Creates a frame from pixels in RGBA format, training a fresh
    /// palette over the frame's colors.
    ///
    /// Fully transparent pixels (alpha 0) are mapped to a transparent
    /// palette index. `speed` is the quantizer sample factor, 1 (best)
    /// to 30 (fastest).
    pub fn from_rgba(width: u16, height: u16, pixels: &[u8], speed: i32) -> Frame<'static> {
        assert_eq!(width as usize * height as usize * 4, pixels.len());
        let mut transparent = None;
        let mut rgb = Vec::with_capacity(width as usize * height as usize * 3);
        for pix in pixels.chunks_exact(4) {
            if pix[3] == 0 {
                transparent = Some([pix[0], pix[1], pix[2]]);
            }
            rgb.extend_from_slice(&pix[..3]);
        }
        let nq = NeuQuant::new(speed, &rgb);
        Frame {
            width,
            height,
            buffer: Cow::Owned(rgb.chunks_exact(3).map(|pix| nq.index_of(pix) as u8).collect()),
            palette: Some(nq.color_map_rgb()),
            transparent: transparent.map(|t| nq.index_of(&t) as u8),
            ..Frame::default()
        }
    }

    /// Creates a frame from pixels in RGB format.
    pub fn from_rgb(width: u16, height: u16, pixels: &[u8], speed: i32) -> Frame<'static> {
        assert_eq!(width as usize * height as usize * 3, pixels.len());
        let nq = NeuQuant::new(speed, pixels);
        Frame {
            width,
            height,
            buffer: Cow::Owned(pixels.chunks_exact(3).map(|pix| nq.index_of(pix) as u8).collect()),
            palette: Some(nq.color_map_rgb()),
            ..Frame::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disposal_round_trips_through_u8() {
        for n in 0..4u8 {
            assert_eq!(DisposalMethod::from_u8(n).map(|d| d as u8), Some(n));
        }
        assert_eq!(DisposalMethod::from_u8(4), None);
    }

    #[test]
    fn from_rgba_maps_transparent_pixels() {
        // 2x1: one opaque red pixel, one fully transparent.
        let pixels = [255, 0, 0, 255, 0, 255, 0, 0];
        let frame = Frame::from_rgba(2, 1, &pixels, 1);
        assert_eq!(frame.buffer.len(), 2);
        assert_eq!(frame.transparent, Some(frame.buffer[1]));
        assert_eq!(frame.palette.as_ref().map(|p| p.len()), Some(768));
    }
}
