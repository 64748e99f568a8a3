//! Caller-facing animation assembly.
//!
//! Accumulates raw RGBA frames into an in-memory GIF byte stream. Each
//! frame trains its own palette unless a shared palette is requested, in
//! which case the first frame's palette serves the whole animation. All
//! state is owned per instance; the encoder is single-threaded and the
//! types are `Send`, so a caller can move an export onto a worker thread.

use std::borrow::Cow;

use log::{debug, warn};

use crate::quant::NeuQuant;
use crate::types::{DisposalMethod, Frame, Repeat};

use super::{Encoder, EncodingError};

/// Builds an animated GIF frame by frame and yields the finished bytes.
///
/// ```
/// use gifanim::{AnimationEncoder, Repeat};
///
/// let mut enc = AnimationEncoder::new(2, 2);
/// enc.set_repeat(Some(Repeat::Infinite));
/// let pixels = [255u8; 2 * 2 * 4];
/// enc.add_frame(&pixels, 120).unwrap();
/// let bytes = enc.finish().unwrap();
/// assert!(bytes.starts_with(b"GIF89a"));
/// ```
pub struct AnimationEncoder {
    width: u16,
    height: u16,
    quality: i32,
    repeat: Option<Repeat>,
    transparent: Option<[u8; 3]>,
    shared_palette: bool,
    shared: Option<NeuQuant>,
    frames_written: usize,
    enc: Encoder<Vec<u8>>,
}

impl AnimationEncoder {
    pub fn new(width: u16, height: u16) -> Self {
        AnimationEncoder {
            width,
            height,
            quality: 10,
            repeat: None,
            transparent: None,
            shared_palette: false,
            shared: None,
            frames_written: 0,
            enc: Encoder::new(Vec::new(), width, height),
        }
    }

    /// Palette sampling quality: 1 is best and slowest, larger values
    /// sample more coarsely. Clamped to at least 1.
    pub fn set_quality(&mut self, quality: i32) {
        self.quality = quality.max(1);
    }

    /// Loop behavior. `None` writes no looping extension, so the
    /// animation plays once. Takes effect only before the first frame.
    pub fn set_repeat(&mut self, repeat: Option<Repeat>) {
        self.repeat = repeat;
    }

    /// Marks the palette entry nearest to `color` transparent in every
    /// frame. Takes effect for frames added afterwards.
    pub fn set_transparent(&mut self, color: Option<[u8; 3]>) {
        self.transparent = color;
    }

    /// Reuses the first frame's trained palette for all frames instead of
    /// training per frame. Takes effect only before the first frame.
    pub fn set_shared_palette(&mut self, shared: bool) {
        self.shared_palette = shared;
    }

    /// Quantizes one RGBA frame and writes it to the stream.
    ///
    /// `delay_ms` is rounded to GIF centisecond units. A buffer that does
    /// not match the declared dimensions is truncated or zero-padded
    /// rather than rejected.
    pub fn add_frame(&mut self, rgba: &[u8], delay_ms: u32) -> Result<(), EncodingError> {
        let expected = self.width as usize * self.height as usize * 4;
        if rgba.len() != expected {
            warn!(
                "frame {} is {} bytes, expected {}; clipping to declared size",
                self.frames_written,
                rgba.len(),
                expected
            );
        }
        let rgb: Vec<u8> = rgba
            .chunks_exact(4)
            .flat_map(|pix| [pix[0], pix[1], pix[2]])
            .collect();

        let first = self.frames_written == 0;
        // Shared mode trains on the first frame only; per-frame mode
        // retrains every time.
        let nq = match &mut self.shared {
            Some(nq) if self.shared_palette => &*nq,
            shared => &*shared.insert(NeuQuant::new(self.quality, &rgb)),
        };

        let mut buffer: Vec<u8> = rgb.chunks_exact(3).map(|pix| nq.index_of(pix) as u8).collect();
        buffer.resize(self.width as usize * self.height as usize, 0);
        let transparent = self.transparent.map(|c| nq.index_of(&c) as u8);

        let frame = Frame {
            delay: centiseconds(delay_ms),
            dispose: if transparent.is_some() {
                DisposalMethod::Background
            } else {
                DisposalMethod::Any
            },
            transparent,
            width: self.width,
            height: self.height,
            // The first palette becomes the global table; later frames
            // carry local tables only when trained per frame.
            palette: if first || self.shared_palette {
                None
            } else {
                Some(nq.color_map_rgb())
            },
            buffer: Cow::Owned(buffer),
            ..Frame::default()
        };

        if first {
            self.enc.write_global_palette(&nq.color_map_rgb())?;
            if let Some(repeat) = self.repeat {
                self.enc.set_repeat(repeat)?;
            }
        }
        self.enc.write_frame(&frame)?;
        self.frames_written += 1;
        debug!(
            "frame {} encoded ({} ms -> {} cs)",
            self.frames_written,
            delay_ms,
            frame.delay
        );
        Ok(())
    }

    /// Number of frames written so far.
    pub fn frames_written(&self) -> usize {
        self.frames_written
    }

    /// Writes the trailer and yields the complete byte stream.
    ///
    /// Finishing with zero frames is valid and produces a minimal empty
    /// GIF rather than an error.
    pub fn finish(self) -> Result<Vec<u8>, EncodingError> {
        self.enc.finish()
    }
}

/// GIF delays are centiseconds; round rather than truncate.
fn centiseconds(delay_ms: u32) -> u16 {
    ((delay_ms + 5) / 10).min(u16::MAX as u32) as u16
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delay_rounds_to_centiseconds() {
        assert_eq!(centiseconds(0), 0);
        assert_eq!(centiseconds(120), 12);
        assert_eq!(centiseconds(125), 13);
        assert_eq!(centiseconds(124), 12);
        assert_eq!(centiseconds(10_000_000), u16::MAX);
    }

    #[test]
    fn encoder_state_is_send() {
        fn assert_send<T: Send>() {}
        assert_send::<AnimationEncoder>();
    }

    #[test]
    fn quality_clamps_to_one() {
        let mut enc = AnimationEncoder::new(1, 1);
        enc.set_quality(-5);
        enc.add_frame(&[1, 2, 3, 255], 0).unwrap();
        assert_eq!(enc.frames_written(), 1);
    }
}
