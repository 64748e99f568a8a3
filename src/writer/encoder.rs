//! Block-level GIF container writer.
//!
//! Serializes the fixed block grammar: header and logical screen
//! descriptor exactly once, an optional global color table and loop
//! extension before the first image, then per frame one graphic control
//! extension, one image descriptor with an optional local table and the
//! LZW-compressed pixel data, and finally a single trailer byte.

use std::io::prelude::*;

use log::trace;

use crate::lzw;
use crate::traits::WriteBytesExt;
use crate::types::{Block, DisposalMethod, Extension, Frame, Repeat};

use super::EncodingError;

pub enum ExtensionData {
    Control { flags: u8, delay: u16, trns: u8 },
}

impl ExtensionData {
    /// Packs a graphic control extension.
    ///
    /// With no transparent index the disposal/transparency nibble
    /// degenerates to zero flags and a zero index.
    pub fn new_control_ext(
        delay: u16,
        dispose: DisposalMethod,
        needs_user_input: bool,
        trns: Option<u8>,
    ) -> ExtensionData {
        let mut flags = 0;
        let trns = match trns {
            Some(trns) => {
                flags |= 1;
                trns
            }
            None => 0,
        };
        flags |= (needs_user_input as u8) << 1;
        flags |= (dispose as u8) << 2;
        ExtensionData::Control { flags, delay, trns }
    }
}

pub struct Encoder<W: Write> {
    w: W,
    header_written: bool,
    global_palette: bool,
    width: u16,
    height: u16,
}

impl<W: Write> Encoder<W> {
    pub fn new(w: W, width: u16, height: u16) -> Self {
        Encoder {
            w,
            header_written: false,
            global_palette: false,
            width,
            height,
        }
    }

    /// Writes the screen descriptor with a global color table.
    ///
    /// Must come before any frame or extension; once the descriptor is on
    /// the wire the table flag cannot be amended.
    pub fn write_global_palette(&mut self, palette: &[u8]) -> Result<(), EncodingError> {
        if self.header_written {
            return Err(EncodingError::ScreenDescriptorWritten);
        }
        self.global_palette = true;
        let size = flag_size(palette.len() / 3);
        // Global table flag, 8-bit color resolution, table size.
        let flags = 0b1000_0000 | 0b0111_0000 | size;
        self.write_screen_desc(flags)?;
        self.write_color_table(palette)?;
        Ok(())
    }

    /// Writes the Netscape looping extension.
    ///
    /// Belongs between the global palette and the first image.
    pub fn set_repeat(&mut self, repeat: Repeat) -> Result<(), EncodingError> {
        let count = match repeat {
            Repeat::Infinite => 0u16,
            Repeat::Finite(n) => n,
        };
        self.write_raw_extension(
            Extension::Application as u8,
            &[b"NETSCAPE2.0", &[1, count as u8, (count >> 8) as u8]],
        )
    }

    /// Writes a complete frame: control extension, image descriptor,
    /// optional local palette and compressed pixel data.
    pub fn write_frame(&mut self, frame: &Frame<'_>) -> Result<(), EncodingError> {
        self.write_screen_desc(0)?;
        self.write_extension(ExtensionData::new_control_ext(
            frame.delay,
            frame.dispose,
            frame.needs_user_input,
            frame.transparent,
        ))?;
        self.w.write_le(Block::Image as u8)?;
        self.w.write_le(frame.left)?;
        self.w.write_le(frame.top)?;
        self.w.write_le(frame.width)?;
        self.w.write_le(frame.height)?;
        match frame.palette {
            Some(ref palette) => {
                let flags = 0b1000_0000 | flag_size(palette.len() / 3);
                self.w.write_le(flags)?;
                self.write_color_table(palette)?;
            }
            None => {
                if !self.global_palette {
                    return Err(EncodingError::MissingColorTable);
                }
                self.w.write_le(0u8)?;
            }
        }
        self.write_image_block(&frame.buffer)?;
        trace!(
            "wrote {}x{} frame at ({}, {}), delay {}cs",
            frame.width, frame.height, frame.left, frame.top, frame.delay
        );
        Ok(())
    }

    fn write_image_block(&mut self, data: &[u8]) -> Result<(), EncodingError> {
        let max = data.iter().copied().max().unwrap_or(0) as usize;
        let min_code_size = (flag_size(max + 1) + 1).max(2);
        self.w.write_le(min_code_size)?;
        lzw::compress(data, min_code_size + 1, &mut self.w)?;
        // Zero-length sub-block terminates the image data.
        self.w.write_le(0u8)?;
        Ok(())
    }

    fn write_color_table(&mut self, table: &[u8]) -> Result<(), EncodingError> {
        let num_colors = table.len() / 3;
        let size = flag_size(num_colors);
        self.w.write_all(&table[..num_colors * 3])?;
        // Tables are padded to a power-of-two entry count per the GIF spec.
        for _ in 0..((2usize << size) - num_colors) {
            self.w.write_all(&[0, 0, 0])?;
        }
        Ok(())
    }

    /// Writes an extension to the image
    pub fn write_extension(&mut self, extension: ExtensionData) -> Result<(), EncodingError> {
        use self::ExtensionData::*;
        self.write_screen_desc(0)?;
        self.w.write_le(Block::Extension as u8)?;
        match extension {
            Control { flags, delay, trns } => {
                self.w.write_le(Extension::Control as u8)?;
                self.w.write_le(4u8)?;
                self.w.write_le(flags)?;
                self.w.write_le(delay)?;
                self.w.write_le(trns)?;
            }
        }
        self.w.write_le(0u8)?;
        Ok(())
    }

    /// Writes a raw extension, one sub-block per data slice.
    pub fn write_raw_extension(
        &mut self,
        func: u8,
        data: &[&[u8]],
    ) -> Result<(), EncodingError> {
        self.write_screen_desc(0)?;
        self.w.write_le(Block::Extension as u8)?;
        self.w.write_le(func)?;
        for block in data {
            for chunk in block.chunks(0xFF) {
                self.w.write_le(chunk.len() as u8)?;
                self.w.write_all(chunk)?;
            }
        }
        self.w.write_le(0u8)?;
        Ok(())
    }

    /// Writes the trailer and hands back the underlying writer.
    ///
    /// Valid with zero frames written; the result is then a minimal
    /// static GIF.
    pub fn finish(mut self) -> Result<W, EncodingError> {
        self.write_screen_desc(0)?;
        self.w.write_le(Block::Trailer as u8)?;
        Ok(self.w)
    }

    /// Writes the header and logical screen descriptor once.
    fn write_screen_desc(&mut self, flags: u8) -> Result<(), EncodingError> {
        if !self.header_written {
            self.w.write_all(b"GIF89a")?;
            self.w.write_le(self.width)?;
            self.w.write_le(self.height)?;
            self.w.write_le(flags)?; // packed field
            self.w.write_le(0u8)?; // bg index
            self.w.write_le(0u8)?; // aspect ratio
            self.header_written = true;
        }
        Ok(())
    }
}

// Color table size converted to flag bits
fn flag_size(size: usize) -> u8 {
    match size {
        0..=2 => 0,
        3..=4 => 1,
        5..=8 => 2,
        9..=16 => 3,
        17..=32 => 4,
        33..=64 => 5,
        65..=128 => 6,
        _ => 7,
    }
}
