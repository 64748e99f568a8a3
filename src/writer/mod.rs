//! GIF serialization: the block-level container writer and the
//! caller-facing animation layer on top of it.

use std::io;

use thiserror::Error;

mod animate;
mod encoder;

pub use self::animate::AnimationEncoder;
pub use self::encoder::{Encoder, ExtensionData};

/// Errors surfaced while writing a GIF stream.
#[derive(Debug, Error)]
pub enum EncodingError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    /// A frame carried no local palette and no global palette was written.
    #[error("the GIF format requires a color table but none was given")]
    MissingColorTable,
    /// A global palette was supplied after the screen descriptor went out.
    #[error("the logical screen descriptor was already written")]
    ScreenDescriptorWritten,
}
