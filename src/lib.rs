//! Animated GIF encoder with NeuQuant color quantization.
//!
//! Turns raw RGBA frames into a complete GIF89a byte stream: a neural
//! network trains a 256-color palette per frame (or one shared palette),
//! the indexed pixels are LZW-compressed, and the container writer
//! assembles the block stream. Everything runs single-threaded with
//! state owned per encode, so exports can be moved onto worker threads
//! freely.
//!
//! The high-level entry point is [`AnimationEncoder`]:
//!
//! ```
//! use gifanim::{AnimationEncoder, Repeat};
//!
//! let mut enc = AnimationEncoder::new(4, 4);
//! enc.set_repeat(Some(Repeat::Infinite));
//! enc.add_frame(&[0x80u8; 4 * 4 * 4], 100).unwrap();
//! enc.add_frame(&[0x20u8; 4 * 4 * 4], 100).unwrap();
//! let gif = enc.finish().unwrap();
//! assert!(gif.starts_with(b"GIF89a"));
//! ```
//!
//! The block-level [`Encoder`] is available for callers that bring their
//! own palettes and indexed pixels.

mod dimensions;
mod lzw;
mod quant;
mod traits;
mod types;
mod writer;

pub use dimensions::dimensions_for_aspect;
pub use quant::NeuQuant;
pub use types::{Block, DisposalMethod, Extension, Frame, Repeat};
pub use writer::{AnimationEncoder, Encoder, EncodingError, ExtensionData};
