//! Canvas size presets for common aspect ratios.
//!
//! Generated source art comes in a fixed set of sizes keyed by aspect
//! ratio; exports use the same table so frames line up with the art.

/// Returns the `(width, height)` preset for an aspect ratio written as
/// `"w:h"`. Unknown ratios fall back to the square preset.
pub fn dimensions_for_aspect(aspect: &str) -> (u32, u32) {
    match aspect {
        "1:1" => (1024, 1024),
        "16:9" => (1024, 576),
        "2:3" => (688, 1024),
        "9:16" => (576, 1024),
        "4:3" => (1024, 768),
        "3:2" => (1024, 688),
        _ => (1024, 1024),
    }
}
