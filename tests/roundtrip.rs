//! Round-trip tests: everything encoded here is decoded again with the
//! `gif` crate and checked against the input.

use std::borrow::Cow;

use gifanim::{AnimationEncoder, Encoder, Frame, Repeat};

fn decode(bytes: &[u8], output: gif::ColorOutput) -> (gif::Decoder<&[u8]>, Vec<gif::Frame<'static>>) {
    let mut options = gif::DecodeOptions::new();
    options.set_color_output(output);
    let mut decoder = options.read_info(bytes).unwrap();
    let mut frames = Vec::new();
    while let Some(frame) = decoder.read_next_frame().unwrap() {
        frames.push(frame.clone());
    }
    (decoder, frames)
}

fn solid_rgba(width: usize, height: usize, color: [u8; 3]) -> Vec<u8> {
    let mut out = Vec::with_capacity(width * height * 4);
    for _ in 0..width * height {
        out.extend_from_slice(&[color[0], color[1], color[2], 255]);
    }
    out
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len()).any(|w| w == needle)
}

#[test]
fn frame_count_and_delays_survive() {
    let mut enc = AnimationEncoder::new(16, 16);
    enc.set_quality(1);
    enc.add_frame(&solid_rgba(16, 16, [255, 0, 0]), 120).unwrap();
    enc.add_frame(&solid_rgba(16, 16, [0, 255, 0]), 250).unwrap();
    enc.add_frame(&solid_rgba(16, 16, [0, 0, 255]), 84).unwrap();
    let bytes = enc.finish().unwrap();

    let (decoder, frames) = decode(&bytes, gif::ColorOutput::Indexed);
    assert_eq!(decoder.width(), 16);
    assert_eq!(decoder.height(), 16);
    assert_eq!(frames.len(), 3);
    assert_eq!(frames[0].delay, 12);
    assert_eq!(frames[1].delay, 25);
    assert_eq!(frames[2].delay, 8);
}

#[test]
fn solid_color_pixels_survive_quantization() {
    let color = [200u8, 40, 90];
    let mut enc = AnimationEncoder::new(32, 32);
    enc.set_quality(1);
    enc.add_frame(&solid_rgba(32, 32, color), 100).unwrap();
    let bytes = enc.finish().unwrap();

    let (_, frames) = decode(&bytes, gif::ColorOutput::RGBA);
    assert_eq!(frames.len(), 1);
    for pix in frames[0].buffer.chunks_exact(4) {
        for c in 0..3 {
            let diff = (pix[c] as i32 - color[c] as i32).abs();
            assert!(diff <= 8, "channel {} off by {}", c, diff);
        }
        assert_eq!(pix[3], 255);
    }
}

#[test]
fn identical_input_produces_identical_bytes() {
    let encode = || {
        let mut enc = AnimationEncoder::new(24, 24);
        enc.set_quality(5);
        enc.set_repeat(Some(Repeat::Finite(3)));
        let gradient: Vec<u8> = (0..24 * 24)
            .flat_map(|i| [(i % 256) as u8, (i * 7 % 256) as u8, (i * 13 % 256) as u8, 255])
            .collect();
        enc.add_frame(&gradient, 50).unwrap();
        enc.add_frame(&solid_rgba(24, 24, [10, 200, 30]), 50).unwrap();
        enc.finish().unwrap()
    };
    assert_eq!(encode(), encode());
}

#[test]
fn zero_frames_yield_minimal_gif() {
    let bytes = AnimationEncoder::new(5, 4).finish().unwrap();
    let mut expected = b"GIF89a".to_vec();
    expected.extend_from_slice(&[5, 0, 4, 0, 0, 0, 0, 0x3B]);
    assert_eq!(bytes, expected);
}

#[test]
fn loop_extension_is_opt_in() {
    let mut enc = AnimationEncoder::new(8, 8);
    enc.add_frame(&solid_rgba(8, 8, [1, 2, 3]), 100).unwrap();
    let without = enc.finish().unwrap();
    assert!(!contains(&without, b"NETSCAPE2.0"));

    let mut enc = AnimationEncoder::new(8, 8);
    enc.set_repeat(Some(Repeat::Infinite));
    enc.add_frame(&solid_rgba(8, 8, [1, 2, 3]), 100).unwrap();
    let with = enc.finish().unwrap();
    assert!(contains(&with, b"NETSCAPE2.0"));
}

#[test]
fn shared_palette_skips_local_tables() {
    let mut enc = AnimationEncoder::new(8, 8);
    enc.set_shared_palette(true);
    enc.add_frame(&solid_rgba(8, 8, [250, 250, 250]), 100).unwrap();
    enc.add_frame(&solid_rgba(8, 8, [250, 250, 250]), 100).unwrap();
    let bytes = enc.finish().unwrap();

    let (_, frames) = decode(&bytes, gif::ColorOutput::Indexed);
    assert_eq!(frames.len(), 2);
    for frame in &frames {
        assert!(frame.palette.is_none());
    }
}

#[test]
fn dictionary_reset_keeps_frame_intact() {
    // High-entropy indexed data overflows the 4096-code dictionary, so
    // the stream must contain at least one mid-frame clear code. Exact
    // index equality after decode proves the reset boundary is sound.
    let mut palette = Vec::with_capacity(768);
    for i in 0..256u32 {
        palette.extend_from_slice(&[i as u8, (255 - i) as u8, (i ^ 0x55) as u8]);
    }
    let mut state = 0x2545F491u32;
    let buffer: Vec<u8> = (0..128 * 128)
        .map(|_| {
            state = state.wrapping_mul(1664525).wrapping_add(1013904223);
            (state >> 24) as u8
        })
        .collect();

    let mut enc = Encoder::new(Vec::new(), 128, 128);
    enc.write_global_palette(&palette).unwrap();
    enc.write_frame(&Frame {
        width: 128,
        height: 128,
        buffer: Cow::Borrowed(&buffer[..]),
        ..Frame::default()
    })
    .unwrap();
    let bytes = enc.finish().unwrap();

    let (_, frames) = decode(&bytes, gif::ColorOutput::Indexed);
    assert_eq!(frames.len(), 1);
    assert_eq!(&*frames[0].buffer, &buffer[..]);
}
