//! GIF-flavored variable-width LZW compression.
//!
//! Implements the classic encoder used by the GIF format: a 12-bit code
//! space, an open-addressed hash table over `(prefix, next byte)` pairs
//! probed with a computed displacement, and output packed LSB-first into
//! 255-byte sub-blocks. The probe sequence matches the reference encoder
//! so identical input produces identical bytes.

use std::io::{self, Write};

/// GIF caps codes at 12 bits.
const BITS: u8 = 12;
/// Hash table size; prime, roughly 80% occupancy at the code cap.
const HSIZE: usize = 5003;
/// Shift spreading the next byte over the hash range.
const HSHIFT: u32 = 4;

fn max_code(n_bits: u8) -> u16 {
    (1 << n_bits) - 1
}

/// Compresses `data` and writes the result as length-prefixed sub-blocks.
///
/// `init_bits` is the minimum code size plus one; the clear code is
/// `1 << (init_bits - 1)`. The caller writes the minimum-code-size byte
/// and the zero-length terminator around this. Empty input is valid and
/// produces a clear code followed by end-of-information only.
pub(crate) fn compress<W: Write>(data: &[u8], init_bits: u8, w: &mut W) -> io::Result<()> {
    Compressor::new(init_bits, w).run(data)
}

struct Compressor<'a, W: Write> {
    w: &'a mut W,
    htab: Vec<i32>,
    codetab: Vec<u16>,
    init_bits: u8,
    n_bits: u8,
    maxcode: u16,
    clear_code: u16,
    eof_code: u16,
    free_ent: u16,
    clear_flg: bool,
    // Bit accumulator, flushed low byte first.
    cur_accum: u32,
    cur_bits: u8,
    // Pending sub-block; 254 data bytes plus the length byte stays
    // within the 255-byte block limit.
    accum: [u8; 254],
    a_count: usize,
}

impl<'a, W: Write> Compressor<'a, W> {
    fn new(init_bits: u8, w: &'a mut W) -> Self {
        let clear_code = 1 << (init_bits - 1);
        Compressor {
            w,
            htab: vec![-1; HSIZE],
            codetab: vec![0; HSIZE],
            init_bits,
            n_bits: init_bits,
            maxcode: max_code(init_bits),
            clear_code,
            eof_code: clear_code + 1,
            free_ent: clear_code + 2,
            clear_flg: false,
            cur_accum: 0,
            cur_bits: 0,
            accum: [0; 254],
            a_count: 0,
        }
    }

    fn run(mut self, data: &[u8]) -> io::Result<()> {
        self.output(self.clear_code)?;
        let mut iter = data.iter().copied();
        let mut ent = match iter.next() {
            Some(first) => u32::from(first),
            None => {
                // Degenerate but valid: clear + EOF.
                return self.output(self.eof_code);
            }
        };

        'next_pixel: for c in iter {
            let c = u32::from(c);
            let fcode = ((c << BITS) + ent) as i32;
            let mut i = ((c << HSHIFT) ^ ent) as usize;

            if self.htab[i] == fcode {
                ent = u32::from(self.codetab[i]);
                continue;
            }
            if self.htab[i] >= 0 {
                // Secondary hash: probe backwards by a displacement
                // derived from the primary slot.
                let disp = if i == 0 { 1 } else { HSIZE - i };
                loop {
                    if i < disp {
                        i += HSIZE;
                    }
                    i -= disp;
                    if self.htab[i] == fcode {
                        ent = u32::from(self.codetab[i]);
                        continue 'next_pixel;
                    }
                    if self.htab[i] < 0 {
                        break;
                    }
                }
            }

            self.output(ent as u16)?;
            ent = c;
            if self.free_ent < 1 << BITS {
                self.codetab[i] = self.free_ent;
                self.free_ent += 1;
                self.htab[i] = fcode;
            } else {
                self.clear_table()?;
            }
        }

        self.output(ent as u16)?;
        self.output(self.eof_code)
    }

    /// Re-seeds the dictionary and tells the decoder to do the same.
    fn clear_table(&mut self) -> io::Result<()> {
        self.htab.fill(-1);
        self.free_ent = self.clear_code + 2;
        self.clear_flg = true;
        self.output(self.clear_code)
    }

    fn output(&mut self, code: u16) -> io::Result<()> {
        self.cur_accum |= u32::from(code) << self.cur_bits;
        self.cur_bits += self.n_bits;
        while self.cur_bits >= 8 {
            self.byte_out((self.cur_accum & 0xFF) as u8)?;
            self.cur_accum >>= 8;
            self.cur_bits -= 8;
        }

        // Widen once the next code would not fit, or drop back to the
        // initial width right after a clear.
        if self.free_ent > self.maxcode || self.clear_flg {
            if self.clear_flg {
                self.n_bits = self.init_bits;
                self.maxcode = max_code(self.n_bits);
                self.clear_flg = false;
            } else {
                self.n_bits += 1;
                self.maxcode = if self.n_bits == BITS {
                    1 << BITS
                } else {
                    max_code(self.n_bits)
                };
            }
        }

        if code == self.eof_code {
            while self.cur_bits > 0 {
                self.byte_out((self.cur_accum & 0xFF) as u8)?;
                self.cur_accum >>= 8;
                self.cur_bits = self.cur_bits.saturating_sub(8);
            }
            self.flush_block()?;
        }
        Ok(())
    }

    fn byte_out(&mut self, byte: u8) -> io::Result<()> {
        self.accum[self.a_count] = byte;
        self.a_count += 1;
        if self.a_count >= self.accum.len() {
            self.flush_block()?;
        }
        Ok(())
    }

    fn flush_block(&mut self) -> io::Result<()> {
        if self.a_count > 0 {
            self.w.write_all(&[self.a_count as u8])?;
            self.w.write_all(&self.accum[..self.a_count])?;
            self.a_count = 0;
        }
        Ok(())
    }
}
