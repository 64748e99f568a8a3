//! NeuQuant neural-network color quantization.
//!
//! Trains a 256-cell self-organizing network over a sampled RGB pixel
//! stream and answers nearest-color queries against the trained palette.
//! All state is owned by the [`NeuQuant`] instance, so independent
//! encodes never share training data.
//!
//! Colors are tracked at 4-bit-shifted precision during training and
//! shifted back before lookup, keeping the whole algorithm in integer
//! arithmetic.

use log::debug;

const NETSIZE: usize = 256;
const MAXNETPOS: usize = NETSIZE - 1;

// Four coprime strides; picking one the image length does not divide
// decorrelates sampling from image structure.
const PRIME1: usize = 499;
const PRIME2: usize = 491;
const PRIME3: usize = 487;
const PRIME4: usize = 503;
const MINPICTUREBYTES: usize = 3 * PRIME4;

// Color values are biased by 4 bits during training.
const NETBIASSHIFT: i32 = 4;
const NCYCLES: usize = 100;

// Frequency and bias accumulators.
const INTBIASSHIFT: i32 = 16;
const INTBIAS: i32 = 1 << INTBIASSHIFT;
const GAMMASHIFT: i32 = 10;
const BETASHIFT: i32 = 10;
const BETA: i32 = INTBIAS >> BETASHIFT;
const BETAGAMMA: i32 = INTBIAS << (GAMMASHIFT - BETASHIFT);

// Neighborhood radius starts at an eighth of the network and decays
// by a factor of 1/30 each cycle.
const INITRAD: usize = NETSIZE >> 3;
const RADIUSBIASSHIFT: i32 = 6;
const RADIUSBIAS: i32 = 1 << RADIUSBIASSHIFT;
const INITRADIUS: i32 = (INITRAD as i32) * RADIUSBIAS;
const RADIUSDEC: i32 = 30;

// Learning rate, biased by 10 bits.
const ALPHABIASSHIFT: i32 = 10;
const INITALPHA: i32 = 1 << ALPHABIASSHIFT;

const RADBIASSHIFT: i32 = 8;
const RADBIAS: i32 = 1 << RADBIASSHIFT;
const ALPHARADBSHIFT: i32 = ALPHABIASSHIFT + RADBIASSHIFT;
const ALPHARADBIAS: i32 = 1 << ALPHARADBSHIFT;

/// A trained 256-color palette.
///
/// Construction runs the full training pass; afterwards the network is
/// frozen and only serves lookups.
pub struct NeuQuant {
    /// Cells hold `[r, g, b, original-index]`, sorted ascending by green
    /// after training.
    network: [[i32; 4]; NETSIZE],
    /// For every green value, the network position to start searching from.
    netindex: [usize; 256],
    freq: [i32; NETSIZE],
    bias: [i32; NETSIZE],
    radpower: [i32; INITRAD],
}

impl NeuQuant {
    /// Trains a palette over `pixels`, a packed RGB byte stream.
    ///
    /// `samplefac` ranges from 1 (every pixel considered, slowest) to 30
    /// (coarsest); values outside that range are clamped. Training is
    /// deterministic for a fixed input and sample factor.
    pub fn new(samplefac: i32, pixels: &[u8]) -> Self {
        let mut this = NeuQuant {
            network: [[0; 4]; NETSIZE],
            netindex: [0; 256],
            freq: [INTBIAS / NETSIZE as i32; NETSIZE],
            bias: [0; NETSIZE],
            radpower: [0; INITRAD],
        };
        for (i, cell) in this.network.iter_mut().enumerate() {
            // Evenly spaced along the grey diagonal.
            let v = ((i as i32) << (NETBIASSHIFT + 8)) / NETSIZE as i32;
            *cell = [v, v, v, 0];
        }
        this.learn(samplefac.clamp(1, 30), pixels);
        this.unbias();
        this.build_index();
        this
    }

    /// The trained palette as 768 packed RGB bytes, ordered so that
    /// [`index_of`](Self::index_of) results index into it directly.
    pub fn color_map_rgb(&self) -> Vec<u8> {
        let mut pos = [0usize; NETSIZE];
        for (i, cell) in self.network.iter().enumerate() {
            pos[cell[3] as usize] = i;
        }
        let mut map = Vec::with_capacity(NETSIZE * 3);
        for &i in pos.iter() {
            let cell = &self.network[i];
            map.push(cell[0] as u8);
            map.push(cell[1] as u8);
            map.push(cell[2] as u8);
        }
        map
    }

    /// Index of the palette entry closest to an RGB triple.
    ///
    /// Searches outward in both directions from the position predicted by
    /// the green index, pruning on the sorted green channel.
    pub fn index_of(&self, pix: &[u8]) -> usize {
        let (r, g, b) = (pix[0] as i32, pix[1] as i32, pix[2] as i32);
        let mut bestd = 1000; // larger than any possible distance
        let mut best = 0usize;
        let mut i = self.netindex[g as usize] as i32;
        let mut j = i - 1;

        while i < NETSIZE as i32 || j >= 0 {
            if i < NETSIZE as i32 {
                let cell = &self.network[i as usize];
                let mut dist = cell[1] - g;
                if dist >= bestd {
                    // Every further cell is greener still.
                    i = NETSIZE as i32;
                } else {
                    i += 1;
                    dist = dist.abs() + (cell[0] - r).abs();
                    if dist < bestd {
                        dist += (cell[2] - b).abs();
                        if dist < bestd {
                            bestd = dist;
                            best = cell[3] as usize;
                        }
                    }
                }
            }
            if j >= 0 {
                let cell = &self.network[j as usize];
                let mut dist = g - cell[1];
                if dist >= bestd {
                    j = -1;
                } else {
                    j -= 1;
                    dist = dist.abs() + (cell[0] - r).abs();
                    if dist < bestd {
                        dist += (cell[2] - b).abs();
                        if dist < bestd {
                            bestd = dist;
                            best = cell[3] as usize;
                        }
                    }
                }
            }
        }
        best
    }

    /// Main training loop: present sampled pixels, move the winning cell
    /// and its neighborhood, decay `alpha` and `radius` on a fixed
    /// schedule.
    fn learn(&mut self, samplefac: i32, pixels: &[u8]) {
        // Whole RGB triples only.
        let lengthcount = pixels.len() - pixels.len() % 3;
        let samplefac = if lengthcount < MINPICTUREBYTES { 1 } else { samplefac };
        let alphadec = 30 + (samplefac - 1) / 3;
        let samplepixels = lengthcount / (3 * samplefac as usize);
        // Too few samples for a full cycle must not stall the decay.
        let delta = (samplepixels / NCYCLES).max(1);
        let mut alpha = INITALPHA;
        let mut radius = INITRADIUS;
        let mut rad = radius >> RADIUSBIASSHIFT;
        if rad <= 1 {
            rad = 0;
        }
        self.fill_radpower(rad, alpha);

        let step = if lengthcount < MINPICTUREBYTES {
            3
        } else if lengthcount % PRIME1 != 0 {
            3 * PRIME1
        } else if lengthcount % PRIME2 != 0 {
            3 * PRIME2
        } else if lengthcount % PRIME3 != 0 {
            3 * PRIME3
        } else {
            3 * PRIME4
        };

        let mut pix = 0usize;
        for i in 1..=samplepixels {
            let r = (pixels[pix] as i32) << NETBIASSHIFT;
            let g = (pixels[pix + 1] as i32) << NETBIASSHIFT;
            let b = (pixels[pix + 2] as i32) << NETBIASSHIFT;
            let winner = self.contest(r, g, b);
            self.alter_single(alpha, winner, r, g, b);
            if rad != 0 {
                self.alter_neigh(rad, winner, r, g, b);
            }

            pix += step;
            while pix >= lengthcount {
                pix -= lengthcount;
            }
            if i % delta == 0 {
                alpha -= alpha / alphadec;
                radius -= radius / RADIUSDEC;
                rad = radius >> RADIUSBIASSHIFT;
                if rad <= 1 {
                    rad = 0;
                }
                self.fill_radpower(rad, alpha);
            }
        }
        debug!(
            "palette trained over {} samples (samplefac {}, final alpha {})",
            samplepixels, samplefac, alpha
        );
    }

    fn fill_radpower(&mut self, rad: i32, alpha: i32) {
        for m in 0..rad as usize {
            let m2 = (m * m) as i32;
            self.radpower[m] = alpha * (((rad * rad - m2) * RADBIAS) / (rad * rad));
        }
    }

    /// Finds the cell closest to the sample by Manhattan distance with a
    /// frequency bias that keeps often-winning cells from swallowing the
    /// whole network.
    fn contest(&mut self, r: i32, g: i32, b: i32) -> usize {
        let mut bestd = i32::MAX;
        let mut bestbiasd = i32::MAX;
        let mut bestpos = 0usize;
        let mut bestbiaspos = 0usize;

        for i in 0..NETSIZE {
            let cell = &self.network[i];
            let dist = (cell[0] - r).abs() + (cell[1] - g).abs() + (cell[2] - b).abs();
            if dist < bestd {
                bestd = dist;
                bestpos = i;
            }
            let biasdist = dist - (self.bias[i] >> (INTBIASSHIFT - NETBIASSHIFT));
            if biasdist < bestbiasd {
                bestbiasd = biasdist;
                bestbiaspos = i;
            }
            let betafreq = self.freq[i] >> BETASHIFT;
            self.freq[i] -= betafreq;
            self.bias[i] += betafreq << GAMMASHIFT;
        }
        self.freq[bestpos] += BETA;
        self.bias[bestpos] -= BETAGAMMA;
        bestbiaspos
    }

    /// Moves the winning cell toward the sample by `alpha`.
    fn alter_single(&mut self, alpha: i32, i: usize, r: i32, g: i32, b: i32) {
        let cell = &mut self.network[i];
        cell[0] -= alpha * (cell[0] - r) / INITALPHA;
        cell[1] -= alpha * (cell[1] - g) / INITALPHA;
        cell[2] -= alpha * (cell[2] - b) / INITALPHA;
    }

    /// Moves cells within `rad` of the winner toward the sample, with the
    /// precomputed distance falloff.
    fn alter_neigh(&mut self, rad: i32, i: usize, r: i32, g: i32, b: i32) {
        let lo = (i as i32 - rad).max(-1);
        let hi = (i as i32 + rad).min(NETSIZE as i32);
        let mut j = i as i32 + 1;
        let mut k = i as i32 - 1;
        let mut m = 1usize;
        while j < hi || k > lo {
            let a = self.radpower[m];
            m += 1;
            if j < hi {
                let cell = &mut self.network[j as usize];
                cell[0] -= a * (cell[0] - r) / ALPHARADBIAS;
                cell[1] -= a * (cell[1] - g) / ALPHARADBIAS;
                cell[2] -= a * (cell[2] - b) / ALPHARADBIAS;
                j += 1;
            }
            if k > lo {
                let cell = &mut self.network[k as usize];
                cell[0] -= a * (cell[0] - r) / ALPHARADBIAS;
                cell[1] -= a * (cell[1] - g) / ALPHARADBIAS;
                cell[2] -= a * (cell[2] - b) / ALPHARADBIAS;
                k -= 1;
            }
        }
    }

    /// Strips the training bias and records each cell's original index.
    fn unbias(&mut self) {
        for (i, cell) in self.network.iter_mut().enumerate() {
            cell[0] >>= NETBIASSHIFT;
            cell[1] >>= NETBIASSHIFT;
            cell[2] >>= NETBIASSHIFT;
            cell[3] = i as i32;
        }
    }

    /// Sorts cells ascending by green and builds the green entry index
    /// used by [`index_of`](Self::index_of).
    fn build_index(&mut self) {
        let mut previouscol = 0usize;
        let mut startpos = 0usize;
        for i in 0..NETSIZE {
            let mut smallpos = i;
            let mut smallval = self.network[i][1];
            for j in i + 1..NETSIZE {
                if self.network[j][1] < smallval {
                    smallpos = j;
                    smallval = self.network[j][1];
                }
            }
            if i != smallpos {
                self.network.swap(i, smallpos);
            }
            let smallval = smallval as usize;
            if smallval != previouscol {
                self.netindex[previouscol] = (startpos + i) >> 1;
                for entry in &mut self.netindex[previouscol + 1..smallval] {
                    *entry = i;
                }
                previouscol = smallval;
                startpos = i;
            }
        }
        self.netindex[previouscol] = (startpos + MAXNETPOS) >> 1;
        for entry in &mut self.netindex[previouscol + 1..] {
            *entry = MAXNETPOS;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solid(color: [u8; 3], pixels: usize) -> Vec<u8> {
        color.iter().copied().cycle().take(pixels * 3).collect()
    }

    #[test]
    fn solid_color_palette_contains_color() {
        let color = [90u8, 120, 200];
        let data = solid(color, 64 * 64);
        let nq = NeuQuant::new(1, &data);
        let map = nq.color_map_rgb();
        let idx = nq.index_of(&color);
        for c in 0..3 {
            let got = map[idx * 3 + c] as i32;
            let want = color[c] as i32;
            assert!(
                (got - want).abs() <= 8,
                "channel {} off by more than 4-bit rounding: {} vs {}",
                c,
                got,
                want
            );
        }
    }

    #[test]
    fn training_is_deterministic() {
        let data: Vec<u8> = (0..3 * 1000).map(|i| (i * 31 % 251) as u8).collect();
        let a = NeuQuant::new(10, &data);
        let b = NeuQuant::new(10, &data);
        assert_eq!(a.color_map_rgb(), b.color_map_rgb());
        assert_eq!(a.index_of(&[17, 200, 3]), b.index_of(&[17, 200, 3]));
    }

    #[test]
    fn tiny_input_does_not_stall() {
        // Fewer samples than one decay cycle; delta clamps to 1.
        let nq = NeuQuant::new(30, &[10, 20, 30, 40, 50, 60]);
        let map = nq.color_map_rgb();
        assert_eq!(map.len(), 768);
        assert!(nq.index_of(&[10, 20, 30]) < 256);
    }

    #[test]
    fn empty_input_yields_valid_palette() {
        let nq = NeuQuant::new(10, &[]);
        assert_eq!(nq.color_map_rgb().len(), 768);
        assert!(nq.index_of(&[0, 0, 0]) < 256);
    }
}
