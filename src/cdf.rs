//! Exact score distribution of a PWM under the background model.
//!
//! Cell scores are shifted by the smallest cell so the convolution runs
//! over a non-negative integer lattice; translation back to raw motif
//! scores happens only at query time. Two buffers of the final length are
//! swapped per position, so a motif costs two allocations total.

use std::mem;

use crate::{background::Background, error::ScanError, motif::Motif, utils::pretty_count};

/// Hard cap on the distribution length. Only reachable when background
/// values sit at the allowed minimum under extreme-width motifs.
pub const MAX_CDF_SIZE: usize = 2_097_152;

/// Right-tail cumulative distribution over every achievable motif score,
/// assuming each position draws its base independently from the
/// background.
pub struct ScoreDist {
    /// `cdf[t]` is P(shifted score >= t).
    cdf: Vec<f64>,
    /// Smallest achievable lattice score, `width * min_cell`; subtracted
    /// from raw scores when indexing.
    min_total: i32,
}

impl ScoreDist {
    pub fn from_motif(motif: &Motif, bkg: &Background) -> Result<Self, ScanError> {
        let width = motif.width();
        let span = (motif.max() - motif.min()) as usize;
        let len = width * span + 1;
        if len > MAX_CDF_SIZE {
            return Err(ScanError::CdfTooLarge {
                name: motif.name().to_string(),
                size: len,
            });
        }
        log::debug!(
            "generating score distribution for [{}] (n={})",
            motif.name(),
            pretty_count(len)
        );

        let mut cur = vec![0.0; len];
        let mut next = vec![0.0; len];
        cur[0] = 1.0;
        for (pos, row) in motif.rows().iter().enumerate() {
            // Mass so far occupies [0, pos * span]; one more position can
            // push it at most `span` further.
            let reach = pos * span;
            for slot in next[..=reach + span].iter_mut() {
                *slot = 0.0;
            }
            for (base, &cell) in row[..4].iter().enumerate() {
                let shift = (cell - motif.min()) as usize;
                let freq = bkg[base];
                for t in 0..=reach {
                    let mass = cur[t];
                    if mass != 0.0 {
                        next[t + shift] += mass * freq;
                    }
                }
            }
            mem::swap(&mut cur, &mut next);
        }

        let total: f64 = cur.iter().sum();
        if (total - 1.0).abs() > 0.0001 {
            log::debug!(
                "sum(PDF) != 1.0 for [{}] (sum={total:.2e}), renormalizing",
                motif.name()
            );
            for mass in cur.iter_mut() {
                *mass /= total;
            }
        }
        // PDF to right-tail CDF, in place.
        for t in (0..len - 1).rev() {
            cur[t] += cur[t + 1];
        }
        Ok(ScoreDist {
            cdf: cur,
            min_total: motif.min() * width as i32,
        })
    }

    /// P-value of a raw integer motif score.
    #[inline]
    pub fn pvalue(&self, score: i32) -> f64 {
        self.cdf[(score - self.min_total) as usize]
    }

    /// Smallest raw motif score whose p-value stays within `alpha`. When
    /// no bucket falls below `alpha` the returned threshold sits one past
    /// the lattice, so every window passes.
    pub fn threshold_for(&self, alpha: f64) -> i32 {
        let first_unreachable = self
            .cdf
            .iter()
            .position(|&p| p < alpha)
            .unwrap_or(self.cdf.len());
        first_unreachable as i32 + self.min_total
    }

    pub fn len(&self) -> usize {
        self.cdf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cdf.is_empty()
    }
}
