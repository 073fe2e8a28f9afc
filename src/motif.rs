//! Integer position-weight-matrix motif model.
//!
//! Scores are log-odds against the background, scaled by 1000 and
//! truncated to integers, so the per-window scan is a plain integer sum.
//! Each position carries five columns: A, C, G, T and an ambiguity slot
//! holding [`AMBIG_SCORE`]. With widths capped at 50 a single ambiguous
//! base drags a window far below any reachable threshold without any
//! special-casing in the scan loop.

use std::io::{self, Write};

use crate::{
    alphabet::iupac_probs,
    background::Background,
    cdf::ScoreDist,
    error::ScanError,
    utils::fmt_g,
};

pub const MAX_NAME_LEN: usize = 255;
pub const MAX_MOTIF_WIDTH: usize = 50;
pub const AMBIG_SCORE: i32 = -10_000_000;
pub const PWM_SCALE: f64 = 1000.0;

pub const DEFAULT_NSITES: i32 = 1000;
pub const DEFAULT_PVALUE: f64 = 0.00001;
pub const DEFAULT_PSEUDOCOUNT: i32 = 1;

/// Sentinel threshold for motifs whose best achievable score still fails
/// the p-value bound. The scanner skips these entirely.
pub const UNREACHABLE_THRESHOLD: i32 = i32::MAX;

/// Knobs shared by every PWM construction path.
#[derive(Clone, Copy, Debug)]
pub struct PwmParams {
    pub nsites: i32,
    pub pseudocount: i32,
    pub bkg: Background,
    /// Set when the background came from the command line; a MEME file's
    /// own background declaration must not override it.
    pub bkg_fixed: bool,
}

impl Default for PwmParams {
    fn default() -> Self {
        PwmParams {
            nsites: DEFAULT_NSITES,
            pseudocount: DEFAULT_PSEUDOCOUNT,
            bkg: Background::uniform(),
            bkg_fixed: false,
        }
    }
}

/// Log-odds score of one matrix cell: pseudocount-smoothed probability
/// against the background, scaled and truncated toward zero (a plain
/// integer cast, so -9967.2 becomes -9967).
fn cell_score(prob: f64, bkg: f64, params: &PwmParams) -> i32 {
    let nsites = f64::from(params.nsites);
    let pseudo = f64::from(params.pseudocount);
    let smoothed = (prob * nsites + pseudo / 4.0) / (nsites + pseudo);
    ((smoothed / bkg).log2() * PWM_SCALE) as i32
}

fn normalize_probs(probs: &mut [f64; 4], name: &str) -> Result<(), ScanError> {
    let sum: f64 = probs.iter().sum();
    if (sum - 1.0).abs() > 0.1 {
        return Err(ScanError::BadMatrix {
            name: name.to_string(),
            msg: format!("position does not add up to 1 (sum={sum:.3})"),
        });
    }
    if (sum - 1.0).abs() > 0.02 {
        log::debug!("motif [{name}]: position does not add up to 1, adjusting (sum={sum:.3})");
        for p in probs.iter_mut() {
            *p /= sum;
        }
    }
    Ok(())
}

pub struct Motif {
    name: String,
    line_num: usize,
    scores: Vec<[i32; 5]>,
    scores_rc: Vec<[i32; 5]>,
    /// Smallest and largest single cell over the base columns, both
    /// seeded from 0 so that min <= 0 <= max always holds.
    min: i32,
    max: i32,
    /// Largest and smallest achievable full-window scores.
    max_score: i32,
    min_score: i32,
    dist: Option<ScoreDist>,
    threshold: i32,
}

impl Motif {
    pub(crate) fn new(name: impl Into<String>, line_num: usize) -> Result<Self, ScanError> {
        let name = name.into();
        if name.len() > MAX_NAME_LEN {
            return Err(ScanError::NameTooLong {
                what: "motif",
                name,
            });
        }
        Ok(Motif {
            name,
            line_num,
            scores: Vec::new(),
            scores_rc: Vec::new(),
            min: 0,
            max: 0,
            max_score: 0,
            min_score: 0,
            dist: None,
            threshold: 0,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn rename(&mut self, name: String) {
        self.name = name;
    }

    pub fn line_num(&self) -> usize {
        self.line_num
    }

    pub fn width(&self) -> usize {
        self.scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }

    pub(crate) fn rows(&self) -> &[[i32; 5]] {
        &self.scores
    }

    pub(crate) fn rows_rc(&self) -> &[[i32; 5]] {
        &self.scores_rc
    }

    pub fn min(&self) -> i32 {
        self.min
    }

    pub fn max(&self) -> i32 {
        self.max
    }

    pub fn max_score(&self) -> i32 {
        self.max_score
    }

    pub fn min_score(&self) -> i32 {
        self.min_score
    }

    pub fn threshold(&self) -> i32 {
        self.threshold
    }

    pub fn is_scannable(&self) -> bool {
        self.threshold != UNREACHABLE_THRESHOLD
    }

    /// Appends one probability row (A, C, G, T order), converting it to
    /// integer log-odds under the current background.
    pub(crate) fn push_probs(
        &mut self,
        mut probs: [f64; 4],
        params: &PwmParams,
    ) -> Result<(), ScanError> {
        if self.width() >= MAX_MOTIF_WIDTH {
            return Err(ScanError::MotifTooWide {
                name: self.name.clone(),
                width: self.width() + 1,
            });
        }
        normalize_probs(&mut probs, &self.name)?;
        let mut row = [AMBIG_SCORE; 5];
        for (k, &p) in probs.iter().enumerate() {
            row[k] = cell_score(p, params.bkg[k], params);
        }
        self.scores.push(row);
        Ok(())
    }

    /// Builds a motif from four labeled count rows (A, C, G, T order).
    /// The site count is taken from the first column; all column sums
    /// must agree with it within one count.
    pub(crate) fn from_counts(
        name: impl Into<String>,
        line_num: usize,
        rows: &[Vec<i64>; 4],
        params: &PwmParams,
    ) -> Result<Self, ScanError> {
        let mut motif = Motif::new(name, line_num)?;
        let width = rows[0].len();
        if rows.iter().any(|row| row.len() != width) {
            return Err(ScanError::BadMatrix {
                name: motif.name,
                msg: "rows have differing numbers of counts".to_string(),
            });
        }
        if width > MAX_MOTIF_WIDTH {
            return Err(ScanError::MotifTooWide {
                name: motif.name,
                width,
            });
        }
        if width == 0 {
            return Ok(motif);
        }
        let nsites: i64 = rows.iter().map(|row| row[0]).sum();
        for pos in 0..width {
            let col_sum: i64 = rows.iter().map(|row| row[pos]).sum();
            if (col_sum - nsites).abs() > 1 {
                return Err(ScanError::BadMatrix {
                    name: motif.name,
                    msg: "column sums are not equal".to_string(),
                });
            } else if (col_sum - nsites).abs() == 1 {
                log::debug!(
                    "found difference of 1 between column sums for motif [{}]",
                    motif.name
                );
            }
        }
        if nsites <= 0 {
            return Err(ScanError::BadMatrix {
                name: motif.name,
                msg: "column counts sum to zero".to_string(),
            });
        }
        for pos in 0..width {
            let mut row = [AMBIG_SCORE; 5];
            for (k, counts) in rows.iter().enumerate() {
                let prob = counts[pos] as f64 / nsites as f64;
                row[k] = cell_score(prob, params.bkg[k], params);
            }
            motif.scores.push(row);
        }
        Ok(motif)
    }

    /// Builds a motif from a single IUPAC consensus string, under a
    /// uniform background with default smoothing. The caller pins the
    /// threshold to the maximum score afterwards so that only exact
    /// matches report.
    pub fn from_consensus(consensus: &str) -> Result<Self, ScanError> {
        let params = PwmParams::default();
        let mut motif = Motif::new(consensus, 0)?;
        if consensus.len() > MAX_MOTIF_WIDTH {
            return Err(ScanError::MotifTooWide {
                name: motif.name,
                width: consensus.len(),
            });
        }
        for &letter in consensus.as_bytes() {
            let probs =
                iupac_probs(letter).ok_or(ScanError::UnknownIupacLetter(letter as char))?;
            let mut row = [AMBIG_SCORE; 5];
            for (k, &p) in probs.iter().enumerate() {
                row[k] = cell_score(p, params.bkg[k], &params);
            }
            motif.scores.push(row);
        }
        motif.finish();
        Ok(motif)
    }

    /// Finalizes a fully parsed matrix: cell extrema, the reverse
    /// complement table, and the achievable score bounds. Must run before
    /// [`Motif::prepare`].
    pub(crate) fn finish(&mut self) {
        let width = self.width();
        self.min = 0;
        self.max = 0;
        self.max_score = 0;
        self.min_score = 0;
        for row in &self.scores {
            for &cell in &row[..4] {
                self.min = self.min.min(cell);
                self.max = self.max.max(cell);
            }
        }
        let mut rc = vec![[0, 0, 0, 0, AMBIG_SCORE]; width];
        for (pos, row) in self.scores.iter().enumerate() {
            rc[width - 1 - pos] = [row[3], row[2], row[1], row[0], AMBIG_SCORE];
        }
        self.scores_rc = rc;
        for row in &self.scores {
            self.max_score += row[..4].iter().copied().max().unwrap_or(0);
            self.min_score += row[..4].iter().copied().min().unwrap_or(0);
        }
    }

    /// Computes the exact score distribution and derives the integer
    /// threshold for the requested p-value. Motifs whose minimum possible
    /// p-value exceeds the bound get the unreachable sentinel and are
    /// skipped by the scanner.
    pub fn prepare(&mut self, bkg: &Background, alpha: f64) -> Result<(), ScanError> {
        let dist = ScoreDist::from_motif(self, bkg)?;
        let mut threshold = dist.threshold_for(alpha);
        let min_pvalue = dist.pvalue(self.max_score);
        if min_pvalue / alpha > 1.0001 {
            log::debug!(
                "min possible p-value for [{}] is greater than the threshold, \
                 motif will not be scored ({min_pvalue:e}>{alpha:e})",
                self.name
            );
            threshold = UNREACHABLE_THRESHOLD;
        }
        self.threshold = threshold;
        self.dist = Some(dist);
        Ok(())
    }

    /// Drops the score distribution once every sequence has been scanned
    /// against this motif. Keeps peak memory bounded by a single CDF.
    pub fn release(&mut self) {
        self.dist = None;
    }

    /// P-value of a raw integer motif score. Only valid once prepared.
    pub fn pvalue(&self, score: i32) -> f64 {
        self.dist
            .as_ref()
            .expect("motif not prepared")
            .pvalue(score)
    }

    /// Pins the threshold to the maximum score; used for consensus
    /// motifs, which only report exact matches.
    pub fn set_exact_threshold(&mut self) {
        self.threshold = self.max_score;
    }

    /// Renders the parsed PWM with its threshold and a few representative
    /// score-to-p-value pairs. Used when no sequences are supplied.
    pub fn pretty_print<W: Write>(&self, out: &mut W, index: usize) -> io::Result<()> {
        writeln!(out, "Motif: {} (N{} L{})", self.name, index, self.line_num)?;
        if self.threshold == UNREACHABLE_THRESHOLD {
            writeln!(
                out,
                "MaxScore={:.2}\tThreshold=[exceeds max]",
                self.max_score as f64 / PWM_SCALE
            )?;
        } else {
            writeln!(
                out,
                "MaxScore={:.2}\tThreshold={:.2}",
                self.max_score as f64 / PWM_SCALE,
                self.threshold as f64 / PWM_SCALE
            )?;
        }
        writeln!(out, "Motif PWM:")?;
        writeln!(out, "\tA\tC\tG\tT")?;
        for (pos, row) in self.scores.iter().enumerate() {
            writeln!(
                out,
                "{}:\t{:.2}\t{:.2}\t{:.2}\t{:.2}",
                pos + 1,
                row[0] as f64 / PWM_SCALE,
                row[1] as f64 / PWM_SCALE,
                row[2] as f64 / PWM_SCALE,
                row[3] as f64 / PWM_SCALE
            )?;
        }
        writeln!(
            out,
            "Score={:.2}\t-->     p=1",
            self.min_score as f64 / PWM_SCALE
        )?;
        for score in [self.min_score / 2, 0, self.max_score / 2, self.max_score] {
            writeln!(
                out,
                "Score={:.2}\t-->     p={}",
                score as f64 / PWM_SCALE,
                fmt_g(self.pvalue(score), 2)
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;

    use super::*;

    fn ppm_motif(name: &str, rows: &[[f64; 4]], params: &PwmParams) -> Motif {
        let mut motif = Motif::new(name, 1).unwrap();
        for row in rows {
            motif.push_probs(*row, params).unwrap();
        }
        motif.finish();
        motif
    }

    #[test]
    fn test_uniform_probs_score_zero() {
        let params = PwmParams::default();
        let motif = ppm_motif("uniform", &[[0.25, 0.25, 0.25, 0.25]], &params);
        assert_eq!(motif.rows()[0], [0, 0, 0, 0, AMBIG_SCORE]);
    }

    #[test]
    fn test_consensus_scores_truncate_toward_zero() {
        // (1*1000 + 0.25)/1001 against 0.25 is just under 2 bits; the
        // losing bases sit at 1000*log2((0.25/1001)/0.25) = -9967.2.
        let motif = Motif::from_consensus("A").unwrap();
        assert_eq!(motif.rows()[0][0], 1998);
        assert_eq!(motif.rows()[0][1], -9967);
        assert_eq!(motif.rows()[0][2], -9967);
        assert_eq!(motif.rows()[0][3], -9967);
    }

    #[test]
    fn test_reverse_complement_table() {
        let params = PwmParams::default();
        let motif = ppm_motif(
            "m",
            &[[0.7, 0.1, 0.1, 0.1], [0.1, 0.1, 0.1, 0.7]],
            &params,
        );
        let fwd = motif.rows();
        let rc = motif.rows_rc();
        for pos in 0..motif.width() {
            let mirror = motif.width() - 1 - pos;
            assert_eq!(rc[mirror][0], fwd[pos][3]);
            assert_eq!(rc[mirror][1], fwd[pos][2]);
            assert_eq!(rc[mirror][2], fwd[pos][1]);
            assert_eq!(rc[mirror][3], fwd[pos][0]);
            assert_eq!(rc[mirror][4], AMBIG_SCORE);
        }
    }

    #[test]
    fn test_score_bounds() {
        let params = PwmParams::default();
        let motif = ppm_motif(
            "m",
            &[[0.7, 0.1, 0.1, 0.1], [0.1, 0.1, 0.1, 0.7]],
            &params,
        );
        assert!(motif.min() <= 0);
        assert!(motif.max() >= 0);
        let per_pos_max: i32 = motif
            .rows()
            .iter()
            .map(|row| *row[..4].iter().max().unwrap())
            .sum();
        assert_eq!(motif.max_score(), per_pos_max);
        assert!(motif.min_score() <= motif.max_score());
    }

    #[test]
    fn test_probs_not_summing_to_one() {
        let params = PwmParams::default();
        let mut motif = Motif::new("bad", 1).unwrap();
        let err = motif.push_probs([0.5, 0.5, 0.5, 0.5], &params);
        assert!(err.is_err());
        // Mild drift renormalizes instead.
        assert!(motif.push_probs([0.26, 0.25, 0.25, 0.25], &params).is_ok());
    }

    #[test]
    fn test_too_wide_consensus() {
        let consensus = "A".repeat(MAX_MOTIF_WIDTH + 1);
        assert!(Motif::from_consensus(&consensus).is_err());
    }

    #[test]
    fn test_unknown_iupac_letter() {
        assert!(matches!(
            Motif::from_consensus("ACEG"),
            Err(ScanError::UnknownIupacLetter('E'))
        ));
    }

    #[test]
    fn test_counts_column_mismatch() {
        let params = PwmParams::default();
        let rows = [
            vec![10, 0],
            vec![0, 0],
            vec![0, 0],
            vec![0, 5],
        ];
        let err = Motif::from_counts("m", 1, &rows, &params);
        assert!(err.is_err());
    }

    #[test]
    fn test_counts_off_by_one_is_accepted() {
        let params = PwmParams::default();
        let rows = [
            vec![5, 4],
            vec![5, 5],
            vec![0, 0],
            vec![0, 0],
        ];
        let motif = Motif::from_counts("m", 1, &rows, &params).unwrap();
        assert_eq!(motif.width(), 2);
    }

    #[test]
    fn test_unreachable_threshold() {
        let params = PwmParams::default();
        let mut motif = ppm_motif("flat", &[[0.25, 0.25, 0.25, 0.25]], &params);
        motif.prepare(&Background::uniform(), 1e-30).unwrap();
        assert!(!motif.is_scannable());
    }

    #[test]
    fn test_exact_threshold_override() {
        let mut motif = Motif::from_consensus("ACGT").unwrap();
        motif.prepare(&Background::uniform(), 1.0).unwrap();
        motif.set_exact_threshold();
        assert_eq!(motif.threshold(), motif.max_score());
        assert!(motif.is_scannable());
    }

    #[test]
    fn test_name_too_long() {
        let name = "x".repeat(MAX_NAME_LEN + 1);
        assert!(Motif::new(name, 1).is_err());
    }
}
