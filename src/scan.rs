//! The per-window scanner and its output sinks.
//!
//! Motifs are processed one at a time: the score distribution is built,
//! the threshold derived, every sequence scanned (forward block then
//! reverse block, ascending start), and the distribution dropped before
//! the next motif. Peak memory is therefore bounded by a single CDF no
//! matter how many motifs are loaded.

use std::io::{self, Write};

use eyre::Result;
use indicatif::{ProgressBar, ProgressStyle};

use crate::{
    alphabet::base_index,
    background::Background,
    fasta::{Sequence, SequenceSet},
    motif::{Motif, DEFAULT_PVALUE, PWM_SCALE},
    utils::fmt_g,
};

pub struct Scanner<W: Write> {
    writer: W,
    bkg: Background,
    pvalue: f64,
    scan_rc: bool,
    exact_only: bool,
    progress: bool,
}

impl<W: Write> Scanner<W> {
    pub fn new(bkg: Background, writer: W) -> Self {
        Scanner {
            writer,
            bkg,
            pvalue: DEFAULT_PVALUE,
            scan_rc: true,
            exact_only: false,
            progress: false,
        }
    }

    pub fn pvalue(&mut self, pvalue: f64) -> &mut Self {
        self.pvalue = pvalue;
        self
    }

    pub fn scan_rc(&mut self, scan_rc: bool) -> &mut Self {
        self.scan_rc = scan_rc;
        self
    }

    /// Only report windows achieving the maximum score. Used for
    /// consensus motifs.
    pub fn exact_only(&mut self, exact_only: bool) -> &mut Self {
        self.exact_only = exact_only;
        self
    }

    pub fn progress(&mut self, progress: bool) -> &mut Self {
        self.progress = progress;
        self
    }

    /// The `##` preamble: tool version with the argument echo, aggregate
    /// motif/sequence stats, and the hit column header.
    pub fn write_header(
        &mut self,
        argv: &[String],
        motifs: &[Motif],
        seqs: &SequenceSet,
    ) -> io::Result<()> {
        write!(self.writer, "##motifscan v{} [ ", env!("CARGO_PKG_VERSION"))?;
        for arg in argv {
            write!(self.writer, "{arg} ")?;
        }
        writeln!(self.writer, "]")?;
        let motif_size: usize = motifs.iter().map(Motif::width).sum();
        writeln!(
            self.writer,
            "##MotifCount={} MotifSize={} SeqCount={} SeqSize={} GC={:.2}% Ns={}",
            motifs.len(),
            motif_size,
            seqs.len(),
            seqs.total_bases(),
            seqs.gc_pct(),
            seqs.unknowns()
        )?;
        writeln!(
            self.writer,
            "##seqname\tstart\tend\tstrand\tmotif\tpvalue\tscore\tscore_pct\tmatch"
        )
    }

    pub fn run(&mut self, motifs: &mut [Motif], seqs: &SequenceSet) -> Result<()> {
        let pb = if self.progress {
            ProgressBar::new(motifs.len() as u64).with_style(
                ProgressStyle::default_bar()
                    .template("[{bar:60}] {percent:>3}%")
                    .unwrap()
                    .progress_chars("== "),
            )
        } else {
            ProgressBar::hidden()
        };
        log::info!("scanning ...");
        for motif in motifs.iter_mut() {
            if !self.progress {
                log::debug!("scanning motif: {}", motif.name());
            }
            motif.prepare(&self.bkg, self.pvalue)?;
            if self.exact_only {
                motif.set_exact_threshold();
            }
            if motif.is_scannable() {
                for seq in seqs.seqs() {
                    if !self.progress {
                        log::debug!("    scanning sequence: {}", seq.name());
                    }
                    self.scan_pair(motif, seq)?;
                }
            }
            motif.release();
            pb.inc(1);
        }
        pb.finish_and_clear();
        log::info!("done");
        Ok(())
    }

    fn scan_pair(&mut self, motif: &Motif, seq: &Sequence) -> io::Result<()> {
        if motif.width() == 0 || seq.len() < motif.width() {
            return Ok(());
        }
        self.scan_strand(motif, seq, motif.rows(), '+')?;
        if self.scan_rc {
            self.scan_strand(motif, seq, motif.rows_rc(), '-')?;
        }
        Ok(())
    }

    fn scan_strand(
        &mut self,
        motif: &Motif,
        seq: &Sequence,
        rows: &[[i32; 5]],
        strand: char,
    ) -> io::Result<()> {
        let threshold = motif.threshold();
        for (start, window) in seq.data().windows(rows.len()).enumerate() {
            let score: i32 = window
                .iter()
                .zip(rows.iter())
                .map(|(&byte, row)| row[base_index(byte)])
                .sum();
            if score >= threshold {
                self.write_hit(motif, seq, start, window, score, strand)?;
            }
        }
        Ok(())
    }

    /// One tab-separated hit line. Coordinates and the matched bytes are
    /// always given on the forward strand, including for `-` hits.
    fn write_hit(
        &mut self,
        motif: &Motif,
        seq: &Sequence,
        start: usize,
        window: &[u8],
        score: i32,
        strand: char,
    ) -> io::Result<()> {
        let pct = if motif.max_score() > 0 {
            format!("{:.1}", 100.0 * score as f64 / motif.max_score() as f64)
        } else {
            // A non-positive maximum makes percent-of-max meaningless.
            "nan".to_string()
        };
        write!(
            self.writer,
            "{}\t{}\t{}\t{}\t{}\t{}\t{:.3}\t{}\t",
            seq.name(),
            start + 1,
            start + window.len(),
            strand,
            motif.name(),
            fmt_g(motif.pvalue(score), 9),
            score as f64 / PWM_SCALE,
            pct
        )?;
        self.writer.write_all(window)?;
        self.writer.write_all(b"\n")
    }
}

/// Prepares and pretty-prints every motif, separator-delimited. Used
/// when no sequences are supplied.
pub fn print_motifs<W: Write>(
    motifs: &mut [Motif],
    bkg: &Background,
    alpha: f64,
    exact_only: bool,
    out: &mut W,
) -> Result<()> {
    for (idx, motif) in motifs.iter_mut().enumerate() {
        motif.prepare(bkg, alpha)?;
        if exact_only {
            motif.set_exact_threshold();
        }
        writeln!(out, "----------------------------------------")?;
        motif.pretty_print(out, idx + 1)?;
        motif.release();
    }
    writeln!(out, "----------------------------------------")?;
    Ok(())
}
