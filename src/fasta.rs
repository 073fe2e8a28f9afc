//! FASTA sequence ingestion.
//!
//! Parsed by hand rather than with an off-the-shelf reader because the
//! scanner needs the source line of every header (for deduplication
//! suffixes and diagnostics), case preserved exactly, spaces stripped
//! from sequence lines, and every other byte retained so it can be
//! scored as ambiguous.

use std::io::{self, BufRead, Write};

use crate::{
    alphabet::is_standard,
    error::ScanError,
    motif::MAX_NAME_LEN,
    utils::pretty_count,
};

pub struct Sequence {
    name: String,
    line_num: usize,
    data: Vec<u8>,
}

impl Sequence {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn rename(&mut self, name: String) {
        self.name = name;
    }

    pub fn line_num(&self) -> usize {
        self.line_num
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn standard_count(&self) -> usize {
        self.data.iter().filter(|&&b| is_standard(b)).count()
    }

    pub fn ambiguous_count(&self) -> usize {
        self.len() - self.standard_count()
    }

    fn gc_count(&self) -> usize {
        self.data
            .iter()
            .filter(|&&b| matches!(b, b'G' | b'g' | b'C' | b'c'))
            .count()
    }

    /// GC percentage over the standard bases only; None when there is
    /// nothing to divide by.
    pub fn gc_pct(&self) -> Option<f64> {
        let standard = self.standard_count();
        if standard == 0 {
            return None;
        }
        Some(100.0 * self.gc_count() as f64 / standard as f64)
    }
}

pub struct SequenceSet {
    seqs: Vec<Sequence>,
    total_bases: usize,
    unknowns: usize,
    gc_pct: f64,
}

impl SequenceSet {
    /// Reads every record from a FASTA stream. Blank lines are skipped,
    /// spaces inside sequence lines are dropped, and anything before the
    /// first `>` header is ignored.
    pub fn load<R: BufRead>(reader: R) -> Result<Self, ScanError> {
        let mut seqs: Vec<Sequence> = Vec::new();
        for (idx, line) in reader.lines().enumerate() {
            let line = line?;
            let line = line.trim_end_matches('\r');
            if line.trim().is_empty() {
                continue;
            }
            if let Some(header) = line.strip_prefix('>') {
                if header.len() > MAX_NAME_LEN {
                    return Err(ScanError::NameTooLong {
                        what: "sequence",
                        name: header.to_string(),
                    });
                }
                seqs.push(Sequence {
                    name: header.to_string(),
                    line_num: idx + 1,
                    data: Vec::new(),
                });
            } else if let Some(seq) = seqs.last_mut() {
                seq.data.extend(line.bytes().filter(|&b| b != b' '));
            }
        }
        if seqs.is_empty() {
            return Err(ScanError::NotFasta);
        }

        let total_bases: usize = seqs.iter().map(Sequence::len).sum();
        if total_bases == 0 {
            return Err(ScanError::EmptySequences);
        }
        let standard: usize = seqs.iter().map(Sequence::standard_count).sum();
        let unknowns = total_bases - standard;
        if unknowns == total_bases {
            return Err(ScanError::NoStandardBases);
        }
        let gc_total: usize = seqs.iter().map(Sequence::gc_count).sum();
        let gc_pct = 100.0 * gc_total as f64 / standard as f64;

        let unknowns_pct = 100.0 * unknowns as f64 / total_bases as f64;
        if unknowns_pct >= 90.0 {
            log::warn!("non-standard base count is extremely high ({unknowns_pct:.2}%)");
        } else if unknowns_pct >= 50.0 {
            log::info!("non-standard base count is very high ({unknowns_pct:.2}%)");
        } else if unknowns_pct >= 10.0 {
            log::info!("non-standard base count seems high ({unknowns_pct:.2}%)");
        }
        log::info!(
            "loaded {} sequence(s), size={} GC={gc_pct:.2}%",
            pretty_count(seqs.len()),
            pretty_count(total_bases)
        );
        if unknowns > 0 {
            log::info!(
                "found {} ({unknowns_pct:.2}%) non-standard bases",
                pretty_count(unknowns)
            );
        }

        Ok(SequenceSet {
            seqs,
            total_bases,
            unknowns,
            gc_pct,
        })
    }

    pub fn seqs(&self) -> &[Sequence] {
        &self.seqs
    }

    pub fn seqs_mut(&mut self) -> &mut [Sequence] {
        &mut self.seqs
    }

    pub fn len(&self) -> usize {
        self.seqs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seqs.is_empty()
    }

    pub fn total_bases(&self) -> usize {
        self.total_bases
    }

    pub fn unknowns(&self) -> usize {
        self.unknowns
    }

    pub fn gc_pct(&self) -> f64 {
        self.gc_pct
    }

    /// One stats row per sequence: index, header line, name, length, GC
    /// percentage and non-standard base count. Used when no motifs are
    /// supplied.
    pub fn write_stats<W: Write>(&self, out: &mut W) -> io::Result<()> {
        writeln!(out, "##seqnum\tline_num\tseqname\tsize\tgc_pct\tn_count")?;
        for (idx, seq) in self.seqs.iter().enumerate() {
            let gc = match seq.gc_pct() {
                Some(pct) => format!("{pct:.2}"),
                None => "nan".to_string(),
            };
            writeln!(
                out,
                "{}\t{}\t{}\t{}\t{}\t{}",
                idx + 1,
                seq.line_num,
                seq.name,
                seq.len(),
                gc,
                seq.ambiguous_count()
            )?;
        }
        Ok(())
    }
}
