//! MEME motif format.
//!
//! Recognized header lines (each at most once, and only before the first
//! motif): `ALPHABET`, `strands:`, and `Background letter frequencies`
//! with its value line. Motifs are a `MOTIF <name>` line followed by a
//! `letter-probability matrix` line and consecutive probability rows; a
//! blank line or one containing `-`/`*` ends the matrix.

use itertools::Itertools;

use crate::{
    background::Background,
    error::ScanError,
    motif::{Motif, PwmParams},
};

use super::parse_prob_row;

pub(crate) fn parse(
    lines: &[String],
    params: &mut PwmParams,
    scan_rc: bool,
) -> Result<Vec<Motif>, ScanError> {
    let mut motifs: Vec<Motif> = Vec::new();
    let mut alph_line = 0usize;
    let mut strand_line = 0usize;
    let mut bkg_line = 0usize;
    let mut expect_bkg = false;
    let mut matrix_line = 0usize;
    // None until the first MOTIF header, then the number of rows parsed
    // since the latest one.
    let mut rows_parsed: Option<usize> = None;
    let mut live = false;

    for (idx, line) in lines.iter().enumerate() {
        let line_num = idx + 1;
        if expect_bkg {
            if line.trim().is_empty() {
                continue;
            }
            parse_background(line, line_num, params)?;
            expect_bkg = false;
        } else if line.starts_with("Background letter frequencies") {
            if bkg_line != 0 {
                return Err(ScanError::MalformedMotifFile {
                    line: line_num,
                    msg: "detected multiple background definition lines".to_string(),
                });
            }
            if !motifs.is_empty() {
                return Err(ScanError::MalformedMotifFile {
                    line: line_num,
                    msg: "found background definition line after motifs".to_string(),
                });
            }
            bkg_line = line_num;
            expect_bkg = true;
        } else if line.starts_with("ALPHABET") {
            if alph_line != 0 {
                return Err(ScanError::MalformedMotifFile {
                    line: line_num,
                    msg: "detected multiple alphabet definition lines".to_string(),
                });
            }
            if !motifs.is_empty() {
                return Err(ScanError::MalformedMotifFile {
                    line: line_num,
                    msg: "found alphabet definition line after motifs".to_string(),
                });
            }
            if line.starts_with("ALPHABET= ACDEFGHIKLMNPQRSTVWY") {
                return Err(ScanError::ProteinAlphabet(line_num));
            }
            alph_line = line_num;
        } else if line.starts_with("strands:") {
            if strand_line != 0 {
                return Err(ScanError::MalformedMotifFile {
                    line: line_num,
                    msg: "detected multiple strand information lines".to_string(),
                });
            }
            if !motifs.is_empty() {
                return Err(ScanError::MalformedMotifFile {
                    line: line_num,
                    msg: "found strand information line after motifs".to_string(),
                });
            }
            check_strands(line, line_num, scan_rc);
            strand_line = line_num;
        } else if line.starts_with("MOTIF") {
            let name = line[5..].split_whitespace().next().unwrap_or("motif");
            log::debug!("found motif: {name}");
            motifs.push(Motif::new(name, line_num)?);
            rows_parsed = Some(0);
            live = false;
        } else if line.starts_with("letter-probability matrix") {
            if rows_parsed != Some(0) {
                return Err(ScanError::MalformedMotifFile {
                    line: line_num,
                    msg: "possible malformed motif".to_string(),
                });
            }
            matrix_line = line_num;
            live = true;
        } else if live {
            let rows = rows_parsed.as_mut().expect("matrix rows follow a MOTIF line");
            if line.trim().is_empty() || line.contains('-') || line.contains('*') {
                live = false;
            } else if line_num == matrix_line + *rows + 1 {
                let motif = motifs.last_mut().expect("matrix rows follow a MOTIF line");
                let probs = parse_prob_row(line, motif.name())?;
                motif.push_probs(probs, params)?;
                *rows += 1;
            } else {
                live = false;
            }
        }
    }

    if motifs.is_empty() {
        return Err(ScanError::NoMotifs("MEME"));
    }
    Ok(motifs)
}

/// Parses the `A p C p G p T p` value line below the background
/// declaration. Skipped entirely when the background came from the
/// command line.
fn parse_background(
    line: &str,
    line_num: usize,
    params: &mut PwmParams,
) -> Result<(), ScanError> {
    if params.bkg_fixed {
        return Ok(());
    }
    let mut values = [0.0f64; 4];
    let mut parsed = 0usize;
    for (letter, value) in line.split_whitespace().tuples() {
        if parsed >= 4 {
            return Err(ScanError::MalformedMotifFile {
                line: line_num,
                msg: "parsed too many background values in MEME file".to_string(),
            });
        }
        let matches = match parsed {
            0 => letter == "A",
            1 => letter == "C",
            2 => letter == "G",
            _ => letter == "T" || letter == "U",
        };
        if !matches {
            return Err(ScanError::MalformedMotifFile {
                line: line_num,
                msg: format!("unexpected letter ({letter}) in MEME background"),
            });
        }
        values[parsed] = value.parse().map_err(|_| ScanError::MalformedMotifFile {
            line: line_num,
            msg: format!("invalid background value: {value:?}"),
        })?;
        parsed += 1;
    }
    params.bkg = Background::from_values(&values[..parsed])?;
    log::debug!("found MEME background values: {}", params.bkg);
    Ok(())
}

/// The strand field is informational; mismatches with the requested scan
/// only warrant warnings.
fn check_strands(line: &str, line_num: usize, scan_rc: bool) {
    let fwd = line.matches('+').count();
    let rev = line.matches('-').count();
    if fwd > 1 || rev > 1 || (fwd == 0 && rev == 0) {
        log::info!("possible malformed strand field (L{line_num})");
    }
    if scan_rc && fwd > 0 && rev == 0 {
        log::info!("MEME motifs are only for the forward strand (L{line_num})");
    }
    if fwd == 0 && rev > 0 {
        log::info!("MEME motifs are only for the reverse strand (L{line_num})");
    }
    if !scan_rc && fwd > 0 && rev > 0 {
        log::info!("MEME motifs are for both strands (L{line_num})");
    }
}
