//! Motif file ingestion: format auto-detection and the MEME, HOMER and
//! JASPAR parsers.

use std::{
    fmt::Display,
    fs::File,
    io::{self, BufRead, BufReader},
    path::Path,
};

use crate::{
    error::ScanError,
    motif::{Motif, PwmParams},
};

pub mod homer;
pub mod jaspar;
pub mod meme;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MotifFormat {
    Meme,
    Homer,
    Jaspar,
}

impl Display for MotifFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            MotifFormat::Meme => "MEME",
            MotifFormat::Homer => "HOMER",
            MotifFormat::Jaspar => "JASPAR",
        };
        write!(f, "{name}")
    }
}

/// Sniffs the motif format from the first meaningful lines: a
/// `MEME version ` prefix wins outright; otherwise a `>` header followed
/// by a line starting with `0`/`1` means HOMER and one starting with `A`
/// means JASPAR.
pub fn detect_format(lines: &[String]) -> Result<MotifFormat, ScanError> {
    let mut saw_header = false;
    for line in lines {
        if line.trim().is_empty() {
            continue;
        }
        if line.starts_with("MEME version ") {
            log::debug!("detected MEME format");
            return Ok(MotifFormat::Meme);
        }
        if saw_header {
            match line.as_bytes().first() {
                Some(b'0') | Some(b'1') => {
                    log::debug!("detected HOMER format");
                    return Ok(MotifFormat::Homer);
                }
                Some(b'A') => {
                    log::debug!("detected JASPAR format");
                    return Ok(MotifFormat::Jaspar);
                }
                _ => {}
            }
        } else if line.starts_with('>') {
            saw_header = true;
        }
    }
    Err(ScanError::UnknownMotifFormat)
}

/// Reads a motif file, dispatching on the detected format. Returned
/// motifs are finished (reverse complement and score bounds filled) but
/// not yet prepared.
pub fn load_motifs(
    path: &Path,
    params: &mut PwmParams,
    trim_names: bool,
    scan_rc: bool,
) -> Result<Vec<Motif>, ScanError> {
    let file = File::open(path)?;
    let lines: Vec<String> = BufReader::new(file).lines().collect::<io::Result<_>>()?;
    let fmt = detect_format(&lines)?;
    let mut motifs = match fmt {
        MotifFormat::Meme => meme::parse(&lines, params, scan_rc)?,
        MotifFormat::Homer => homer::parse(&lines, params)?,
        MotifFormat::Jaspar => jaspar::parse(&lines, params, trim_names)?,
    };
    for motif in motifs.iter_mut() {
        motif.finish();
    }
    let empty = motifs.iter().filter(|m| m.is_empty()).count();
    if empty == motifs.len() {
        return Err(ScanError::AllMotifsEmpty);
    }
    if empty > 0 {
        log::warn!("found {empty} empty motifs");
    }
    log::info!("found {} {fmt} motif(s)", motifs.len());
    Ok(motifs)
}

/// Splits a PPM row into exactly four probabilities.
pub(crate) fn parse_prob_row(line: &str, name: &str) -> Result<[f64; 4], ScanError> {
    let fields: Vec<&str> = line.split_whitespace().collect();
    if fields.is_empty() {
        return Err(ScanError::BadMatrix {
            name: name.to_string(),
            msg: "has an empty row".to_string(),
        });
    }
    if fields.len() != 4 {
        let which = if fields.len() > 4 { "many" } else { "few" };
        return Err(ScanError::BadMatrix {
            name: name.to_string(),
            msg: format!("has too {which} columns (need 4)"),
        });
    }
    let mut probs = [0.0; 4];
    for (slot, field) in probs.iter_mut().zip(fields) {
        *slot = field.parse().map_err(|_| ScanError::BadMatrix {
            name: name.to_string(),
            msg: format!("invalid matrix value: {field:?}"),
        })?;
    }
    Ok(probs)
}
