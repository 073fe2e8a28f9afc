//! JASPAR motif format: `>name` headers followed by exactly four
//! bracketed count rows labeled A/C/G/T (U accepted for T). Counts are
//! converted to probabilities using the first column's sum as the site
//! count.

use crate::{
    error::ScanError,
    motif::{Motif, PwmParams},
};

struct Pending {
    name: String,
    line_num: usize,
    rows: [Vec<i64>; 4],
    rows_seen: usize,
}

pub(crate) fn parse(
    lines: &[String],
    params: &PwmParams,
    trim_names: bool,
) -> Result<Vec<Motif>, ScanError> {
    let mut motifs: Vec<Motif> = Vec::new();
    let mut pending: Option<Pending> = None;
    for (idx, line) in lines.iter().enumerate() {
        let line_num = idx + 1;
        if line.starts_with('>') {
            if let Some(done) = pending.take() {
                motifs.push(finalize(done, params)?);
            }
            let mut name = line[1..].trim_end_matches('\r').to_string();
            if trim_names {
                if let Some(end) = name.find(char::is_whitespace) {
                    name.truncate(end);
                }
            }
            log::debug!("found motif: {name}");
            pending = Some(Pending {
                name,
                line_num,
                rows: Default::default(),
                rows_seen: 0,
            });
        } else if !line.trim().is_empty() {
            let entry = pending
                .as_mut()
                .ok_or_else(|| ScanError::MalformedMotifFile {
                    line: line_num,
                    msg: "count row before any motif header".to_string(),
                })?;
            entry.rows_seen += 1;
            let (row_idx, counts) = parse_count_row(line, &entry.name)?;
            entry.rows[row_idx] = counts;
        }
    }
    if let Some(done) = pending.take() {
        motifs.push(finalize(done, params)?);
    }
    Ok(motifs)
}

fn finalize(pending: Pending, params: &PwmParams) -> Result<Motif, ScanError> {
    if pending.rows_seen != 4 {
        let which = if pending.rows_seen < 4 { "few" } else { "many" };
        return Err(ScanError::BadMatrix {
            name: pending.name,
            msg: format!("has too {which} rows"),
        });
    }
    Motif::from_counts(pending.name, pending.line_num, &pending.rows, params)
}

/// Extracts the base label and the integer counts between brackets.
fn parse_count_row(line: &str, name: &str) -> Result<(usize, Vec<i64>), ScanError> {
    let mut row_idx = None;
    let mut left = None;
    let mut right = None;
    for (pos, ch) in line.char_indices() {
        match ch {
            'a' | 'A' => row_idx = Some(0),
            'c' | 'C' => row_idx = Some(1),
            'g' | 'G' => row_idx = Some(2),
            't' | 'T' | 'u' | 'U' => row_idx = Some(3),
            '[' => left = Some(pos),
            ']' => right = Some(pos),
            _ => {}
        }
    }
    let row_idx = row_idx.ok_or_else(|| ScanError::BadMatrix {
        name: name.to_string(),
        msg: "couldn't find ACGTU in row names".to_string(),
    })?;
    let (left, right) = match left.zip(right) {
        Some((l, r)) if l < r => (l, r),
        _ => {
            return Err(ScanError::BadMatrix {
                name: name.to_string(),
                msg: format!("couldn't find '[]' in row ({})", row_idx + 1),
            })
        }
    };
    let counts = line[left + 1..right]
        .split_whitespace()
        .map(|field| {
            field.parse().map_err(|_| ScanError::BadMatrix {
                name: name.to_string(),
                msg: format!("invalid count value: {field:?}"),
            })
        })
        .collect::<Result<Vec<i64>, ScanError>>()?;
    if counts.is_empty() {
        return Err(ScanError::BadMatrix {
            name: name.to_string(),
            msg: "has an empty row".to_string(),
        });
    }
    Ok((row_idx, counts))
}
