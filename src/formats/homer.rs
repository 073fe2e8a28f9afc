//! HOMER motif format: `>consensus\tname\tlogodds...` headers followed by
//! probability rows. The background is whatever the caller configured;
//! HOMER files never declare one.

use crate::{
    error::ScanError,
    motif::{Motif, PwmParams},
};

use super::parse_prob_row;

pub(crate) fn parse(lines: &[String], params: &PwmParams) -> Result<Vec<Motif>, ScanError> {
    let mut motifs: Vec<Motif> = Vec::new();
    for (idx, line) in lines.iter().enumerate() {
        let line_num = idx + 1;
        if line.starts_with('>') {
            let name = header_name(line, motifs.len() + 1);
            log::debug!("found motif: {name}");
            motifs.push(Motif::new(name, line_num)?);
        } else if !line.trim().is_empty() {
            let motif = motifs
                .last_mut()
                .ok_or_else(|| ScanError::MalformedMotifFile {
                    line: line_num,
                    msg: "matrix row before any motif header".to_string(),
                })?;
            let probs = parse_prob_row(line, motif.name())?;
            motif.push_probs(probs, params)?;
        }
    }
    Ok(motifs)
}

/// The motif name is the first non-empty tab field after the consensus.
/// Headers missing it fall back to a default name.
fn header_name(line: &str, ordinal: usize) -> String {
    let fields: Vec<&str> = line.split('\t').collect();
    let named = fields
        .iter()
        .enumerate()
        .skip(1)
        .find(|(_, field)| !field.is_empty());
    match named {
        None => {
            log::debug!("failed to parse motif name [#{ordinal}]");
            "motif".to_string()
        }
        Some((pos, field)) => {
            if pos == fields.len() - 1 {
                log::debug!("HOMER motif is missing logodds score [#{ordinal}]");
            }
            let mut name = field.to_string();
            if let Some(end) = name.find(['\r', '\n']) {
                name.truncate(end);
            }
            name
        }
    }
}
