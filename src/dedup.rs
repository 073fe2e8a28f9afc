//! Motif and sequence name hygiene: `-r` trimming and `-d` deduplication.

use fnv::FnvHashMap;

use crate::{error::ScanError, fasta::Sequence, motif::Motif, motif::MAX_NAME_LEN};

/// Anything with a renameable identifier and a source line.
pub trait NamedRecord {
    fn name(&self) -> &str;
    fn rename(&mut self, name: String);
    fn line_num(&self) -> usize;
}

impl NamedRecord for Motif {
    fn name(&self) -> &str {
        Motif::name(self)
    }

    fn rename(&mut self, name: String) {
        Motif::rename(self, name);
    }

    fn line_num(&self) -> usize {
        Motif::line_num(self)
    }
}

impl NamedRecord for Sequence {
    fn name(&self) -> &str {
        Sequence::name(self)
    }

    fn rename(&mut self, name: String) {
        Sequence::rename(self, name);
    }

    fn line_num(&self) -> usize {
        Sequence::line_num(self)
    }
}

/// Cuts every name at its first whitespace character.
pub fn trim_names<T: NamedRecord>(items: &mut [T]) {
    for item in items.iter_mut() {
        if let Some(end) = item.name().find(char::is_whitespace) {
            let trimmed = item.name()[..end].to_string();
            item.rename(trimmed);
        }
    }
}

/// Resolves duplicate names. With `allow` set, every repeated name (all
/// of its occurrences) gets `__N{index}_L{line}` appended; otherwise the
/// offenders are listed and an error returned. Suffixed names may not
/// outgrow the name limit.
pub fn deduplicate<T: NamedRecord>(
    items: &mut [T],
    allow: bool,
    what: &'static str,
) -> Result<(), ScanError> {
    if items.len() <= 1 {
        return Ok(());
    }
    let mut counts: FnvHashMap<String, usize> = FnvHashMap::default();
    for item in items.iter() {
        *counts.entry(item.name().to_string()).or_insert(0) += 1;
    }
    let offenders: Vec<usize> = items
        .iter()
        .enumerate()
        .filter(|(_, item)| counts[item.name()] > 1)
        .map(|(idx, _)| idx)
        .collect();
    if offenders.is_empty() {
        return Ok(());
    }

    if !allow {
        let mut listing = String::new();
        for &idx in offenders.iter().take(5) {
            listing.push_str(&format!(
                "\n    L{} #{}: {}",
                items[idx].line_num(),
                idx + 1,
                items[idx].name()
            ));
        }
        if offenders.len() > 5 {
            listing.push_str("\n    ...");
            listing.push_str(&format!(
                "\n    found {} total non-unique names",
                offenders.len()
            ));
        }
        return Err(ScanError::DuplicateNames { what, listing });
    }

    for &idx in &offenders {
        let renamed = format!(
            "{}__N{}_L{}",
            items[idx].name(),
            idx + 1,
            items[idx].line_num()
        );
        if renamed.len() > MAX_NAME_LEN {
            return Err(ScanError::NameTooLong {
                what,
                name: renamed,
            });
        }
        items[idx].rename(renamed);
    }
    Ok(())
}
