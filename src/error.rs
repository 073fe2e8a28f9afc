use std::io;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("failed to detect motif format")]
    UnknownMotifFormat,

    #[error("detected protein alphabet (L{0})")]
    ProteinAlphabet(usize),

    #[error("malformed motif file: {msg} (L{line})")]
    MalformedMotifFile { line: usize, msg: String },

    #[error("motif [{name}]: {msg}")]
    BadMatrix { name: String, msg: String },

    #[error("motif [{name}] is too wide ({width}, max 50)")]
    MotifTooWide { name: String, width: usize },

    #[error(
        "requested score distribution for [{name}] is too large ({size}>2097152); \
         make sure no background values are below 0.001"
    )]
    CdfTooLarge { name: String, size: usize },

    #[error("{what} name is too long (max 255 bytes): {name}")]
    NameTooLong { what: &'static str, name: String },

    #[error("encountered duplicate {what} name (use -d to deduplicate){listing}")]
    DuplicateNames { what: &'static str, listing: String },

    #[error("encountered unknown letter in consensus ({0})")]
    UnknownIupacLetter(char),

    #[error("{0}")]
    BadBackground(String),

    #[error("sequences don't appear to be fasta-formatted")]
    NotFasta,

    #[error("only encountered empty sequences")]
    EmptySequences,

    #[error("failed to read any standard DNA/RNA bases")]
    NoStandardBases,

    #[error("failed to detect any motifs in {0} file")]
    NoMotifs(&'static str),

    #[error("all parsed motifs are empty")]
    AllMotifsEmpty,
}
