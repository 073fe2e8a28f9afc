use std::{env, path::PathBuf};

use clap::Parser;
use eyre::Result;
use human_panic::setup_panic;
use libmotifscan::{
    background::Background,
    dedup::{deduplicate, trim_names},
    fasta::SequenceSet,
    formats::load_motifs,
    motif::{Motif, PwmParams, DEFAULT_NSITES, DEFAULT_PSEUDOCOUNT, DEFAULT_PVALUE},
    scan::{print_motifs, Scanner},
    utils::{stdin_or_file, stdout_or_file},
};
use log::LevelFilter;

#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
/// Scan DNA/RNA sequences for MEME/JASPAR/HOMER motifs.
struct Args {
    /// Text file of motifs, 1-50 bases wide. Acceptable formats: MEME,
    /// JASPAR, HOMER (auto-detected)
    #[clap(short = 'm', long, conflicts_with = "consensus")]
    motifs: Option<PathBuf>,

    /// Instead of -m, scan a single consensus sequence. IUPAC ambiguity
    /// letters are allowed; -b, -t, -p and -n are unused
    #[clap(short = '1', long)]
    consensus: Option<String>,

    /// Fasta file of DNA/RNA sequences to scan, '-' for stdin. Omitting
    /// -s prints the parsed motifs instead; omitting -m/-1 prints
    /// per-sequence stats
    #[clap(short = 's', long)]
    sequences: Option<String>,

    /// Output file. By default output goes to stdout
    #[clap(short = 'o', long)]
    output: Option<PathBuf>,

    /// Comma-separated background probabilities for A,C,G,T; overrides
    /// any background declared by a MEME motif file
    #[clap(short = 'b', long)]
    background: Option<Background>,

    /// Only scan the forward strand
    #[clap(short = 'f', long)]
    forward_only: bool,

    /// Threshold P-value
    #[clap(short = 't', long, default_value_t = DEFAULT_PVALUE)]
    threshold: f64,

    /// Pseudocount for PWM generation
    #[clap(
        short = 'p',
        long,
        default_value_t = DEFAULT_PSEUDOCOUNT,
        value_parser = clap::value_parser!(i32).range(1..)
    )]
    pseudocount: i32,

    /// Number of motif sites used in PWM generation
    #[clap(
        short = 'n',
        long,
        default_value_t = DEFAULT_NSITES,
        value_parser = clap::value_parser!(i32).range(1..)
    )]
    nsites: i32,

    /// Deduplicate motif/sequence names by appending index and line
    /// numbers; duplicate names abort otherwise
    #[clap(short = 'd', long)]
    dedup: bool,

    /// Trim motif (JASPAR only) and sequence names to the first word
    #[clap(short = 'r', long)]
    trim_names: bool,

    /// Print a progress bar during scanning
    #[clap(short = 'g', long)]
    progress: bool,

    /// Verbose mode
    #[clap(short = 'v', long)]
    verbose: bool,

    /// Very verbose mode. Only recommended for debugging
    #[clap(short = 'w', long)]
    very_verbose: bool,
}

fn main() -> Result<()> {
    setup_panic!();
    jane_eyre::install()?;

    let args = Args::parse();
    let level = if args.very_verbose {
        LevelFilter::Debug
    } else if args.verbose {
        LevelFilter::Info
    } else {
        LevelFilter::Warn
    };
    env_logger::Builder::new()
        .filter_level(level)
        .format_timestamp(None)
        .init();

    if args.motifs.is_none() && args.consensus.is_none() && args.sequences.is_none() {
        eyre::bail!("missing one of -m, -1, -s args");
    }

    let mut params = PwmParams {
        nsites: args.nsites,
        pseudocount: args.pseudocount,
        ..Default::default()
    };
    if let Some(bkg) = args.background {
        params.bkg = bkg;
        params.bkg_fixed = true;
        log::debug!("using background values: {}", params.bkg);
    }

    let exact_only = args.consensus.is_some();
    let mut pvalue = args.threshold;
    let mut motifs = match (&args.consensus, &args.motifs) {
        (Some(consensus), _) => {
            // Consensus scans ignore -b/-t/-p/-n: uniform background,
            // default smoothing, and exact matches only.
            params = PwmParams::default();
            pvalue = 1.0;
            vec![Motif::from_consensus(consensus)?]
        }
        (None, Some(path)) => {
            let mut motifs = load_motifs(path, &mut params, args.trim_names, !args.forward_only)?;
            deduplicate(&mut motifs, args.dedup, "motif")?;
            motifs
        }
        (None, None) => Vec::new(),
    };

    let seqs = match &args.sequences {
        Some(path) => {
            log::info!("reading sequences ...");
            let reader = stdin_or_file(path)?;
            let mut seqs = SequenceSet::load(reader)?;
            if args.trim_names {
                trim_names(seqs.seqs_mut());
            }
            deduplicate(seqs.seqs_mut(), args.dedup, "sequence")?;
            Some(seqs)
        }
        None => None,
    };

    let mut out = stdout_or_file(args.output.as_ref())?;

    match seqs {
        None => {
            log::info!("no sequences provided, parsing and printing motifs before exit");
            print_motifs(&mut motifs, &params.bkg, pvalue, exact_only, &mut out)?;
        }
        Some(seqs) if motifs.is_empty() => {
            log::info!("no motifs provided, printing sequence stats before exit");
            seqs.write_stats(&mut out)?;
        }
        Some(seqs) => {
            let argv: Vec<String> = env::args().skip(1).collect();
            let mut scanner = Scanner::new(params.bkg, &mut out);
            scanner
                .pvalue(pvalue)
                .scan_rc(!args.forward_only)
                .exact_only(exact_only)
                .progress(args.progress);
            scanner.write_header(&argv, &motifs, &seqs)?;
            scanner.run(&mut motifs, &seqs)?;
        }
    }
    Ok(())
}
