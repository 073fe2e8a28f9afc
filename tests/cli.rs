use std::{error::Error, path::PathBuf, process::Command};

use assert_cmd::prelude::OutputAssertExt;
use assert_fs::{fixture::FileWriteStr, fixture::PathChild, TempDir};
use escargot::CargoBuild;
use predicates::prelude::predicate;

fn motifscan() -> Result<PathBuf, Box<dyn Error>> {
    let run = CargoBuild::new()
        .package("motifscan")
        .bin("motifscan")
        .run()?;
    Ok(run.path().to_path_buf())
}

fn stdout_of(output: std::process::Output) -> String {
    String::from_utf8(output.stdout).expect("utf8 output")
}

#[test]
fn consensus_exact_match_reports_both_strands() -> Result<(), Box<dyn Error>> {
    let bin = motifscan()?;
    let temp_dir = TempDir::new()?;
    let fasta = temp_dir.child("seq.fa");
    fasta.write_str(">s1\nTTACGTAA\n")?;

    let output = Command::new(&bin)
        .arg("-1")
        .arg("ACGT")
        .arg("-s")
        .arg(fasta.path())
        .output()?;
    output.clone().assert().success();

    let text = stdout_of(output);
    let hits: Vec<&str> = text
        .lines()
        .filter(|line| !line.starts_with("##"))
        .collect();
    // ACGT is its own reverse complement: one hit per strand, same
    // coordinates, forward-strand match bytes on both.
    assert_eq!(hits.len(), 2);
    assert!(hits[0].starts_with("s1\t3\t6\t+\tACGT\t"));
    assert!(hits[0].ends_with("\tACGT"));
    assert!(hits[1].starts_with("s1\t3\t6\t-\tACGT\t"));
    assert!(hits[1].ends_with("\tACGT"));
    Ok(())
}

#[test]
fn forward_only_flag_drops_reverse_hits() -> Result<(), Box<dyn Error>> {
    let bin = motifscan()?;
    let temp_dir = TempDir::new()?;
    let fasta = temp_dir.child("seq.fa");
    fasta.write_str(">s1\nTTACGTAA\n")?;

    let output = Command::new(&bin)
        .arg("-1")
        .arg("ACGT")
        .arg("-s")
        .arg(fasta.path())
        .arg("-f")
        .output()?;
    output.clone().assert().success();

    let hits: Vec<String> = stdout_of(output)
        .lines()
        .filter(|line| !line.starts_with("##"))
        .map(str::to_string)
        .collect();
    assert_eq!(hits.len(), 1);
    assert!(hits[0].contains("\t+\t"));
    Ok(())
}

#[test]
fn windows_containing_ambiguous_bases_never_report() -> Result<(), Box<dyn Error>> {
    let bin = motifscan()?;
    let temp_dir = TempDir::new()?;
    let motifs = temp_dir.child("motifs.txt");
    motifs.write_str(
        "MEME version 4\n\nMOTIF m1\nletter-probability matrix:\n\
         1.0 0.0 0.0 0.0\n0.0 1.0 0.0 0.0\n0.0 0.0 1.0 0.0\n",
    )?;
    let fasta = temp_dir.child("seq.fa");
    fasta.write_str(">s\nACNGT\n")?;

    // Even with the most permissive threshold, every width-3 window of
    // ACNGT touches the N and must stay silent.
    let output = Command::new(&bin)
        .arg("-m")
        .arg(motifs.path())
        .arg("-s")
        .arg(fasta.path())
        .arg("-t")
        .arg("1")
        .output()?;
    output.clone().assert().success();

    let hits: Vec<String> = stdout_of(output)
        .lines()
        .filter(|line| !line.starts_with("##"))
        .map(str::to_string)
        .collect();
    assert_eq!(hits, Vec::<String>::new());
    Ok(())
}

#[test]
fn background_override_changes_scores() -> Result<(), Box<dyn Error>> {
    let bin = motifscan()?;
    let temp_dir = TempDir::new()?;
    let motifs = temp_dir.child("motifs.txt");
    motifs.write_str(
        "MEME version 4\n\nMOTIF aa\nletter-probability matrix:\n\
         1.0 0.0 0.0 0.0\n1.0 0.0 0.0 0.0\n",
    )?;
    let fasta = temp_dir.child("seq.fa");
    fasta.write_str(">s\nAA\n")?;

    let uniform = Command::new(&bin)
        .arg("-m")
        .arg(motifs.path())
        .arg("-s")
        .arg(fasta.path())
        .arg("-t")
        .arg("1")
        .output()?;
    uniform.clone().assert().success();
    let uniform_text = stdout_of(uniform);
    // Perfect match under a uniform background:
    // 2 * (1000 * log2(4 * (1000.25/1001))) truncated = 2 * 1998.
    assert!(uniform_text.contains("\t3.996\t"), "got: {uniform_text}");

    let skewed = Command::new(&bin)
        .arg("-m")
        .arg(motifs.path())
        .arg("-s")
        .arg(fasta.path())
        .arg("-t")
        .arg("1")
        .arg("-b")
        .arg("0.1,0.4,0.4,0.1")
        .output()?;
    skewed.clone().assert().success();
    let skewed_text = stdout_of(skewed);
    assert!(!skewed_text.contains("\t3.996\t"), "got: {skewed_text}");
    // 2 * (1000 * log2((1000.25/1001)/0.1)) truncated = 2 * 3320.
    assert!(skewed_text.contains("\t6.640\t"), "got: {skewed_text}");
    Ok(())
}

#[test]
fn unreachable_threshold_yields_no_hits() -> Result<(), Box<dyn Error>> {
    let bin = motifscan()?;
    let temp_dir = TempDir::new()?;
    let motifs = temp_dir.child("motifs.txt");
    motifs.write_str(
        "MEME version 4\n\nMOTIF flat\nletter-probability matrix:\n\
         0.25 0.25 0.25 0.25\n0.25 0.25 0.25 0.25\n\
         0.25 0.25 0.25 0.25\n0.25 0.25 0.25 0.25\n",
    )?;
    let fasta = temp_dir.child("seq.fa");
    fasta.write_str(">s\nACGTACGTACGT\n")?;

    let output = Command::new(&bin)
        .arg("-m")
        .arg(motifs.path())
        .arg("-s")
        .arg(fasta.path())
        .arg("-t")
        .arg("1e-30")
        .output()?;
    output.clone().assert().success();

    let hits: Vec<String> = stdout_of(output)
        .lines()
        .filter(|line| !line.starts_with("##"))
        .map(str::to_string)
        .collect();
    assert_eq!(hits, Vec::<String>::new());
    Ok(())
}

#[test]
fn duplicate_motif_names_abort_without_dedup_flag() -> Result<(), Box<dyn Error>> {
    let bin = motifscan()?;
    let temp_dir = TempDir::new()?;
    let motifs = temp_dir.child("motifs.txt");
    motifs.write_str(
        "MEME version 4\n\nMOTIF foo\nletter-probability matrix:\n\
         1.0 0.0 0.0 0.0\n\nMOTIF foo\nletter-probability matrix:\n\
         0.0 1.0 0.0 0.0\n",
    )?;

    Command::new(&bin)
        .arg("-m")
        .arg(motifs.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("duplicate motif name"));
    Ok(())
}

#[test]
fn duplicate_motif_names_get_suffixed_with_dedup_flag() -> Result<(), Box<dyn Error>> {
    let bin = motifscan()?;
    let temp_dir = TempDir::new()?;
    let motifs = temp_dir.child("motifs.txt");
    motifs.write_str(
        "MEME version 4\n\nMOTIF foo\nletter-probability matrix:\n\
         1.0 0.0 0.0 0.0\n\nMOTIF foo\nletter-probability matrix:\n\
         0.0 1.0 0.0 0.0\n",
    )?;

    let output = Command::new(&bin)
        .arg("-m")
        .arg(motifs.path())
        .arg("-d")
        .output()?;
    output.clone().assert().success();
    let text = stdout_of(output);
    assert!(text.contains("Motif: foo__N1_L3"), "got: {text}");
    assert!(text.contains("Motif: foo__N2_L7"), "got: {text}");
    Ok(())
}

#[test]
fn meme_background_is_inherited_unless_overridden() -> Result<(), Box<dyn Error>> {
    let bin = motifscan()?;
    let temp_dir = TempDir::new()?;
    let motifs = temp_dir.child("motifs.txt");
    motifs.write_str(
        "MEME version 4\n\nBackground letter frequencies\n\
         A 0.1 C 0.4 G 0.4 T 0.1\n\nMOTIF m\nletter-probability matrix:\n\
         1.0 0.0 0.0 0.0\n",
    )?;

    // Inherited: the A cell is 1000*log2((1000.25/1001)/0.1) = 3320.
    let inherited = Command::new(&bin).arg("-m").arg(motifs.path()).output()?;
    inherited.clone().assert().success();
    assert!(stdout_of(inherited).contains("1:\t3.32\t"));

    // Overridden back to uniform: 1998.
    let overridden = Command::new(&bin)
        .arg("-m")
        .arg(motifs.path())
        .arg("-b")
        .arg("0.25,0.25,0.25,0.25")
        .output()?;
    overridden.clone().assert().success();
    assert!(stdout_of(overridden).contains("1:\t2.00\t"));
    Ok(())
}

#[test]
fn sequence_stats_mode() -> Result<(), Box<dyn Error>> {
    let bin = motifscan()?;
    let temp_dir = TempDir::new()?;
    let fasta = temp_dir.child("seq.fa");
    fasta.write_str(">one\nACGT\n>two extra words\nNNGGCC\n")?;

    let output = Command::new(&bin)
        .arg("-s")
        .arg(fasta.path())
        .arg("-r")
        .output()?;
    output.clone().assert().success();
    let text = stdout_of(output);
    let mut lines = text.lines();
    assert_eq!(
        lines.next().unwrap(),
        "##seqnum\tline_num\tseqname\tsize\tgc_pct\tn_count"
    );
    assert_eq!(lines.next().unwrap(), "1\t1\tone\t4\t50.00\t0");
    assert_eq!(lines.next().unwrap(), "2\t3\ttwo\t6\t100.00\t2");
    Ok(())
}

#[test]
fn motif_print_mode_round_trips_the_pwm() -> Result<(), Box<dyn Error>> {
    let bin = motifscan()?;
    let temp_dir = TempDir::new()?;
    let motifs = temp_dir.child("motifs.txt");
    motifs.write_str(
        "MEME version 4\n\nMOTIF m1\nletter-probability matrix:\n\
         0.7 0.1 0.1 0.1\n0.1 0.1 0.1 0.7\n",
    )?;

    let output = Command::new(&bin).arg("-m").arg(motifs.path()).output()?;
    output.clone().assert().success();
    let text = stdout_of(output);
    assert!(text.contains("Motif: m1 (N1 L3)"));
    assert!(text.contains("MaxScore="));
    assert!(text.contains("Motif PWM:"));
    assert!(text.contains("\tA\tC\tG\tT"));
    // Representative p-values bracket the score range.
    assert!(text.contains("-->     p=1"));
    Ok(())
}

#[test]
fn missing_all_inputs_is_an_error() -> Result<(), Box<dyn Error>> {
    let bin = motifscan()?;
    Command::new(&bin)
        .assert()
        .failure()
        .stderr(predicate::str::contains("-m"));
    Ok(())
}

#[test]
fn stdin_sequences_with_dash() -> Result<(), Box<dyn Error>> {
    let bin = motifscan()?;
    let mut cmd = assert_cmd::Command::new(&bin);
    cmd.arg("-1")
        .arg("AA")
        .arg("-s")
        .arg("-")
        .write_stdin(">s\nAAAA\n");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("\t+\tAA\t"));
    Ok(())
}
