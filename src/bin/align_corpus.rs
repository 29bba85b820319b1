//! Align a corpus of TEI documents against their glyph dumps.
//!
//! Every `<id>.xml` / `<id>.tei.xml` in the TEI directory is aligned against
//! the glyph dump with the same id and written to the output directory as
//! `<id>.xml` (annotated TEI) and `<id>.coords.json` (coordinate index).
//!
//! Usage:
//!   cargo run --release --bin align_corpus -- --tei-dir tei --glyph-dir glyphs --output-dir out
//!   cargo run --release --bin align_corpus -- ... --profile yugoslav --workers 8
//!   cargo run --release --bin align_corpus -- ... --config aligner.json --verbose

use glyph_anchor::config::{AlignerConfig, CorpusProfile};
use glyph_anchor::glyph::DirectoryGlyphSource;
use glyph_anchor::pipeline::{BatchRunner, DirectorySink, DocumentAligner};
use glyph_anchor::structure::DirectoryTeiSource;
use lazy_static::lazy_static;
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};
use std::process;

lazy_static! {
    static ref TEI_FILE: Regex = Regex::new(r"^(.+?)(\.tei)?\.xml$").unwrap();
}

struct RunConfig {
    tei_dir: PathBuf,
    glyph_dir: PathBuf,
    output_dir: PathBuf,
    profile: CorpusProfile,
    config_file: Option<PathBuf>,
    workers: usize,
    verbose: bool,
}

impl RunConfig {
    fn from_args() -> Result<Self, String> {
        let args: Vec<String> = std::env::args().collect();
        let mut tei_dir = None;
        let mut glyph_dir = None;
        let mut output_dir = PathBuf::from("aligned");
        let mut profile = CorpusProfile::Generic;
        let mut config_file = None;
        let mut workers = 0;
        let mut verbose = false;

        let mut i = 1;
        while i < args.len() {
            let value = |i: usize| {
                args.get(i + 1)
                    .cloned()
                    .ok_or_else(|| format!("{} expects a value", args[i]))
            };
            match args[i].as_str() {
                "--tei-dir" => {
                    tei_dir = Some(PathBuf::from(value(i)?));
                    i += 1;
                },
                "--glyph-dir" => {
                    glyph_dir = Some(PathBuf::from(value(i)?));
                    i += 1;
                },
                "--output-dir" => {
                    output_dir = PathBuf::from(value(i)?);
                    i += 1;
                },
                "--profile" => {
                    profile = value(i)?.parse().map_err(|e| format!("{}", e))?;
                    i += 1;
                },
                "--config" => {
                    config_file = Some(PathBuf::from(value(i)?));
                    i += 1;
                },
                "--workers" => {
                    workers = value(i)?
                        .parse()
                        .map_err(|_| "--workers expects a number".to_string())?;
                    i += 1;
                },
                "--verbose" | "-v" => {
                    verbose = true;
                },
                "--help" | "-h" => {
                    print_usage();
                    process::exit(0);
                },
                other => return Err(format!("unknown argument '{}'", other)),
            }
            i += 1;
        }

        Ok(Self {
            tei_dir: tei_dir.ok_or("--tei-dir is required")?,
            glyph_dir: glyph_dir.ok_or("--glyph-dir is required")?,
            output_dir,
            profile,
            config_file,
            workers,
            verbose,
        })
    }

    fn aligner_config(&self) -> glyph_anchor::Result<AlignerConfig> {
        match &self.config_file {
            Some(path) => AlignerConfig::from_json_file(path),
            None => Ok(self.profile.create_config()),
        }
    }
}

fn print_usage() {
    println!("Usage: align_corpus --tei-dir DIR --glyph-dir DIR [options]");
    println!();
    println!("Options:");
    println!("  --output-dir DIR   where annotated files are written (default: aligned)");
    println!("  --profile NAME     generic, yugoslav or carniolan (default: generic)");
    println!("  --config FILE      JSON aligner configuration (overrides --profile)");
    println!("  --workers N        worker threads (default: one per CPU)");
    println!("  --verbose, -v      log every unit decision");
}

/// Document ids of the TEI files in `dir`, sorted.
fn discover_documents(dir: &Path) -> std::io::Result<Vec<String>> {
    let mut ids = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if !path.is_file() {
            continue;
        }
        let name = match path.file_name().and_then(|n| n.to_str()) {
            Some(name) => name,
            None => continue,
        };
        if let Some(caps) = TEI_FILE.captures(name) {
            ids.push(caps[1].to_string());
        }
    }
    ids.sort();
    ids.dedup();
    Ok(ids)
}

fn run(config: &RunConfig) -> Result<bool, Box<dyn std::error::Error>> {
    let aligner_config = config.aligner_config()?;
    let documents = discover_documents(&config.tei_dir)?;
    if documents.is_empty() {
        log::warn!("No TEI documents in {}", config.tei_dir.display());
        return Ok(true);
    }

    let sink = DirectorySink::create(&config.output_dir)?;
    let runner = BatchRunner::new(DocumentAligner::new(aligner_config)?).with_workers(config.workers);
    let report = runner.run(
        &documents,
        &DirectoryGlyphSource::new(&config.glyph_dir),
        &DirectoryTeiSource::new(&config.tei_dir),
        &sink,
    )?;

    let timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
    let report_path = config
        .output_dir
        .join(format!("alignment_report_{}.json", timestamp));
    fs::write(&report_path, report.to_json()?)?;

    println!(
        "Aligned {}/{} documents ({} failed) in {:.2}s",
        report.successful,
        report.total_documents,
        report.failed,
        report.total_duration_ms / 1000.0
    );
    for failure in report.failures() {
        println!(
            "  {}: {}",
            failure.document_id,
            failure.error.as_deref().unwrap_or("unknown error")
        );
    }
    println!("Report saved to: {}", report_path.display());

    Ok(report.failed == 0)
}

fn main() {
    let config = match RunConfig::from_args() {
        Ok(config) => config,
        Err(message) => {
            eprintln!("Error: {}", message);
            print_usage();
            process::exit(2);
        },
    };

    let default_level = if config.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level)).init();

    match run(&config) {
        Ok(true) => {},
        Ok(false) => process::exit(1),
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(2);
        },
    }
}
