//! CLI tool for converting PowerPoint files into render-ready slide views.

use anyhow::{bail, Context, Result};
use clap::Parser;
use serde::Serialize;
use slideview_pptx::{Conversion, ConvertOptions, PptxConverter};
use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

/// Local file header signature of a ZIP archive.
const ZIP_MAGIC: [u8; 4] = [0x50, 0x4B, 0x03, 0x04];

/// Resolve PowerPoint (.pptx) files into slide views as JSON.
#[derive(Parser, Debug)]
#[command(name = "pptx2view")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Input PowerPoint file(s) (.pptx)
    #[arg(required = true)]
    input: Vec<PathBuf>,

    /// Output directory (default: same as input file)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Print output to stdout instead of writing to file
    #[arg(short, long)]
    print: bool,

    /// Convert only this slide (1-based)
    #[arg(long)]
    page: Option<usize>,

    /// Resolve slides one at a time
    #[arg(long)]
    sequential: bool,

    /// Number of image embedding workers
    #[arg(short, long, default_value = "4")]
    workers: usize,

    /// Keep image references as package paths instead of data URIs
    #[arg(long)]
    no_images: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    fn options(&self) -> ConvertOptions {
        ConvertOptions::default()
            .with_parallel(!self.sequential)
            .with_image_workers(self.workers)
            .with_embed_images(!self.no_images)
            .with_slide_filter(self.page)
    }
}

/// What gets written for one input file.
#[derive(Serialize)]
struct Output<'a> {
    source: &'a str,
    #[serde(flatten)]
    conversion: &'a Conversion,
    css: String,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    if args.verbose {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug")).init();
    } else {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    }

    let converter = PptxConverter::with_options(args.options());
    let mut failed = 0;

    for input_path in &args.input {
        if args.verbose {
            eprintln!("Processing: {}", input_path.display());
        }

        match process_file(input_path, &args, &converter) {
            Ok(output) => {
                if args.print {
                    println!("{}", output);
                } else {
                    let output_path = get_output_path(input_path, args.output.as_ref())?;
                    write_output(&output_path, &output)?;
                    if args.verbose {
                        eprintln!("Written to: {}", output_path.display());
                    }
                }
            }
            Err(e) => {
                failed += 1;
                eprintln!("Error processing {}: {:#}", input_path.display(), e);
            }
        }
    }

    if failed > 0 {
        bail!("{} of {} file(s) failed", failed, args.input.len());
    }

    Ok(())
}

/// Convert a single PowerPoint file to JSON.
fn process_file(input_path: &Path, args: &Args, converter: &PptxConverter) -> Result<String> {
    let file = File::open(input_path)
        .with_context(|| format!("Failed to open {}", input_path.display()))?;
    let mut reader = BufReader::new(file);

    // Legacy binary .ppt files are not ZIP archives.
    let mut magic = [0u8; 4];
    reader
        .read_exact(&mut magic)
        .with_context(|| "Failed to read file header")?;
    if magic != ZIP_MAGIC {
        bail!("not a .pptx (Office Open XML) file");
    }
    reader.seek(SeekFrom::Start(0))?;

    log::debug!("Converting {} with {:?}", input_path.display(), converter.options());

    let conversion = converter
        .convert(reader)
        .with_context(|| format!("Failed to convert {}", input_path.display()))?;

    if args.verbose {
        eprintln!(
            "  Resolved {} slides ({}x{} px), {} style classes",
            conversion.slides.len(),
            conversion.width,
            conversion.height,
            conversion.styles.len()
        );
        for diagnostic in &conversion.diagnostics {
            eprintln!(
                "  Skipped slide {} ({}): {}",
                diagnostic.index, diagnostic.path, diagnostic.message
            );
        }
    }

    let source = input_path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("unknown");
    let output = Output {
        source,
        conversion: &conversion,
        css: conversion.css(""),
    };

    serde_json::to_string_pretty(&output).context("Failed to serialize slide views")
}

/// Determine the output path for a processed file.
fn get_output_path(input_path: &Path, output_dir: Option<&PathBuf>) -> Result<PathBuf> {
    let stem = input_path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("output");

    let output_filename = format!("{}.slides.json", stem);

    let output_path = match output_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create output directory: {}", dir.display()))?;
            dir.join(output_filename)
        }
        None => match input_path.parent() {
            Some(parent) => parent.join(output_filename),
            None => PathBuf::from(output_filename),
        },
    };

    Ok(output_path)
}

/// Write output to a file.
fn write_output(path: &Path, content: &str) -> Result<()> {
    let mut file =
        File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;

    file.write_all(content.as_bytes())
        .with_context(|| format!("Failed to write to {}", path.display()))?;

    Ok(())
}
