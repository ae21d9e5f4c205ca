//! tbs CLI
//!
//! Generate Rust, TypeScript and C++ codecs from protocol schemas.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod config;

use config::TbsConfig;
use tbs_compiler::{compile_with, parse, Language};

#[derive(Parser)]
#[command(name = "tbs")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Compile binary protocol schemas into Rust, TypeScript and C++", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate code for one or more languages
    Generate {
        /// Input `.tsp` schema file
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Output directory (defaults to `generated`)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Comma-separated languages (rust, typescript, cpp); defaults to all
        #[arg(short, long, value_delimiter = ',')]
        languages: Vec<Language>,

        /// Protocol version written into generated headers
        #[arg(long)]
        protocol_version: Option<String>,

        /// Config file (defaults to `./tbs.toml` when present)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Print the resolved schema IR as JSON
    Parse {
        /// Input `.tsp` schema file
        input: PathBuf,
    },

    /// Validate a schema and print a summary
    Check {
        /// Input `.tsp` schema file
        input: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    match cli.command {
        Commands::Generate {
            input,
            output,
            languages,
            protocol_version,
            config,
        } => cmd_generate(input, output, languages, protocol_version, config.as_deref()),

        Commands::Parse { input } => cmd_parse(&input),

        Commands::Check { input } => cmd_check(&input),
    }
}

fn read_schema(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("Failed to read schema {}", path.display()))
}

fn source_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn cmd_generate(
    input: Option<PathBuf>,
    output: Option<PathBuf>,
    languages: Vec<Language>,
    protocol_version: Option<String>,
    config_path: Option<&Path>,
) -> Result<()> {
    let config = TbsConfig::load_or_default(config_path)?;

    let input = input
        .or_else(|| config.input.clone())
        .context("No input schema. Pass --input or set `input` in tbs.toml")?;
    let output = output
        .or_else(|| config.output.clone())
        .unwrap_or_else(|| PathBuf::from("generated"));
    let languages = if !languages.is_empty() {
        languages
    } else {
        let from_config = config.languages()?;
        if from_config.is_empty() {
            Language::ALL.to_vec()
        } else {
            from_config
        }
    };
    let mut generator_config = config.generator_config();
    if protocol_version.is_some() {
        generator_config.protocol_version = protocol_version;
    }

    info!("Compiling {}", input.display());
    let text = read_schema(&input)?;
    let files = compile_with(&text, &source_name(&input), &languages, &generator_config)?;

    for file in &files {
        let path = output.join(&file.filename);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }
        fs::write(&path, &file.content).with_context(|| format!("Failed to write {}", path.display()))?;
        debug!("Wrote {} ({} bytes)", path.display(), file.content.len());
    }

    info!("Generated {} files in {}", files.len(), output.display());
    Ok(())
}

fn cmd_parse(input: &Path) -> Result<()> {
    let text = read_schema(input)?;
    let json = tbs::parse_to_json(&text, &source_name(input))?;
    println!("{}", json);
    Ok(())
}

fn cmd_check(input: &Path) -> Result<()> {
    let text = read_schema(input)?;
    let ir = parse(&text, &source_name(input))?;

    let fixed = ir.models.iter().filter(|m| m.fixed_size().is_some()).count();
    println!("{}: ok", input.display());
    if !ir.namespace.is_empty() {
        println!("  namespace: {}", ir.namespace);
    }
    println!("  enums:     {}", ir.enums.len());
    println!("  models:    {} ({} fixed size)", ir.models.len(), fixed);
    println!("  commands:  {}", ir.commands().count());
    Ok(())
}
