//! trackcfg CLI
//!
//! Usage:
//!   trackcfg [OPTIONS] [SCRIPT]
//!
//! Options:
//!   -l, --library <FILE>      Extra template library (TOML), layered over the built-in one
//!   --shadowing <POLICY>      allow, warn or deny imports that rebind a name
//!   -f, --format <FORMAT>     text or toml
//!   --no-validate             Skip the validation pass
//!   --strict                  Exit with an error when validation reports errors
//!   --list-modules            List the available template modules
//!   -g, --grammar             Show script syntax reference
//!   -h, --help                Print help

use std::fs;
use std::io::{self, IsTerminal, Read};
use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use trackcfg::{load_with_config, LoadConfig, ShadowPolicy, TemplateLibrary};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Toml,
}

#[derive(Parser)]
#[command(name = "trackcfg")]
#[command(about = "Assemble track-reconstruction configurations from templates")]
struct Cli {
    /// Assembly script (reads from stdin if not provided)
    input: Option<PathBuf>,

    /// Extra template library (TOML); may be repeated, later files win
    #[arg(short, long)]
    library: Vec<PathBuf>,

    /// What to do when an import rebinds an existing name
    #[arg(long, default_value = "warn")]
    shadowing: ShadowPolicy,

    /// Output format for the assembled process
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    /// Skip the validation pass
    #[arg(long)]
    no_validate: bool,

    /// Exit with an error when validation reports errors
    #[arg(long)]
    strict: bool,

    /// List the available template modules and their bindings
    #[arg(long)]
    list_modules: bool,

    /// Show script syntax reference
    #[arg(short, long)]
    grammar: bool,
}

fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "trackcfg=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let cli = Cli::parse();

    if cli.grammar {
        print_grammar();
        return;
    }

    // Built-in library, then each user library in order
    let mut library = TemplateLibrary::default();
    for path in &cli.library {
        match TemplateLibrary::from_file(path) {
            Ok(extra) => library = library.merge(extra),
            Err(e) => {
                eprintln!("Error loading template library '{}': {}", path.display(), e);
                std::process::exit(1);
            }
        }
    }

    if cli.list_modules {
        print_modules(&library);
        return;
    }

    // If no input file and stdin is a terminal (interactive), show intro help
    if cli.input.is_none() && io::stdin().is_terminal() {
        print_intro();
        return;
    }

    let (source, filename) = match &cli.input {
        Some(path) => match fs::read_to_string(path) {
            Ok(content) => (content, path.display().to_string()),
            Err(e) => {
                eprintln!("Error reading file '{}': {}", path.display(), e);
                std::process::exit(1);
            }
        },
        None => {
            let mut buffer = String::new();
            match io::stdin().read_to_string(&mut buffer) {
                Ok(_) => (buffer, "<stdin>".to_string()),
                Err(e) => {
                    eprintln!("Error reading from stdin: {}", e);
                    std::process::exit(1);
                }
            }
        }
    };

    let config = LoadConfig::new()
        .with_library(library)
        .with_shadowing(cli.shadowing)
        .with_validation(!cli.no_validate)
        .with_strict(cli.strict);

    let loaded = match load_with_config(&source, config) {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("{}", e.format(&source, &filename));
            std::process::exit(1);
        }
    };

    match cli.format {
        OutputFormat::Text => print!("{}", loaded.process),
        OutputFormat::Toml => match loaded.process.to_toml() {
            Ok(toml) => print!("{}", toml),
            Err(e) => {
                eprintln!("Error serializing process: {}", e);
                std::process::exit(1);
            }
        },
    }
}

fn print_modules(library: &TemplateLibrary) {
    let mut modules: Vec<_> = library.modules().iter().collect();
    modules.sort_by(|a, b| a.path().cmp(b.path()));
    for module in modules {
        println!("{}", module.path());
        for (binding, record) in module.records() {
            match record.component_name() {
                Some(name) => println!("    {} ({}, ComponentName = {:?})", binding, record.kind(), name),
                None => println!("    {} ({})", binding, record.kind()),
            }
        }
    }
}

fn print_intro() {
    println!(
        r#"trackcfg - Assemble track-reconstruction configurations from templates

USAGE:
    trackcfg [OPTIONS] [SCRIPT]
    echo '<script>' | trackcfg

OPTIONS:
    -l, --library       Extra template library (TOML file)
    --shadowing         allow | warn | deny (default: warn)
    -f, --format        text | toml (default: text)
    --no-validate       Skip the validation pass
    --strict            Fail on validation errors
    --list-modules      List available template modules
    -g, --grammar       Show script syntax reference
    -h, --help          Print help

QUICK START:
    trackcfg processes/CTFFinalFitWithMaterialTIFTIB.tcfg

Run --grammar for syntax reference or --list-modules for the template catalog."#
    );
}

fn print_grammar() {
    println!(
        r#"TRACKCFG SCRIPT SYNTAX
=====================

HEADER
------
process Name                        Optional, must come first (default: process)

IMPORTS
-------
import A.B.C                        Bind every record of module A.B.C
from A.B.C import X, Y              Bind only X and Y
from A.B.C import *                 Same as import A.B.C

SPECIALIZATION
--------------
X = copy(Y)                         Bind X to an independent copy of Y
X = copy(Y) {{ f = v, g = w }}       Copy and override fields
X.f = v                             Create or overwrite field f of X

VALUES
------
"text" or 'text'                    String
true, false                         Boolean
42, -1                              Integer
0.105, 1e-3                         Double
@Name                               Reference to a component by ComponentName
[v, v, ...]                         List

COMMENTS
--------
// line comment
/* block comment */"#
    );
}
