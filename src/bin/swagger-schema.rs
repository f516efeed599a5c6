//! Swagger Schema CLI
//!
//! Command-line interface for resolving and linting Swagger documents.

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use serde_json::Value;
use swagger_schema::{
    lint, load_document_auto, ref_locations, resolve, resolve_all_definitions, FileStatus,
    MissingDefinitions, ResolveError, ResolveOptions, RootDocument, Severity, DEFAULT_MAX_PASSES,
    DEFINITIONS_KEY,
};
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "swagger-schema")]
#[command(about = "Inline $ref and allOf in Swagger 2.0 schemas")]
#[command(version)]
struct Cli {
    /// Log resolution passes to stderr (overrides RUST_LOG)
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve a schema within a Swagger document
    Resolve {
        /// Document source: file path or URL (http:// or https://)
        document: String,

        /// Resolve the named entry of `definitions`
        #[arg(long, short, conflicts_with_all = ["pointer", "all"])]
        definition: Option<String>,

        /// Resolve the schema at a JSON Pointer (default: whole document)
        #[arg(long, short, conflicts_with = "all")]
        pointer: Option<String>,

        /// Resolve every definition and print them as one object
        #[arg(long)]
        all: bool,

        /// Maximum resolution passes before reporting a circular reference
        #[arg(long, default_value_t = DEFAULT_MAX_PASSES)]
        max_passes: usize,

        /// Drop $refs to missing definitions instead of failing
        #[arg(long)]
        allow_missing: bool,

        /// Output file (stdout if not specified)
        #[arg(long, short)]
        output: Option<PathBuf>,

        /// Pretty-print JSON output
        #[arg(long)]
        pretty: bool,
    },

    /// List every $ref in a document
    Refs {
        /// Document source: file path or URL
        document: String,

        /// Output as JSON (for automation)
        #[arg(long)]
        json: bool,
    },

    /// Lint Swagger documents (syntax, missing definitions, cycles)
    Lint {
        /// File or directory to lint
        path: PathBuf,

        /// Output format: text (default) or json
        #[arg(long, default_value = "text")]
        format: String,

        /// Treat warnings as errors
        #[arg(long)]
        strict: bool,

        /// Suppress progress output, only show errors
        #[arg(long, short)]
        quiet: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Resolve {
            document,
            definition,
            pointer,
            all,
            max_passes,
            allow_missing,
            output,
            pretty,
        } => run_resolve(ResolveArgs {
            document,
            target: Target::from_args(definition, pointer, all),
            max_passes,
            allow_missing,
            output,
            pretty,
        }),

        Commands::Refs { document, json } => run_refs(&document, json),

        Commands::Lint {
            path,
            format,
            strict,
            quiet,
        } => run_lint(&path, &format, strict, quiet),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(code) => ExitCode::from(code),
    }
}

/// Filter used by `--verbose`: crate debug output on top of the default `warn`.
const VERBOSE_FILTER: &str = "warn,swagger_schema=debug";

/// Logs go to stderr so stdout stays clean JSON.
fn init_logging(verbose: bool) {
    let filter = log_filter(verbose);

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn log_filter(verbose: bool) -> EnvFilter {
    if verbose {
        EnvFilter::new(VERBOSE_FILTER)
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    }
}

/// What part of the document to resolve.
enum Target {
    Definition(String),
    Pointer(String),
    AllDefinitions,
}

impl Target {
    fn from_args(definition: Option<String>, pointer: Option<String>, all: bool) -> Self {
        match (definition, pointer) {
            _ if all => Target::AllDefinitions,
            (Some(name), _) => Target::Definition(name),
            (None, Some(pointer)) => Target::Pointer(pointer),
            (None, None) => Target::Pointer(String::new()),
        }
    }
}

struct ResolveArgs {
    document: String,
    target: Target,
    max_passes: usize,
    allow_missing: bool,
    output: Option<PathBuf>,
    pretty: bool,
}

fn run_resolve(args: ResolveArgs) -> Result<(), u8> {
    let ResolveArgs {
        document: source,
        target,
        max_passes,
        allow_missing,
        output,
        pretty,
    } = args;

    let document = load_document_auto(&source).map_err(report)?;
    let root = RootDocument::new(document).map(Arc::new).map_err(report)?;
    debug!(
        source = source.as_str(),
        definitions = root.definitions().len(),
        "document loaded"
    );

    let policy = if allow_missing {
        MissingDefinitions::Drop
    } else {
        MissingDefinitions::Error
    };
    let options = ResolveOptions::new()
        .max_passes(max_passes)
        .missing_definitions(policy);

    let resolved = match target {
        Target::AllDefinitions => resolve_all_definitions(&root, &options).map(Value::Object),
        Target::Definition(name) => root
            .definition_node(&name)
            .and_then(|node| resolve(&node, &options)),
        Target::Pointer(pointer) => root
            .node_at(&pointer)
            .and_then(|node| resolve(&node, &options)),
    }
    .map_err(report)?;

    let json_output = if pretty {
        serde_json::to_string_pretty(&resolved)
    } else {
        serde_json::to_string(&resolved)
    }
    .map_err(|e| {
        eprintln!("Error serializing output: {}", e);
        2u8
    })?;

    match output {
        Some(path) => {
            std::fs::write(&path, &json_output).map_err(|e| {
                eprintln!("Error writing to {}: {}", path.display(), e);
                3u8
            })?;
        }
        None => {
            println!("{}", json_output);
        }
    }

    Ok(())
}

fn run_refs(source: &str, json_output: bool) -> Result<(), u8> {
    let document = load_document_auto(source).map_err(report)?;
    let found = ref_locations(&document);

    if json_output {
        let output = serde_json::to_string(&found).map_err(|e| {
            eprintln!("Error serializing output: {}", e);
            2u8
        })?;
        println!("{}", output);
        return Ok(());
    }

    let definitions = document.get(DEFINITIONS_KEY).and_then(Value::as_object);
    for location in &found {
        println!(
            "{}\t{}\t{}",
            location.kind.as_str(),
            location.path,
            location.reference
        );
    }
    println!(
        "\n{} refs, {} definitions",
        found.len(),
        definitions.map(|d| d.len()).unwrap_or(0)
    );
    Ok(())
}

/// Print an error and map it to its exit code.
fn report(e: ResolveError) -> u8 {
    eprintln!("Error: {}", e);
    e.exit_code() as u8
}

fn run_lint(path: &Path, format: &str, strict: bool, quiet: bool) -> Result<(), u8> {
    if !path.exists() {
        eprintln!("Error: path not found: {}", path.display());
        return Err(2);
    }

    let result = lint(path, strict);

    if format == "json" {
        let output = serde_json::to_string_pretty(&result).map_err(|e| {
            eprintln!("Error serializing output: {}", e);
            2u8
        })?;
        println!("{}", output);
    } else {
        if !quiet {
            println!("Linting {} ...\n", path.display());
        }

        for file_result in &result.results {
            let status_icon = match file_result.status {
                FileStatus::Ok => "\x1b[32m✓\x1b[0m",
                FileStatus::Warning => "\x1b[33m⚠\x1b[0m",
                FileStatus::Error => "\x1b[31m✗\x1b[0m",
            };

            if !quiet || file_result.status != FileStatus::Ok {
                println!("  {} {}", status_icon, file_result.file.display());
            }

            for diag in &file_result.diagnostics {
                let (color, label) = match diag.severity {
                    Severity::Error => ("\x1b[31m", "error"),
                    Severity::Warning => ("\x1b[33m", "warning"),
                };
                if !quiet || diag.severity == Severity::Error {
                    println!(
                        "    {}{}[{}]\x1b[0m: {} - {}",
                        color, label, diag.code, diag.path, diag.message
                    );
                }
            }
        }

        println!();
        if result.is_ok() && (!strict || result.warnings == 0) {
            println!(
                "\x1b[32m✓ {} files checked, all passed\x1b[0m",
                result.files_checked
            );
        } else {
            println!(
                "\x1b[31m✗ {} files checked: {} passed, {} failed ({} errors, {} warnings)\x1b[0m",
                result.files_checked, result.passed, result.failed, result.errors, result.warnings
            );
        }
    }

    if result.is_ok() && (!strict || result.warnings == 0) {
        Ok(())
    } else {
        Err(1)
    }
}
