//! OpenAPI catalog CLI
//!
//! Command-line interface for compiling OpenAPI documents into reduced
//! endpoint catalogs and checking proposed calls against them.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use oas_catalog::{
    extract_call, is_valid_call, load_document_auto, reduce_document, EndpointCatalog,
    ReduceOptions, ReducedSpec,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "oas-catalog")]
#[command(about = "Compile OpenAPI documents into reduced endpoint catalogs")]
#[command(version)]
struct Cli {
    /// Log debug output to stderr (overrides RUST_LOG)
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Options shared by every command that compiles a document.
#[derive(Args)]
struct CompileArgs {
    /// Document source: file path or URL (http:// or https://)
    source: String,

    /// Keep optional parameters too (default: required parameters only)
    #[arg(long)]
    all_params: bool,

    /// Leave $ref pointers in place
    #[arg(long)]
    no_dereference: bool,

    /// Leave allOf compositions in place
    #[arg(long)]
    no_merge_all_of: bool,
}

impl CompileArgs {
    fn options(&self) -> ReduceOptions {
        ReduceOptions::new()
            .only_required(!self.all_params)
            .dereference(!self.no_dereference)
            .merge_all_of(!self.no_merge_all_of)
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Compile a document and print the reduced document as JSON
    Reduce {
        #[command(flatten)]
        compile: CompileArgs,

        /// Output file (stdout if not specified)
        #[arg(long)]
        output: Option<PathBuf>,

        /// Pretty-print JSON output
        #[arg(long)]
        pretty: bool,
    },

    /// List the endpoints of a document
    List {
        #[command(flatten)]
        compile: CompileArgs,

        /// Print each endpoint with its reduced docs
        #[arg(long)]
        docs: bool,
    },

    /// Check whether a proposed "API calling N: METHOD PATH" line is valid
    Check {
        #[command(flatten)]
        compile: CompileArgs,

        /// Proposal text to validate
        text: String,

        /// Output result as JSON (for automation)
        #[arg(long)]
        json: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Commands::Reduce {
            compile,
            output,
            pretty,
        } => run_reduce(&compile, output, pretty),
        Commands::List { compile, docs } => run_list(&compile, docs),
        Commands::Check {
            compile,
            text,
            json,
        } => run_check(&compile, &text, json),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(code) => ExitCode::from(code),
    }
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Load and compile the document named by `args`.
fn compile(args: &CompileArgs) -> Result<ReducedSpec, u8> {
    let document = load_document_auto(&args.source).map_err(|e| {
        eprintln!("Error: {}", e);
        e.exit_code() as u8
    })?;

    reduce_document(&document, &args.options()).map_err(|e| {
        eprintln!("Error: {}", e);
        e.exit_code() as u8
    })
}

fn run_reduce(args: &CompileArgs, output: Option<PathBuf>, pretty: bool) -> Result<(), u8> {
    let spec = compile(args)?;

    let json_output = if pretty {
        serde_json::to_string_pretty(&spec)
    } else {
        serde_json::to_string(&spec)
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

fn run_list(args: &CompileArgs, docs: bool) -> Result<(), u8> {
    let catalog = EndpointCatalog::from(compile(args)?);

    if docs {
        let rendered = catalog.render_docs();
        if !rendered.is_empty() {
            println!("{}", rendered);
        }
    } else {
        for name in catalog.list_endpoints() {
            println!("{}", name);
        }
    }
    Ok(())
}

fn run_check(args: &CompileArgs, text: &str, json_output: bool) -> Result<(), u8> {
    let catalog = EndpointCatalog::from(compile(args)?);
    let valid = is_valid_call(&catalog, text);

    if json_output {
        let output = serde_json::json!({
            "valid": valid,
            "call": extract_call(text),
        });
        println!("{}", output);
    } else if valid {
        println!("Valid");
    } else {
        eprintln!("Invalid API call: {:?}", extract_call(text));
    }

    if valid {
        Ok(())
    } else {
        Err(1)
    }
}
