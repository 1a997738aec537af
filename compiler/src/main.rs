//! @ai:module:intent CLI for compiling stored C sources and annotating their sections
//! @ai:module:layer presentation

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use sectioner::{enrich, output, FileId, OutputFormat, SectionStatus, SectionStore, SourceLines};
use sectioner_compile::{
    config::{CompilerConfig, DEFAULT_CONFIG_FILE},
    options::{self, dependent_options},
    report, CompileRequest, CompileSession, SdccBackend, ToolchainValidator,
};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "sectioner-compile")]
#[command(about = "Compile C sources with SDCC and overlay the diagnostics onto their sections")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile a file and annotate its stored sections
    Run {
        /// Path to the source file
        path: PathBuf,

        /// Path to configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Identity of the file inside the section store
        #[arg(long, default_value = "1")]
        file_id: FileId,

        /// Override the configured processor
        #[arg(long)]
        processor: Option<String>,

        /// Override the configured language standard
        #[arg(long)]
        standard: Option<String>,

        /// Print the annotated source after the report
        #[arg(long)]
        render: bool,

        /// Also write the report as JSON to this path
        #[arg(long)]
        report: Option<PathBuf>,

        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: Format,
    },

    /// Check that the configured compiler is installed
    Check {
        /// Path to configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// List the accepted compiler options
    Options {
        /// Only list the options that depend on this processor
        #[arg(long)]
        processor: Option<String>,
    },

    /// Initialize default configuration
    Init {
        /// Output path for config file
        #[arg(short, long, default_value = DEFAULT_CONFIG_FILE)]
        output: PathBuf,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Text,
    Json,
    JsonPretty,
}

impl From<Format> for OutputFormat {
    fn from(f: Format) -> Self {
        match f {
            Format::Text => OutputFormat::Text,
            Format::Json => OutputFormat::Json,
            Format::JsonPretty => OutputFormat::JsonPretty,
        }
    }
}

struct RunArgs {
    path: PathBuf,
    config: Option<PathBuf>,
    file_id: FileId,
    processor: Option<String>,
    standard: Option<String>,
    render: bool,
    report: Option<PathBuf>,
    format: Format,
}

fn main() -> Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("sectioner_compile=info".parse()?),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            path,
            config,
            file_id,
            processor,
            standard,
            render,
            report,
            format,
        } => run_compile(RunArgs {
            path,
            config,
            file_id,
            processor,
            standard,
            render,
            report,
            format,
        }),
        Commands::Check { config } => check(config),
        Commands::Options { processor } => list_options(processor),
        Commands::Init { output } => init_config(output),
    }
}

/// @ai:intent Compile one file, annotate its sections and print the report
/// @ai:effects fs:read, fs:write, io
fn run_compile(args: RunArgs) -> Result<ExitCode> {
    let mut config = CompilerConfig::load_or_default(args.config.as_deref())?;
    if let Some(processor) = args.processor {
        config.options.processor = processor;
    }
    if let Some(standard) = args.standard {
        config.options.standard = standard;
    }

    let toolchain = ToolchainValidator::validate(&config.compiler.binary);
    ToolchainValidator::log_warnings(&toolchain);
    if !toolchain.available {
        anyhow::bail!("Compiler '{}' is not available", config.compiler.binary);
    }

    let lines = SourceLines::read(&args.path)?;
    let store = SectionStore::load(&config.store.path)
        .with_context(|| format!("Failed to load section store {}", config.store.path.display()))?;
    if store.get(args.file_id).is_empty() {
        tracing::info!("No sections stored for file {}, sectionizing first", args.file_id);
        store.reparse(args.file_id, &lines)?;
    }

    let request = CompileRequest::new(&config.compiler, config.options.clone());
    let session = CompileSession::new(SdccBackend::new(&config.compiler.binary), request, &store);
    let compile_report = session.run(args.file_id, &lines)?;
    store.save(&config.store.path)?;

    println!("{}", report::format_report(&compile_report, args.format.into()));
    if args.render {
        let decorations = enrich(lines.lines(), &store.get(args.file_id));
        println!("{}", output::format_decorations(&decorations, args.format.into()));
    }
    if let Some(path) = args.report {
        report::save_report(&compile_report, &path)?;
    }

    Ok(if compile_report.status == SectionStatus::DoesNotCompile {
        ExitCode::from(1)
    } else {
        ExitCode::SUCCESS
    })
}

/// @ai:intent Report whether the configured compiler can be run
/// @ai:effects fs:read, io
fn check(config_path: Option<PathBuf>) -> Result<ExitCode> {
    let config = CompilerConfig::load_or_default(config_path.as_deref())?;
    let status = ToolchainValidator::validate(&config.compiler.binary);

    if status.available {
        println!(
            "{} {} - {}",
            "OK".green().bold(),
            status.binary,
            status.version.as_deref().unwrap_or_default()
        );
        Ok(ExitCode::SUCCESS)
    } else {
        ToolchainValidator::log_warnings(&status);
        println!("{} {} not found", "MISSING".red().bold(), status.binary);
        Ok(ExitCode::from(1))
    }
}

/// @ai:intent Print the option tables, or the options of one processor
/// @ai:effects io
fn list_options(processor: Option<String>) -> Result<ExitCode> {
    if let Some(processor) = processor {
        if !options::PROCESSORS.contains(&processor.as_str()) {
            anyhow::bail!("Unknown processor: {}", processor);
        }
        for option in dependent_options(&processor) {
            println!("{}", option);
        }
        return Ok(ExitCode::SUCCESS);
    }

    println!("{}", "Standards:".bold());
    println!("  {}", options::STANDARDS.join(" "));
    println!("{}", "Optimizations:".bold());
    for option in options::OPTIMIZATIONS {
        println!("  --{}", option);
    }
    println!("{}", "Processors:".bold());
    for processor in options::PROCESSORS {
        let dependent = dependent_options(processor);
        println!("  -m{:<10} {}", processor, dependent.join(" ").dimmed());
    }
    Ok(ExitCode::SUCCESS)
}

/// @ai:intent Initialize default configuration file
/// @ai:effects fs:write
fn init_config(output: PathBuf) -> Result<ExitCode> {
    if output.exists() {
        anyhow::bail!("Config file already exists: {}", output.display());
    }

    CompilerConfig::default().save(&output)?;
    tracing::info!("Created default configuration at {}", output.display());
    Ok(ExitCode::SUCCESS)
}
