//! @ai:module:intent CLI entry point for the sectioner
//! @ai:module:layer presentation
//! @ai:module:public_api main
//! @ai:module:depends_on sectionize, store, diagnostics, annotate, enrich, output, scan

use clap::{Parser, Subcommand, ValueEnum};
use sectioner::{
    apply_compile_result, compile_status, enrich, output, scan_directory, sectionize_nested,
    DiagnosticMapper, FileId, NewSection, OutputFormat, Result, SectionStore, SourceLines,
};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "sectioner")]
#[command(author, version, about = "Sectioner - classify C source into nested sections")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Args)]
struct StoreArgs {
    /// Path of the JSON section store
    #[arg(long, default_value = "sections.json")]
    store: PathBuf,

    /// Identity of the file inside the store
    #[arg(long, default_value = "1")]
    file_id: FileId,
}

#[derive(Subcommand)]
enum Commands {
    /// Sectionize a source file and print the sections found
    Sections {
        /// Path to the source file
        path: PathBuf,

        /// Levels of procedure bodies to re-scan for nested sections
        #[arg(long, default_value = "1")]
        depth: usize,

        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: Format,
    },

    /// Sectionize every .c/.h file under a directory
    Scan {
        /// Directory to scan
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: Format,
    },

    /// Replace the stored sections of a file with a fresh sectionizer pass
    Reparse {
        /// Path to the source file
        path: PathBuf,

        #[command(flatten)]
        store: StoreArgs,

        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: Format,
    },

    /// Print the source with section markers and statuses
    Render {
        /// Path to the source file
        path: PathBuf,

        #[command(flatten)]
        store: StoreArgs,

        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: Format,
    },

    /// Add a section by hand
    AddSection {
        /// Path to the source file
        path: PathBuf,
        start_line: usize,
        end_line: usize,
        kind: String,

        #[arg(long, default_value = "")]
        name: String,

        #[arg(long, default_value = "")]
        description: String,

        #[command(flatten)]
        store: StoreArgs,
    },

    /// Delete a section and the source lines it covers, then reparse
    DeleteSection {
        /// Path to the source file
        path: PathBuf,
        start_line: usize,
        end_line: usize,

        /// Delete the lines even when no stored section has exactly this range
        #[arg(long)]
        force: bool,

        #[command(flatten)]
        store: StoreArgs,
    },

    /// Map raw compiler output onto source lines
    Diagnostics {
        /// Name of the compiled source file as the compiler reports it
        #[arg(long, default_value = "source.c")]
        name: String,

        /// File holding the compiler's stderr
        #[arg(long)]
        stderr: Option<PathBuf>,

        /// Assembly listing produced by the compiler
        #[arg(long)]
        listing: Option<PathBuf>,

        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: Format,
    },

    /// Apply captured compiler output to the stored sections of a file
    Annotate {
        /// Name of the compiled source file as the compiler reports it
        #[arg(long, default_value = "source.c")]
        name: String,

        /// File holding the compiler's stderr
        #[arg(long)]
        stderr: PathBuf,

        /// Assembly listing; its absence means the file did not compile
        #[arg(long)]
        listing: Option<PathBuf>,

        #[command(flatten)]
        store: StoreArgs,

        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: Format,
    },

    /// List section kinds, optionally registering a new one
    Kinds {
        /// Kind name to register
        #[arg(long)]
        add: Option<String>,

        /// Path of the JSON section store
        #[arg(long, default_value = "sections.json")]
        store: PathBuf,
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

fn main() -> ExitCode {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("sectioner=info"));
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .init();

    let cli = Cli::parse();

    match run(cli.command) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::from(2)
        }
    }
}

fn run(command: Commands) -> Result<ExitCode> {
    match command {
        Commands::Sections {
            path,
            depth,
            format,
        } => {
            let source = SourceLines::read(&path)?;
            let spans = sectionize_nested(source.lines(), 0, depth)?;
            println!("{}", output::format_spans(&spans, format.into()));
            Ok(ExitCode::SUCCESS)
        }

        Commands::Scan { path, format } => {
            let report = scan_directory(&path);
            println!("{}", output::format_scan_report(&report, format.into()));
            Ok(if report.passed() {
                ExitCode::SUCCESS
            } else {
                ExitCode::from(1)
            })
        }

        Commands::Reparse {
            path,
            store,
            format,
        } => {
            let source = SourceLines::read(&path)?;
            let sections = SectionStore::load(&store.store)?;
            let result = sections.reparse(store.file_id, &source);
            // Keep whatever was inserted before a failure, as the store itself does.
            sections.save(&store.store)?;
            result?;
            println!(
                "{}",
                output::format_sections(&sections.get(store.file_id), format.into())
            );
            Ok(ExitCode::SUCCESS)
        }

        Commands::Render {
            path,
            store,
            format,
        } => {
            let source = SourceLines::read(&path)?;
            let sections = SectionStore::load(&store.store)?;
            let decorations = enrich(source.lines(), &sections.get(store.file_id));
            println!("{}", output::format_decorations(&decorations, format.into()));
            Ok(ExitCode::SUCCESS)
        }

        Commands::AddSection {
            path,
            start_line,
            end_line,
            kind,
            name,
            description,
            store,
        } => {
            let source = SourceLines::read(&path)?;
            let sections = SectionStore::load(&store.store)?;
            let section = sections.create(
                store.file_id,
                &source,
                NewSection {
                    kind,
                    start_line,
                    end_line,
                    name,
                    description,
                },
            )?;
            sections.save(&store.store)?;
            println!(
                "Added {} section {}-{}",
                section.kind, section.start_line, section.end_line
            );
            Ok(ExitCode::SUCCESS)
        }

        Commands::DeleteSection {
            path,
            start_line,
            end_line,
            force,
            store,
        } => delete_section(&path, start_line, end_line, force, &store),

        Commands::Diagnostics {
            name,
            stderr,
            listing,
            format,
        } => {
            let mapper = DiagnosticMapper::new(&name);
            if let Some(stderr) = stderr {
                let text = read_text(&stderr)?;
                if let Err(e) = mapper.check_delimiter(&text) {
                    tracing::warn!("{}", e);
                }
                let diagnostics = mapper.map_diagnostics(&text);
                println!("{}", output::format_diagnostics(&diagnostics, format.into()));
            }
            if let Some(listing) = listing {
                let text = read_text(&listing)?;
                let lines = mapper.map_listing(&text);
                println!("{}", output::format_listing(&lines, format.into()));
            }
            Ok(ExitCode::SUCCESS)
        }

        Commands::Annotate {
            name,
            stderr,
            listing,
            store,
            format,
        } => {
            let mapper = DiagnosticMapper::new(&name);
            let diagnostics = mapper.map_diagnostics(&read_text(&stderr)?);
            let listing_exists = listing.as_deref().is_some_and(Path::exists);
            let status = compile_status(listing_exists, &diagnostics);

            let sections = SectionStore::load(&store.store)?;
            let summary = apply_compile_result(&sections, store.file_id, status, &diagnostics);
            sections.save(&store.store)?;

            match OutputFormat::from(format) {
                OutputFormat::Text => println!(
                    "{}",
                    output::format_sections(&sections.get(store.file_id), OutputFormat::Text)
                ),
                other => println!(
                    "{}",
                    output::to_json(&summary, matches!(other, OutputFormat::JsonPretty))
                ),
            }
            Ok(ExitCode::SUCCESS)
        }

        Commands::Kinds { add, store } => {
            let mut sections = SectionStore::load(&store)?;
            if let Some(name) = add {
                sections.kinds_mut().register(name);
                sections.save(&store)?;
            }
            for kind in sections.kinds().names() {
                println!("{}", kind);
            }
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// @ai:intent Delete a stored section and its source lines, then resectionize the file
/// @ai:post without `force`, an unmatched range leaves the file and store untouched (exit 1)
/// @ai:effects fs:read, fs:write
fn delete_section(
    path: &Path,
    start_line: usize,
    end_line: usize,
    force: bool,
    store: &StoreArgs,
) -> Result<ExitCode> {
    let mut source = SourceLines::read(path)?;
    let sections = SectionStore::load(&store.store)?;

    if !sections.remove_section(store.file_id, &mut source, start_line, end_line)? {
        if !force {
            tracing::warn!(
                "No section {}-{} stored for file {}; nothing deleted (use --force to delete the lines anyway)",
                start_line,
                end_line,
                store.file_id
            );
            return Ok(ExitCode::from(1));
        }
        tracing::warn!(
            "No section {}-{} stored for file {}; deleting the lines anyway",
            start_line,
            end_line,
            store.file_id
        );
        source.delete_range(start_line, end_line)?;
    }
    source.write(path)?;

    // Surviving sections still carry the old line numbers until the file is reparsed.
    let result = sections.reparse(store.file_id, &source);
    sections.save(&store.store)?;
    let count = result?;
    println!(
        "Deleted lines {}-{}; {} sections after reparse",
        start_line, end_line, count
    );
    Ok(ExitCode::SUCCESS)
}

fn read_text(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|e| sectioner::Error::FileRead {
        path: path.to_path_buf(),
        source: e,
    })
}
