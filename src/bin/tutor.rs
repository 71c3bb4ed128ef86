//! CLI binary for tutor-reader.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `ParserConfig` / `ModernizeConfig` and prints results.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::AsyncReadExt;
use tracing_subscriber::EnvFilter;
use tutor_reader::{
    modernize, modernize_document, modernize_section, parse_with, ChapterLibrary,
    ModernizeConfig, ModernizeProgressCallback, ParsedDocument, ParserConfig, ProgressCallback,
    ReaderError,
};

/// Exit code for a chapter that does not exist in the library.
const EXIT_NOT_FOUND: i32 = 2;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress bar for batch modernization. Blocks complete out of
/// order, so the bar only counts.
struct CliProgressCallback {
    bar: ProgressBar,
    errors: AtomicUsize,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        bar.set_style(
            ProgressStyle::with_template(
                "{spinner:.cyan} {prefix:.bold}  [{bar:42.green/238}] {pos:>3}/{len} blocks  ⏱ {elapsed_precise}",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▉▊▋▌▍▎▏  "),
        );
        bar.set_prefix("Modernizing");
        bar.enable_steady_tick(Duration::from_millis(80));
        Arc::new(Self {
            bar,
            errors: AtomicUsize::new(0),
        })
    }
}

impl ModernizeProgressCallback for CliProgressCallback {
    fn on_batch_start(&self, total_blocks: usize) {
        self.bar.set_length(total_blocks as u64);
    }

    fn on_block_complete(&self, _index: usize, _total: usize, _modern_len: usize) {
        self.bar.inc(1);
    }

    fn on_block_error(&self, index: usize, _total: usize, error: &str) {
        self.errors.fetch_add(1, Ordering::SeqCst);
        self.bar
            .println(format!("  {} block {}  {}", red("✗"), index + 1, red(error)));
        self.bar.inc(1);
    }

    fn on_batch_complete(&self, total_blocks: usize, success_count: usize) {
        self.bar.finish_and_clear();
        let failed = self.errors.load(Ordering::SeqCst);
        if failed == 0 {
            eprintln!("{} {} blocks modernized", green("✔"), bold(&success_count.to_string()));
        } else {
            eprintln!(
                "{} {}/{} blocks modernized  ({} failed)",
                red("✘"),
                bold(&success_count.to_string()),
                total_blocks,
                red(&failed.to_string())
            );
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Parse a chapter and print its outline
  tutor parse tutor1.txt --format outline

  # JSON for a front end
  tutor parse tutor1.txt --format json > tutor1.json

  # Load by name from a chapter directory
  tutor show tutor3 --library public/texts

  # Regenerate manifest.json
  tutor manifest --library public/texts

  # Modernize the prose of one section
  tutor modernize tutor2.txt --section the-cradle-1 --json

ENVIRONMENT VARIABLES:
  TUTOR_LIBRARY           Chapter directory for show/list/manifest
  OPENAI_API_KEY          OpenAI API key
  ANTHROPIC_API_KEY       Anthropic API key
  EDGEQUAKE_LLM_PROVIDER  Override provider (openai, anthropic, gemini, ollama)
  EDGEQUAKE_MODEL         Override model ID
  RUST_LOG                Log filter (overrides --verbose/--quiet)
"#;

/// Structure plain-text compiler tutorials into sections of prose and code.
#[derive(Parser, Debug)]
#[command(
    name = "tutor",
    version,
    about = "Structure plain-text compiler tutorials into sections of prose and code",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, global = true, env = "TUTOR_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, global = true, env = "TUTOR_QUIET")]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Parse a chapter file (or `-` for stdin) and print it.
    Parse {
        /// Chapter file path, or `-` for stdin.
        input: String,

        #[arg(long, value_enum, default_value = "outline")]
        format: OutputFormat,

        #[command(flatten)]
        heuristics: HeuristicArgs,
    },

    /// Load a chapter by name from the library and print it.
    Show {
        /// Chapter name, e.g. `tutor1` or `tutor1.txt`.
        name: String,

        #[command(flatten)]
        library: LibraryArgs,

        #[arg(long, value_enum, default_value = "outline")]
        format: OutputFormat,

        #[command(flatten)]
        heuristics: HeuristicArgs,
    },

    /// List chapters in reading order.
    List {
        #[command(flatten)]
        library: LibraryArgs,
    },

    /// Write manifest.json listing every chapter.
    Manifest {
        #[command(flatten)]
        library: LibraryArgs,
    },

    /// Rewrite old compiler-writing prose in current terminology.
    Modernize {
        /// Text file path, or `-` for stdin.
        input: String,

        /// Parse the input and modernize every prose block of this section
        /// instead of the raw text.
        #[arg(long)]
        section: Option<String>,

        /// Parse the input and modernize every prose block of every section.
        #[arg(long, conflicts_with = "section")]
        all_sections: bool,

        /// LLM model ID.
        #[arg(long, env = "EDGEQUAKE_MODEL")]
        model: Option<String>,

        /// LLM provider: openai, anthropic, gemini, ollama, azure.
        #[arg(long, env = "EDGEQUAKE_PROVIDER")]
        provider: Option<String>,

        /// Max LLM output tokens per request.
        #[arg(long, env = "TUTOR_MAX_TOKENS", default_value_t = 1000)]
        max_tokens: usize,

        /// Retries per request on LLM failure.
        #[arg(long, env = "TUTOR_MAX_RETRIES", default_value_t = 0)]
        max_retries: u32,

        /// Concurrent LLM calls for section batches.
        #[arg(short, long, env = "TUTOR_CONCURRENCY", default_value_t = 4)]
        concurrency: usize,

        /// Output JSON instead of text.
        #[arg(long)]
        json: bool,
    },
}

#[derive(Args, Debug)]
struct LibraryArgs {
    /// Directory holding the chapter files.
    #[arg(long, env = "TUTOR_LIBRARY", default_value = "public/texts")]
    library: PathBuf,

    /// Chapter file extension.
    #[arg(long, default_value = "txt")]
    extension: String,
}

impl LibraryArgs {
    fn open(&self) -> ChapterLibrary {
        ChapterLibrary::new(&self.library).with_extension(&self.extension)
    }
}

#[derive(Args, Debug)]
struct HeuristicArgs {
    /// Regex a trimmed heading must fully match (replaces the A-Z allow-list).
    #[arg(long)]
    heading_pattern: Option<String>,

    /// Comma-separated keywords that mark a line as code.
    #[arg(long, value_delimiter = ',')]
    code_keywords: Option<Vec<String>>,
}

impl HeuristicArgs {
    fn to_config(&self) -> Result<ParserConfig> {
        let mut builder = ParserConfig::builder();
        if let Some(ref pattern) = self.heading_pattern {
            builder = builder.heading_pattern(pattern);
        }
        if let Some(ref keywords) = self.code_keywords {
            builder = builder.code_keywords(keywords.iter().cloned());
        }
        builder.build().context("Invalid parser configuration")
    }
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum OutputFormat {
    /// Section ids, titles and block kinds.
    Outline,
    /// Pretty JSON of the parsed document.
    Json,
    /// Markdown with fenced code blocks.
    Markdown,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        "info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    match &cli.command {
        Command::Parse {
            input,
            format,
            heuristics,
        } => {
            let text = read_input(input).await?;
            let doc = parse_with(&text, &heuristics.to_config()?);
            print_document(&doc, *format)?;
        }

        Command::Show {
            name,
            library,
            format,
            heuristics,
        } => {
            let config = heuristics.to_config()?;
            match library.open().load_chapter(name, &config).await {
                Ok(doc) => print_document(&doc, *format)?,
                Err(e) if e.is_not_found() => {
                    eprintln!("{} {}", red("✗"), e);
                    std::process::exit(EXIT_NOT_FOUND);
                }
                Err(e) => return Err(e).context("Failed to load chapter"),
            }
        }

        Command::List { library } => {
            let names = library
                .open()
                .list_chapters()
                .await
                .context("Failed to list chapters")?;
            for name in names {
                println!("{name}");
            }
        }

        Command::Manifest { library } => {
            let summary = library
                .open()
                .write_manifest()
                .await
                .context("Failed to write manifest")?;
            if !cli.quiet {
                eprintln!(
                    "{} Wrote {} entries to {}",
                    green("✔"),
                    summary.entries,
                    bold(&summary.path.display().to_string())
                );
            }
        }

        Command::Modernize {
            input,
            section,
            all_sections,
            model,
            provider,
            max_tokens,
            max_retries,
            concurrency,
            json,
        } => {
            let text = read_input(input).await?;

            let mut builder = ModernizeConfig::builder()
                .max_tokens(*max_tokens)
                .max_retries(*max_retries)
                .concurrency(*concurrency);
            if let Some(m) = model {
                builder = builder.model(m);
            }
            if let Some(p) = provider {
                builder = builder.provider_name(p);
            }
            let batch = section.is_some() || *all_sections;
            if batch && !cli.quiet && !*json {
                let cb: ProgressCallback = CliProgressCallback::new();
                builder = builder.progress_callback(cb);
            }
            let config = builder.build().context("Invalid configuration")?;

            if batch {
                let doc = parse_with(&text, &ParserConfig::default());
                let results = match section {
                    Some(id) => {
                        let section = doc.section(id).ok_or_else(|| {
                            anyhow::anyhow!(
                                "No section '{id}'. Available: {}",
                                doc.sections
                                    .iter()
                                    .map(|s| s.id.as_str())
                                    .collect::<Vec<_>>()
                                    .join(", ")
                            )
                        })?;
                        modernize_section(section, &config).await
                    }
                    None => modernize_document(&doc, &config).await,
                }
                .context("Modernization failed")?;

                if *json {
                    println!(
                        "{}",
                        serde_json::to_string_pretty(&results)
                            .context("Failed to serialise output")?
                    );
                } else {
                    for r in &results {
                        println!("{}", bold(&format!("[{} #{}]", r.section_id, r.block_index)));
                        match (&r.result, &r.error) {
                            (Some(m), _) => println!("{}\n", m.modern),
                            (None, Some(e)) => println!("{}\n", red(&e.to_string())),
                            (None, None) => println!(),
                        }
                    }
                }
            } else {
                let output = modernize(&text, &config)
                    .await
                    .context("Modernization failed")?;
                if *json {
                    println!(
                        "{}",
                        serde_json::to_string_pretty(&output)
                            .context("Failed to serialise output")?
                    );
                } else {
                    println!("{}", output.result.modern);
                    for m in &output.result.mappings {
                        println!("  {} → {}  {}", m.old, m.modern, dim(&m.explanation));
                    }
                    if !cli.quiet {
                        eprintln!(
                            "   {} tokens in  /  {} tokens out  —  {}ms",
                            dim(&output.input_tokens.to_string()),
                            dim(&output.output_tokens.to_string()),
                            output.duration_ms
                        );
                    }
                }
            }
        }
    }

    Ok(())
}

/// Read a file path, or stdin for `-`.
async fn read_input(input: &str) -> Result<String> {
    if input == "-" {
        let mut text = String::new();
        tokio::io::stdin()
            .read_to_string(&mut text)
            .await
            .context("Failed to read stdin")?;
        return Ok(text);
    }
    let path = Path::new(input);
    tokio::fs::read_to_string(path)
        .await
        .map_err(|source| ReaderError::ReadFailed {
            path: path.to_path_buf(),
            source,
        })
        .with_context(|| format!("Failed to read {input}"))
}

fn print_document(doc: &ParsedDocument, format: OutputFormat) -> Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    match format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(doc).context("Failed to serialise document")?;
            writeln!(out, "{json}")?;
        }
        OutputFormat::Markdown => {
            write!(out, "{}", doc.to_markdown())?;
        }
        OutputFormat::Outline => {
            writeln!(out, "{}", bold(&doc.header))?;
            for section in &doc.sections {
                let kinds: Vec<String> =
                    section.blocks.iter().map(|b| b.kind.to_string()).collect();
                writeln!(
                    out,
                    "  {:<32} {}  {}",
                    section.id,
                    section.title,
                    dim(&kinds.join(" "))
                )?;
            }
            let stats = doc.stats();
            writeln!(
                out,
                "{}",
                dim(&format!(
                    "{} sections, {} prose blocks, {} code blocks",
                    stats.sections, stats.prose_blocks, stats.code_blocks
                ))
            )?;
        }
    }
    Ok(())
}
