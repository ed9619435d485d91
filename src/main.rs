//! # qualcode CLI (`qcode`)
//!
//! The `qcode` binary loads a document collection and either prints an
//! analysis view, codes documents in batch, runs an interactive coding
//! session, or serves the HTTP API.
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `qcode stats <input>` | Corpus summary |
//! | `qcode freq <input>` | Most frequent terms |
//! | `qcode sentiment <input>` | Sentiment distribution |
//! | `qcode themes <input>` | Keyword groupings |
//! | `qcode code <input>` | Add and apply codes, then export |
//! | `qcode session` | Interactive coding session on stdin |
//! | `qcode serve` | HTTP JSON API |
//!
//! ## Examples
//!
//! ```bash
//! qcode freq ./survey.csv --top 10
//! qcode code ./survey.csv --label urgent --label billing --apply 2=urgent --apply 2=billing
//! qcode session --load ./interviews/
//! qcode --config ./config/qcode.toml serve --load ./survey.csv
//! ```

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::io::{IsTerminal, Write};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

use qualcode::analysis::{self, TokenOptions};
use qualcode::config::{self, Config};
use qualcode::session::Session;
use qualcode::{export, ingest, report, server, TaggingEngine};

const DEFAULT_CONFIG_PATH: &str = "./config/qcode.toml";

/// qualcode: exploratory qualitative text analysis.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. Without it, `./config/qcode.toml` is used when present and built-in
/// defaults otherwise.
#[derive(Parser)]
#[command(
    name = "qcode",
    about = "qualcode: load documents, code them with labels, and explore frequencies, themes and sentiment",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print document and word counts.
    Stats {
        /// CSV file, text file, or directory.
        input: PathBuf,
    },

    /// Print the most frequent terms after stop-word removal.
    Freq {
        input: PathBuf,

        /// Number of terms to show (defaults to `[analysis].top_n`).
        #[arg(long)]
        top: Option<usize>,
    },

    /// Print the positive / neutral / negative distribution.
    Sentiment { input: PathBuf },

    /// Print documents grouped under the most frequent keywords.
    Themes {
        input: PathBuf,

        /// Number of keywords (defaults to `[analysis].theme_count`).
        #[arg(long)]
        top: Option<usize>,
    },

    /// Add codes, apply them to documents, and export the coded table.
    ///
    /// Codes are added in the order given, then applications are made in
    /// the order given. Any rejected code or application aborts the command
    /// before anything is written.
    Code {
        input: PathBuf,

        /// Code to add to the vocabulary (repeatable).
        #[arg(long = "label")]
        labels: Vec<String>,

        /// Application as `<doc>=<code>` (repeatable).
        #[arg(long = "apply", value_parser = parse_application)]
        applications: Vec<(usize, String)>,

        /// Directory for `coded_data_<date>.csv` (defaults to `[export].dir`).
        #[arg(long)]
        out_dir: Option<PathBuf>,
    },

    /// Start an interactive coding session reading commands from stdin.
    Session {
        /// Load this input before reading commands.
        #[arg(long)]
        load: Option<PathBuf>,
    },

    /// Start the HTTP JSON API on `[server].bind`.
    Serve {
        /// Load this input before serving.
        #[arg(long)]
        load: Option<PathBuf>,
    },
}

/// Parse a `doc=code` pair for `--apply` arguments.
fn parse_application(s: &str) -> Result<(usize, String), String> {
    let (doc, code) = s
        .split_once('=')
        .ok_or_else(|| format!("invalid DOC=CODE: no '=' found in '{}'", s))?;
    let doc: usize = doc
        .trim()
        .parse()
        .map_err(|_| format!("invalid document id in '{}'", s))?;
    Ok((doc, code.trim().to_string()))
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_engine(input: &Path, cfg: &Config) -> anyhow::Result<TaggingEngine> {
    let docs = ingest::load_path(input, &cfg.ingest)?;
    Ok(TaggingEngine::with_documents(docs))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging();
    let cli = Cli::parse();
    let cfg = config::resolve_config(cli.config.as_deref(), Path::new(DEFAULT_CONFIG_PATH))?;
    let tokens = TokenOptions::from_config(&cfg.analysis);
    let mut stdout = std::io::stdout().lock();

    match cli.command {
        Commands::Stats { input } => {
            let engine = load_engine(&input, &cfg)?;
            let s = analysis::summary(engine.documents(), &tokens);
            report::print_summary(&mut stdout, &s)?;
        }
        Commands::Freq { input, top } => {
            let engine = load_engine(&input, &cfg)?;
            let n = top.unwrap_or(cfg.analysis.top_n).max(1);
            let terms = analysis::word_frequencies(engine.documents(), &tokens, n);
            report::print_frequencies(&mut stdout, &terms)?;
        }
        Commands::Sentiment { input } => {
            let engine = load_engine(&input, &cfg)?;
            let d = analysis::sentiment_distribution(engine.documents());
            report::print_sentiment(&mut stdout, &d)?;
        }
        Commands::Themes { input, top } => {
            let engine = load_engine(&input, &cfg)?;
            let n = top.unwrap_or(cfg.analysis.theme_count).max(1);
            let themes = analysis::themes(engine.documents(), &tokens, n);
            report::print_themes(&mut stdout, &themes)?;
        }
        Commands::Code {
            input,
            labels,
            applications,
            out_dir,
        } => {
            let mut engine = load_engine(&input, &cfg)?;
            for label in &labels {
                engine
                    .add_label(label.trim())
                    .with_context(|| format!("cannot add code '{}'", label))?;
            }
            for (doc, code) in &applications {
                engine
                    .apply_label(*doc, code)
                    .with_context(|| format!("cannot apply '{}' to document {}", code, doc))?;
            }
            report::print_documents(&mut stdout, &engine, None)?;

            let dir = out_dir.unwrap_or_else(|| cfg.export.dir.clone());
            let path = export::write_export(&engine, &dir, export::today())?;
            writeln!(stdout)?;
            writeln!(
                stdout,
                "Exported {} documents to {}",
                engine.document_count(),
                path.display()
            )?;
        }
        Commands::Session { load } => {
            let interactive = std::io::stdin().is_terminal();
            let mut session = Session::new(cfg).with_prompt(interactive);
            if let Some(path) = load {
                let n = session.load(&path)?;
                writeln!(stdout, "Loaded {} documents.", n)?;
            }
            let stdin = std::io::stdin().lock();
            session.run(stdin, &mut stdout)?;
        }
        Commands::Serve { load } => {
            let engine = match load {
                Some(path) => load_engine(&path, &cfg)?,
                None => TaggingEngine::new(),
            };
            drop(stdout);
            server::run_server(&cfg, engine).await?;
        }
    }

    Ok(())
}
