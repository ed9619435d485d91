//! Line-oriented interactive coding session.
//!
//! A [`Session`] owns one [`TaggingEngine`] and translates text commands
//! into engine calls. It is the only place the CLI mutates an engine, and it
//! only uses the engine's public operations. A rejected command prints
//! `error: <message>` and leaves the engine unchanged; the session keeps
//! reading.
//!
//! # Commands
//!
//! | Command | Effect |
//! |---------|--------|
//! | `load <path>` | Ingest a file or directory, replacing the documents |
//! | `code <name>` | Add a code to the vocabulary |
//! | `apply <doc> <name>` | Apply a code to a document |
//! | `codes` | List codes with document counts |
//! | `show [n]` | Show the first `n` documents (all by default) |
//! | `stats` | Corpus summary |
//! | `freq [n]` | Top `n` terms |
//! | `sentiment` | Sentiment distribution |
//! | `themes [n]` | Top `n` keyword groupings |
//! | `export [dir]` | Write `coded_data_<date>.csv` |
//! | `help` | List commands |
//! | `quit` / `exit` | Leave the session |

use anyhow::{anyhow, bail, Result};
use qualcode_core::TaggingEngine;
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::analysis::{self, TokenOptions};
use crate::config::Config;
use crate::export;
use crate::ingest;
use crate::report;

const HELP: &str = "\
Commands:
  load <path>          load a CSV/text file or directory (replaces documents)
  code <name>          add a code
  apply <doc> <name>   apply a code to a document
  codes                list codes
  show [n]             show documents with their codes
  stats                corpus summary
  freq [n]             most frequent terms
  sentiment            sentiment distribution
  themes [n]           keyword groupings
  export [dir]         write coded_data_<date>.csv
  help                 this message
  quit                 leave the session";

/// Whether the session should keep reading after a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

pub struct Session {
    engine: TaggingEngine,
    config: Config,
    tokens: TokenOptions,
    prompt: bool,
}

impl Session {
    pub fn new(config: Config) -> Self {
        let tokens = TokenOptions::from_config(&config.analysis);
        Self {
            engine: TaggingEngine::new(),
            config,
            tokens,
            prompt: false,
        }
    }

    /// Print a `> ` prompt before each command (for terminals).
    pub fn with_prompt(mut self, prompt: bool) -> Self {
        self.prompt = prompt;
        self
    }

    pub fn engine(&self) -> &TaggingEngine {
        &self.engine
    }

    /// Load documents from `path`, replacing the current set.
    pub fn load(&mut self, path: &Path) -> Result<usize> {
        let docs = ingest::load_path(path, &self.config.ingest)?;
        let n = docs.len();
        self.engine.reset(docs);
        Ok(n)
    }

    /// Read commands until end of input or `quit`.
    pub fn run<R: BufRead, W: Write>(&mut self, input: R, out: &mut W) -> Result<()> {
        if self.prompt {
            write!(out, "> ")?;
            out.flush()?;
        }
        for line in input.lines() {
            let line = line?;
            if self.execute(&line, out)? == Flow::Quit {
                break;
            }
            if self.prompt {
                write!(out, "> ")?;
                out.flush()?;
            }
        }
        Ok(())
    }

    /// Execute one command line. Command failures are reported on `out`;
    /// only write failures on `out` itself are returned as errors.
    pub fn execute<W: Write>(&mut self, line: &str, out: &mut W) -> Result<Flow> {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            return Ok(Flow::Continue);
        }
        let (cmd, rest) = match line.split_once(char::is_whitespace) {
            Some((c, r)) => (c, r.trim()),
            None => (line, ""),
        };
        debug!(command = cmd, "session command");

        match self.dispatch(cmd, rest, out) {
            Ok(flow) => Ok(flow),
            Err(e) => {
                if let Some(io_err) = e.downcast_ref::<std::io::Error>() {
                    if io_err.kind() == std::io::ErrorKind::BrokenPipe {
                        return Err(e);
                    }
                }
                warn!(command = cmd, error = %e, "command rejected");
                writeln!(out, "error: {:#}", e)?;
                Ok(Flow::Continue)
            }
        }
    }

    fn dispatch<W: Write>(&mut self, cmd: &str, rest: &str, out: &mut W) -> Result<Flow> {
        match cmd {
            "load" => {
                if rest.is_empty() {
                    bail!("usage: load <path>");
                }
                let n = self.load(Path::new(rest))?;
                writeln!(out, "Loaded {} documents.", n)?;
            }
            "code" => {
                let labels = self.engine.add_label(rest)?;
                writeln!(out, "Codes: {}", labels.join(", "))?;
            }
            "apply" => {
                let (id, label) = rest
                    .split_once(char::is_whitespace)
                    .ok_or_else(|| anyhow!("usage: apply <doc> <code>"))?;
                let id: usize = id
                    .parse()
                    .map_err(|_| anyhow!("invalid document id: {}", id))?;
                let labels = self.engine.apply_label(id, label.trim())?;
                writeln!(out, "Document {}: {}", id, labels.join(", "))?;
            }
            "codes" => report::print_codes(out, &self.engine)?,
            "show" => {
                let limit = parse_count(rest)?;
                report::print_documents(out, &self.engine, limit)?;
            }
            "stats" => {
                let s = analysis::summary(self.engine.documents(), &self.tokens);
                report::print_summary(out, &s)?;
            }
            "freq" => {
                let n = parse_count(rest)?.unwrap_or(self.config.analysis.top_n);
                let terms = analysis::word_frequencies(self.engine.documents(), &self.tokens, n);
                report::print_frequencies(out, &terms)?;
            }
            "sentiment" => {
                let d = analysis::sentiment_distribution(self.engine.documents());
                report::print_sentiment(out, &d)?;
            }
            "themes" => {
                let n = parse_count(rest)?.unwrap_or(self.config.analysis.theme_count);
                let themes = analysis::themes(self.engine.documents(), &self.tokens, n);
                report::print_themes(out, &themes)?;
            }
            "export" => {
                let dir = if rest.is_empty() {
                    self.config.export.dir.clone()
                } else {
                    PathBuf::from(rest)
                };
                let path = export::write_export(&self.engine, &dir, export::today())?;
                writeln!(
                    out,
                    "Exported {} documents to {}",
                    self.engine.document_count(),
                    path.display()
                )?;
            }
            "help" => writeln!(out, "{}", HELP)?,
            "quit" | "exit" => return Ok(Flow::Quit),
            other => bail!("unknown command: {} (try `help`)", other),
        }
        Ok(Flow::Continue)
    }
}

fn parse_count(arg: &str) -> Result<Option<usize>> {
    if arg.is_empty() {
        return Ok(None);
    }
    let n: usize = arg
        .parse()
        .map_err(|_| anyhow!("expected a positive number, got: {}", arg))?;
    if n == 0 {
        bail!("expected a positive number, got: 0");
    }
    Ok(Some(n))
}
