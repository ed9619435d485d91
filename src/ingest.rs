//! Document ingestion.
//!
//! Turns a CSV file, a plain-text file, or a directory of such files into
//! the ordered list of [`DocumentRecord`]s handed to
//! [`TaggingEngine::reset`](qualcode_core::TaggingEngine::reset).
//!
//! | Source | Documents |
//! |--------|-----------|
//! | CSV with header | one per row; every column is kept as a field (repeated header names become `name_2`, `name_3`, ...) |
//! | plain text | one per non-blank line, single field `text` |
//! | directory | files matching `include_globs`, sorted by path, plus a `source` field (renamed like a repeated header if the file already has one) |
//!
//! An ingestion that yields no documents is an error, so the caller's
//! previous document set stays in place.

use anyhow::{bail, Context, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};
use qualcode_core::DocumentRecord;
use std::path::Path;
use tracing::{debug, info};
use walkdir::WalkDir;

use crate::config::IngestConfig;

/// Header names tried, in order, when no text column is configured.
const TEXT_COLUMN_CANDIDATES: &[&str] = &["text", "comment", "response", "content", "body"];

/// Field added to every document ingested from a directory.
pub const SOURCE_FIELD: &str = "source";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Csv,
    Text,
}

impl Format {
    /// Pick a format from a file extension (`.csv` is CSV, anything else text).
    pub fn detect(path: &Path) -> Format {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("csv") => Format::Csv,
            _ => Format::Text,
        }
    }
}

impl std::str::FromStr for Format {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "csv" => Ok(Format::Csv),
            "text" | "txt" => Ok(Format::Text),
            other => bail!("Unknown input format: '{}'. Must be csv or text.", other),
        }
    }
}

/// Load documents from a file or a directory.
pub fn load_path(path: &Path, config: &IngestConfig) -> Result<Vec<DocumentRecord>> {
    if !path.exists() {
        bail!("Input does not exist: {}", path.display());
    }

    let docs = if path.is_dir() {
        scan_directory(path, config)?
    } else {
        load_file(path, config)?
    };

    if docs.is_empty() {
        bail!("No documents found in {}", path.display());
    }
    info!(path = %path.display(), documents = docs.len(), "ingested documents");
    Ok(docs)
}

/// Parse in-memory content (e.g. an upload) in the given format.
pub fn parse_content(
    content: &str,
    format: Format,
    config: &IngestConfig,
) -> Result<Vec<DocumentRecord>> {
    let docs = match format {
        Format::Csv => parse_csv(content, config)?,
        Format::Text => parse_text(content),
    };
    if docs.is_empty() {
        bail!("No documents found in uploaded content");
    }
    Ok(docs)
}

fn load_file(path: &Path, config: &IngestConfig) -> Result<Vec<DocumentRecord>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read input file: {}", path.display()))?;
    match Format::detect(path) {
        Format::Csv => parse_csv(&content, config)
            .with_context(|| format!("Failed to parse CSV: {}", path.display())),
        Format::Text => Ok(parse_text(&content)),
    }
}

fn parse_csv(content: &str, config: &IngestConfig) -> Result<Vec<DocumentRecord>> {
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(config.delimiter as u8)
        .flexible(true)
        .trim(csv::Trim::Headers)
        .from_reader(content.as_bytes());

    let raw: Vec<String> = reader.headers()?.iter().map(|h| h.to_string()).collect();
    if raw.is_empty() || raw.iter().all(|h| h.is_empty()) {
        bail!("CSV input has no header row");
    }
    let headers = unique_headers(&raw);
    let text_idx = text_column_index(&headers, config.text_column.as_deref())?;
    debug!(column = %headers[text_idx], "using text column");

    let mut docs = Vec::new();
    for record in reader.records() {
        let record = record?;
        if record.len() > headers.len() {
            let line = record.position().map(|p| p.line()).unwrap_or(0);
            bail!(
                "CSV line {} has {} fields but the header has {}",
                line,
                record.len(),
                headers.len()
            );
        }
        let text = record.get(text_idx).unwrap_or("").to_string();
        if config.skip_blank && text.trim().is_empty() {
            continue;
        }
        let fields = headers
            .iter()
            .enumerate()
            .map(|(i, h)| (h.clone(), record.get(i).unwrap_or("").to_string()))
            .collect();
        docs.push(DocumentRecord::with_fields(text, fields));
    }
    Ok(docs)
}

/// Rename repeated header names to `name_2`, `name_3`, ... so every column
/// keeps its own field. Generated names skip any name the header already has.
fn unique_headers(raw: &[String]) -> Vec<String> {
    let mut headers: Vec<String> = Vec::with_capacity(raw.len());
    for name in raw {
        let unique = if headers.contains(name) {
            unique_name(name, |c| headers.iter().chain(raw).any(|t| t == c))
        } else {
            name.clone()
        };
        headers.push(unique);
    }
    headers
}

/// `name` if free, else the first free `name_N` with N >= 2.
fn unique_name(name: &str, is_taken: impl Fn(&str) -> bool) -> String {
    if !is_taken(name) {
        return name.to_string();
    }
    let mut n = 2;
    loop {
        let candidate = format!("{}_{}", name, n);
        if !is_taken(&candidate) {
            return candidate;
        }
        n += 1;
    }
}

fn text_column_index(headers: &[String], configured: Option<&str>) -> Result<usize> {
    if let Some(name) = configured {
        return headers
            .iter()
            .position(|h| h == name)
            .or_else(|| headers.iter().position(|h| h.eq_ignore_ascii_case(name)))
            .ok_or_else(|| {
                anyhow::anyhow!(
                    "Text column '{}' not found in CSV header: {}",
                    name,
                    headers.join(", ")
                )
            });
    }

    for candidate in TEXT_COLUMN_CANDIDATES {
        if let Some(i) = headers.iter().position(|h| h.eq_ignore_ascii_case(candidate)) {
            return Ok(i);
        }
    }
    Ok(0)
}

fn parse_text(content: &str) -> Vec<DocumentRecord> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| {
            DocumentRecord::with_fields(line, vec![("text".to_string(), line.to_string())])
        })
        .collect()
}

fn scan_directory(root: &Path, config: &IngestConfig) -> Result<Vec<DocumentRecord>> {
    let include_set = build_globset(&config.include_globs)?;

    let mut default_excludes = vec!["**/.git/**".to_string(), "**/target/**".to_string()];
    default_excludes.extend(config.exclude_globs.clone());
    let exclude_set = build_globset(&default_excludes)?;

    let mut files = Vec::new();
    for entry in WalkDir::new(root).follow_links(config.follow_symlinks) {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        let relative = path.strip_prefix(root).unwrap_or(path);
        let rel_str = relative.to_string_lossy().replace('\\', "/");

        if exclude_set.is_match(&rel_str) || !include_set.is_match(&rel_str) {
            continue;
        }
        files.push((rel_str, path.to_path_buf()));
    }

    // Sort for deterministic document numbering
    files.sort_by(|a, b| a.0.cmp(&b.0));

    let mut docs = Vec::new();
    for (rel, path) in files {
        let mut file_docs = load_file(&path, config)?;
        debug!(file = %rel, documents = file_docs.len(), "scanned file");
        for doc in &mut file_docs {
            let name = unique_name(SOURCE_FIELD, |c| doc.fields.iter().any(|(f, _)| f == c));
            doc.fields.push((name, rel.clone()));
        }
        docs.extend(file_docs);
    }
    Ok(docs)
}

fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(Glob::new(pattern)?);
    }
    Ok(builder.build()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn cfg() -> IngestConfig {
        IngestConfig::default()
    }

    #[test]
    fn test_detect_format() {
        assert_eq!(Format::detect(Path::new("a/b.CSV")), Format::Csv);
        assert_eq!(Format::detect(Path::new("notes.txt")), Format::Text);
        assert_eq!(Format::detect(Path::new("README")), Format::Text);
        assert_eq!("csv".parse::<Format>().unwrap(), Format::Csv);
        assert!("xlsx".parse::<Format>().is_err());
    }

    #[test]
    fn test_text_one_document_per_line() {
        let docs = parse_content("first\n\n  second  \n\t\nthird", Format::Text, &cfg()).unwrap();
        let texts: Vec<&str> = docs.iter().map(|d| d.text.as_str()).collect();
        assert_eq!(texts, ["first", "second", "third"]);
        assert_eq!(docs[1].field("text"), Some("second"));
    }

    #[test]
    fn test_csv_guesses_text_column() {
        let content = "id,Comment,score\n1,too slow,2\n2,\"great, fast\",5\n";
        let docs = parse_content(content, Format::Csv, &cfg()).unwrap();
        assert_eq!(docs.len(), 2);
        assert_eq!(docs[1].text, "great, fast");
        assert_eq!(
            docs[1].fields,
            vec![
                ("id".to_string(), "2".to_string()),
                ("Comment".to_string(), "great, fast".to_string()),
                ("score".to_string(), "5".to_string()),
            ]
        );
    }

    #[test]
    fn test_csv_falls_back_to_first_column() {
        let docs = parse_content("feedback,when\nok then,monday\n", Format::Csv, &cfg()).unwrap();
        assert_eq!(docs[0].text, "ok then");
    }

    #[test]
    fn test_csv_configured_column() {
        let mut config = cfg();
        config.text_column = Some("answer".to_string());
        let docs = parse_content("text,answer\nignored,kept\n", Format::Csv, &config).unwrap();
        assert_eq!(docs[0].text, "kept");

        config.text_column = Some("missing".to_string());
        let err = parse_content("text,answer\na,b\n", Format::Csv, &config).unwrap_err();
        assert!(err.to_string().contains("not found"));
    }

    #[test]
    fn test_csv_skips_blank_text_and_handles_short_rows() {
        let content = "\u{feff}text,extra\nhello,x\n  ,y\nshort\n";
        let docs = parse_content(content, Format::Csv, &cfg()).unwrap();
        assert_eq!(docs.len(), 2);
        assert_eq!(docs[1].text, "short");
        assert_eq!(docs[1].field("extra"), Some(""));

        let mut keep = cfg();
        keep.skip_blank = false;
        let docs = parse_content(content, Format::Csv, &keep).unwrap();
        assert_eq!(docs.len(), 3);
    }

    #[test]
    fn test_csv_repeated_headers_keep_every_column() {
        let docs = parse_content("q,q,q_2\nfirst,second,third\n", Format::Csv, &cfg()).unwrap();
        assert_eq!(docs[0].text, "first");
        assert_eq!(
            docs[0].fields,
            vec![
                ("q".to_string(), "first".to_string()),
                ("q_3".to_string(), "second".to_string()),
                ("q_2".to_string(), "third".to_string()),
            ]
        );

        let engine = qualcode_core::TaggingEngine::with_documents(docs);
        let csv = engine.serialize_assignments().to_csv().unwrap();
        assert_eq!(csv, "q,q_3,q_2,labels\nfirst,second,third,\n");
    }

    #[test]
    fn test_csv_rejects_rows_longer_than_header() {
        let content = "text,n\nok,1\ntoo,many,cells\n";
        let err = parse_content(content, Format::Csv, &cfg()).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("line 3"), "{}", msg);
        assert!(msg.contains("3 fields but the header has 2"), "{}", msg);
    }

    #[test]
    fn test_csv_custom_delimiter() {
        let mut config = cfg();
        config.delimiter = ';';
        let docs = parse_content("text;n\na, b;1\n", Format::Csv, &config).unwrap();
        assert_eq!(docs[0].text, "a, b");
    }

    #[test]
    fn test_empty_content_is_error() {
        assert!(parse_content("\n\n", Format::Text, &cfg()).is_err());
        assert!(parse_content("text\n", Format::Csv, &cfg()).is_err());
    }

    #[test]
    fn test_load_missing_path() {
        let err = load_path(Path::new("/definitely/not/here.csv"), &cfg()).unwrap_err();
        assert!(err.to_string().contains("does not exist"));
    }

    #[test]
    fn test_scan_directory_sorted_with_source() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path();
        fs::create_dir_all(root.join("sub")).unwrap();
        fs::write(root.join("b.txt"), "beta one\nbeta two\n").unwrap();
        fs::write(root.join("sub/a.csv"), "text\nalpha\n").unwrap();
        fs::write(root.join("ignored.md"), "nope\n").unwrap();

        let docs = load_path(root, &cfg()).unwrap();
        let texts: Vec<&str> = docs.iter().map(|d| d.text.as_str()).collect();
        assert_eq!(texts, ["beta one", "beta two", "alpha"]);
        assert_eq!(docs[0].field(SOURCE_FIELD), Some("b.txt"));
        assert_eq!(docs[2].field(SOURCE_FIELD), Some("sub/a.csv"));
    }

    #[test]
    fn test_scan_directory_keeps_own_source_column() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(tmp.path().join("survey.csv"), "text,source\nhello,email\n").unwrap();

        let docs = load_path(tmp.path(), &cfg()).unwrap();
        assert_eq!(docs[0].field("source"), Some("email"));
        assert_eq!(docs[0].field("source_2"), Some("survey.csv"));
    }

    #[test]
    fn test_scan_directory_excludes() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path();
        fs::write(root.join("keep.txt"), "kept\n").unwrap();
        fs::write(root.join("drop.txt"), "dropped\n").unwrap();

        let mut config = cfg();
        config.exclude_globs = vec!["drop.txt".to_string()];
        let docs = load_path(root, &config).unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].text, "kept");
    }
}
