//! Main entry point for the runres CLI application.
//!
//! Opens a resource directory file (local path or HTTP URL), lists its
//! entries or extracts their payloads from the companion data blob, and
//! reports results on standard output. Exit status is non-zero on any
//! open or parse failure.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;

use runres::cli::is_http_url;
use runres::{
    ByteSource, Cli, DirEntry, FileSource, HttpRangeSource, IntegerPolicy, ResExtractor,
};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let (directory, dir_http) = open_source(&cli.file).await?;
    let mut extractor = ResExtractor::new(directory);
    if cli.strict {
        extractor = extractor.with_policy(IntegerPolicy::Strict);
    }

    let mut data_http = None;
    if let Some(target) = &cli.data {
        let (data, http) = open_source(target).await?;
        extractor = extractor.with_data(data);
        data_http = http;
    }

    process_res(&extractor, &cli).await?;

    // Network accounting only makes sense for remote sources.
    if !cli.is_quiet() {
        let fetched: u64 = dir_http
            .iter()
            .chain(data_http.iter())
            .map(|source| source.bytes_fetched())
            .sum();
        if fetched > 0 {
            eprintln!("\nTotal bytes transferred: {}", format_size(fetched));
        }
    }

    Ok(())
}

/// Open a FILE argument as a byte source.
///
/// Returns the source plus, for HTTP sources, a second handle kept around
/// for transfer accounting once the first has been erased to `dyn`.
async fn open_source(target: &str) -> Result<(Arc<dyn ByteSource>, Option<Arc<HttpRangeSource>>)> {
    if is_http_url(target) {
        let source = Arc::new(HttpRangeSource::connect(target.to_string()).await?);
        Ok((source.clone(), Some(source)))
    } else {
        Ok((Arc::new(FileSource::open(Path::new(target))?), None))
    }
}

/// Dispatch between listing and extraction based on CLI options.
async fn process_res(extractor: &ResExtractor, cli: &Cli) -> Result<()> {
    if cli.list || cli.verbose {
        return list_entries(extractor, cli.verbose).await;
    }

    // Extraction wants the complete entry set; a damaged directory aborts
    // here rather than silently unpacking a prefix.
    let entries = extractor.entries().await?;

    let selected: Vec<_> = entries
        .iter()
        .filter(|entry| entry_selected(entry, cli))
        .collect();

    let banner_between = cli.pipe && selected.len() > 1;
    for entry in selected {
        extract_entry(extractor, entry, cli, banner_between).await?;
    }

    Ok(())
}

/// Apply the positional selection and `-x` exclusion patterns to one entry.
fn entry_selected(entry: &DirEntry, cli: &Cli) -> bool {
    let name = entry.name();
    let normalized = entry.relative_path();
    let basename = basename_of(&normalized).to_string();

    if !cli.entries.is_empty() {
        let matches = cli.entries.iter().any(|wanted| {
            if has_glob_chars(wanted) {
                glob_match(wanted, &name) || glob_match(wanted, &normalized)
            } else {
                *wanted == name || *wanted == normalized || *wanted == basename
            }
        });
        if !matches {
            return false;
        }
    }

    !cli.exclude
        .iter()
        .any(|pattern| name.contains(pattern.as_str()) || glob_match(pattern, &name))
}

/// List directory entries.
///
/// A parse failure mid-directory still prints every entry decoded before
/// it, then surfaces the error (and a non-zero exit) to the caller.
async fn list_entries(extractor: &ResExtractor, verbose: bool) -> Result<()> {
    let (entries, error) = extractor.entries_partial().await?;

    if verbose {
        println!("{:>10}  {:>10}  Name", "Start", "Size");
        println!("{}", "-".repeat(50));
    }

    let mut total_size = 0u64;
    for entry in &entries {
        if verbose {
            println!("{:>10}  {:>10}  {}", entry.start, entry.size, entry.name());
            total_size += entry.size;
        } else {
            println!("{}", entry.name());
        }
    }

    if verbose {
        println!("{}", "-".repeat(50));
        println!("{:>10}  {:>10}  {} entries", "", total_size, entries.len());
    }

    match error {
        Some(err) => {
            eprintln!("error: {err}");
            Err(err.into())
        }
        None => Ok(()),
    }
}

/// Extract a single entry's payload.
async fn extract_entry(
    extractor: &ResExtractor,
    entry: &DirEntry,
    cli: &Cli,
    banner: bool,
) -> Result<()> {
    if cli.pipe {
        if banner {
            use tokio::io::AsyncWriteExt;
            let mut stdout = tokio::io::stdout();
            stdout
                .write_all(format!("--- {} ---\n", entry.name()).as_bytes())
                .await?;
        }
        return extractor.extract_to_stdout(entry).await;
    }

    let output_path = output_path_for(entry, cli);

    if output_path.exists() {
        if cli.never_overwrite {
            if !cli.is_quiet() {
                eprintln!("Skipping: {} (file exists)", entry.name());
            }
            return Ok(());
        }
        if !cli.overwrite {
            if !cli.is_quiet() {
                eprintln!("Skipping: {} (use -o to overwrite)", entry.name());
            }
            return Ok(());
        }
    }

    if !cli.is_quiet() {
        println!("   unpacking: {}", entry.name());
    }

    extractor.extract_to_file(entry, &output_path).await?;

    Ok(())
}

/// Where on disk an entry lands, honoring `-d` and `-j`.
fn output_path_for(entry: &DirEntry, cli: &Cli) -> PathBuf {
    let normalized = entry.relative_path();
    let relative = if cli.junk_paths {
        basename_of(&normalized).to_string()
    } else {
        normalized
    };

    match &cli.extract_dir {
        Some(dir) => PathBuf::from(dir).join(relative),
        None => PathBuf::from(relative),
    }
}

fn basename_of(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

fn has_glob_chars(pattern: &str) -> bool {
    pattern.contains('*') || pattern.contains('?')
}

/// Match `text` against a pattern with `*` and `?` wildcards.
///
/// Classic two-pointer scan: `?` consumes one character, `*` records a
/// backtrack point and retries from one character further each time the
/// tail fails to match.
fn glob_match(pattern: &str, text: &str) -> bool {
    let pattern: Vec<char> = pattern.chars().collect();
    let text: Vec<char> = text.chars().collect();

    let (mut p, mut t) = (0, 0);
    let mut backtrack: Option<(usize, usize)> = None;

    while t < text.len() {
        if p < pattern.len() && (pattern[p] == '?' || pattern[p] == text[t]) {
            p += 1;
            t += 1;
        } else if p < pattern.len() && pattern[p] == '*' {
            backtrack = Some((p, t));
            p += 1;
        } else if let Some((star_p, star_t)) = backtrack {
            p = star_p + 1;
            t = star_t + 1;
            backtrack = Some((star_p, star_t + 1));
        } else {
            return false;
        }
    }

    while p < pattern.len() && pattern[p] == '*' {
        p += 1;
    }
    p == pattern.len()
}

/// Render a byte count with a unit fitting its magnitude.
fn format_size(size: u64) -> String {
    const UNITS: [(u64, &str); 3] = [(1 << 30, "GB"), (1 << 20, "MB"), (1 << 10, "KB")];

    for (scale, unit) in UNITS {
        if size >= scale {
            return format!("{:.2} {}", size as f64 / scale as f64, unit);
        }
    }
    format!("{size} bytes")
}
