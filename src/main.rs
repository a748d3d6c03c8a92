//! Main entry point for the lazyzip CLI.
//!
//! Lists and extracts ZIP archives from the local filesystem or from remote
//! HTTP URLs, never reading more of the archive than the requested entries.

use anyhow::Result;
use clap::Parser;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use lazyzip::{Cli, HttpRangeReader, LocalFileReader, ReadAt, ZipArchive, ZipEntry};

/// Application entry point.
///
/// Parses command-line arguments and dispatches to the appropriate handler
/// based on whether the input is a local file or HTTP URL.
#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    if cli.is_http_url() {
        // Remote ZIP via HTTP Range requests
        let reader = HttpRangeReader::new(cli.file.clone()).await?;
        let transferred_before = reader.transferred_bytes();
        let reader = Arc::new(reader);

        process_archive(reader.clone(), &cli).await?;

        // Show how little of the remote file was actually fetched
        if !cli.is_quiet() {
            let transferred = reader.transferred_bytes() - transferred_before;
            eprintln!("\nTotal bytes transferred: {}", format_size(transferred));
        }
    } else {
        let reader = Arc::new(LocalFileReader::new(Path::new(&cli.file))?);
        process_archive(reader, &cli).await?;
    }

    Ok(())
}

/// Process an archive based on CLI options.
///
/// - List mode (`-l` or `-v`): display the index, no payload reads
/// - Extract mode: extract the entries matching the filters
async fn process_archive<R: ReadAt + 'static>(reader: Arc<R>, cli: &Cli) -> Result<()> {
    let archive = ZipArchive::open(reader).await?;

    if cli.list || cli.verbose {
        return list_entries(&archive, cli.verbose);
    }

    // Filters:
    // 1. Skip directories (created automatically during extraction)
    // 2. If specific files are requested, only include matching entries
    // 3. Exclude files matching the -x patterns
    let to_extract: Vec<_> = archive
        .entries()
        .iter()
        .filter(|e| {
            if e.is_directory {
                return false;
            }

            if !cli.files.is_empty() {
                let matches = cli.files.iter().any(|f| {
                    if has_glob_chars(f) {
                        glob_match(f, &e.name)
                    } else {
                        // No wildcards: exact match on filename or full path
                        let basename = Path::new(&e.name)
                            .file_name()
                            .map(|s| s.to_string_lossy())
                            .unwrap_or_default();
                        e.name == *f || basename == *f
                    }
                });
                if !matches {
                    return false;
                }
            }

            if cli
                .exclude
                .iter()
                .any(|x| e.name.contains(x) || glob_match(x, &e.name))
            {
                return false;
            }

            true
        })
        .collect();

    let multiple_files = cli.pipe && to_extract.len() > 1;
    for entry in to_extract {
        extract_entry(&archive, entry, cli, multiple_files).await?;
    }

    Ok(())
}

/// List the archive index.
///
/// Simple format (`-l`) prints names only; verbose (`-v`) prints a table
/// with sizes, compression ratio and timestamps, plus a summary line.
fn list_entries<R: ReadAt + 'static>(archive: &ZipArchive<R>, verbose: bool) -> Result<()> {
    if verbose {
        println!(
            "{:>10}  {:>10}  {:>5}  {:>10}  {:>5}  Name",
            "Length", "Size", "Cmpr", "Date", "Time"
        );
        println!("{}", "-".repeat(70));
    }

    let mut total_uncompressed = 0u64;
    let mut total_compressed = 0u64;
    let mut file_count = 0usize;

    for entry in archive.entries() {
        if verbose {
            let (year, month, day) = entry.mod_date();
            let (hour, minute, _second) = entry.mod_time();

            println!(
                "{:>10}  {:>10}  {}  {:04}-{:02}-{:02}  {:02}:{:02}  {}",
                entry.uncompressed_size,
                entry.compressed_size,
                ratio(entry.compressed_size, entry.uncompressed_size),
                year,
                month,
                day,
                hour,
                minute,
                entry.name
            );

            if !entry.is_directory {
                total_uncompressed += entry.uncompressed_size;
                total_compressed += entry.compressed_size;
                file_count += 1;
            }
        } else {
            println!("{}", entry.name);
        }
    }

    if verbose {
        println!("{}", "-".repeat(70));
        println!(
            "{:>10}  {:>10}  {}  {:>21}  {} files",
            total_uncompressed,
            total_compressed,
            ratio(total_compressed, total_uncompressed),
            "",
            file_count
        );
    }

    Ok(())
}

/// Compression ratio as percentage saved.
///
/// Clamped at 0% because deflate can expand incompressible payloads, in
/// which case the recorded compressed size exceeds the uncompressed one.
fn ratio(compressed: u64, uncompressed: u64) -> String {
    if uncompressed > 0 {
        format!("{:>4}%", 100u64.saturating_sub(compressed * 100 / uncompressed))
    } else {
        "  0%".to_string()
    }
}

/// Extract a single entry honouring the output options.
async fn extract_entry<R: ReadAt + 'static>(
    archive: &ZipArchive<R>,
    entry: &ZipEntry,
    cli: &Cli,
    show_filename: bool,
) -> Result<()> {
    // Pipe mode: write the payload directly to stdout
    if cli.pipe {
        if show_filename {
            use tokio::io::AsyncWriteExt;
            let mut stdout = tokio::io::stdout();
            stdout
                .write_all(format!("--- {} ---\n", entry.name).as_bytes())
                .await?;
        }
        archive.extract_to_stdout(entry).await?;
        return Ok(());
    }

    let file_name = if cli.junk_paths {
        // Junk paths: use only the base filename, ignore directory structure
        Path::new(&entry.name)
            .file_name()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| entry.name.clone())
    } else {
        entry.name.clone()
    };

    let output_path = match cli.extract_dir {
        Some(ref dir) => PathBuf::from(dir).join(&file_name),
        None => PathBuf::from(&file_name),
    };

    if output_path.exists() {
        if cli.never_overwrite {
            // -n flag: skip silently (unless quiet)
            if !cli.is_quiet() {
                eprintln!("Skipping: {} (file exists)", entry.name);
            }
            return Ok(());
        }

        if !cli.overwrite {
            if !cli.is_quiet() {
                eprintln!("Skipping: {} (use -o to overwrite)", entry.name);
            }
            return Ok(());
        }
        // -o flag: overwrite without prompting
    }

    if !cli.is_quiet() {
        println!("  extracting: {}", entry.name);
    }

    archive.extract_to_file(entry, &output_path).await?;

    Ok(())
}

/// Check if a pattern contains glob wildcard characters.
fn has_glob_chars(pattern: &str) -> bool {
    pattern.contains('*') || pattern.contains('?')
}

/// Simple glob matching: `*` matches zero or more characters, `?` matches
/// exactly one.
fn glob_match(pattern: &str, text: &str) -> bool {
    let pattern_chars: Vec<char> = pattern.chars().collect();
    let text_chars: Vec<char> = text.chars().collect();

    fn do_match(pattern: &[char], text: &[char]) -> bool {
        match (pattern.first(), text.first()) {
            (None, None) => true,
            (Some('*'), _) => {
                // Match zero characters (skip the star) or consume one and
                // keep the star for more
                do_match(&pattern[1..], text) || (!text.is_empty() && do_match(pattern, &text[1..]))
            }
            (Some('?'), Some(_)) => do_match(&pattern[1..], &text[1..]),
            (Some(p), Some(t)) if *p == *t => do_match(&pattern[1..], &text[1..]),
            _ => false,
        }
    }

    do_match(&pattern_chars, &text_chars)
}

/// Format a byte size into a human-readable string.
fn format_size(size: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if size >= GB {
        format!("{:.2} GB", size as f64 / GB as f64)
    } else if size >= MB {
        format!("{:.2} MB", size as f64 / MB as f64)
    } else if size >= KB {
        format!("{:.2} KB", size as f64 / KB as f64)
    } else {
        format!("{} bytes", size)
    }
}

#[cfg(test)]
mod tests {
    use super::{format_size, glob_match, has_glob_chars, ratio};

    #[test]
    fn glob_matching() {
        assert!(glob_match("*.txt", "readme.txt"));
        assert!(glob_match("file?.dat", "file1.dat"));
        assert!(glob_match("docs/*", "docs/guide.md"));
        assert!(!glob_match("*.txt", "readme.md"));
        assert!(!glob_match("file?.dat", "file12.dat"));
    }

    #[test]
    fn glob_detection() {
        assert!(has_glob_chars("*.zip"));
        assert!(has_glob_chars("file?"));
        assert!(!has_glob_chars("plain.txt"));
    }

    #[test]
    fn ratio_clamps_expanded_payloads() {
        assert_eq!(ratio(50, 100), "  50%");
        assert_eq!(ratio(0, 0), "  0%");
        // Deflate made it bigger: saved percentage bottoms out at zero
        assert_eq!(ratio(110, 100), "   0%");
    }

    #[test]
    fn size_formatting() {
        assert_eq!(format_size(500), "500 bytes");
        assert_eq!(format_size(1536), "1.50 KB");
        assert_eq!(format_size(1048576), "1.00 MB");
    }
}
