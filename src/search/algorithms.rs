//! Search Algorithm Implementations
//!
//! Five strategies for testing whether a query string exists as an exact
//! full line of a text file:
//!
//! | name          | mode   | cost per query        |
//! |---------------|--------|-----------------------|
//! | linear_scan   | either | O(n) read             |
//! | mmap_scan     | reread | O(n), no per-line alloc |
//! | grep_fx       | reread | O(n) + process spawn  |
//! | set_cache     | cached | O(1) amortized        |
//! | sorted_bisect | cached | O(log n)              |
//!
//! Matching is exact and full-line only: no substrings, no prefixes, no
//! whitespace normalization. Line terminators (`\n`, `\r\n`) are stripped
//! before comparison, and invalid UTF-8 in the data file is replaced
//! lossily, so a dataset with stray bytes still serves the remaining lines.
//!
//! The cached algorithms are split into a build step (run once at engine
//! construction) and a lookup step over the resulting immutable structure.

use std::collections::HashSet;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use memmap2::Mmap;
use tokio::process::Command;
use tracing::debug;

/// Errors raised when a search strategy cannot read or scan the data file.
#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    /// The data file is missing
    #[error("data file not found: {}", .path.display())]
    FileNotFound { path: PathBuf },

    /// Reading or mapping the data file failed
    #[error("failed reading data file {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The external grep binary could not be started
    #[error("grep not found on system: {0}")]
    GrepUnavailable(std::io::Error),

    /// The external grep did not finish within its budget
    #[error("grep timed out after {0:?}")]
    GrepTimeout(Duration),

    /// The external grep exited abnormally (killed, or exit code > 1)
    #[error("grep exited abnormally: {0}")]
    GrepFailed(String),
}

impl SearchError {
    fn from_io(path: &Path, source: std::io::Error) -> Self {
        if source.kind() == std::io::ErrorKind::NotFound {
            SearchError::FileNotFound {
                path: path.to_path_buf(),
            }
        } else {
            SearchError::Io {
                path: path.to_path_buf(),
                source,
            }
        }
    }
}

/// Strips trailing `\n` and `\r` bytes from a line.
fn trim_eol(mut line: &[u8]) -> &[u8] {
    while let Some((&last, rest)) = line.split_last() {
        if last == b'\n' || last == b'\r' {
            line = rest;
        } else {
            break;
        }
    }
    line
}

/// Compares a raw dataset line against the query, decoding lossily only
/// when the line is not valid UTF-8.
fn line_matches(line: &[u8], query: &str) -> bool {
    if line == query.as_bytes() {
        return true;
    }
    if line.is_ascii() || std::str::from_utf8(line).is_ok() {
        return false;
    }
    String::from_utf8_lossy(line) == query
}

/// Searches by sequentially scanning the file for an exact line match.
///
/// Reads the file line by line on each call and returns true only if a
/// line equals the query after stripping line terminators.
///
/// # Errors
///
/// Returns [`SearchError`] if the file cannot be read.
pub fn linear_scan_file(path: &Path, query: &str) -> Result<bool, SearchError> {
    let file = File::open(path).map_err(|e| SearchError::from_io(path, e))?;
    let mut reader = BufReader::new(file);
    let mut buf = Vec::new();

    loop {
        buf.clear();
        let n = reader
            .read_until(b'\n', &mut buf)
            .map_err(|e| SearchError::from_io(path, e))?;
        if n == 0 {
            return Ok(false);
        }
        if line_matches(trim_eol(&buf), query) {
            return Ok(true);
        }
    }
}

/// Searches a pre-built line snapshot sequentially.
///
/// The cached-mode counterpart of [`linear_scan_file`]: same O(n) walk, but
/// over the immutable snapshot taken at engine construction.
pub fn linear_scan_lines(lines: &[String], query: &str) -> bool {
    lines.iter().any(|line| line == query)
}

/// Searches using a memory-mapped scan of newline-delimited regions.
///
/// The file content is never copied into per-line allocations; each region
/// between newlines is compared in place (trailing `\r` stripped, so CRLF
/// files behave like LF files).
///
/// An empty query and an empty file both report no match.
///
/// # Errors
///
/// Returns [`SearchError`] if the file cannot be opened or mapped.
pub fn mmap_scan(path: &Path, query: &str) -> Result<bool, SearchError> {
    if query.is_empty() {
        return Ok(false);
    }

    let file = File::open(path).map_err(|e| SearchError::from_io(path, e))?;
    let meta = file
        .metadata()
        .map_err(|e| SearchError::from_io(path, e))?;
    // mmap of a zero-length file fails; handle explicitly.
    if meta.len() == 0 {
        return Ok(false);
    }

    // Safety: the mapping is read-only and dropped before this call returns.
    // Concurrent writers can change observed bytes, which is the documented
    // freshness behavior of reread mode.
    let map = unsafe { Mmap::map(&file) }.map_err(|e| SearchError::from_io(path, e))?;

    let needle = query.as_bytes();
    for region in map.split(|&b| b == b'\n') {
        if trim_eol(region) == needle {
            return Ok(true);
        }
    }
    Ok(false)
}

/// Default time budget for one external grep invocation.
pub const GREP_TIMEOUT: Duration = Duration::from_secs(5);

/// Searches using `grep -F -x` for an exact full-line fixed-string match.
///
/// Spawns one child process per query. The child is bounded by `budget`:
/// on timeout it is killed and reaped, and the query fails with
/// [`SearchError::GrepTimeout`] rather than reporting a miss. Exit status 0
/// means hit, 1 means miss, anything else is an error distinct from a miss.
///
/// # Errors
///
/// Returns [`SearchError`] if grep is unavailable, times out, or exits
/// abnormally.
pub async fn grep_fx(path: &Path, query: &str, budget: Duration) -> Result<bool, SearchError> {
    let mut child = Command::new("grep")
        .arg("-F")
        .arg("-x")
        .arg("--")
        .arg(query)
        .arg(path)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .kill_on_drop(true)
        .spawn()
        .map_err(SearchError::GrepUnavailable)?;

    let status = match tokio::time::timeout(budget, child.wait()).await {
        Ok(waited) => waited.map_err(|e| SearchError::from_io(path, e))?,
        Err(_) => {
            // kill() waits for the child, so no zombie is left behind.
            let _ = child.kill().await;
            debug!(path = %path.display(), "grep child killed after timeout");
            return Err(SearchError::GrepTimeout(budget));
        }
    };

    match status.code() {
        Some(0) => Ok(true),
        Some(1) => Ok(false),
        Some(code) => Err(SearchError::GrepFailed(format!("exit code {code}"))),
        None => Err(SearchError::GrepFailed("terminated by signal".to_string())),
    }
}

/// Reads all lines of the file with terminators stripped, in file order.
///
/// Shared build step for the cached algorithms.
///
/// # Errors
///
/// Returns [`SearchError`] if the file cannot be read.
pub fn build_line_list(path: &Path) -> Result<Vec<String>, SearchError> {
    let file = File::open(path).map_err(|e| SearchError::from_io(path, e))?;
    let mut reader = BufReader::new(file);
    let mut buf = Vec::new();
    let mut lines = Vec::new();

    loop {
        buf.clear();
        let n = reader
            .read_until(b'\n', &mut buf)
            .map_err(|e| SearchError::from_io(path, e))?;
        if n == 0 {
            return Ok(lines);
        }
        lines.push(String::from_utf8_lossy(trim_eol(&buf)).into_owned());
    }
}

/// Builds a hash-set snapshot of all lines in the file.
///
/// # Errors
///
/// Returns [`SearchError`] if the file cannot be read.
pub fn build_set_cache(path: &Path) -> Result<HashSet<String>, SearchError> {
    Ok(build_line_list(path)?.into_iter().collect())
}

/// Searches for a query in a pre-built set cache.
pub fn set_cache_contains(cache: &HashSet<String>, query: &str) -> bool {
    cache.contains(query)
}

/// Builds a sorted snapshot of all lines in the file.
///
/// # Errors
///
/// Returns [`SearchError`] if the file cannot be read.
pub fn build_sorted_lines(path: &Path) -> Result<Vec<String>, SearchError> {
    let mut lines = build_line_list(path)?;
    lines.sort_unstable();
    Ok(lines)
}

/// Searches for a query with binary search over a sorted snapshot.
pub fn sorted_bisect(sorted_lines: &[String], query: &str) -> bool {
    sorted_lines
        .binary_search_by(|line| line.as_str().cmp(query))
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::io::Write;
    use tempfile::TempDir;

    fn dataset(content: &str) -> (TempDir, std::path::PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.txt");
        fs::write(&path, content).unwrap();
        (dir, path)
    }

    /// Exact-match discipline shared by every strategy: `beta` hits,
    /// `bet` (prefix) and `beta ` (trailing space) miss.
    const DATA: &str = "alpha\nbeta\ngamma\n";
    const CASES: [(&str, bool); 5] = [
        ("beta", true),
        ("bet", false),
        ("beta ", false),
        ("gamma", true),
        ("delta", false),
    ];

    #[test]
    fn test_linear_scan_exact_match() {
        let (_dir, path) = dataset(DATA);
        for (query, expected) in CASES {
            assert_eq!(
                linear_scan_file(&path, query).unwrap(),
                expected,
                "query {query:?}"
            );
        }
    }

    #[test]
    fn test_mmap_scan_exact_match() {
        let (_dir, path) = dataset(DATA);
        for (query, expected) in CASES {
            assert_eq!(mmap_scan(&path, query).unwrap(), expected, "query {query:?}");
        }
    }

    #[tokio::test]
    async fn test_grep_fx_exact_match() {
        let (_dir, path) = dataset(DATA);
        for (query, expected) in CASES {
            assert_eq!(
                grep_fx(&path, query, GREP_TIMEOUT).await.unwrap(),
                expected,
                "query {query:?}"
            );
        }
    }

    #[test]
    fn test_set_cache_exact_match() {
        let (_dir, path) = dataset(DATA);
        let cache = build_set_cache(&path).unwrap();
        for (query, expected) in CASES {
            assert_eq!(set_cache_contains(&cache, query), expected, "query {query:?}");
        }
    }

    #[test]
    fn test_sorted_bisect_exact_match() {
        let (_dir, path) = dataset(DATA);
        let sorted = build_sorted_lines(&path).unwrap();
        for (query, expected) in CASES {
            assert_eq!(sorted_bisect(&sorted, query), expected, "query {query:?}");
        }
    }

    #[test]
    fn test_linear_scan_lines_matches_file_scan() {
        let (_dir, path) = dataset(DATA);
        let snapshot = build_line_list(&path).unwrap();
        for (query, expected) in CASES {
            assert_eq!(linear_scan_lines(&snapshot, query), expected);
            assert_eq!(
                linear_scan_lines(&snapshot, query),
                linear_scan_file(&path, query).unwrap()
            );
        }
    }

    #[test]
    fn test_crlf_dataset_behaves_like_lf() {
        let (_dir, path) = dataset("alpha\r\nbeta\r\ngamma\r\n");
        assert!(linear_scan_file(&path, "beta").unwrap());
        assert!(mmap_scan(&path, "beta").unwrap());
        let cache = build_set_cache(&path).unwrap();
        assert!(set_cache_contains(&cache, "beta"));
        assert!(!set_cache_contains(&cache, "beta\r"));
    }

    #[test]
    fn test_no_trailing_newline_last_line_still_matches() {
        let (_dir, path) = dataset("alpha\nbeta");
        assert!(linear_scan_file(&path, "beta").unwrap());
        assert!(mmap_scan(&path, "beta").unwrap());
        let sorted = build_sorted_lines(&path).unwrap();
        assert!(sorted_bisect(&sorted, "beta"));
    }

    #[test]
    fn test_mmap_scan_empty_query_and_empty_file() {
        let (_dir, path) = dataset(DATA);
        assert!(!mmap_scan(&path, "").unwrap());

        let (_dir2, empty) = dataset("");
        assert!(!mmap_scan(&empty, "alpha").unwrap());
    }

    #[test]
    fn test_missing_file_is_an_error_not_a_miss() {
        let missing = Path::new("/no/such/data.txt");
        assert!(matches!(
            linear_scan_file(missing, "x"),
            Err(SearchError::FileNotFound { .. })
        ));
        assert!(matches!(
            mmap_scan(missing, "x"),
            Err(SearchError::FileNotFound { .. })
        ));
        assert!(matches!(
            build_set_cache(missing),
            Err(SearchError::FileNotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_grep_fx_missing_file_is_an_error() {
        let missing = Path::new("/no/such/data.txt");
        // grep exits 2 when the file does not exist.
        assert!(matches!(
            grep_fx(missing, "x", GREP_TIMEOUT).await,
            Err(SearchError::GrepFailed(_))
        ));
    }

    #[tokio::test]
    async fn test_grep_fx_query_looking_like_an_option() {
        // The `--` separator keeps option-shaped queries literal.
        let (_dir, path) = dataset("-v\nplain\n");
        assert!(grep_fx(&path, "-v", GREP_TIMEOUT).await.unwrap());
        assert!(!grep_fx(&path, "-x", GREP_TIMEOUT).await.unwrap());
    }

    #[test]
    fn test_invalid_utf8_line_does_not_break_scan() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.txt");
        let mut f = fs::File::create(&path).unwrap();
        f.write_all(b"alpha\n\xff\xfe\nbeta\n").unwrap();
        drop(f);

        assert!(linear_scan_file(&path, "beta").unwrap());
        assert!(!linear_scan_file(&path, "zeta").unwrap());
        let cache = build_set_cache(&path).unwrap();
        assert!(set_cache_contains(&cache, "alpha"));
    }

    #[test]
    fn test_all_mode_valid_algorithms_agree() {
        let (_dir, path) = dataset("one\ntwo\nthree\nfour\n");
        let cache = build_set_cache(&path).unwrap();
        let sorted = build_sorted_lines(&path).unwrap();
        let snapshot = build_line_list(&path).unwrap();

        for query in ["one", "two", "three", "four", "f", "five", "two\n", ""] {
            let linear = linear_scan_file(&path, query).unwrap();
            assert_eq!(linear_scan_lines(&snapshot, query), linear, "query {query:?}");
            assert_eq!(set_cache_contains(&cache, query), linear, "query {query:?}");
            assert_eq!(sorted_bisect(&sorted, query), linear, "query {query:?}");
            if !query.is_empty() {
                assert_eq!(mmap_scan(&path, query).unwrap(), linear, "query {query:?}");
            }
        }
    }
}
