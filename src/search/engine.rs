//! Search Engine
//!
//! Binds one search algorithm to the data file and exposes the single
//! membership operation the server needs: [`SearchEngine::contains`].
//!
//! ## Dispatch Model
//!
//! The (mode, algorithm) pair is resolved into exactly one backend variant
//! at construction. Queries match on that closed enum; there is no
//! per-query algorithm re-selection, and cached snapshots are built here,
//! before the first connection is accepted.
//!
//! ## Concurrency
//!
//! The engine is shared as `Arc<SearchEngine>` across all connection tasks.
//! Cached backends are immutable after construction, so concurrent lookups
//! need no locking. Reread backends hold only the file path; each call
//! performs an independent file open on a blocking worker thread, and
//! grep_fx spawns one timeout-guarded child process per query.

use std::collections::HashSet;
use std::path::PathBuf;

use crate::config::{AppConfig, SearchAlgo};
use crate::search::algorithms::{self, SearchError, GREP_TIMEOUT};

/// Errors raised when the engine cannot be built or cannot answer a query.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// The underlying search strategy failed
    #[error(transparent)]
    Search(#[from] SearchError),

    /// The blocking search task was cancelled or panicked
    #[error("search task aborted: {0}")]
    TaskAborted(#[from] tokio::task::JoinError),

    /// The algorithm cannot run in the selected consistency mode
    #[error("search_algo={algo} is not compatible with reread_on_query={reread_on_query}")]
    IncompatibleAlgo {
        algo: SearchAlgo,
        reread_on_query: bool,
    },
}

/// The backend bound at construction. One variant per (mode, algorithm)
/// pairing that the configuration validator admits.
#[derive(Debug)]
enum Backend {
    /// linear_scan in reread mode: sequential file read per query
    LinearFile(PathBuf),
    /// linear_scan in cached mode: sequential scan of the snapshot
    LinearSnapshot(Vec<String>),
    /// mmap_scan: memory-mapped file scan per query
    MmapFile(PathBuf),
    /// grep_fx: external grep invocation per query
    GrepFile(PathBuf),
    /// set_cache: hash-set snapshot
    HashSnapshot(HashSet<String>),
    /// sorted_bisect: sorted snapshot with binary search
    SortedSnapshot(Vec<String>),
}

/// Engine that routes queries to the configured search algorithm.
///
/// Constructed once per process from a validated [`AppConfig`]; see the
/// module docs for the dispatch and sharing model.
#[derive(Debug)]
pub struct SearchEngine {
    backend: Backend,
    algo: SearchAlgo,
    reread_on_query: bool,
}

impl SearchEngine {
    /// Creates an engine from a validated configuration.
    ///
    /// For cached algorithms this loads the snapshot now, so a startup-time
    /// read failure surfaces here rather than on the first query.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError`] if the algorithm is incompatible with the
    /// configured mode or the snapshot cannot be built.
    pub fn from_config(cfg: &AppConfig) -> Result<Self, EngineError> {
        Self::new(cfg.linuxpath.clone(), cfg.reread_on_query, cfg.search_algo)
    }

    /// Creates an engine from its parts.
    ///
    /// The configuration validator enforces the mode/algorithm pairing for
    /// file-driven startup; this constructor re-checks it so directly built
    /// engines obey the same contract.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError`] on an incompatible pairing or a failed
    /// snapshot build.
    pub fn new(
        path: PathBuf,
        reread_on_query: bool,
        algo: SearchAlgo,
    ) -> Result<Self, EngineError> {
        if !algo.valid_for(reread_on_query) {
            return Err(EngineError::IncompatibleAlgo {
                algo,
                reread_on_query,
            });
        }

        let backend = match (reread_on_query, algo) {
            (true, SearchAlgo::LinearScan) => Backend::LinearFile(path),
            (true, SearchAlgo::MmapScan) => Backend::MmapFile(path),
            (true, SearchAlgo::GrepFx) => Backend::GrepFile(path),
            (false, SearchAlgo::LinearScan) => {
                Backend::LinearSnapshot(algorithms::build_line_list(&path)?)
            }
            (false, SearchAlgo::SetCache) => {
                Backend::HashSnapshot(algorithms::build_set_cache(&path)?)
            }
            (false, SearchAlgo::SortedBisect) => {
                Backend::SortedSnapshot(algorithms::build_sorted_lines(&path)?)
            }
            // valid_for() rejected everything else above.
            (reread_on_query, algo) => {
                return Err(EngineError::IncompatibleAlgo {
                    algo,
                    reread_on_query,
                })
            }
        };

        Ok(Self {
            backend,
            algo,
            reread_on_query,
        })
    }

    /// The algorithm this engine was bound to.
    pub fn algorithm(&self) -> SearchAlgo {
        self.algo
    }

    /// Whether this engine re-reads the file per query.
    pub fn reread_on_query(&self) -> bool {
        self.reread_on_query
    }

    /// Checks whether the query exists as an exact full line of the data.
    ///
    /// Cached backends answer from the construction-time snapshot; reread
    /// backends reflect the file content at the moment of the call. File
    /// scans run under `spawn_blocking` so they never stall the connection
    /// tasks sharing this worker pool.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError`] if the underlying search operation fails.
    /// A failed lookup is distinct from a miss.
    pub async fn contains(&self, query: &str) -> Result<bool, EngineError> {
        match &self.backend {
            Backend::LinearFile(path) => {
                let path = path.clone();
                let query = query.to_owned();
                let found =
                    tokio::task::spawn_blocking(move || algorithms::linear_scan_file(&path, &query))
                        .await??;
                Ok(found)
            }
            Backend::MmapFile(path) => {
                let path = path.clone();
                let query = query.to_owned();
                let found =
                    tokio::task::spawn_blocking(move || algorithms::mmap_scan(&path, &query))
                        .await??;
                Ok(found)
            }
            Backend::GrepFile(path) => {
                Ok(algorithms::grep_fx(path, query, GREP_TIMEOUT).await?)
            }
            Backend::LinearSnapshot(lines) => Ok(algorithms::linear_scan_lines(lines, query)),
            Backend::HashSnapshot(cache) => Ok(algorithms::set_cache_contains(cache, query)),
            Backend::SortedSnapshot(sorted) => Ok(algorithms::sorted_bisect(sorted, query)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::fs::OpenOptions;
    use std::io::Write;
    use tempfile::TempDir;

    fn dataset(content: &str) -> (TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.txt");
        fs::write(&path, content).unwrap();
        (dir, path)
    }

    fn append(path: &PathBuf, content: &str) {
        let mut f = OpenOptions::new().append(true).open(path).unwrap();
        f.write_all(content.as_bytes()).unwrap();
    }

    #[tokio::test]
    async fn test_reread_algorithms_agree() {
        let (_dir, path) = dataset("alpha\nbeta\ngamma\n");

        for algo in [SearchAlgo::LinearScan, SearchAlgo::MmapScan, SearchAlgo::GrepFx] {
            let engine = SearchEngine::new(path.clone(), true, algo).unwrap();
            assert!(engine.contains("beta").await.unwrap(), "{algo}");
            assert!(!engine.contains("bet").await.unwrap(), "{algo}");
            assert!(!engine.contains("delta").await.unwrap(), "{algo}");
        }
    }

    #[tokio::test]
    async fn test_cached_algorithms_agree() {
        let (_dir, path) = dataset("alpha\nbeta\ngamma\n");

        for algo in [
            SearchAlgo::LinearScan,
            SearchAlgo::SetCache,
            SearchAlgo::SortedBisect,
        ] {
            let engine = SearchEngine::new(path.clone(), false, algo).unwrap();
            assert!(engine.contains("beta").await.unwrap(), "{algo}");
            assert!(!engine.contains("beta ").await.unwrap(), "{algo}");
            assert!(!engine.contains("").await.unwrap(), "{algo}");
        }
    }

    #[tokio::test]
    async fn test_reread_sees_file_changes() {
        let (_dir, path) = dataset("alpha\n");

        for algo in [SearchAlgo::LinearScan, SearchAlgo::MmapScan, SearchAlgo::GrepFx] {
            let engine = SearchEngine::new(path.clone(), true, algo).unwrap();
            assert!(!engine.contains("qqq").await.unwrap(), "{algo}");
        }

        append(&path, "qqq\n");

        for algo in [SearchAlgo::LinearScan, SearchAlgo::MmapScan, SearchAlgo::GrepFx] {
            let engine = SearchEngine::new(path.clone(), true, algo).unwrap();
            assert!(engine.contains("qqq").await.unwrap(), "{algo}");
        }
    }

    #[tokio::test]
    async fn test_reread_freshness_without_reconstruction() {
        let (_dir, path) = dataset("alpha\n");
        let engine = SearchEngine::new(path.clone(), true, SearchAlgo::LinearScan).unwrap();

        assert!(!engine.contains("qqq").await.unwrap());
        append(&path, "qqq\n");
        assert!(engine.contains("qqq").await.unwrap());
    }

    #[tokio::test]
    async fn test_cached_snapshot_is_stale_by_contract() {
        let (_dir, path) = dataset("alpha\n");

        for algo in [
            SearchAlgo::LinearScan,
            SearchAlgo::SetCache,
            SearchAlgo::SortedBisect,
        ] {
            let engine = SearchEngine::new(path.clone(), false, algo).unwrap();
            assert!(!engine.contains("qqq").await.unwrap(), "{algo}");

            append(&path, "qqq\n");

            // The snapshot was taken at construction; the edit is invisible.
            assert!(!engine.contains("qqq").await.unwrap(), "{algo}");
            assert!(engine.contains("alpha").await.unwrap(), "{algo}");

            fs::write(&path, "alpha\n").unwrap();
        }
    }

    #[tokio::test]
    async fn test_cached_results_stable_across_repeated_calls() {
        let (_dir, path) = dataset("alpha\nbeta\n");
        let engine = SearchEngine::new(path.clone(), false, SearchAlgo::SetCache).unwrap();

        fs::remove_file(&path).unwrap();

        // Even deleting the backing file cannot perturb the snapshot.
        for _ in 0..3 {
            assert!(engine.contains("alpha").await.unwrap());
            assert!(!engine.contains("qqq").await.unwrap());
        }
    }

    #[test]
    fn test_incompatible_pairings_rejected() {
        let (_dir, path) = dataset("alpha\n");

        for (reread, algo) in [
            (false, SearchAlgo::MmapScan),
            (false, SearchAlgo::GrepFx),
            (true, SearchAlgo::SetCache),
            (true, SearchAlgo::SortedBisect),
        ] {
            let err = SearchEngine::new(path.clone(), reread, algo).unwrap_err();
            assert!(
                matches!(err, EngineError::IncompatibleAlgo { .. }),
                "({reread}, {algo}) should be rejected"
            );
        }
    }

    #[test]
    fn test_cached_construction_fails_on_missing_file() {
        let err = SearchEngine::new(
            PathBuf::from("/no/such/data.txt"),
            false,
            SearchAlgo::SetCache,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            EngineError::Search(SearchError::FileNotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_reread_missing_file_errors_per_query() {
        let (dir, path) = dataset("alpha\n");
        let engine = SearchEngine::new(path.clone(), true, SearchAlgo::LinearScan).unwrap();

        assert!(engine.contains("alpha").await.unwrap());

        drop(dir); // removes the temp directory and the data file

        assert!(matches!(
            engine.contains("alpha").await,
            Err(EngineError::Search(SearchError::FileNotFound { .. }))
        ));
    }

    #[tokio::test]
    async fn test_from_config_binds_selected_algorithm() {
        let (_dir, path) = dataset("alpha\n");
        let cfg = AppConfig {
            linuxpath: path,
            reread_on_query: false,
            search_algo: SearchAlgo::SortedBisect,
            ssl_enabled: false,
            ssl_certfile: None,
            ssl_keyfile: None,
            ssl_verify: true,
            ssl_cafile: None,
        };

        let engine = SearchEngine::from_config(&cfg).unwrap();
        assert_eq!(engine.algorithm(), SearchAlgo::SortedBisect);
        assert!(!engine.reread_on_query());
        assert!(engine.contains("alpha").await.unwrap());
    }
}
