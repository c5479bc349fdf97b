//! Configuration for batch runs of the `cauchy` tool

use rayon::{ThreadPool, ThreadPoolBuildError, ThreadPoolBuilder};

/// How many inputs are coded at once
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    /// Number of worker threads (0 = auto-detect)
    pub threads: usize,
    /// Whether independent inputs are coded in parallel
    pub parallel: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            threads: 0,
            parallel: true,
        }
    }
}

impl RunConfig {
    pub fn new(threads: usize, parallel: bool) -> Self {
        Self { threads, parallel }
    }

    pub fn from_args(matches: &clap::ArgMatches) -> Self {
        let threads = matches.get_one::<usize>("threads").copied().unwrap_or(0);
        let parallel = !matches.get_flag("no-parallel");
        Self::new(threads, parallel)
    }

    /// Get effective thread count (auto-detect if 0)
    pub fn effective_threads(&self) -> usize {
        match (self.parallel, self.threads) {
            (false, _) => 1,
            (true, 0) => std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(4),
            (true, n) => n,
        }
    }

    /// Dedicated pool sized by [`effective_threads`](Self::effective_threads)
    pub fn thread_pool(&self) -> Result<ThreadPool, ThreadPoolBuildError> {
        ThreadPoolBuilder::new()
            .num_threads(self.effective_threads())
            .thread_name(|index| format!("cauchy-{index}"))
            .build()
    }
}
