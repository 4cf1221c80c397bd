//! Bounded memoization of repository context fetches.
//!
//! Fetching branch + file tree + README costs three upstream calls, and the
//! same repository is typically requested many times in a row (generation
//! followed by Q&A, retries with a credential). [`RepoContextCache`] wraps
//! the [`RepositorySource`] in a fixed-capacity, least-recently-used map so
//! a resident entry never touches the network again.
//!
//! The cache is constructed once in the binary and injected everywhere it
//! is needed; there is no implicit global instance.

use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::Mutex;
use rustc_hash::FxHashMap;

use crate::source::{RepositorySource, SourceError};

/// Branch name substituted when the source cannot report one.
pub const DEFAULT_BRANCH_FALLBACK: &str = "main";

/// Default number of distinct (owner, repo, token) keys kept resident.
pub const DEFAULT_CACHE_CAPACITY: usize = 100;

/// Repository metadata snapshot. Immutable once fetched.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RepoContext {
    /// Never empty; falls back to [`DEFAULT_BRANCH_FALLBACK`].
    pub default_branch: String,
    pub file_tree: String,
    pub readme: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
struct RepoKey {
    owner: String,
    repo: String,
    token: Option<String>,
}

struct LruState {
    entries: FxHashMap<RepoKey, Arc<RepoContext>>,
    /// Access order, least recently used at the front.
    order: VecDeque<RepoKey>,
}

/// Fixed-capacity memoizing cache around a [`RepositorySource`].
///
/// A single mutex guards the map and its access order; the upstream fetch
/// itself runs outside the lock so slow network calls never serialize
/// unrelated requests.
pub struct RepoContextCache {
    source: Arc<dyn RepositorySource>,
    capacity: usize,
    state: Mutex<LruState>,
}

impl RepoContextCache {
    pub fn new(source: Arc<dyn RepositorySource>, capacity: usize) -> Self {
        Self {
            source,
            capacity: capacity.max(1),
            state: Mutex::new(LruState {
                entries: FxHashMap::default(),
                order: VecDeque::new(),
            }),
        }
    }

    /// Fetch-or-return the context for `(owner, repo, token)`.
    ///
    /// On a hit the stored value is returned without any network activity
    /// and the key is marked most recently used. On a miss the source is
    /// queried, the result stored, and the least recently used entry evicted
    /// if the cache is over capacity.
    pub async fn get(
        &self,
        owner: &str,
        repo: &str,
        token: Option<&str>,
    ) -> Result<Arc<RepoContext>, SourceError> {
        let key = RepoKey {
            owner: owner.to_owned(),
            repo: repo.to_owned(),
            token: token.map(str::to_owned),
        };

        if let Some(context) = self.lookup(&key) {
            return Ok(context);
        }

        let context = Arc::new(self.fetch(owner, repo, token).await?);
        Ok(self.insert(key, context))
    }

    /// Number of resident entries.
    pub fn len(&self) -> usize {
        self.state.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lookup(&self, key: &RepoKey) -> Option<Arc<RepoContext>> {
        let mut state = self.state.lock();
        let context = state.entries.get(key)?.clone();
        state.order.retain(|k| k != key);
        state.order.push_back(key.clone());
        Some(context)
    }

    fn insert(&self, key: RepoKey, context: Arc<RepoContext>) -> Arc<RepoContext> {
        let mut state = self.state.lock();
        // Two tasks may have fetched the same key concurrently; the first
        // insert wins so both callers observe one value.
        if let Some(existing) = state.entries.get(&key) {
            return existing.clone();
        }
        state.entries.insert(key.clone(), context.clone());
        state.order.push_back(key);
        while state.entries.len() > self.capacity {
            if let Some(evicted) = state.order.pop_front() {
                state.entries.remove(&evicted);
            } else {
                break;
            }
        }
        context
    }

    async fn fetch(
        &self,
        owner: &str,
        repo: &str,
        token: Option<&str>,
    ) -> Result<RepoContext, SourceError> {
        let branch = self
            .source
            .default_branch(owner, repo, token)
            .await?
            .filter(|b| !b.is_empty())
            .unwrap_or_else(|| DEFAULT_BRANCH_FALLBACK.to_owned());
        let file_tree = self.source.file_tree(owner, repo, token).await?;
        let readme = self.source.readme(owner, repo, token).await?;

        tracing::debug!(owner, repo, branch = %branch, "fetched repository context");
        Ok(RepoContext {
            default_branch: branch,
            file_tree,
            readme,
        })
    }
}
