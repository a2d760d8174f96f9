//! Revision store abstraction layer
//!
//! This module provides a trait-based abstraction over the underlying
//! version-control system, allowing for multiple implementations including
//! real Git repositories and an in-memory fake for testing.
//!
//! # Overview
//!
//! The primary abstraction is the [RevisionStore] trait, which defines the
//! history queries and the three mutations git-release needs. The concrete
//! implementations are:
//!
//! - [repository::Git2Store]: a real implementation using the `git2` crate
//! - [mock::MockStore]: an in-memory implementation for testing
//!
//! Most code should depend on the [RevisionStore] trait rather than a
//! concrete implementation, so TagManager and ChangelogGenerator can be
//! tested without a real repository.

pub mod mock;
pub mod repository;

pub use mock::MockStore;
pub use repository::Git2Store;

use std::path::Path;

use crate::error::Result;

/// Commit metadata surfaced by a revision store.
///
/// Revisions are immutable once created by the underlying system; this core
/// only reads them. A history rewrite produces new revisions with new ids,
/// it never mutates one in place.
#[derive(Debug, Clone, PartialEq)]
pub struct Revision {
    /// Full commit hash
    pub id: String,
    /// Shortened hash for display
    pub short_id: String,
    /// First line of the commit message
    pub subject: String,
    /// Author name
    pub author: String,
    /// Commit time, seconds since the Unix epoch
    pub timestamp: i64,
    /// Parent commit hashes
    pub parent_ids: Vec<String>,
}

impl Revision {
    /// A merge commit has more than one parent.
    pub fn is_merge(&self) -> bool {
        self.parent_ids.len() > 1
    }
}

/// Common revision store trait for abstraction
///
/// All implementors must be `Send + Sync` to allow safe sharing across
/// threads. Methods return [crate::error::Result<T>]; implementations map
/// underlying failures (like `git2::Error`) to the appropriate
/// [crate::error::GitReleaseError] variants, usually `RevisionQuery` for
/// history reads.
pub trait RevisionStore: Send + Sync {
    /// Resolve HEAD to a revision.
    ///
    /// # Returns
    /// * `Ok(Revision)` - The commit at the tip of the current branch
    /// * `Err` - If HEAD is unborn or cannot be peeled to a commit
    fn head(&self) -> Result<Revision>;

    /// Get all tag names in the repository.
    ///
    /// The order is the store's listing order; callers that need a specific
    /// boundary (latest, previous) resolve it by walking history, not by
    /// sorting this list.
    fn list_tags(&self) -> Result<Vec<String>>;

    /// Resolve a tag name to the revision it points at.
    ///
    /// Handles both lightweight and annotated tags.
    ///
    /// # Returns
    /// * `Ok(Some(Revision))` - Target revision if the tag exists
    /// * `Ok(None)` - If the tag does not exist
    fn tag_target(&self, name: &str) -> Result<Option<Revision>>;

    /// Get commits reachable from `to` (inclusive), stopping at `from`
    /// (exclusive), in the history's native order (newest first).
    ///
    /// # Arguments
    /// * `from` - Lower bound commit id, excluded from the results; `None`
    ///   enumerates the full history below `to`
    /// * `to` - Upper bound commit id, included in the results
    fn commits_between(&self, from: Option<&str>, to: &str) -> Result<Vec<Revision>>;

    /// Get paths changed between two revisions.
    ///
    /// With `from` set to `None` the diff is taken against the empty tree,
    /// so every path present at `to` is reported.
    fn changed_files(&self, from: Option<&str>, to: &str) -> Result<Vec<String>>;

    /// Render the unified diff for one path between two revisions.
    ///
    /// # Returns
    /// * `Ok(Some(String))` - The rendered patch text
    /// * `Ok(None)` - If the path has no resolvable diff (binary content,
    ///   or nothing changed under that path)
    fn diff_file(&self, from: Option<&str>, to: &str, path: &str) -> Result<Option<String>>;

    /// Create an annotated tag named `name` pointing at `target`.
    ///
    /// # Returns
    /// * `Ok(())` - Success
    /// * `Err` - `TagExists` if the exact name is already present
    fn create_tag(&self, name: &str, target: &str, message: &str) -> Result<()>;

    /// Stage the given paths and create a commit on the current branch.
    ///
    /// # Returns
    /// * `Ok(String)` - The new commit id
    fn commit_files(&self, paths: &[&Path], message: &str) -> Result<String>;

    /// Rewrite every commit message reachable from every reference with
    /// `transform`, in a single pass with remapped parents.
    ///
    /// # Returns
    /// * `Ok(usize)` - Number of commits whose identity changed
    /// * `Err` - `RewriteAborted` if the pass fails partway
    fn rewrite_messages(&self, transform: &dyn Fn(&str) -> String) -> Result<usize>;
}
