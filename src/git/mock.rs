use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;

use crate::error::{GitReleaseError, Result};
use crate::git::{Revision, RevisionStore};

/// Mock revision store for testing without an actual repository.
///
/// Commits are held in chronological order (oldest first); the last one is
/// HEAD. Tags and full messages sit behind a Mutex so the mutation methods
/// work through `&self` like the real store.
pub struct MockStore {
    commits: Vec<Revision>,
    tags: Mutex<Vec<(String, String)>>,
    messages: Mutex<HashMap<String, String>>,
    diffs: HashMap<String, Option<String>>,
}

impl MockStore {
    /// Create a new empty mock store
    pub fn new() -> Self {
        MockStore {
            commits: Vec::new(),
            tags: Mutex::new(Vec::new()),
            messages: Mutex::new(HashMap::new()),
            diffs: HashMap::new(),
        }
    }

    /// Append a commit; insertion order is chronological (oldest first)
    pub fn add_commit(&mut self, revision: Revision) {
        self.messages
            .lock()
            .expect("mock store lock")
            .insert(revision.id.clone(), revision.subject.clone());
        self.commits.push(revision);
    }

    /// Convenience builder: append a linear commit with the previous commit
    /// as its single parent
    pub fn add_linear_commit(&mut self, id: impl Into<String>, subject: impl Into<String>) {
        let id = id.into();
        let parent_ids = match self.commits.last() {
            Some(parent) => vec![parent.id.clone()],
            None => Vec::new(),
        };
        let short_id = id.chars().take(7).collect();
        let timestamp = self.commits.len() as i64;
        self.add_commit(Revision {
            id,
            short_id,
            subject: subject.into(),
            author: "Test Author".to_string(),
            timestamp,
            parent_ids,
        });
    }

    /// Add a tag pointing at a commit id
    pub fn add_tag(&mut self, name: impl Into<String>, target: impl Into<String>) {
        self.tags
            .lock()
            .expect("mock store lock")
            .push((name.into(), target.into()));
    }

    /// Register a path and its diff text; `None` models a path with no
    /// resolvable diff (binary, renamed)
    pub fn set_diff(&mut self, path: impl Into<String>, patch: Option<&str>) {
        self.diffs.insert(path.into(), patch.map(|p| p.to_string()));
    }

    /// Full message currently stored for a commit id (rewritten messages land here)
    pub fn message(&self, id: &str) -> Option<String> {
        self.messages.lock().expect("mock store lock").get(id).cloned()
    }

    fn position(&self, id: &str) -> Result<usize> {
        self.commits
            .iter()
            .position(|revision| revision.id == id)
            .ok_or_else(|| GitReleaseError::revision(format!("unknown revision '{}'", id)))
    }
}

impl Default for MockStore {
    fn default() -> Self {
        Self::new()
    }
}

impl RevisionStore for MockStore {
    fn head(&self) -> Result<Revision> {
        self.commits
            .last()
            .cloned()
            .ok_or_else(|| GitReleaseError::revision("repository has no commits"))
    }

    fn list_tags(&self) -> Result<Vec<String>> {
        Ok(self
            .tags
            .lock()
            .expect("mock store lock")
            .iter()
            .map(|(name, _)| name.clone())
            .collect())
    }

    fn tag_target(&self, name: &str) -> Result<Option<Revision>> {
        let target = self
            .tags
            .lock()
            .expect("mock store lock")
            .iter()
            .find(|(tag_name, _)| tag_name == name)
            .map(|(_, target)| target.clone());

        match target {
            Some(target) => {
                let index = self.position(&target)?;
                Ok(Some(self.commits[index].clone()))
            }
            None => Ok(None),
        }
    }

    fn commits_between(&self, from: Option<&str>, to: &str) -> Result<Vec<Revision>> {
        let to_index = self.position(to)?;
        let start = match from {
            Some(from) => self.position(from)? + 1,
            None => 0,
        };

        // Native order is newest first, like a real history walk
        let mut revisions: Vec<Revision> = self.commits[start..=to_index].to_vec();
        revisions.reverse();
        Ok(revisions)
    }

    fn changed_files(&self, _from: Option<&str>, _to: &str) -> Result<Vec<String>> {
        Ok(self.diffs.keys().cloned().collect())
    }

    fn diff_file(&self, _from: Option<&str>, _to: &str, path: &str) -> Result<Option<String>> {
        Ok(self.diffs.get(path).cloned().flatten())
    }

    fn create_tag(&self, name: &str, target: &str, _message: &str) -> Result<()> {
        let mut tags = self.tags.lock().expect("mock store lock");
        if tags.iter().any(|(tag_name, _)| tag_name == name) {
            return Err(GitReleaseError::tag_exists(name));
        }
        tags.push((name.to_string(), target.to_string()));
        Ok(())
    }

    fn commit_files(&self, _paths: &[&Path], _message: &str) -> Result<String> {
        // Simplified: the mock does not grow new commits, it reports HEAD
        self.head().map(|revision| revision.id)
    }

    fn rewrite_messages(&self, transform: &dyn Fn(&str) -> String) -> Result<usize> {
        let mut messages = self.messages.lock().expect("mock store lock");
        let mut changed = 0usize;
        for message in messages.values_mut() {
            let rewritten = transform(message);
            if rewritten != *message {
                *message = rewritten;
                changed += 1;
            }
        }
        Ok(changed)
    }
}
