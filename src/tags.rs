use log::debug;
use std::collections::HashMap;

use crate::error::{GitReleaseError, Result};
use crate::git::{Revision, RevisionStore};
use crate::version::Version;

/// A release tag and the revision it points at
#[derive(Debug, Clone, PartialEq)]
pub struct Tag {
    pub name: String,
    pub target: Revision,
}

/// Tag naming pattern (e.g., "v{version}", "release-{version}")
#[derive(Debug, Clone)]
pub struct TagPattern {
    pattern: String,
}

impl TagPattern {
    /// Create a new tag pattern
    pub fn new(pattern: impl Into<String>) -> Self {
        TagPattern {
            pattern: pattern.into(),
        }
    }

    /// Format a version according to pattern
    /// Example: pattern="v{version}", version=1.2.3 -> "v1.2.3"
    pub fn format(&self, version: &Version) -> String {
        self.pattern.replace("{version}", &version.to_string())
    }
}

/// Resolves release boundaries and creates release tags.
///
/// Depends only on the [RevisionStore] trait so it can be driven by the
/// in-memory mock in tests.
pub struct TagManager<'a, S: RevisionStore + ?Sized> {
    store: &'a S,
    pattern: TagPattern,
}

impl<'a, S: RevisionStore + ?Sized> TagManager<'a, S> {
    pub fn new(store: &'a S, pattern: TagPattern) -> Self {
        TagManager { store, pattern }
    }

    /// Map of commit id to the tag name pointing at it.
    ///
    /// When several tags point at the same commit the first listed wins.
    fn tag_targets(&self) -> Result<HashMap<String, String>> {
        let mut targets = HashMap::new();
        for name in self.store.list_tags()? {
            if let Some(revision) = self.store.tag_target(&name)? {
                targets.entry(revision.id).or_insert(name);
            }
        }
        Ok(targets)
    }

    /// Finds the latest release tag.
    ///
    /// Walks the commit history from HEAD backwards and returns the first
    /// tagged revision. This is creation-order resolution: the nearest
    /// reachable tag wins, never the semver-highest one.
    ///
    /// # Returns
    /// * `Ok(Some(tag))` - The latest tag reachable from HEAD
    /// * `Ok(None)` - If no tags exist; signals the first-release state
    pub fn latest_tag(&self) -> Result<Option<Tag>> {
        let targets = self.tag_targets()?;
        if targets.is_empty() {
            return Ok(None);
        }

        let head = self.store.head()?;
        for revision in self.store.commits_between(None, &head.id)? {
            if let Some(name) = targets.get(&revision.id) {
                debug!("latest tag is {} at {}", name, revision.short_id);
                return Ok(Some(Tag {
                    name: name.clone(),
                    target: revision,
                }));
            }
        }

        Ok(None)
    }

    /// Finds the release boundary immediately preceding `tag`.
    ///
    /// Walks backwards from the tag's target, skipping the target itself,
    /// and returns the nearest ancestor tag. A repository whose first tag
    /// this is yields `Ok(None)`, never an error; the changelog then covers
    /// the full history up to the tag.
    pub fn previous_tag(&self, tag: &Tag) -> Result<Option<Tag>> {
        let targets = self.tag_targets()?;

        for revision in self
            .store
            .commits_between(None, &tag.target.id)?
            .into_iter()
            .skip(1)
        {
            if let Some(name) = targets.get(&revision.id) {
                return Ok(Some(Tag {
                    name: name.clone(),
                    target: revision,
                }));
            }
        }

        Ok(None)
    }

    /// Resolve a tag by exact name.
    ///
    /// # Returns
    /// * `Ok(Tag)` - The tag and its target revision
    /// * `Err` - `TagNotFound` when the name is absent
    pub fn resolve(&self, name: &str) -> Result<Tag> {
        match self.store.tag_target(name)? {
            Some(target) => Ok(Tag {
                name: name.to_string(),
                target,
            }),
            None => Err(GitReleaseError::tag_not_found(name)),
        }
    }

    /// Creates the annotated release tag for `version` at `target`.
    ///
    /// Tag creation is local only; pushing to a remote is an explicit
    /// external step.
    ///
    /// # Returns
    /// * `Ok(Tag)` - The created tag
    /// * `Err` - `TagExists` if the exact name is already present
    pub fn create_tag(&self, version: &Version, target: &Revision) -> Result<Tag> {
        let name = self.pattern.format(version);
        if self.store.tag_target(&name)?.is_some() {
            return Err(GitReleaseError::tag_exists(&name));
        }

        let message = format!("Release {}", name);
        self.store.create_tag(&name, &target.id, &message)?;
        debug!("created tag {} at {}", name, target.short_id);

        Ok(Tag {
            name,
            target: target.clone(),
        })
    }
}
