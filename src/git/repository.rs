use git2::{Oid, Repository};
use log::debug;
use std::collections::HashMap;
use std::path::Path;

use crate::error::{GitReleaseError, Result};
use crate::git::{Revision, RevisionStore};

/// Wrapper around git2::Repository with our trait interface
pub struct Git2Store {
    repo: Repository,
    identity: Option<(String, String)>,
}

impl Git2Store {
    /// Open or discover a git repository starting at `path`.
    ///
    /// The optional identity pair (name, email) overrides the repository's
    /// own signature configuration for commits and tags created by this
    /// store.
    pub fn discover<P: AsRef<Path>>(path: P, identity: Option<(String, String)>) -> Result<Self> {
        let repo = Repository::discover(path)?;

        Ok(Git2Store { repo, identity })
    }

    /// Create from an existing git2::Repository
    pub fn from_git2(repo: Repository) -> Self {
        Git2Store {
            repo,
            identity: None,
        }
    }

    fn signature(&self) -> Result<git2::Signature<'_>> {
        match &self.identity {
            Some((name, email)) => Ok(git2::Signature::now(name, email)?),
            None => Ok(self.repo.signature()?),
        }
    }

    fn describe(&self, commit: &git2::Commit) -> Revision {
        let id = commit.id().to_string();
        let short_id = id.chars().take(7).collect();

        Revision {
            id,
            short_id,
            subject: commit.summary().unwrap_or("(no subject)").to_string(),
            author: commit.author().name().unwrap_or("unknown").to_string(),
            timestamp: commit.time().seconds(),
            parent_ids: commit.parent_ids().map(|p| p.to_string()).collect(),
        }
    }

    fn parse_oid(&self, id: &str) -> Result<Oid> {
        Oid::from_str(id)
            .map_err(|e| GitReleaseError::revision(format!("invalid revision id '{}': {}", id, e)))
    }

    fn commit_tree(&self, id: &str) -> Result<git2::Tree<'_>> {
        let oid = self.parse_oid(id)?;
        let commit = self
            .repo
            .find_commit(oid)
            .map_err(|e| GitReleaseError::revision(format!("cannot read revision {}: {}", id, e)))?;
        let tree = commit
            .tree()
            .map_err(|e| GitReleaseError::revision(format!("cannot read tree of {}: {}", id, e)))?;
        Ok(tree)
    }

    fn diff_between(
        &self,
        from: Option<&str>,
        to: &str,
        path: Option<&str>,
    ) -> Result<git2::Diff<'_>> {
        let new_tree = self.commit_tree(to)?;
        let old_tree = match from {
            Some(id) => Some(self.commit_tree(id)?),
            None => None,
        };

        let mut options = git2::DiffOptions::new();
        if let Some(path) = path {
            options.pathspec(path);
        }

        let diff = self
            .repo
            .diff_tree_to_tree(old_tree.as_ref(), Some(&new_tree), Some(&mut options))
            .map_err(|e| GitReleaseError::revision(format!("diff failed: {}", e)))?;
        Ok(diff)
    }
}

impl RevisionStore for Git2Store {
    fn head(&self) -> Result<Revision> {
        let commit = self
            .repo
            .head()
            .and_then(|head| head.peel_to_commit())
            .map_err(|e| GitReleaseError::revision(format!("cannot resolve HEAD: {}", e)))?;

        Ok(self.describe(&commit))
    }

    fn list_tags(&self) -> Result<Vec<String>> {
        let tags = self.repo.tag_names(None)?;

        Ok(tags.iter().flatten().map(|s| s.to_string()).collect())
    }

    fn tag_target(&self, name: &str) -> Result<Option<Revision>> {
        let reference_name = format!("refs/tags/{}", name);

        match self.repo.find_reference(&reference_name) {
            Ok(reference) => {
                let commit = reference.peel_to_commit().map_err(|e| {
                    GitReleaseError::revision(format!("cannot peel tag '{}': {}", name, e))
                })?;

                Ok(Some(self.describe(&commit)))
            }
            Err(e) if e.code() == git2::ErrorCode::NotFound => Ok(None),
            Err(e) => Err(GitReleaseError::revision(format!(
                "cannot resolve tag '{}': {}",
                name, e
            ))),
        }
    }

    fn commits_between(&self, from: Option<&str>, to: &str) -> Result<Vec<Revision>> {
        let to_oid = self.parse_oid(to)?;

        let mut revwalk = self.repo.revwalk()?;
        revwalk.push(to_oid)?;
        if let Some(from) = from {
            let from_oid = self.parse_oid(from)?;
            revwalk.hide(from_oid)?;
        }

        let mut revisions = Vec::new();
        for oid in revwalk {
            let oid =
                oid.map_err(|e| GitReleaseError::revision(format!("history walk failed: {}", e)))?;
            let commit = self.repo.find_commit(oid).map_err(|e| {
                GitReleaseError::revision(format!("cannot read revision {}: {}", oid, e))
            })?;
            revisions.push(self.describe(&commit));
        }

        debug!(
            "enumerated {} commits in {:?}..{}",
            revisions.len(),
            from,
            to
        );
        Ok(revisions)
    }

    fn changed_files(&self, from: Option<&str>, to: &str) -> Result<Vec<String>> {
        let diff = self.diff_between(from, to, None)?;

        let mut files = Vec::new();
        for delta in diff.deltas() {
            for file in [delta.old_file(), delta.new_file()] {
                if let Some(path) = file.path() {
                    files.push(path.to_string_lossy().into_owned());
                }
            }
        }
        files.sort();
        files.dedup();

        Ok(files)
    }

    fn diff_file(&self, from: Option<&str>, to: &str, path: &str) -> Result<Option<String>> {
        let diff = self.diff_between(from, to, Some(path))?;

        if diff.num_deltas() == 0 {
            return Ok(None);
        }

        let mut binary = false;
        let mut text = String::new();
        diff.print(git2::DiffFormat::Patch, |_delta, _hunk, line| {
            match line.origin() {
                '+' | '-' | ' ' => {
                    text.push(line.origin());
                    text.push_str(&String::from_utf8_lossy(line.content()));
                }
                // "Binary files differ" marker; the path has no renderable diff
                'B' => binary = true,
                _ => text.push_str(&String::from_utf8_lossy(line.content())),
            }
            true
        })
        .map_err(|e| GitReleaseError::revision(format!("cannot render diff of {}: {}", path, e)))?;

        if binary || text.is_empty() {
            Ok(None)
        } else {
            Ok(Some(text))
        }
    }

    fn create_tag(&self, name: &str, target: &str, message: &str) -> Result<()> {
        let oid = self.parse_oid(target)?;
        let object = self
            .repo
            .find_object(oid, None)
            .map_err(|e| GitReleaseError::revision(format!("cannot find object: {}", e)))?;
        let tagger = self.signature()?;

        match self.repo.tag(name, &object, &tagger, message, false) {
            Ok(_) => Ok(()),
            Err(e) if e.code() == git2::ErrorCode::Exists => {
                Err(GitReleaseError::tag_exists(name))
            }
            Err(e) => Err(e.into()),
        }
    }

    fn commit_files(&self, paths: &[&Path], message: &str) -> Result<String> {
        let mut index = self.repo.index()?;
        for path in paths {
            index.add_path(path)?;
        }
        index.write()?;

        let tree_id = index.write_tree()?;
        let tree = self.repo.find_tree(tree_id)?;
        let signature = self.signature()?;

        // First commit on an unborn branch has no parent
        let parent = self
            .repo
            .head()
            .ok()
            .and_then(|head| head.peel_to_commit().ok());
        let parents: Vec<&git2::Commit> = parent.iter().collect();

        let oid = self
            .repo
            .commit(Some("HEAD"), &signature, &signature, message, &tree, &parents)?;

        debug!("created commit {} ({:?})", oid, message.lines().next());
        Ok(oid.to_string())
    }

    fn rewrite_messages(&self, transform: &dyn Fn(&str) -> String) -> Result<usize> {
        let mut revwalk = self
            .repo
            .revwalk()
            .map_err(|e| GitReleaseError::rewrite(e.to_string()))?;
        revwalk
            .set_sorting(git2::Sort::TOPOLOGICAL | git2::Sort::REVERSE)
            .map_err(|e| GitReleaseError::rewrite(e.to_string()))?;

        // Every reference roots the walk, so the whole reachable history is
        // covered in one pass
        for reference in self
            .repo
            .references()
            .map_err(|e| GitReleaseError::rewrite(e.to_string()))?
        {
            let reference = reference.map_err(|e| GitReleaseError::rewrite(e.to_string()))?;
            if let Ok(commit) = reference.peel_to_commit() {
                revwalk
                    .push(commit.id())
                    .map_err(|e| GitReleaseError::rewrite(e.to_string()))?;
            }
        }

        let mut rewritten: HashMap<Oid, Oid> = HashMap::new();
        let mut changed = 0usize;

        for oid in revwalk {
            let oid = oid.map_err(|e| GitReleaseError::rewrite(e.to_string()))?;
            let commit = self
                .repo
                .find_commit(oid)
                .map_err(|e| GitReleaseError::rewrite(format!("cannot read {}: {}", oid, e)))?;

            let message = commit.message().unwrap_or("");
            let new_message = transform(message);

            // Parents-first order guarantees every parent is already mapped
            let parent_oids: Vec<Oid> = commit
                .parent_ids()
                .map(|p| rewritten.get(&p).copied().unwrap_or(p))
                .collect();
            let mut parents = Vec::with_capacity(parent_oids.len());
            for parent_oid in &parent_oids {
                let parent = self.repo.find_commit(*parent_oid).map_err(|e| {
                    GitReleaseError::rewrite(format!("cannot read parent {}: {}", parent_oid, e))
                })?;
                parents.push(parent);
            }
            let parent_refs: Vec<&git2::Commit> = parents.iter().collect();

            let tree = commit
                .tree()
                .map_err(|e| GitReleaseError::rewrite(e.to_string()))?;
            let author = commit.author();
            let committer = commit.committer();

            // Unchanged message and parents reproduce the identical object id
            let new_oid = self
                .repo
                .commit(None, &author, &committer, &new_message, &tree, &parent_refs)
                .map_err(|e| GitReleaseError::rewrite(format!("cannot rewrite {}: {}", oid, e)))?;

            if new_oid != oid {
                changed += 1;
            }
            rewritten.insert(oid, new_oid);
        }

        // Re-point local branches at their rewritten commits. Tags and
        // remote-tracking references are left stale; repairing them is the
        // operator's job.
        let branches = self
            .repo
            .branches(Some(git2::BranchType::Local))
            .map_err(|e| GitReleaseError::rewrite(e.to_string()))?;
        for branch in branches {
            let (branch, _) = branch.map_err(|e| GitReleaseError::rewrite(e.to_string()))?;
            let target = match branch.get().target() {
                Some(target) => target,
                None => continue,
            };
            if let Some(new_target) = rewritten.get(&target) {
                if *new_target != target {
                    let mut reference = branch.into_reference();
                    reference
                        .set_target(*new_target, "git-release history rewrite")
                        .map_err(|e| GitReleaseError::rewrite(e.to_string()))?;
                }
            }
        }

        debug!("history rewrite changed {} commits", changed);
        Ok(changed)
    }
}

// SAFETY: Git2Store wraps git2::Repository which is Send + Sync.
// git2 library is thread-safe for read operations via libgit2's thread-safe design.
unsafe impl Sync for Git2Store {}
