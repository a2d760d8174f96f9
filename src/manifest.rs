use log::{debug, info};
use std::fs;
use std::ops::Range;
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::error::{GitReleaseError, Result};
use crate::version::{parse_version, Version};

/// Pattern for the single version-declaration line in the manifest.
/// Anything other than exactly one matching line is rejected.
const VERSION_LINE: &str = r#"(?m)^version\s*=\s*"(\d+\.\d+\.\d+)"\s*$"#;

/// Rewrites the manifest's version field and refreshes the derived lock
/// artifact.
///
/// The updater only ever touches the version digits inside the one
/// version-declaration line; the rest of the manifest passes through
/// byte-for-byte.
pub struct ManifestUpdater {
    manifest_path: PathBuf,
    lock_path: Option<PathBuf>,
    lock_command: Vec<String>,
}

impl ManifestUpdater {
    pub fn new(
        manifest_path: PathBuf,
        lock_path: Option<PathBuf>,
        lock_command: Vec<String>,
    ) -> Self {
        ManifestUpdater {
            manifest_path,
            lock_path,
            lock_command,
        }
    }

    /// Paths to stage for the bump commit: the manifest, plus the lock
    /// artifact when one is configured.
    pub fn staged_paths(&self) -> Vec<&Path> {
        let mut paths = vec![self.manifest_path.as_path()];
        if let Some(lock_path) = &self.lock_path {
            paths.push(lock_path.as_path());
        }
        paths
    }

    /// Locates the single version line in the manifest text.
    ///
    /// # Returns
    /// * `Ok((range, version))` - Byte range of the version digits and their text
    /// * `Err` - `ManifestFormat` when zero or more than one line matches
    fn version_field(&self, text: &str) -> Result<(Range<usize>, String)> {
        let re = regex::Regex::new(VERSION_LINE)
            .map_err(|e| GitReleaseError::manifest(e.to_string()))?;

        let mut fields = Vec::new();
        for captures in re.captures_iter(text) {
            let group = captures.get(1).ok_or_else(|| {
                GitReleaseError::manifest("version line is missing its value")
            })?;
            fields.push((group.range(), group.as_str().to_string()));
        }

        match fields.len() {
            1 => Ok(fields.remove(0)),
            0 => Err(GitReleaseError::manifest(format!(
                "no version line found in {}",
                self.manifest_path.display()
            ))),
            n => Err(GitReleaseError::manifest(format!(
                "{} version lines found in {}; refusing to guess which one to update",
                n,
                self.manifest_path.display()
            ))),
        }
    }

    /// Reads the current version from the manifest.
    pub fn current_version(&self) -> Result<Version> {
        let text = fs::read_to_string(&self.manifest_path)?;
        let (_, raw) = self.version_field(&text)?;
        parse_version(&raw)
    }

    /// Substitutes the version digits in the single version line and writes
    /// the manifest back.
    pub fn apply(&self, new_version: &Version) -> Result<()> {
        let mut text = fs::read_to_string(&self.manifest_path)?;
        let (range, old) = self.version_field(&text)?;

        text.replace_range(range, &new_version.to_string());
        fs::write(&self.manifest_path, text)?;

        info!(
            "{}: version {} set to {}",
            self.manifest_path.display(),
            old,
            new_version
        );
        Ok(())
    }

    /// Regenerates the lock artifact via the configured build tool command.
    ///
    /// A no-op when no lock artifact is configured. A failing command is
    /// fatal: the bump must never commit a manifest/lock mismatch.
    pub fn refresh_lock(&self) -> Result<()> {
        let lock_path = match &self.lock_path {
            Some(lock_path) => lock_path,
            None => return Ok(()),
        };

        let (program, args) = match self.lock_command.split_first() {
            Some(split) => split,
            None => return Err(GitReleaseError::lock("empty lock refresh command")),
        };

        debug!(
            "refreshing {} with {:?}",
            lock_path.display(),
            self.lock_command
        );

        let mut command = Command::new(program);
        command.args(args);
        // Run next to the manifest, not wherever the process happens to be
        if let Some(dir) = self
            .manifest_path
            .parent()
            .filter(|dir| !dir.as_os_str().is_empty())
        {
            command.current_dir(dir);
        }

        let output = command.output().map_err(|e| {
            GitReleaseError::lock(format!("failed to execute '{}': {}", program, e))
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(GitReleaseError::lock(format!(
                "'{}' exited with code {}: {}",
                program,
                output.status.code().unwrap_or(-1),
                stderr.trim()
            )));
        }

        Ok(())
    }
}
