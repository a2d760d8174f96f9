use log::debug;

use crate::config::ChangelogConfig;
use crate::error::Result;
use crate::git::{Revision, RevisionStore};
use crate::tags::Tag;

/// Maximum number of commits listed inline for a first release; the rest is
/// summarized as "... and N more commits".
const INLINE_COMMIT_CAP: usize = 10;

/// Placeholder line for a section with nothing to report, so an empty
/// section is never mistaken for a truncated document.
const EMPTY_SECTION: &str = "- None\n";

/// Changelog section derived from commit-subject keywords.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Feature,
    Fix,
    Performance,
    Uncategorized,
}

impl Category {
    /// Section heading in the rendered document
    pub fn heading(&self) -> &'static str {
        match self {
            Category::Feature => "Features",
            Category::Fix => "Fixes",
            Category::Performance => "Performance",
            Category::Uncategorized => "Other changes",
        }
    }
}

/// Classifies a commit into changelog sections.
///
/// The keyword tests are independent and case-insensitive, so one commit may
/// land in several sections. Merge commits are never categorized. A commit
/// matching no keyword is Uncategorized.
pub fn classify(revision: &Revision, config: &ChangelogConfig) -> Vec<Category> {
    if revision.is_merge() {
        return vec![Category::Uncategorized];
    }

    let subject = revision.subject.to_lowercase();
    let mut categories = Vec::new();

    if config
        .feature_keywords
        .iter()
        .any(|keyword| subject.contains(keyword.as_str()))
    {
        categories.push(Category::Feature);
    }
    if config
        .fix_keywords
        .iter()
        .any(|keyword| subject.contains(keyword.as_str()))
    {
        categories.push(Category::Fix);
    }
    if config
        .performance_keywords
        .iter()
        .any(|keyword| subject.contains(keyword.as_str()))
    {
        categories.push(Category::Performance);
    }

    if categories.is_empty() {
        categories.push(Category::Uncategorized);
    }
    categories
}

/// Renders the changelog document for a release range.
///
/// The document is assembled fully in memory and only handed back when every
/// underlying history query succeeded; a partial changelog is never
/// produced.
pub struct ChangelogGenerator<'a, S: RevisionStore + ?Sized> {
    store: &'a S,
    config: &'a ChangelogConfig,
}

impl<'a, S: RevisionStore + ?Sized> ChangelogGenerator<'a, S> {
    pub fn new(store: &'a S, config: &'a ChangelogConfig) -> Self {
        ChangelogGenerator { store, config }
    }

    /// Renders the full document.
    ///
    /// # Arguments
    /// * `lower` - Previous release boundary, exclusive; `None` means no
    ///   release has happened yet and the whole history is covered
    /// * `upper` - Release revision, inclusive
    /// * `title` - Document title, normally the release tag name
    pub fn generate(&self, lower: Option<&Tag>, upper: &Revision, title: &str) -> Result<String> {
        let lower_id = lower.map(|tag| tag.target.id.as_str());
        let commits = self.store.commits_between(lower_id, &upper.id)?;
        debug!("changelog for {} covers {} commits", title, commits.len());

        let mut doc = String::new();
        doc.push_str(&format!("# Changelog for {}\n\n", title));

        match lower {
            None => self.render_first_release(&mut doc, &commits),
            Some(tag) => self.render_range(&mut doc, tag, &commits),
        }

        self.render_files(&mut doc, lower_id, upper)?;
        self.render_categories(&mut doc, &commits);

        Ok(doc)
    }

    /// Commit listing for a repository that has never been released:
    /// oldest first, capped, with an accurate remainder count.
    fn render_first_release(&self, doc: &mut String, commits: &[Revision]) {
        doc.push_str("First release: the log below covers the full project history.\n\n");
        doc.push_str("## Commits\n\n");

        let total = commits.len();
        if total == 0 {
            doc.push_str(EMPTY_SECTION);
        }
        // Native order is newest first; a first release reads oldest first
        for revision in commits.iter().rev().take(INLINE_COMMIT_CAP) {
            doc.push_str(&commit_line(revision));
        }
        if total > INLINE_COMMIT_CAP {
            doc.push_str(&format!(
                "... and {} more commits\n",
                total - INLINE_COMMIT_CAP
            ));
        }
        doc.push('\n');
    }

    /// Commit listing between two releases, uncapped, in native order.
    fn render_range(&self, doc: &mut String, lower: &Tag, commits: &[Revision]) {
        doc.push_str(&format!("Changes since {}.\n\n", lower.name));
        doc.push_str("## Commits\n\n");

        if commits.is_empty() {
            doc.push_str(EMPTY_SECTION);
        }
        for revision in commits {
            doc.push_str(&commit_line(revision));
        }
        doc.push('\n');
    }

    /// Changed-file list plus one diff block per source file.
    ///
    /// Every listed source file gets a block: either the rendered patch or
    /// the literal "No changes" when the store cannot resolve a diff, so the
    /// file list and the blocks stay in a 1:1 mapping.
    fn render_files(
        &self,
        doc: &mut String,
        lower_id: Option<&str>,
        upper: &Revision,
    ) -> Result<()> {
        let mut files = self.store.changed_files(lower_id, &upper.id)?;
        files.sort();
        files.dedup();

        doc.push_str("## Changed files\n\n");
        if files.is_empty() {
            doc.push_str(EMPTY_SECTION);
        }
        for file in &files {
            doc.push_str(&format!("- {}\n", file));
        }
        doc.push('\n');

        let suffix = format!(".{}", self.config.source_extension);
        let source_files: Vec<&String> =
            files.iter().filter(|file| file.ends_with(&suffix)).collect();

        doc.push_str("## Source changes\n\n");
        if source_files.is_empty() {
            doc.push_str(EMPTY_SECTION);
            doc.push('\n');
        }
        for file in source_files {
            doc.push_str(&format!("### {}\n\n", file));
            match self.store.diff_file(lower_id, &upper.id, file)? {
                Some(patch) => {
                    doc.push_str("```diff\n");
                    doc.push_str(&patch);
                    if !patch.ends_with('\n') {
                        doc.push('\n');
                    }
                    doc.push_str("```\n\n");
                }
                None => doc.push_str("No changes\n\n"),
            }
        }

        Ok(())
    }

    /// One section per category, each with a placeholder when empty.
    fn render_categories(&self, doc: &mut String, commits: &[Revision]) {
        let sections = [
            Category::Feature,
            Category::Fix,
            Category::Performance,
            Category::Uncategorized,
        ];

        for category in sections {
            doc.push_str(&format!("## {}\n\n", category.heading()));
            let mut empty = true;
            for revision in commits {
                if classify(revision, self.config).contains(&category) {
                    doc.push_str(&commit_line(revision));
                    empty = false;
                }
            }
            if empty {
                doc.push_str(EMPTY_SECTION);
            }
            doc.push('\n');
        }
    }
}

fn commit_line(revision: &Revision) -> String {
    format!(
        "- {} {} ({})\n",
        revision.short_id, revision.subject, revision.author
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn revision(subject: &str, parents: usize) -> Revision {
        Revision {
            id: "aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa".to_string(),
            short_id: "aaaaaaa".to_string(),
            subject: subject.to_string(),
            author: "Test Author".to_string(),
            timestamp: 0,
            parent_ids: (0..parents).map(|i| format!("p{}", i)).collect(),
        }
    }

    #[test]
    fn test_classify_fix_subject() {
        let config = ChangelogConfig::default();
        let categories = classify(&revision("Fix: resolve off-by-one in parser", 1), &config);
        assert_eq!(categories, vec![Category::Fix]);
    }

    #[test]
    fn test_classify_feature_subject() {
        let config = ChangelogConfig::default();
        let categories = classify(&revision("feat: add new tracer", 1), &config);
        assert_eq!(categories, vec![Category::Feature]);
    }

    #[test]
    fn test_classify_multiple_sections() {
        let config = ChangelogConfig::default();
        let categories = classify(&revision("fix perf regression in new parser", 1), &config);
        assert!(categories.contains(&Category::Fix));
        assert!(categories.contains(&Category::Performance));
        // "new" also places it in Features; membership is not exclusive
        assert!(categories.contains(&Category::Feature));
    }

    #[test]
    fn test_classify_is_case_insensitive() {
        let config = ChangelogConfig::default();
        let categories = classify(&revision("FIX THE BUILD ERROR", 1), &config);
        assert_eq!(categories, vec![Category::Fix]);
    }

    #[test]
    fn test_classify_merge_commit_is_uncategorized() {
        let config = ChangelogConfig::default();
        let categories = classify(&revision("Merge branch 'feat/tracing'", 2), &config);
        assert_eq!(categories, vec![Category::Uncategorized]);
    }

    #[test]
    fn test_classify_unmatched_subject_is_uncategorized() {
        let config = ChangelogConfig::default();
        let categories = classify(&revision("chore: tidy imports", 1), &config);
        assert_eq!(categories, vec![Category::Uncategorized]);
    }

    #[test]
    fn test_category_headings() {
        assert_eq!(Category::Feature.heading(), "Features");
        assert_eq!(Category::Uncategorized.heading(), "Other changes");
    }
}
