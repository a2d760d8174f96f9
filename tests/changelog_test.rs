use git_release::changelog::ChangelogGenerator;
use git_release::config::ChangelogConfig;
use git_release::git::{MockStore, RevisionStore};
use git_release::tags::{Tag, TagPattern, TagManager};

// ============================================================================
// Helpers
// ============================================================================

fn linear_store(subjects: &[&str]) -> MockStore {
    let mut store = MockStore::new();
    for (i, subject) in subjects.iter().enumerate() {
        store.add_linear_commit(format!("c{:02}", i), *subject);
    }
    store
}

fn generate(store: &MockStore, lower: Option<&Tag>, title: &str) -> String {
    let config = ChangelogConfig::default();
    let generator = ChangelogGenerator::new(store, &config);
    let head = store.head().unwrap();
    generator
        .generate(lower, &head, title)
        .expect("changelog generation should succeed")
}

fn tag_at(store: &MockStore, name: &str) -> Tag {
    let manager = TagManager::new(store, TagPattern::new("v{version}"));
    manager.resolve(name).expect("tag should resolve")
}

// ============================================================================
// First-release mode
// ============================================================================

#[test]
fn test_first_release_framing_and_cap() {
    let subjects: Vec<String> = (0..12).map(|i| format!("commit number {}", i)).collect();
    let refs: Vec<&str> = subjects.iter().map(|s| s.as_str()).collect();
    let store = linear_store(&refs);

    let doc = generate(&store, None, "unreleased");

    assert!(doc.contains("# Changelog for unreleased"));
    assert!(doc.contains("First release"));
    // 12 commits, cap of 10, remainder of exactly 2
    assert!(
        doc.contains("... and 2 more commits"),
        "remainder suffix missing or wrong, got:\n{}",
        doc
    );
    // Oldest first: commit 0 is listed, the two newest sit behind the cap
    let commits_section = section(&doc, "## Commits");
    assert!(commits_section.contains("commit number 0"));
    assert!(!commits_section.contains("commit number 10"));
    assert!(!commits_section.contains("commit number 11"));
}

#[test]
fn test_first_release_no_suffix_at_or_below_cap() {
    let subjects: Vec<String> = (0..10).map(|i| format!("commit number {}", i)).collect();
    let refs: Vec<&str> = subjects.iter().map(|s| s.as_str()).collect();
    let store = linear_store(&refs);

    let doc = generate(&store, None, "unreleased");

    // total == cap must not produce "and 0 more" (or anything negative)
    assert!(!doc.contains("more commits"), "got:\n{}", doc);
    assert!(doc.contains("commit number 9"));
}

#[test]
fn test_first_release_lists_oldest_first() {
    let store = linear_store(&["the oldest commit", "the middle commit", "the newest commit"]);

    let doc = generate(&store, None, "unreleased");

    let oldest = doc.find("the oldest commit").unwrap();
    let newest = doc.find("the newest commit").unwrap();
    assert!(
        oldest < newest,
        "first-release listing should read oldest first:\n{}",
        doc
    );
}

// ============================================================================
// Range mode
// ============================================================================

#[test]
fn test_range_mode_lists_only_commits_after_the_boundary() {
    let mut store = linear_store(&["ancient work", "boundary commit", "recent work"]);
    store.add_tag("v0.1.0", "c01");

    let lower = tag_at(&store, "v0.1.0");
    let doc = generate(&store, Some(&lower), "v0.2.0");

    assert!(doc.contains("Changes since v0.1.0"));
    assert!(doc.contains("recent work"));
    // The boundary and everything below it stay out of the commit list
    assert!(!doc.contains("boundary commit"));
    assert!(!doc.contains("ancient work"));
}

#[test]
fn test_range_mode_is_uncapped() {
    let subjects: Vec<String> = (0..15).map(|i| format!("ranged commit {}", i)).collect();
    let mut refs: Vec<&str> = vec!["boundary commit"];
    refs.extend(subjects.iter().map(|s| s.as_str()));
    let mut store = linear_store(&refs);
    store.add_tag("v1.0.0", "c00");

    let lower = tag_at(&store, "v1.0.0");
    let doc = generate(&store, Some(&lower), "v1.1.0");

    assert!(!doc.contains("more commits"));
    assert!(doc.contains("ranged commit 0"));
    assert!(doc.contains("ranged commit 14"));
}

#[test]
fn test_empty_range_renders_placeholder() {
    let mut store = linear_store(&["only commit"]);
    store.add_tag("v1.0.0", "c00");

    let lower = tag_at(&store, "v1.0.0");
    let doc = generate(&store, Some(&lower), "v1.0.1");

    assert!(doc.contains("## Commits\n\n- None"), "got:\n{}", doc);
}

// ============================================================================
// Category sections
// ============================================================================

#[test]
fn test_category_sections_with_placeholders() {
    let store = linear_store(&["chore: tidy imports"]);

    let doc = generate(&store, None, "unreleased");

    assert!(doc.contains("## Features\n\n- None"));
    assert!(doc.contains("## Fixes\n\n- None"));
    assert!(doc.contains("## Performance\n\n- None"));
    assert!(doc.contains("## Other changes\n\n- c00 chore: tidy imports"));
}

#[test]
fn test_commit_may_appear_in_multiple_sections() {
    let store = linear_store(&["fix perf regression in new parser"]);

    let doc = generate(&store, None, "unreleased");

    let fixes = doc.find("## Fixes").unwrap();
    let performance = doc.find("## Performance").unwrap();
    let subject_hits = doc.matches("fix perf regression in new parser").count();
    // Commit list, Features ("new"), Fixes, and Performance all list it
    assert!(subject_hits >= 3, "got {} hits in:\n{}", subject_hits, doc);
    assert!(fixes < performance);
}

#[test]
fn test_fix_and_feature_classification_in_document() {
    let store = linear_store(&[
        "Fix: resolve off-by-one in parser",
        "feat: add new tracer",
    ]);

    let doc = generate(&store, None, "unreleased");

    let features_section = section(&doc, "## Features");
    let fixes_section = section(&doc, "## Fixes");
    assert!(features_section.contains("feat: add new tracer"));
    assert!(fixes_section.contains("Fix: resolve off-by-one in parser"));
    assert!(!fixes_section.contains("feat: add new tracer"));
}

#[test]
fn test_merge_commits_are_not_categorized() {
    let mut store = linear_store(&["fix: real fix work"]);
    // A merge whose subject matches the fix keywords anyway
    store.add_commit(git_release::git::Revision {
        id: "m1".to_string(),
        short_id: "m1".to_string(),
        subject: "Merge fix branch into main".to_string(),
        author: "Test Author".to_string(),
        timestamp: 99,
        parent_ids: vec!["c00".to_string(), "x9".to_string()],
    });

    let doc = generate(&store, None, "unreleased");

    let fixes_section = section(&doc, "## Fixes");
    assert!(fixes_section.contains("real fix work"));
    assert!(!fixes_section.contains("Merge fix branch"));
    let other_section = section(&doc, "## Other changes");
    assert!(other_section.contains("Merge fix branch"));
}

// ============================================================================
// Changed files and diff blocks
// ============================================================================

#[test]
fn test_changed_files_are_sorted_and_source_blocks_match() {
    let mut store = linear_store(&["feat: add parser"]);
    store.set_diff("src/parser.rs", Some("@@ -0,0 +1 @@\n+fn parse() {}\n"));
    store.set_diff("src/lib.rs", Some("@@ -1 +1 @@\n-old\n+new\n"));
    store.set_diff("README.md", Some("@@ -1 +1 @@\n-a\n+b\n"));

    let doc = generate(&store, None, "unreleased");

    // Lexically sorted file list
    let readme = doc.find("- README.md").unwrap();
    let lib = doc.find("- src/lib.rs").unwrap();
    let parser = doc.find("- src/parser.rs").unwrap();
    assert!(readme < lib && lib < parser);

    // Only source files get diff blocks
    assert!(doc.contains("### src/lib.rs"));
    assert!(doc.contains("### src/parser.rs"));
    assert!(!doc.contains("### README.md"));
    assert!(doc.contains("+fn parse() {}"));
}

#[test]
fn test_unresolvable_diff_renders_no_changes_block() {
    let mut store = linear_store(&["chore: vendor a binary"]);
    store.set_diff("src/good.rs", Some("@@ -1 +1 @@\n-x\n+y\n"));
    store.set_diff("src/binary_blob.rs", None);

    let doc = generate(&store, None, "unreleased");

    // 1:1 mapping: the unresolvable file still gets its block
    assert!(doc.contains("### src/binary_blob.rs\n\nNo changes"));
    assert!(doc.contains("### src/good.rs\n\n```diff"));
}

#[test]
fn test_no_changed_files_renders_placeholders() {
    let store = linear_store(&["docs: clarify usage"]);

    let doc = generate(&store, None, "unreleased");

    assert!(doc.contains("## Changed files\n\n- None"));
    assert!(doc.contains("## Source changes\n\n- None"));
}

// ============================================================================
// Failure propagation
// ============================================================================

#[test]
fn test_unknown_upper_bound_is_fatal() {
    let store = linear_store(&["only commit"]);
    let config = ChangelogConfig::default();
    let generator = ChangelogGenerator::new(&store, &config);

    let ghost = git_release::git::Revision {
        id: "does-not-exist".to_string(),
        short_id: "does-no".to_string(),
        subject: "ghost".to_string(),
        author: "nobody".to_string(),
        timestamp: 0,
        parent_ids: vec![],
    };
    let result = generator.generate(None, &ghost, "v1.0.0");
    assert!(result.is_err(), "a failing history query must abort generation");
}

fn section<'a>(doc: &'a str, heading: &str) -> &'a str {
    let start = doc.find(heading).expect("section heading missing");
    let rest = &doc[start + heading.len()..];
    match rest.find("\n## ") {
        Some(end) => &rest[..end],
        None => rest,
    }
}
