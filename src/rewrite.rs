use log::info;

use crate::error::{GitReleaseError, Result};
use crate::git::RevisionStore;

/// Upper bound, in bytes, for a normalized subject line.
const SUBJECT_LIMIT: usize = 60;

/// Default message transform: lowercase the subject line, truncate it to at
/// most 60 bytes, and re-append every remaining line unchanged.
///
/// Truncation is byte-based and makes no attempt to land on a character
/// boundary; a multi-byte character torn at the limit is dropped. Applying
/// the transform twice yields the same text as applying it once.
pub fn normalize_message(message: &str) -> String {
    let (subject, rest) = match message.split_once('\n') {
        Some((subject, rest)) => (subject, Some(rest)),
        None => (message, None),
    };

    let lowered = subject.to_lowercase();
    let truncated = if lowered.len() > SUBJECT_LIMIT {
        let mut cut = String::from_utf8_lossy(&lowered.as_bytes()[..SUBJECT_LIMIT]).into_owned();
        if cut.ends_with('\u{FFFD}') {
            cut.pop();
        }
        cut
    } else {
        lowered
    };

    match rest {
        Some(rest) => format!("{}\n{}", truncated, rest),
        None => truncated,
    }
}

/// Rewrites every reachable commit message with a single consistent
/// transform.
///
/// Destructive and irreversible without a separate backup: commit identity
/// changes transitively for every descendant of the earliest rewritten
/// commit, and existing tags pointing into the range go stale. This type
/// never repairs stale references.
pub struct HistoryRewriter<'a, S: RevisionStore + ?Sized> {
    store: &'a S,
}

impl<'a, S: RevisionStore + ?Sized> HistoryRewriter<'a, S> {
    pub fn new(store: &'a S) -> Self {
        HistoryRewriter { store }
    }

    /// Applies `transform` to every commit reachable from every reference,
    /// in one pass. Partial or interactive rewriting is not supported; a
    /// failure partway surfaces as `RewriteAborted`.
    ///
    /// # Returns
    /// * `Ok(usize)` - Number of commits whose identity changed
    pub fn rewrite_all<F>(&self, transform: F) -> Result<usize>
    where
        F: Fn(&str) -> String,
    {
        let rewritten = self.store.rewrite_messages(&transform).map_err(|e| match e {
            GitReleaseError::RewriteAborted(_) => e,
            other => GitReleaseError::rewrite(other.to_string()),
        })?;

        info!("rewrote {} commit messages", rewritten);
        Ok(rewritten)
    }

    /// Whole-history pass with the default normalization transform.
    pub fn normalize_all(&self) -> Result<usize> {
        self.rewrite_all(normalize_message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::git::MockStore;

    #[test]
    fn test_normalize_lowercases_the_subject() {
        assert_eq!(normalize_message("Fix The Parser"), "fix the parser");
    }

    #[test]
    fn test_normalize_truncates_to_sixty_bytes() {
        let long = "a".repeat(80);
        let normalized = normalize_message(&long);
        assert_eq!(normalized.len(), 60);
        assert_eq!(normalized, "a".repeat(60));
    }

    #[test]
    fn test_normalize_keeps_body_lines_unchanged() {
        let message = "Add The Tracer\n\nBody Line Stays EXACTLY As Written\nsecond body line";
        let normalized = normalize_message(message);
        assert_eq!(
            normalized,
            "add the tracer\n\nBody Line Stays EXACTLY As Written\nsecond body line"
        );
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let long = "x".repeat(100);
        let messages = vec![
            "already lowercase and short",
            "Mixed Case Subject\n\nwith a body",
            long.as_str(),
        ];
        for message in messages {
            let once = normalize_message(message);
            let twice = normalize_message(&once);
            assert_eq!(once, twice, "second pass changed '{}'", message);
        }
    }

    #[test]
    fn test_normalize_passes_clean_messages_through() {
        let message = "fix: resolve off-by-one\n\nlonger explanation";
        assert_eq!(normalize_message(message), message);
    }

    #[test]
    fn test_normalize_drops_a_torn_multibyte_character() {
        // 58 ASCII bytes followed by a 3-byte character straddling the limit
        let subject = format!("{}日本", "a".repeat(58));
        let normalized = normalize_message(&subject);
        assert_eq!(normalized, "a".repeat(58));
        assert!(normalized.len() <= 60);
        // And a second pass leaves it alone
        assert_eq!(normalize_message(&normalized), normalized);
    }

    #[test]
    fn test_rewrite_all_counts_changed_commits() {
        let mut store = MockStore::new();
        store.add_linear_commit("a1", "ALL CAPS SUBJECT");
        store.add_linear_commit("b2", "already fine");

        let rewriter = HistoryRewriter::new(&store);
        let changed = rewriter.normalize_all().unwrap();
        assert_eq!(changed, 1);
        assert_eq!(store.message("a1").unwrap(), "all caps subject");
    }

    #[test]
    fn test_rewrite_all_twice_is_idempotent() {
        let mut store = MockStore::new();
        store.add_linear_commit("a1", "Mixed Case Subject");

        let rewriter = HistoryRewriter::new(&store);
        assert_eq!(rewriter.normalize_all().unwrap(), 1);
        assert_eq!(rewriter.normalize_all().unwrap(), 0);
    }
}
