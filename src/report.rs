//! Category-tagged reporting of reconciliation decisions
//!
//! Every decision point in the engine emits exactly one event through a
//! [`Reporter`]. The default [`TracingReporter`] turns them into `tracing`
//! events; tests substitute a recorder.

use std::fmt;
use tracing::{error, info, warn};

/// Kind of decision being reported
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    /// A change was applied
    Success,
    /// Nothing to do, remote already matches
    Skip,
    /// Something went wrong but the run is unaffected
    Warning,
    /// An operation failed and its domain or item was abandoned
    Failure,
    /// A change that would have been applied outside dry-run mode
    Preview,
    /// Progress information
    Info,
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Category::Success => "success",
            Category::Skip => "skip",
            Category::Warning => "warning",
            Category::Failure => "failure",
            Category::Preview => "dry-run",
            Category::Info => "info",
        };
        f.write_str(label)
    }
}

/// Sink for reconciliation events
///
/// `repo` is the repository the event is about, or empty for run-level events.
pub trait Reporter: Send + Sync {
    fn emit(&self, category: Category, repo: &str, message: &str);

    fn success(&self, repo: &str, message: &str) {
        self.emit(Category::Success, repo, message);
    }

    fn skip(&self, repo: &str, message: &str) {
        self.emit(Category::Skip, repo, message);
    }

    fn warning(&self, repo: &str, message: &str) {
        self.emit(Category::Warning, repo, message);
    }

    fn failure(&self, repo: &str, message: &str) {
        self.emit(Category::Failure, repo, message);
    }

    fn preview(&self, repo: &str, message: &str) {
        self.emit(Category::Preview, repo, message);
    }

    fn info(&self, repo: &str, message: &str) {
        self.emit(Category::Info, repo, message);
    }
}

/// Reporter that forwards events to the `tracing` subscriber
#[derive(Debug, Clone, Default)]
pub struct TracingReporter;

impl Reporter for TracingReporter {
    fn emit(&self, category: Category, repo: &str, message: &str) {
        let dry_run = category == Category::Preview;
        match category {
            Category::Failure => error!(category = %category, repo = repo, "{}", message),
            Category::Warning => warn!(category = %category, repo = repo, "{}", message),
            _ => info!(category = %category, repo = repo, dry_run = dry_run, "{}", message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Collect(Mutex<Vec<(Category, String)>>);

    impl Reporter for Collect {
        fn emit(&self, category: Category, repo: &str, message: &str) {
            self.0
                .lock()
                .unwrap()
                .push((category, format!("{}: {}", repo, message)));
        }
    }

    #[test]
    fn test_helpers_tag_category() {
        let collect = Collect::default();
        collect.success("a", "1");
        collect.skip("a", "2");
        collect.warning("a", "3");
        collect.failure("a", "4");
        collect.preview("a", "5");
        collect.info("", "6");

        let categories: Vec<Category> = collect.0.lock().unwrap().iter().map(|(c, _)| *c).collect();
        assert_eq!(
            categories,
            vec![
                Category::Success,
                Category::Skip,
                Category::Warning,
                Category::Failure,
                Category::Preview,
                Category::Info,
            ]
        );
    }

    #[test]
    fn test_category_labels() {
        assert_eq!(Category::Preview.to_string(), "dry-run");
        assert_eq!(Category::Failure.to_string(), "failure");
    }
}
