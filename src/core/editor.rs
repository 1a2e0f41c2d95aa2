//! Repository change-set merge
//!
//! Produces a new record set; the caller swaps it in and rebuilds the index.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::core::auth::{EditError, EditToken};
use crate::core::identifier::canonical;
use crate::core::repository::{Repository, RepositoryRecord};

/// Titles to add and identifiers to remove
#[derive(Debug, Clone, Default)]
pub struct ChangeSet {
    pub additions: Vec<RepositoryRecord>,
    /// ISBNs (any accepted spelling) or Master Order IDs
    pub removals: Vec<String>,
}

impl ChangeSet {
    pub fn is_empty(&self) -> bool {
        self.additions.is_empty() && self.removals.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MergeReport {
    pub added: usize,
    /// Additions that overwrote a record with the same ISBN
    pub replaced: usize,
    pub removed: usize,
    /// Removal keys that matched nothing
    pub unmatched_removals: Vec<String>,
}

enum RemovalKey {
    Isbn(String),
    Alternate(String),
}

impl RemovalKey {
    fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            return None;
        }
        Some(match canonical(raw) {
            Some(isbn) => RemovalKey::Isbn(isbn),
            None => RemovalKey::Alternate(raw.to_lowercase()),
        })
    }

    fn matches(&self, record: &RepositoryRecord) -> bool {
        match self {
            RemovalKey::Isbn(isbn) => record.isbn == *isbn,
            RemovalKey::Alternate(id) => {
                !record.alternate_order_id.is_empty()
                    && record.alternate_order_id.trim().to_lowercase() == *id
            }
        }
    }
}

/// Apply removals then additions to a copy of the record set
///
/// The token is checked against `now` first; an expired token leaves the
/// repository untouched.
pub fn merge(
    repository: &Repository,
    changes: &ChangeSet,
    token: &EditToken,
    now: DateTime<Utc>,
) -> Result<(Repository, MergeReport), EditError> {
    token.check(now)?;

    let mut records: Vec<Arc<RepositoryRecord>> = repository.records().to_vec();
    let mut report = MergeReport::default();

    for raw in &changes.removals {
        let Some(key) = RemovalKey::parse(raw) else {
            continue;
        };
        let before = records.len();
        records.retain(|record| !key.matches(record));
        let removed = before - records.len();
        if removed == 0 {
            report.unmatched_removals.push(raw.trim().to_string());
        }
        report.removed += removed;
    }

    for addition in &changes.additions {
        let existing = addition
            .is_identified()
            .then(|| records.iter().position(|r| r.isbn == addition.isbn))
            .flatten();
        match existing {
            Some(position) => {
                records[position] = Arc::new(addition.clone());
                report.replaced += 1;
            }
            None => {
                records.push(Arc::new(addition.clone()));
                report.added += 1;
            }
        }
    }

    tracing::info!(
        added = report.added,
        replaced = report.replaced,
        removed = report.removed,
        "repository change set merged"
    );

    Ok((Repository::from_shared(records), report))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::auth::{hash_secret, Sha256Authorizer};
    use crate::core::repository::{PhysicalSpec, TitleStatus};
    use chrono::{Duration, TimeZone};

    fn record(isbn: &str, alt: &str, title: &str) -> RepositoryRecord {
        RepositoryRecord {
            isbn: isbn.to_string(),
            title: title.to_string(),
            alternate_order_id: alt.to_string(),
            status: TitleStatus::PodReady,
            paper_description: String::new(),
            physical: PhysicalSpec::default(),
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap()
    }

    fn token() -> EditToken {
        let auth = Sha256Authorizer::new(&hash_secret("pw"));
        EditToken::grant(&auth, "pw", Duration::minutes(30), now()).unwrap()
    }

    fn sample() -> Repository {
        Repository::new(vec![
            record("9780140175936", "SA1657", "Cleopatra's Sister"),
            record("9780000000002", "SB0002", "Second"),
            record("", "SC0003", "Unidentified"),
        ])
    }

    #[test]
    fn test_remove_by_isbn_and_alternate() {
        let changes = ChangeSet {
            additions: vec![],
            removals: vec![
                "978-0-14-017593-6".to_string(),
                "sc0003".to_string(),
                "missing".to_string(),
                " ".to_string(),
            ],
        };
        let (repo, report) = merge(&sample(), &changes, &token(), now()).unwrap();

        assert_eq!(repo.len(), 1);
        assert_eq!(report.removed, 2);
        assert_eq!(report.unmatched_removals, ["missing"]);
        assert!(repo.index().by_isbn("9780140175936").is_none());
        assert!(repo.index().by_isbn("9780000000002").is_some());
    }

    #[test]
    fn test_add_and_replace() {
        let changes = ChangeSet {
            additions: vec![
                record("9780000000002", "SB0002", "Second, revised"),
                record("9781111111111", "", "New"),
                record("", "SD0004", "New, unidentified"),
            ],
            removals: vec![],
        };
        let (repo, report) = merge(&sample(), &changes, &token(), now()).unwrap();

        assert_eq!(report.replaced, 1);
        assert_eq!(report.added, 2);
        assert_eq!(repo.len(), 5);
        assert_eq!(repo.records()[1].title, "Second, revised");
        assert_eq!(
            repo.index().by_isbn("9781111111111").map(|r| r.title.as_str()),
            Some("New")
        );
        assert!(repo.index().by_alternate_id("sd0004").is_some());
        assert_eq!(repo.stats().duplicates, 0);
    }

    #[test]
    fn test_expired_token_leaves_repository() {
        let original = sample();
        let changes = ChangeSet {
            additions: vec![],
            removals: vec!["SA1657".to_string()],
        };
        let result = merge(&original, &changes, &token(), now() + Duration::hours(2));

        assert!(matches!(result, Err(EditError::TokenExpired { .. })));
        assert_eq!(original.len(), 3);
    }
}
