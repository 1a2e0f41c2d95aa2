//! Lookup index over the repository

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::core::identifier::{canonical, is_valid_identifier};
use crate::core::repository::RepositoryRecord;

/// Which matching strategy resolved a lookup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum LookupMethod {
    /// Matched on the canonical ISBN
    Identifier,
    /// Matched on the Master Order ID
    AlternateId,
    /// Nothing matched
    #[default]
    None,
}

impl std::fmt::Display for LookupMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LookupMethod::Identifier => write!(f, "ISBN"),
            LookupMethod::AlternateId => write!(f, "Master Order ID"),
            LookupMethod::None => write!(f, "none"),
        }
    }
}

/// Point-lookup maps derived from the record set
///
/// Never mutated after [`RepositoryIndex::build`]; a changed record set gets a
/// fresh index.
#[derive(Debug, Clone, Default)]
pub struct RepositoryIndex {
    by_isbn: HashMap<String, Arc<RepositoryRecord>>,
    by_alternate_id: HashMap<String, Arc<RepositoryRecord>>,
    duplicates: usize,
}

impl RepositoryIndex {
    /// Index every record; later records win on duplicate keys
    pub fn build(records: &[Arc<RepositoryRecord>]) -> Self {
        let mut by_isbn = HashMap::with_capacity(records.len());
        let mut by_alternate_id = HashMap::new();
        let mut occurrences: HashMap<&str, usize> = HashMap::new();

        for record in records {
            if !record.isbn.is_empty() {
                by_isbn.insert(record.isbn.clone(), Arc::clone(record));
                *occurrences.entry(record.isbn.as_str()).or_default() += 1;
            }
            let alternate = alternate_key(&record.alternate_order_id);
            if !alternate.is_empty() {
                by_alternate_id.insert(alternate, Arc::clone(record));
            }
        }

        let duplicates = occurrences.values().map(|count| count - 1).sum();

        Self {
            by_isbn,
            by_alternate_id,
            duplicates,
        }
    }

    /// Look up a canonical identifier
    pub fn by_isbn(&self, isbn: &str) -> Option<&Arc<RepositoryRecord>> {
        self.by_isbn.get(isbn)
    }

    /// Look up a Master Order ID, ignoring case
    pub fn by_alternate_id(&self, id: &str) -> Option<&Arc<RepositoryRecord>> {
        self.by_alternate_id.get(&alternate_key(id))
    }

    /// Sum over each identifier of (occurrences - 1)
    pub fn duplicate_count(&self) -> usize {
        self.duplicates
    }

    /// Resolve a free-form query the way the quick-search box does
    ///
    /// Queries that look like an ISBN try the identifier map first; anything
    /// unresolved falls back to the Master Order ID map.
    pub fn search(&self, query: &str) -> Option<SearchHit<'_>> {
        let query = query.trim();
        if query.is_empty() {
            return None;
        }

        let by_identifier = is_valid_identifier(query)
            .then(|| canonical(query))
            .flatten()
            .and_then(|isbn| self.by_isbn(&isbn))
            .map(|record| SearchHit {
                record,
                method: LookupMethod::Identifier,
            });

        by_identifier.or_else(|| {
            self.by_alternate_id(query).map(|record| SearchHit {
                record,
                method: LookupMethod::AlternateId,
            })
        })
    }
}

/// Result of [`RepositoryIndex::search`]
#[derive(Debug, Clone, Copy)]
pub struct SearchHit<'a> {
    pub record: &'a Arc<RepositoryRecord>,
    pub method: LookupMethod,
}

fn alternate_key(id: &str) -> String {
    id.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::repository::{PhysicalSpec, TitleStatus};

    fn record(isbn: &str, alt: &str, title: &str) -> Arc<RepositoryRecord> {
        Arc::new(RepositoryRecord {
            isbn: isbn.to_string(),
            title: title.to_string(),
            alternate_order_id: alt.to_string(),
            status: TitleStatus::PodReady,
            paper_description: String::new(),
            physical: PhysicalSpec::default(),
        })
    }

    #[test]
    fn test_build_and_lookup() {
        let index = RepositoryIndex::build(&[
            record("9780140175936", "SA1657", "Cleopatra's Sister"),
            record("", "SB0001", "No ISBN"),
        ]);

        assert_eq!(
            index.by_isbn("9780140175936").map(|r| r.title.as_str()),
            Some("Cleopatra's Sister")
        );
        assert_eq!(
            index.by_alternate_id("sa1657").map(|r| r.isbn.as_str()),
            Some("9780140175936")
        );
        assert_eq!(
            index.by_alternate_id(" SB0001 ").map(|r| r.title.as_str()),
            Some("No ISBN")
        );
        assert!(index.by_isbn("").is_none());
    }

    #[test]
    fn test_last_write_wins() {
        let index = RepositoryIndex::build(&[
            record("9780140175936", "", "First"),
            record("9780140175936", "", "Second"),
        ]);
        assert_eq!(
            index.by_isbn("9780140175936").map(|r| r.title.as_str()),
            Some("Second")
        );
    }

    #[test]
    fn test_duplicate_count() {
        let index = RepositoryIndex::build(&[
            record("9780140175936", "", "a"),
            record("9780140175936", "", "b"),
            record("9780140175936", "", "c"),
            record("9780000000002", "", "d"),
            record("9780000000002", "", "e"),
            record("9781111111111", "", "f"),
            record("", "", "g"),
            record("", "", "h"),
        ]);
        assert_eq!(index.duplicate_count(), 3);
    }

    #[test]
    fn test_search_prefers_identifier() {
        let index = RepositoryIndex::build(&[
            record("9780140175936", "SA1657", "By ISBN"),
            record("", "9780140175936", "By alternate"),
        ]);

        let hit = index.search("978-0-14-017593-6").unwrap();
        assert_eq!(hit.method, LookupMethod::Identifier);
        assert_eq!(hit.record.title, "By ISBN");

        let hit = index.search("sa1657").unwrap();
        assert_eq!(hit.method, LookupMethod::AlternateId);

        assert!(index.search("").is_none());
        assert!(index.search("missing").is_none());
    }

    #[test]
    fn test_search_falls_back_when_isbn_unknown() {
        let index = RepositoryIndex::build(&[record("", "9780000000002", "Alt only")]);
        let hit = index.search("9780000000002").unwrap();
        assert_eq!(hit.method, LookupMethod::AlternateId);
    }
}
