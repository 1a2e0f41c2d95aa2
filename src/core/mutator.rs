//! The editable order list: deletes, sort toggling and filtered views
//!
//! Line numbers belong to storage order. Deleting and sorting change storage
//! order and renumber; filtering only produces a view and never renumbers.

use crate::core::order::{BatchSummary, OrderLine};
use crate::core::repository::TitleStatus;

/// Attribute an order list can be sorted by
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    /// Paper description, then description, ignoring case
    PaperDescription,
}

impl SortKey {
    fn sort_key(&self, line: &OrderLine) -> (String, String) {
        match self {
            SortKey::PaperDescription => (
                line.paper_description.to_lowercase(),
                line.description.to_lowercase(),
            ),
        }
    }
}

/// Status filter; exactly one is active at a time
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StatusFilter {
    #[default]
    All,
    /// Available lines whose title is MPI
    Mpi,
    /// Lines that matched nothing
    NotAvailable,
    /// Available lines whose title is POD Ready
    PodReady,
}

impl StatusFilter {
    pub fn matches(&self, line: &OrderLine) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Mpi => line.available && line.status == TitleStatus::Mpi.as_str(),
            StatusFilter::NotAvailable => !line.available,
            StatusFilter::PodReady => {
                line.available && line.status == TitleStatus::PodReady.as_str()
            }
        }
    }
}

/// Read-side filter: a status filter ANDed with an optional paper type
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderFilter {
    pub status: StatusFilter,
    pub paper: Option<String>,
}

impl OrderFilter {
    pub fn new(status: StatusFilter, paper: Option<String>) -> Self {
        Self {
            status,
            paper: paper.filter(|p| !p.trim().is_empty()),
        }
    }

    pub fn matches(&self, line: &OrderLine) -> bool {
        let paper_matches = self.paper.as_deref().map_or(true, |paper| {
            line.paper_description.trim().eq_ignore_ascii_case(paper.trim())
        });
        paper_matches && self.status.matches(line)
    }

    pub fn is_active(&self) -> bool {
        self.status != StatusFilter::All || self.paper.is_some()
    }
}

/// One upload's worth of order lines, owned by the session
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderList {
    order_ref: String,
    lines: Vec<OrderLine>,
    sorted_by: Option<SortKey>,
}

impl OrderList {
    /// Wrap freshly processed lines and number them
    pub fn new(order_ref: impl Into<String>, lines: Vec<OrderLine>) -> Self {
        let mut list = Self {
            order_ref: order_ref.into(),
            lines,
            sorted_by: None,
        };
        list.renumber();
        list
    }

    pub fn order_ref(&self) -> &str {
        &self.order_ref
    }

    pub fn lines(&self) -> &[OrderLine] {
        &self.lines
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Active sort, if any
    pub fn sorted_by(&self) -> Option<SortKey> {
        self.sorted_by
    }

    /// Storage position of a line number
    pub fn position_of(&self, line_number: u32) -> Option<usize> {
        self.lines.iter().position(|l| l.line_number == line_number)
    }

    /// Remove the line at a storage position and renumber
    pub fn delete(&mut self, position: usize) -> Option<OrderLine> {
        if position >= self.lines.len() {
            return None;
        }
        let removed = self.lines.remove(position);
        self.renumber();
        Some(removed)
    }

    /// Remove several storage positions at once; out-of-range positions are ignored
    ///
    /// Returns how many lines were removed.
    pub fn delete_many(&mut self, positions: &[usize]) -> usize {
        let mut positions: Vec<usize> = positions
            .iter()
            .copied()
            .filter(|&p| p < self.lines.len())
            .collect();
        positions.sort_unstable_by(|a, b| b.cmp(a));
        positions.dedup();

        for &position in &positions {
            self.lines.remove(position);
        }
        if !positions.is_empty() {
            self.renumber();
        }
        positions.len()
    }

    /// Sort by `key`, or restore upload order if that sort is already applied
    ///
    /// Returns the sort now in effect.
    pub fn toggle_sort(&mut self, key: SortKey) -> Option<SortKey> {
        if self.sorted_by == Some(key) {
            self.lines.sort_by_key(|l| l.original_index);
            self.sorted_by = None;
        } else {
            self.lines.sort_by_cached_key(|l| key.sort_key(l));
            self.sorted_by = Some(key);
        }
        self.renumber();
        self.sorted_by
    }

    /// Lines passing `filter`, paired with their storage positions
    pub fn view(&self, filter: &OrderFilter) -> Vec<(usize, &OrderLine)> {
        self.lines
            .iter()
            .enumerate()
            .filter(|(_, line)| filter.matches(line))
            .collect()
    }

    /// Distinct paper descriptions in first-seen order, for the paper filter
    pub fn paper_types(&self) -> Vec<&str> {
        let mut seen: Vec<&str> = Vec::new();
        for line in &self.lines {
            if !seen.contains(&line.paper_description.as_str()) {
                seen.push(&line.paper_description);
            }
        }
        seen
    }

    pub fn summary(&self) -> BatchSummary {
        let mut summary = BatchSummary {
            total: self.lines.len(),
            ..BatchSummary::default()
        };
        for line in &self.lines {
            summary.total_quantity += u64::from(line.quantity);
            if !line.available {
                summary.not_available += 1;
                continue;
            }
            summary.found += 1;
            if StatusFilter::PodReady.matches(line) {
                summary.pod_ready += 1;
            } else if StatusFilter::Mpi.matches(line) {
                summary.mpi += 1;
            }
        }
        summary
    }

    fn renumber(&mut self) {
        for (i, line) in self.lines.iter_mut().enumerate() {
            line.line_number = (i + 1) as u32;
        }
    }
}
