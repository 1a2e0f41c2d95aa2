//! Filter and sort enums for CLI commands
//!
//! Thin `ValueEnum` wrappers that map onto the order-list types in core.

use clap::ValueEnum;

use crate::core::mutator::{SortKey, StatusFilter};

/// Status filter for order listings
#[derive(Debug, Clone, Copy, ValueEnum, Default, PartialEq, Eq)]
pub enum StatusFilterArg {
    /// Every line - default
    #[default]
    All,
    /// Matched titles printed as miscellaneous items
    Mpi,
    /// Lines that matched nothing in the repository
    NotAvailable,
    /// Matched titles ready for print on demand
    PodReady,
}

impl From<StatusFilterArg> for StatusFilter {
    fn from(arg: StatusFilterArg) -> Self {
        match arg {
            StatusFilterArg::All => StatusFilter::All,
            StatusFilterArg::Mpi => StatusFilter::Mpi,
            StatusFilterArg::NotAvailable => StatusFilter::NotAvailable,
            StatusFilterArg::PodReady => StatusFilter::PodReady,
        }
    }
}

impl std::fmt::Display for StatusFilterArg {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StatusFilterArg::All => write!(f, "all"),
            StatusFilterArg::Mpi => write!(f, "mpi"),
            StatusFilterArg::NotAvailable => write!(f, "not-available"),
            StatusFilterArg::PodReady => write!(f, "pod-ready"),
        }
    }
}

/// Sort applied to an order list
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum SortArg {
    /// Paper description, then description
    Paper,
}

impl From<SortArg> for SortKey {
    fn from(arg: SortArg) -> Self {
        match arg {
            SortArg::Paper => SortKey::PaperDescription,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_filter_mapping() {
        assert_eq!(StatusFilter::from(StatusFilterArg::All), StatusFilter::All);
        assert_eq!(
            StatusFilter::from(StatusFilterArg::NotAvailable),
            StatusFilter::NotAvailable
        );
        assert_eq!(StatusFilterArg::PodReady.to_string(), "pod-ready");
    }

    #[test]
    fn test_value_names_round_trip() {
        for arg in StatusFilterArg::value_variants() {
            let parsed = StatusFilterArg::from_str(&arg.to_string(), false).unwrap();
            assert_eq!(parsed, *arg);
        }
    }

    #[test]
    fn test_sort_mapping() {
        assert_eq!(SortKey::from(SortArg::Paper), SortKey::PaperDescription);
    }
}
