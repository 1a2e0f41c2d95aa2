//! Shared helper functions for CLI commands

use std::io::{self, BufRead, IsTerminal};

/// Truncate a string to `max_len` characters, adding "..." if truncated
pub fn truncate_str(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// Parse a comma-separated list of 1-based line numbers
///
/// Blank entries are skipped; anything else that is not a positive integer is
/// an error naming the bad entry.
pub fn parse_line_numbers(list: &str) -> Result<Vec<u32>, String> {
    list.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| match s.parse::<u32>() {
            Ok(n) if n > 0 => Ok(n),
            _ => Err(format!("invalid line number '{}'", s)),
        })
        .collect()
}

/// Read identifiers from stdin if it is piped
///
/// One per line; blank lines are ignored. Returns `None` for a terminal.
pub fn read_ids_from_stdin() -> Option<Vec<String>> {
    let stdin = io::stdin();

    if stdin.is_terminal() {
        return None;
    }

    let ids: Vec<String> = stdin
        .lock()
        .lines()
        .map_while(Result::ok)
        .map(|line| line.trim().to_string())
        .filter(|line| !line.is_empty())
        .collect();

    if ids.is_empty() {
        None
    } else {
        Some(ids)
    }
}

/// Check if stdin has piped input available
pub fn stdin_has_data() -> bool {
    !io::stdin().is_terminal()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_str() {
        assert_eq!(truncate_str("hello", 10), "hello");
        assert_eq!(truncate_str("hello world", 8), "hello...");
        assert_eq!(truncate_str("hi", 2), "hi");
        assert_eq!(truncate_str("éééééé", 5), "éé...");
    }

    #[test]
    fn test_parse_line_numbers() {
        assert_eq!(parse_line_numbers("1, 3,,7").unwrap(), vec![1, 3, 7]);
        assert_eq!(parse_line_numbers("").unwrap(), Vec::<u32>::new());
        assert!(parse_line_numbers("0").is_err());
        assert!(parse_line_numbers("2,x").unwrap_err().contains("'x'"));
    }
}
