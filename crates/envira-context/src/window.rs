//! Context window management

use serde::{Deserialize, Serialize};

use crate::context::Exchange;

/// Default character budget for prompt history.
pub const DEFAULT_MAX_CHARS: usize = 3000;

const SEPARATOR: &str = "---\n";

/// Context window configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextWindow {
    /// Maximum characters of serialized history in a prompt
    pub max_chars: usize,
}

impl Default for ContextWindow {
    fn default() -> Self {
        Self {
            max_chars: DEFAULT_MAX_CHARS,
        }
    }
}

impl ContextWindow {
    pub fn new(max_chars: usize) -> Self {
        Self { max_chars }
    }

    /// Build from a signed budget; negative values become 0.
    pub fn from_signed(budget: i64) -> Self {
        Self::new(usize::try_from(budget).unwrap_or(0))
    }

    /// Select the longest run of most recent exchanges that fits the budget.
    ///
    /// `history` must be oldest-first. The walk stops at the first exchange
    /// that would overflow, so the result is always a suffix of `history`.
    pub fn apply<'a>(&self, history: &'a [Exchange]) -> Window<'a> {
        let mut used = 0usize;
        let mut start = history.len();

        for exchange in history.iter().rev() {
            match used.checked_add(exchange.serialized_len()) {
                Some(total) if total <= self.max_chars => {
                    used = total;
                    start -= 1;
                }
                _ => break,
            }
        }

        Window {
            included: &history[start..],
            omitted_count: start,
        }
    }
}

/// Budget-constrained suffix of a conversation history.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window<'a> {
    included: &'a [Exchange],
    omitted_count: usize,
}

impl<'a> Window<'a> {
    /// Included exchanges, oldest first.
    pub fn included(&self) -> &'a [Exchange] {
        self.included
    }

    /// Number of older exchanges left out.
    pub fn omitted_count(&self) -> usize {
        self.omitted_count
    }

    pub fn is_empty(&self) -> bool {
        self.included.is_empty()
    }

    /// Total serialized characters of the included exchanges.
    pub fn used_chars(&self) -> usize {
        self.included.iter().map(Exchange::serialized_len).sum()
    }

    /// Prompt-ready history block.
    ///
    /// Empty when there was no history at all. Otherwise an optional omission
    /// marker, the included exchanges and a `---` separator line.
    pub fn render(&self) -> String {
        if self.included.is_empty() && self.omitted_count == 0 {
            return String::new();
        }

        let mut out = String::with_capacity(self.used_chars() + 64);
        if self.omitted_count > 0 {
            let noun = if self.omitted_count == 1 {
                "exchange"
            } else {
                "exchanges"
            };
            out.push_str(&format!("[{} earlier {noun} omitted]\n", self.omitted_count));
        }
        for exchange in self.included {
            exchange.write_to(&mut out);
        }
        out.push_str(SEPARATOR);
        out
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone, Utc};

    use super::*;

    /// `count` exchanges, each serializing to exactly `size` characters.
    fn history(count: usize, size: usize) -> Vec<Exchange> {
        let base = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        let body = size - 20;
        (0..count)
            .map(|i| {
                let user = format!("{i:0>width$}", width = body / 2);
                let assistant = "a".repeat(body - body / 2);
                Exchange::new(user, assistant, base + Duration::minutes(i as i64))
            })
            .collect()
    }

    #[test]
    fn empty_history_renders_nothing() {
        let window = ContextWindow::new(3000).apply(&[]);
        assert!(window.is_empty());
        assert_eq!(window.omitted_count(), 0);
        assert_eq!(window.render(), "");
    }

    #[test]
    fn keeps_most_recent_that_fit() {
        let history = history(5, 700);
        let window = ContextWindow::new(3000).apply(&history);

        assert_eq!(window.included().len(), 4);
        assert_eq!(window.omitted_count(), 1);
        assert_eq!(window.included(), &history[1..]);
        assert_eq!(window.used_chars(), 2800);
    }

    #[test]
    fn oversized_single_exchange_is_omitted() {
        let history = history(1, 4000);
        let window = ContextWindow::new(3000).apply(&history);

        assert!(window.is_empty());
        assert_eq!(window.omitted_count(), 1);
        assert_eq!(window.render(), "[1 earlier exchange omitted]\n---\n");
    }

    #[test]
    fn oversized_latest_blocks_older_exchanges() {
        let mut history = history(2, 100);
        history.push(Exchange::new("x".repeat(5000), "", Utc::now()));
        let window = ContextWindow::new(3000).apply(&history);

        assert!(window.is_empty());
        assert_eq!(window.omitted_count(), 3);
    }

    #[test]
    fn exact_fit_is_included() {
        let history = history(3, 100);
        let window = ContextWindow::new(300).apply(&history);
        assert_eq!(window.omitted_count(), 0);

        let window = ContextWindow::new(299).apply(&history);
        assert_eq!(window.included().len(), 2);
        assert_eq!(window.omitted_count(), 1);
    }

    #[test]
    fn zero_and_negative_budgets_are_empty() {
        let history = history(3, 100);
        for window in [ContextWindow::new(0), ContextWindow::from_signed(-10)] {
            let applied = window.apply(&history);
            assert!(applied.is_empty());
            assert_eq!(applied.omitted_count(), 3);
        }
        assert_eq!(ContextWindow::from_signed(-10).max_chars, 0);
    }

    #[test]
    fn render_is_chronological_with_marker() {
        let base = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        let history = vec![
            Exchange::new("first", "one", base),
            Exchange::new("second", "two", base + Duration::minutes(1)),
            Exchange::new("third", "three", base + Duration::minutes(2)),
        ];
        let budget = history[1].serialized_len() + history[2].serialized_len();
        let window = ContextWindow::new(budget).apply(&history);

        assert_eq!(
            window.render(),
            "[1 earlier exchange omitted]\n\
             User: second\nAssistant: two\n\n\
             User: third\nAssistant: three\n\n\
             ---\n"
        );
    }

    #[test]
    fn render_without_omissions_has_no_marker() {
        let history = history(2, 50);
        let rendered = ContextWindow::default().apply(&history).render();
        assert!(rendered.starts_with("User: "));
        assert!(rendered.ends_with("\n\n---\n"));
    }

    #[test]
    fn plural_marker() {
        let history = history(5, 700);
        let rendered = ContextWindow::new(700).apply(&history).render();
        assert!(rendered.starts_with("[4 earlier exchanges omitted]\n"));
    }
}
