//! Token usage tracking for a session.

use crate::TokenUsage;

/// Cumulative token usage across the turns of one session.
#[derive(Debug, Clone, Default)]
pub struct TokenTracker {
    total: TokenUsage,
    /// Usage of the most recent completed call.
    last: TokenUsage,
    call_count: u64,
}

impl TokenTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record token usage from a completed API call.
    pub fn record(&mut self, usage: &TokenUsage) {
        self.total.input_tokens = self.total.input_tokens.saturating_add(usage.input_tokens);
        self.total.output_tokens = self
            .total
            .output_tokens
            .saturating_add(usage.output_tokens);
        self.last = *usage;
        self.call_count += 1;
    }

    pub fn total(&self) -> &TokenUsage {
        &self.total
    }

    pub fn last(&self) -> &TokenUsage {
        &self.last
    }

    /// Total tokens (input + output).
    pub fn total_tokens(&self) -> u64 {
        self.total.total_tokens()
    }

    pub fn call_count(&self) -> u64 {
        self.call_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accumulates_across_calls() {
        let mut tracker = TokenTracker::new();
        tracker.record(&TokenUsage {
            input_tokens: 100,
            output_tokens: 20,
        });
        tracker.record(&TokenUsage {
            input_tokens: 150,
            output_tokens: 30,
        });

        assert_eq!(tracker.call_count(), 2);
        assert_eq!(tracker.total().input_tokens, 250);
        assert_eq!(tracker.total().output_tokens, 50);
        assert_eq!(tracker.total_tokens(), 300);
        assert_eq!(tracker.last().input_tokens, 150);
    }

    #[test]
    fn starts_empty() {
        let tracker = TokenTracker::default();
        assert_eq!(tracker.call_count(), 0);
        assert_eq!(tracker.total_tokens(), 0);
    }
}
