use super::settings::Settings;

/// The persisted count.
///
/// Stored as a decimal string under the `count` key.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CounterState {
    pub count: i64,
}

impl CounterState {
    pub fn new(count: i64) -> Self {
        Self { count }
    }

    /// Decode a stored count, tolerating surrounding whitespace.
    pub fn decode(raw: &str) -> Option<Self> {
        raw.trim().parse().ok().map(Self::new)
    }

    pub fn encode(&self) -> String {
        self.count.to_string()
    }
}

/// Why an increment was refused
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IncrementRefusal {
    /// `count + increment` would exceed a positive limit
    LimitExceeded { limit: i64 },
    /// `count + increment` does not fit in an `i64`
    Overflow,
}

/// Count and settings as one in-memory record.
///
/// Owned by [`StateManager`](crate::state::StateManager); never shared as a global.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CounterSession {
    pub counter: CounterState,
    pub settings: Settings,
}

impl CounterSession {
    pub fn new(counter: CounterState, settings: Settings) -> Self {
        Self { counter, settings }
    }

    pub fn count(&self) -> i64 {
        self.counter.count
    }

    /// The count a successful increment would produce.
    ///
    /// A limit at or below zero never refuses. A limit already below the
    /// current count refuses every positive step until the count is lowered
    /// or the limit raised.
    pub fn next_count(&self) -> Result<i64, IncrementRefusal> {
        let candidate = self
            .counter
            .count
            .checked_add(self.settings.increment)
            .ok_or(IncrementRefusal::Overflow)?;

        if self.settings.has_limit() && candidate > self.settings.limit {
            return Err(IncrementRefusal::LimitExceeded {
                limit: self.settings.limit,
            });
        }

        Ok(candidate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(count: i64, increment: i64, limit: i64) -> CounterSession {
        CounterSession::new(
            CounterState::new(count),
            Settings {
                increment,
                limit,
                ..Settings::default()
            },
        )
    }

    #[test]
    fn test_decode_count() {
        assert_eq!(CounterState::decode("42"), Some(CounterState::new(42)));
        assert_eq!(CounterState::decode(" -7\n"), Some(CounterState::new(-7)));
        assert_eq!(CounterState::decode("abc"), None);
        assert_eq!(CounterState::decode(""), None);
        assert_eq!(CounterState::new(12).encode(), "12");
    }

    #[test]
    fn test_next_count_unlimited() {
        assert_eq!(session(5, 3, 0).next_count(), Ok(8));
        assert_eq!(session(5, 3, -1).next_count(), Ok(8));
    }

    #[test]
    fn test_next_count_at_limit_boundary() {
        assert_eq!(session(9, 1, 10).next_count(), Ok(10));
        assert_eq!(
            session(10, 1, 10).next_count(),
            Err(IncrementRefusal::LimitExceeded { limit: 10 })
        );
    }

    #[test]
    fn test_limit_below_count_refuses() {
        assert_eq!(
            session(42, 1, 10).next_count(),
            Err(IncrementRefusal::LimitExceeded { limit: 10 })
        );
    }

    #[test]
    fn test_next_count_overflow() {
        assert_eq!(
            session(i64::MAX, 1, 0).next_count(),
            Err(IncrementRefusal::Overflow)
        );
    }
}
