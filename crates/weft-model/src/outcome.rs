use serde::{Deserialize, Serialize};

/// Result of racing an operation against a deadline.
///
/// Produced exactly once per gate invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Outcome<T> {
    /// The operation signalled completion before the deadline.
    Completed(T),
    /// The deadline fired first.
    TimedOut,
}

impl<T> Outcome<T> {
    #[inline]
    pub fn is_completed(&self) -> bool {
        matches!(self, Outcome::Completed(_))
    }

    #[inline]
    pub fn is_timed_out(&self) -> bool {
        matches!(self, Outcome::TimedOut)
    }
}

/// Result of a single non-blocking publish attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Publish {
    /// A consumer was parked and took the value.
    Sent,
    /// No consumer was ready (or it is gone); the value was shed.
    Dropped,
}

impl Publish {
    #[inline]
    pub fn is_sent(&self) -> bool {
        matches!(self, Publish::Sent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn predicates_match_variant() {
        assert!(Outcome::Completed(7).is_completed());
        assert!(Outcome::<u32>::TimedOut.is_timed_out());
        assert!(!Outcome::<u32>::TimedOut.is_completed());
    }

    #[test]
    fn serde_uses_camel_case() {
        let json = serde_json::to_string(&Outcome::<()>::TimedOut).unwrap();
        assert_eq!(json, r#""timedOut""#);

        let json = serde_json::to_string(&Publish::Dropped).unwrap();
        assert_eq!(json, r#""dropped""#);
        let back: Publish = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Publish::Dropped);
    }
}
