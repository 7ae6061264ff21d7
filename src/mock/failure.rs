//! Failure injection for the mock chain.

use std::collections::HashMap;

use crate::collab::CollabError;

/// Collaborator calls that can be made to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChainOp {
    Broadcast,
    Fetch,
    Search,
}

/// Kind of error a failing call reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Unavailable,
    Rejected,
}

/// Failure configuration for one operation
#[derive(Debug, Clone)]
pub struct FailureConfig {
    pub kind: FailureKind,
    pub message: String,
    /// Calls that succeed before failures start.
    pub skip: u32,
    /// Number of calls that fail after `skip` (None = every later call).
    pub fail_count: Option<u32>,
}

impl FailureConfig {
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self {
            kind: FailureKind::Unavailable,
            message: message.into(),
            skip: 0,
            fail_count: None,
        }
    }

    pub fn rejected(message: impl Into<String>) -> Self {
        Self {
            kind: FailureKind::Rejected,
            ..Self::unavailable(message)
        }
    }

    /// Let the first `calls` calls through.
    pub fn after(mut self, calls: u32) -> Self {
        self.skip = calls;
        self
    }

    pub fn with_fail_count(mut self, count: u32) -> Self {
        self.fail_count = Some(count);
        self
    }

    fn error(&self) -> CollabError {
        match self.kind {
            FailureKind::Unavailable => CollabError::Unavailable(self.message.clone()),
            FailureKind::Rejected => CollabError::Rejected(self.message.clone()),
        }
    }
}

#[derive(Debug, Default)]
pub struct FailureInjector {
    configs: HashMap<ChainOp, FailureConfig>,
    call_counts: HashMap<ChainOp, u32>,
}

impl FailureInjector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn inject(&mut self, op: ChainOp, config: FailureConfig) {
        self.configs.insert(op, config);
        self.call_counts.insert(op, 0);
    }

    pub fn clear(&mut self) {
        self.configs.clear();
        self.call_counts.clear();
    }

    /// Count a call to `op` and return the error it should fail with, if any.
    pub fn check(&mut self, op: ChainOp) -> Option<CollabError> {
        let config = self.configs.get(&op)?;
        let count = self.call_counts.entry(op).or_insert(0);
        *count += 1;

        if *count <= config.skip {
            return None;
        }
        if let Some(limit) = config.fail_count {
            if *count - config.skip > limit {
                return None;
            }
        }
        Some(config.error())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_failure_configured() {
        let mut injector = FailureInjector::new();
        assert!(injector.check(ChainOp::Broadcast).is_none());
    }

    #[test]
    fn test_skip_then_fail() {
        let mut injector = FailureInjector::new();
        injector.inject(ChainOp::Broadcast, FailureConfig::unavailable("node down").after(2));

        assert!(injector.check(ChainOp::Broadcast).is_none());
        assert!(injector.check(ChainOp::Broadcast).is_none());
        assert_eq!(
            injector.check(ChainOp::Broadcast),
            Some(CollabError::Unavailable("node down".into()))
        );
        assert!(injector.check(ChainOp::Fetch).is_none());
    }

    #[test]
    fn test_fail_count_then_recover() {
        let mut injector = FailureInjector::new();
        injector.inject(ChainOp::Search, FailureConfig::rejected("bad prefix").with_fail_count(1));

        assert_eq!(
            injector.check(ChainOp::Search),
            Some(CollabError::Rejected("bad prefix".into()))
        );
        assert!(injector.check(ChainOp::Search).is_none());
    }

    #[test]
    fn test_clear() {
        let mut injector = FailureInjector::new();
        injector.inject(ChainOp::Fetch, FailureConfig::unavailable("x"));
        injector.clear();
        assert!(injector.check(ChainOp::Fetch).is_none());
    }
}
