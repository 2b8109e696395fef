// src/app/phase.rs
use std::fmt;
use std::sync::Arc;

use crate::utils::logging::Logger;

/// Steps a mutating call walks through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Validating,
    Mutating,
    Persisting,
    NotifyingObservers,
    Aborted,
}

impl Phase {
    pub fn can_advance_to(self, next: Phase) -> bool {
        use Phase::*;
        matches!(
            (self, next),
            (Idle, Validating)
                | (Validating, Mutating)
                | (Mutating, Persisting)
                | (Persisting, NotifyingObservers)
                | (NotifyingObservers, Idle)
                | (Aborted, Idle)
        ) || (next == Aborted && !matches!(self, Idle | Aborted | NotifyingObservers))
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Phase::Idle => "idle",
            Phase::Validating => "validating",
            Phase::Mutating => "mutating",
            Phase::Persisting => "persisting",
            Phase::NotifyingObservers => "notifying observers",
            Phase::Aborted => "aborted",
        };
        write!(f, "{}", label)
    }
}

/// Tracks and logs the phase of one call.
pub struct OperationTrace {
    operation: String,
    phase: Phase,
    logger: Arc<dyn Logger>,
}

impl OperationTrace {
    pub fn begin(operation: &str, logger: Arc<dyn Logger>) -> Self {
        let mut trace = Self {
            operation: operation.to_string(),
            phase: Phase::Idle,
            logger,
        };
        trace.advance(Phase::Validating);
        trace
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn advance(&mut self, next: Phase) {
        if !self.phase.can_advance_to(next) {
            self.logger.log(&format!(
                "{}: unexpected transition {} -> {}",
                self.operation, self.phase, next
            ));
        }
        self.logger
            .debug_log(&format!("{}: {} -> {}", self.operation, self.phase, next));
        self.phase = next;
    }

    pub fn abort(&mut self, reason: &str) {
        self.advance(Phase::Aborted);
        self.logger
            .debug_log(&format!("{} aborted: {}", self.operation, reason));
        self.advance(Phase::Idle);
    }

    pub fn finish(&mut self) {
        self.advance(Phase::Idle);
    }
}
