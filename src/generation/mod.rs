pub mod composer;
pub mod executor;

pub use composer::{aspect_ratio_clause, compose, ComposedRequest};
pub use executor::{BatchOutcome, FanOutExecutor};

use std::fmt;
use uuid::Uuid;

/// Lifecycle of one `generate` call. There is no retry edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationPhase {
    Idle,
    Composing,
    Dispatching,
    AwaitingAll,
    Succeeded,
    Failed,
}

impl GenerationPhase {
    pub fn is_terminal(&self) -> bool {
        matches!(self, GenerationPhase::Succeeded | GenerationPhase::Failed)
    }

    fn can_advance_to(&self, next: GenerationPhase) -> bool {
        use GenerationPhase::*;
        matches!(
            (self, next),
            (Idle, Composing)
                | (Composing, Dispatching)
                | (Composing, Failed)
                | (Dispatching, AwaitingAll)
                | (Dispatching, Succeeded)
                | (Dispatching, Failed)
                | (AwaitingAll, Succeeded)
                | (AwaitingAll, Failed)
        )
    }
}

impl fmt::Display for GenerationPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            GenerationPhase::Idle => "idle",
            GenerationPhase::Composing => "composing",
            GenerationPhase::Dispatching => "dispatching",
            GenerationPhase::AwaitingAll => "awaiting-all",
            GenerationPhase::Succeeded => "succeeded",
            GenerationPhase::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Tracks one invocation: a request id for log lines plus its current phase.
#[derive(Debug)]
pub struct Invocation {
    id: String,
    phase: GenerationPhase,
}

impl Default for Invocation {
    fn default() -> Self {
        Self::new()
    }
}

impl Invocation {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            phase: GenerationPhase::Idle,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn phase(&self) -> GenerationPhase {
        self.phase
    }

    pub fn advance(&mut self, next: GenerationPhase) {
        if !self.phase.can_advance_to(next) {
            log::warn!("[{}] unexpected transition {} -> {}", self.id, self.phase, next);
        }
        log::debug!("[{}] {} -> {}", self.id, self.phase, next);
        self.phase = next;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn happy_path_reaches_a_terminal_phase() {
        let mut invocation = Invocation::new();
        for next in [
            GenerationPhase::Composing,
            GenerationPhase::Dispatching,
            GenerationPhase::AwaitingAll,
            GenerationPhase::Succeeded,
        ] {
            assert!(invocation.phase().can_advance_to(next));
            invocation.advance(next);
        }
        assert!(invocation.phase().is_terminal());
    }

    #[test]
    fn terminal_phases_have_no_way_out() {
        for next in [GenerationPhase::Composing, GenerationPhase::Dispatching] {
            assert!(!GenerationPhase::Failed.can_advance_to(next));
            assert!(!GenerationPhase::Succeeded.can_advance_to(next));
        }
    }
}
