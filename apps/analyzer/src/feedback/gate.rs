//! Feedback Gate — at most one accepted submission per session per cooldown.
//!
//! The state is an explicit value owned by the session store; the gate reads
//! it and returns the updated value instead of mutating anything ambient.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Instant of the last accepted submission for one session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitState {
    pub last_accepted: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    Accepted,
    Rejected { retry_after: Duration },
}

impl RateLimitState {
    /// Checks the cooldown without recording anything.
    pub fn check(&self, now: DateTime<Utc>, cooldown: Duration) -> GateDecision {
        let Some(last) = self.last_accepted else {
            return GateDecision::Accepted;
        };

        // A clock reading earlier than `last` counts as no time elapsed.
        let elapsed = (now - last).to_std().unwrap_or(Duration::ZERO);
        if elapsed >= cooldown {
            GateDecision::Accepted
        } else {
            GateDecision::Rejected {
                retry_after: cooldown - elapsed,
            }
        }
    }

    /// Returns the state after a submission was accepted at `now`.
    pub fn record(self, now: DateTime<Utc>) -> Self {
        Self {
            last_accepted: Some(now),
        }
    }
}

/// Checks and, when accepted, records `now` in one step.
pub fn try_accept(
    state: RateLimitState,
    now: DateTime<Utc>,
    cooldown: Duration,
) -> (RateLimitState, GateDecision) {
    match state.check(now, cooldown) {
        GateDecision::Accepted => (state.record(now), GateDecision::Accepted),
        rejected => (state, rejected),
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    const COOLDOWN: Duration = Duration::from_secs(300);

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    #[test]
    fn test_first_submission_accepted() {
        let (state, decision) = try_accept(RateLimitState::default(), at(0), COOLDOWN);
        assert_eq!(decision, GateDecision::Accepted);
        assert_eq!(state.last_accepted, Some(at(0)));
    }

    #[test]
    fn test_cooldown_scenario() {
        let (state, a) = try_accept(RateLimitState::default(), at(0), COOLDOWN);
        assert_eq!(a, GateDecision::Accepted);

        let (state, b) = try_accept(state, at(100), COOLDOWN);
        assert_eq!(
            b,
            GateDecision::Rejected {
                retry_after: Duration::from_secs(200)
            }
        );
        assert_eq!(state.last_accepted, Some(at(0)));

        let (state, c) = try_accept(state, at(301), COOLDOWN);
        assert_eq!(c, GateDecision::Accepted);
        assert_eq!(state.last_accepted, Some(at(301)));
    }

    #[test]
    fn test_boundary_is_inclusive() {
        let state = RateLimitState::default().record(at(0));
        assert_eq!(state.check(at(300), COOLDOWN), GateDecision::Accepted);
        assert_eq!(
            state.check(at(299), COOLDOWN),
            GateDecision::Rejected {
                retry_after: Duration::from_secs(1)
            }
        );
    }

    #[test]
    fn test_rejected_iff_within_cooldown_for_many_gaps() {
        for cooldown_secs in [1u64, 10, 60, 300] {
            let cooldown = Duration::from_secs(cooldown_secs);
            for gap in 1..=(cooldown_secs as i64 * 2) {
                let state = RateLimitState::default().record(at(0));
                let decision = state.check(at(gap), cooldown);
                if (gap as u64) < cooldown_secs {
                    let expected = cooldown - Duration::from_secs(gap as u64);
                    assert_eq!(decision, GateDecision::Rejected { retry_after: expected });
                    assert!(expected > Duration::ZERO);
                } else {
                    assert_eq!(decision, GateDecision::Accepted);
                }
            }
        }
    }

    #[test]
    fn test_sub_second_precision() {
        let state = RateLimitState::default().record(at(0));
        let now = at(100) + chrono::Duration::milliseconds(250);
        assert_eq!(
            state.check(now, COOLDOWN),
            GateDecision::Rejected {
                retry_after: Duration::from_millis(199_750)
            }
        );
    }

    #[test]
    fn test_clock_going_backwards_is_rejected_for_full_cooldown() {
        let state = RateLimitState::default().record(at(50));
        assert_eq!(
            state.check(at(10), COOLDOWN),
            GateDecision::Rejected {
                retry_after: COOLDOWN
            }
        );
    }

    #[test]
    fn test_check_does_not_mutate() {
        let state = RateLimitState::default();
        assert_eq!(state.check(at(0), COOLDOWN), GateDecision::Accepted);
        assert_eq!(state.last_accepted, None);
    }
}
