//! Fixed-schedule readiness polling.
//!
//! An explicit state machine drives the wait-for-ready loop used after the
//! KEDA chart install: up to `max_attempts` probes with a fixed delay between
//! them, no backoff. A probe that finds the resource missing and a probe that
//! finds it not yet ready are treated the same (keep polling); any other API
//! failure stops the loop immediately. The in-between sleeps honor a
//! [`CancellationToken`] so the wait can be aborted.

use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Fixed polling schedule.
#[derive(Debug, Clone, Copy)]
pub struct PollSchedule {
    pub max_attempts: u32,
    pub interval: Duration,
}

impl Default for PollSchedule {
    fn default() -> Self {
        Self {
            max_attempts: 12,
            interval: Duration::from_secs(10),
        }
    }
}

/// Result of one readiness probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Probe {
    /// Condition met, stop polling.
    Ready,
    /// Not found or found-but-not-ready, keep polling.
    Pending,
    /// Unrecoverable failure, stop polling immediately.
    Fatal(String),
}

/// Terminal state of a polling run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    Ready { attempts: u32 },
    TimedOut { attempts: u32 },
    Failed { attempts: u32, message: String },
    Cancelled,
}

/// Non-terminal vs. terminal polling state.
#[derive(Debug, Clone, PartialEq, Eq)]
enum PollState {
    Polling { attempt: u32 },
    Done(PollOutcome),
}

/// Pure transition function: the state after probe number `attempt`.
fn step(attempt: u32, probe: Probe, max_attempts: u32) -> PollState {
    match probe {
        Probe::Ready => PollState::Done(PollOutcome::Ready { attempts: attempt }),
        Probe::Fatal(message) => PollState::Done(PollOutcome::Failed {
            attempts: attempt,
            message,
        }),
        Probe::Pending if attempt >= max_attempts => {
            PollState::Done(PollOutcome::TimedOut { attempts: attempt })
        }
        Probe::Pending => PollState::Polling {
            attempt: attempt + 1,
        },
    }
}

/// Run the polling loop to a terminal outcome.
///
/// `probe_fn` is invoked once per attempt; the schedule's interval elapses
/// between attempts. Cancelling the token returns [`PollOutcome::Cancelled`]
/// at the next opportunity (before a probe or during a sleep).
pub async fn run<F, Fut>(
    schedule: PollSchedule,
    cancel: &CancellationToken,
    description: &str,
    mut probe_fn: F,
) -> PollOutcome
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Probe>,
{
    let mut state = PollState::Polling { attempt: 1 };

    loop {
        let attempt = match state {
            PollState::Polling { attempt } => attempt,
            PollState::Done(outcome) => return outcome,
        };

        if cancel.is_cancelled() {
            return PollOutcome::Cancelled;
        }

        debug!(
            attempt,
            max_attempts = schedule.max_attempts,
            "polling for {}",
            description
        );
        state = step(attempt, probe_fn().await, schedule.max_attempts);

        if let PollState::Polling { .. } = state {
            tokio::select! {
                _ = cancel.cancelled() => return PollOutcome::Cancelled,
                _ = tokio::time::sleep(schedule.interval) => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    fn fast(max_attempts: u32) -> PollSchedule {
        PollSchedule {
            max_attempts,
            interval: Duration::ZERO,
        }
    }

    #[test]
    fn step_ready_is_terminal() {
        assert_eq!(
            step(3, Probe::Ready, 12),
            PollState::Done(PollOutcome::Ready { attempts: 3 })
        );
    }

    #[test]
    fn step_pending_advances_attempt() {
        assert_eq!(
            step(3, Probe::Pending, 12),
            PollState::Polling { attempt: 4 }
        );
    }

    #[test]
    fn step_pending_on_last_attempt_times_out() {
        assert_eq!(
            step(12, Probe::Pending, 12),
            PollState::Done(PollOutcome::TimedOut { attempts: 12 })
        );
    }

    #[test]
    fn step_fatal_is_terminal() {
        assert_eq!(
            step(1, Probe::Fatal("boom".to_string()), 12),
            PollState::Done(PollOutcome::Failed {
                attempts: 1,
                message: "boom".to_string()
            })
        );
    }

    /// Probe that replays a fixed script of results.
    fn scripted(script: Vec<Probe>) -> (RefCell<Vec<Probe>>, RefCell<u32>) {
        (RefCell::new(script), RefCell::new(0))
    }

    #[tokio::test]
    async fn ready_on_final_attempt() {
        let mut script = vec![Probe::Pending; 11];
        script.push(Probe::Ready);
        let (script, count) = scripted(script);

        let outcome = run(fast(12), &CancellationToken::new(), "test", || {
            *count.borrow_mut() += 1;
            let probe = script.borrow_mut().remove(0);
            async move { probe }
        })
        .await;

        assert_eq!(outcome, PollOutcome::Ready { attempts: 12 });
        assert_eq!(*count.borrow(), 12);
    }

    #[tokio::test]
    async fn all_pending_times_out() {
        let (script, count) = scripted(vec![Probe::Pending; 12]);

        let outcome = run(fast(12), &CancellationToken::new(), "test", || {
            *count.borrow_mut() += 1;
            let probe = script.borrow_mut().remove(0);
            async move { probe }
        })
        .await;

        assert_eq!(outcome, PollOutcome::TimedOut { attempts: 12 });
        assert_eq!(*count.borrow(), 12);
    }

    #[tokio::test]
    async fn fatal_stops_immediately() {
        let (script, count) = scripted(vec![
            Probe::Pending,
            Probe::Fatal("forbidden".to_string()),
            Probe::Ready,
        ]);

        let outcome = run(fast(12), &CancellationToken::new(), "test", || {
            *count.borrow_mut() += 1;
            let probe = script.borrow_mut().remove(0);
            async move { probe }
        })
        .await;

        assert_eq!(
            outcome,
            PollOutcome::Failed {
                attempts: 2,
                message: "forbidden".to_string()
            }
        );
        // No probe after the fatal one
        assert_eq!(*count.borrow(), 2);
    }

    #[tokio::test]
    async fn cancelled_token_stops_before_first_probe() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let count = RefCell::new(0u32);

        let outcome = run(fast(12), &cancel, "test", || {
            *count.borrow_mut() += 1;
            async { Probe::Pending }
        })
        .await;

        assert_eq!(outcome, PollOutcome::Cancelled);
        assert_eq!(*count.borrow(), 0);
    }
}
