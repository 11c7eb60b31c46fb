//! Session lifecycle: `scheduled -> active -> completed`.
//!
//! These methods are the only mutators of a [`GameSession`]. They are plain
//! synchronous state changes; serialization of concurrent callers is the job
//! of the owning [`SessionActor`](super::SessionActor).

use chrono::{DateTime, Duration, Utc};
use rand::Rng;

use super::models::{GameSession, SessionStatus, Transition};
use crate::card::Ball;
use crate::error::{BingoError, BingoResult};
use crate::win::CalledSet;

impl GameSession {
    fn reject(&self, action: Transition) -> BingoError {
        BingoError::InvalidTransition {
            session_id: self.id,
            from: self.status,
            action,
        }
    }

    /// Start calling numbers. Allowed only from `scheduled`.
    pub fn activate(&mut self, now: DateTime<Utc>) -> BingoResult<()> {
        if self.status != SessionStatus::Scheduled {
            return Err(self.reject(Transition::Activate));
        }
        self.status = SessionStatus::Active;
        self.activated_at = Some(now);
        Ok(())
    }

    /// Draw a ball uniformly from those not yet called and append it.
    ///
    /// # Errors
    ///
    /// * `InvalidTransition` - Session is not active
    /// * `ExhaustedPool` - All 75 balls have been called
    pub fn call_next_number<R: Rng>(&mut self, rng: &mut R) -> BingoResult<Ball> {
        if self.status != SessionStatus::Active {
            return Err(self.reject(Transition::CallNumber));
        }

        let remaining = self.remaining_balls();
        if remaining.is_empty() {
            return Err(BingoError::ExhaustedPool(self.id));
        }

        let ball = remaining[rng.random_range(0..remaining.len())];
        self.called_numbers.push(ball);
        Ok(ball)
    }

    /// End the session, or cancel it before it started.
    pub fn complete(&mut self, now: DateTime<Utc>) -> BingoResult<()> {
        if self.status == SessionStatus::Completed {
            return Err(self.reject(Transition::Complete));
        }
        self.status = SessionStatus::Completed;
        self.end_time = Some(now);
        Ok(())
    }

    pub fn called_set(&self) -> CalledSet {
        self.called_numbers.iter().collect()
    }

    /// Balls still in the pool, ascending
    pub fn remaining_balls(&self) -> Vec<Ball> {
        self.called_set().remaining()
    }

    /// Latest instant a claim is accepted. `None` while the window is open-ended.
    pub fn claim_deadline(&self, window: Duration) -> Option<DateTime<Utc>> {
        match self.status {
            SessionStatus::Completed => self.end_time.map(|end| end + window),
            _ => None,
        }
    }

    /// Check that a claim made at `at` falls inside the claim window.
    ///
    /// Active sessions always accept claims. Completed sessions accept them up
    /// to and including `end_time + window`, unless they were cancelled
    /// before they ever started.
    pub fn check_claim_window(&self, at: DateTime<Utc>, window: Duration) -> BingoResult<()> {
        if self.activated_at.is_none() {
            return Err(BingoError::SessionNotLive(self.id));
        }

        match self.claim_deadline(window) {
            Some(deadline) if at > deadline => Err(BingoError::ClaimExpired {
                session_id: self.id,
                deadline,
            }),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::NewSession;
    use crate::win::WinPattern;
    use rand::{SeedableRng, rngs::StdRng};
    use std::collections::HashSet;

    fn session() -> GameSession {
        let now = Utc::now();
        GameSession::from_new(1, NewSession::new("Test", now, WinPattern::Standard), now)
    }

    #[test]
    fn test_activate_only_from_scheduled() {
        let mut session = session();
        let started = Utc::now();
        session.activate(started).unwrap();
        assert_eq!(session.status, SessionStatus::Active);
        assert_eq!(session.activated_at, Some(started));

        let err = session.activate(Utc::now()).unwrap_err();
        assert_eq!(
            err,
            BingoError::InvalidTransition {
                session_id: 1,
                from: SessionStatus::Active,
                action: Transition::Activate,
            }
        );
    }

    #[test]
    fn test_call_requires_active() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut session = session();
        assert_eq!(
            session.call_next_number(&mut rng).unwrap_err().kind(),
            "invalid_transition"
        );
        assert!(session.called_numbers.is_empty());
    }

    #[test]
    fn test_full_pool_then_exhausted() {
        let mut rng = StdRng::seed_from_u64(42);
        let mut session = session();
        session.activate(Utc::now()).unwrap();

        let mut seen = HashSet::new();
        for _ in 0..75 {
            let ball = session.call_next_number(&mut rng).unwrap();
            assert!(seen.insert(ball), "ball {ball} called twice");
        }

        assert_eq!(session.called_numbers.len(), 75);
        assert_eq!(
            session.call_next_number(&mut rng).unwrap_err(),
            BingoError::ExhaustedPool(1)
        );
        assert_eq!(session.called_numbers.len(), 75);
    }

    #[test]
    fn test_complete_freezes_calls() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut session = session();
        session.activate(Utc::now()).unwrap();
        session.call_next_number(&mut rng).unwrap();

        let end = Utc::now();
        session.complete(end).unwrap();
        assert_eq!(session.end_time, Some(end));

        assert!(session.call_next_number(&mut rng).is_err());
        assert!(session.complete(Utc::now()).is_err());
        assert_eq!(session.end_time, Some(end));
        assert_eq!(session.called_numbers.len(), 1);
    }

    #[test]
    fn test_cancel_from_scheduled() {
        let mut session = session();
        session.complete(Utc::now()).unwrap();
        assert_eq!(session.status, SessionStatus::Completed);
        assert!(session.activate(Utc::now()).is_err());
    }

    #[test]
    fn test_cancelled_session_never_live() {
        let window = Duration::minutes(30);
        let mut session = session();
        let end = Utc::now();
        session.complete(end).unwrap();

        assert_eq!(session.activated_at, None);
        assert_eq!(
            session
                .check_claim_window(end + Duration::minutes(5), window)
                .unwrap_err(),
            BingoError::SessionNotLive(1)
        );
    }

    #[test]
    fn test_claim_window_boundaries() {
        let window = Duration::minutes(30);
        let mut session = session();
        assert_eq!(
            session.check_claim_window(Utc::now(), window).unwrap_err(),
            BingoError::SessionNotLive(1)
        );

        session.activate(Utc::now()).unwrap();
        assert!(session.check_claim_window(Utc::now(), window).is_ok());
        assert_eq!(session.claim_deadline(window), None);

        let end = Utc::now();
        session.complete(end).unwrap();
        let deadline = end + window;
        assert_eq!(session.claim_deadline(window), Some(deadline));

        assert!(session.check_claim_window(end + Duration::minutes(29), window).is_ok());
        assert!(session.check_claim_window(deadline, window).is_ok());
        assert_eq!(
            session
                .check_claim_window(end + Duration::minutes(31), window)
                .unwrap_err(),
            BingoError::ClaimExpired {
                session_id: 1,
                deadline
            }
        );
    }
}
