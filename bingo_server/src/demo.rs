//! Demo data for trying the server without an operator console.

use care_bingo::{
    BingoResult,
    card::CardManager,
    session::{SessionId, SessionManager},
    win::WinPattern,
};
use chrono::{Duration, Utc};

/// Numbers called in the seeded live session
pub const DEMO_CALLS: usize = 5;

/// Cards issued for the seeded live session
pub const DEMO_CARDS: usize = 10;

/// What [`seed`] created
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DemoSeed {
    pub scheduled: Vec<SessionId>,
    pub live: SessionId,
}

/// Seed two upcoming sessions and one live session with a few calls and
/// cards bound to it.
pub async fn seed(sessions: &SessionManager, cards: &CardManager) -> BingoResult<DemoSeed> {
    let now = Utc::now();

    let afternoon = sessions
        .create_session(
            "Afternoon Bingo",
            now + Duration::hours(2),
            WinPattern::Standard,
        )
        .await?;
    let friday = sessions
        .create_session(
            "Friday Full House",
            now + Duration::days(3),
            WinPattern::Blackout,
        )
        .await?;

    let live = sessions
        .create_session("Lounge Corners", now + Duration::minutes(30), WinPattern::FourCorners)
        .await?;
    sessions.activate(live.id).await?;
    for _ in 0..DEMO_CALLS {
        sessions.call_next_number(live.id).await?;
    }

    let issued = cards.generate_cards(DEMO_CARDS, Some(live.id), None).await?;
    log::info!(
        "Seeded demo: sessions {} and {} scheduled, session {} live with {} cards",
        afternoon.id,
        friday.id,
        live.id,
        issued.len()
    );

    Ok(DemoSeed {
        scheduled: vec![afternoon.id, friday.id],
        live: live.id,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use care_bingo::{
        session::{SessionConfig, SessionStatus},
        store::InMemoryStore,
    };
    use std::sync::Arc;

    #[tokio::test]
    async fn test_seed_creates_live_session_with_cards() {
        let store = Arc::new(InMemoryStore::new());
        let sessions = SessionManager::new(store.clone(), SessionConfig::default());
        let cards = CardManager::new(store.clone(), store);

        let seeded = seed(&sessions, &cards).await.unwrap();
        assert_eq!(seeded.scheduled.len(), 2);

        let live = sessions.get_snapshot(seeded.live).await.unwrap();
        assert_eq!(live.status, SessionStatus::Active);
        assert_eq!(live.called_numbers.len(), DEMO_CALLS);

        let issued = cards.list_cards(Some(seeded.live)).await.unwrap();
        assert_eq!(issued.len(), DEMO_CARDS);

        sessions.shutdown().await;
    }
}
