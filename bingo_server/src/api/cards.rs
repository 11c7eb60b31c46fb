//! Card API handlers: generation, print/order tracking and win verification.
//!
//! # Examples
//!
//! Generate cards for a session:
//! ```bash
//! curl -X POST http://localhost:6969/api/v1/cards/generate \
//!   -H "Content-Type: application/json" \
//!   -d '{"count": 20, "session_id": 1}'
//! ```
//!
//! Check a claim read off a printed card:
//! ```bash
//! curl -X POST http://localhost:6969/api/v1/cards/verify \
//!   -H "Content-Type: application/json" \
//!   -d '{"identifier": "GBL-4821937", "session_id": 1}'
//! ```

use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
};
use care_bingo::{
    BingoResult, WinClaim,
    card::{BingoCard, CardId, OwnerId},
    session::SessionId,
    win::WinPattern,
};
use serde::Deserialize;

use super::{AppState, error::ApiError};
use crate::{logging, metrics};

#[derive(Debug, Deserialize)]
pub struct ListCardsQuery {
    pub session_id: Option<SessionId>,
}

#[derive(Debug, Deserialize)]
pub struct GenerateCardsRequest {
    pub count: usize,
    pub session_id: Option<SessionId>,
    pub owner_id: Option<OwnerId>,
}

#[derive(Debug, Deserialize)]
pub struct CardIdsRequest {
    pub card_ids: Vec<CardId>,
}

#[derive(Debug, Deserialize)]
pub struct VerifyCardRequest {
    pub identifier: String,
    pub session_id: SessionId,
    /// Pattern the caller believes is in play; checked against the session's
    pub pattern: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct VerifyCodeRequest {
    pub code: String,
    pub session_id: SessionId,
    pub pattern: Option<String>,
}

/// List cards, optionally only those bound to one session.
pub async fn list_cards(
    State(state): State<AppState>,
    Query(query): Query<ListCardsQuery>,
) -> Result<Json<Vec<BingoCard>>, ApiError> {
    Ok(Json(state.cards.list_cards(query.session_id).await?))
}

/// Generate a batch of cards.
///
/// # Errors
///
/// - `400 Bad Request`: `count` outside 1..=100
/// - `404 Not Found`: `session_id` does not exist
pub async fn generate_cards(
    State(state): State<AppState>,
    Json(request): Json<GenerateCardsRequest>,
) -> Result<(StatusCode, Json<Vec<BingoCard>>), ApiError> {
    let cards = state
        .cards
        .generate_cards(request.count, request.session_id, request.owner_id)
        .await?;

    metrics::cards_generated_total(cards.len());
    Ok((StatusCode::CREATED, Json(cards)))
}

/// Mark cards as printed. Unknown IDs are skipped.
pub async fn print_cards(
    State(state): State<AppState>,
    Json(request): Json<CardIdsRequest>,
) -> Result<Json<Vec<BingoCard>>, ApiError> {
    Ok(Json(state.cards.mark_printed(&request.card_ids).await?))
}

/// Mark cards as ordered. Unknown IDs are skipped.
pub async fn order_cards(
    State(state): State<AppState>,
    Json(request): Json<CardIdsRequest>,
) -> Result<Json<Vec<BingoCard>>, ApiError> {
    Ok(Json(state.cards.mark_ordered(&request.card_ids).await?))
}

/// Verify a win claim by printed card identifier.
///
/// A losing card is a normal `200 OK` with `"is_valid": false`.
///
/// # Errors
///
/// - `404 Not Found`: Card or session doesn't exist
/// - `409 Conflict`: Card not bound to this session, or session not started
/// - `410 Gone`: Claim window has closed
pub async fn verify_card(
    State(state): State<AppState>,
    Json(request): Json<VerifyCardRequest>,
) -> Result<Json<WinClaim>, ApiError> {
    let pattern = parse_pattern(request.pattern.as_deref())?;
    let result = state
        .verifier
        .verify_by_identifier(&request.identifier, request.session_id, pattern)
        .await;

    finish_claim(request.session_id, &request.identifier, result)
}

/// Verify a win claim by verification code.
///
/// Same outcomes as [`verify_card`].
pub async fn verify_code(
    State(state): State<AppState>,
    Json(request): Json<VerifyCodeRequest>,
) -> Result<Json<WinClaim>, ApiError> {
    let pattern = parse_pattern(request.pattern.as_deref())?;
    let result = state
        .verifier
        .verify_by_code(&request.code, request.session_id, pattern)
        .await;

    finish_claim(request.session_id, &request.code, result)
}

fn parse_pattern(raw: Option<&str>) -> Result<Option<WinPattern>, ApiError> {
    raw.map(str::parse::<WinPattern>)
        .transpose()
        .map_err(ApiError::from)
}

/// Record the claim outcome and convert it to a response
fn finish_claim(
    session_id: SessionId,
    card: &str,
    result: BingoResult<WinClaim>,
) -> Result<Json<WinClaim>, ApiError> {
    let outcome = match &result {
        Ok(claim) if claim.is_valid => "winner",
        Ok(_) => "not_winner",
        Err(err) => err.kind(),
    };

    metrics::win_claims_total(outcome);
    logging::log_claim(session_id, card, outcome);

    Ok(Json(result?))
}
