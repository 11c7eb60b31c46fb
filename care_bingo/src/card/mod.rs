//! Bingo cards: 75-ball grid model, random generation and card administration.
//!
//! This module implements:
//! - `CardNumbers`: 5x5 grid with a FREE center and per-letter columns
//! - `CardGenerator`: collision-free random cards, identifiers and verification codes
//! - `CardManager`: batch generation against the card store, status flags, lookups
//!
//! ## Example
//!
//! ```
//! use care_bingo::card::{CardGenerator, Cell};
//!
//! let mut generator = CardGenerator::new();
//! let cards = generator.generate(3, None, None).unwrap();
//!
//! assert_eq!(cards.len(), 3);
//! assert_eq!(cards[0].numbers.get(2, 2), Cell::Free);
//! ```

pub mod generator;
pub mod manager;
pub mod models;

pub use generator::{CardGenerator, IDENTIFIER_PREFIX, MAX_BATCH, MIN_BATCH};
pub use manager::{CardManager, MAX_ALLOCATION_ATTEMPTS};
pub use models::{
    BALL_COUNT, BALLS_PER_LETTER, Ball, BingoCard, CARD_CELLS, CardDraft, CardId, CardMark, CardNumbers,
    Cell, FREE_INDEX, GRID_SIZE, Letter, OwnerId,
};
