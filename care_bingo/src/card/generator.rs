//! Random card generation.

use rand::{Rng, rngs::ThreadRng};
use std::collections::HashSet;

use super::models::{
    Ball, CARD_CELLS, CardDraft, CardNumbers, Cell, FREE_INDEX, GRID_SIZE, Letter, OwnerId,
};
use crate::error::{BingoError, BingoResult};
use crate::session::SessionId;

/// Prefix of every card identifier
pub const IDENTIFIER_PREFIX: &str = "GBL-";

/// Smallest batch a single request may generate
pub const MIN_BATCH: usize = 1;

/// Largest batch a single request may generate
pub const MAX_BATCH: usize = 100;

const IDENTIFIER_DIGITS: std::ops::RangeInclusive<u32> = 1_000_000..=9_999_999;
const CODE_DIGITS: std::ops::RangeInclusive<u64> = 1_000_000_000..=9_999_999_999;

/// Produces card grids, identifiers and verification codes.
///
/// Uniqueness against previously stored cards is the card store's job; the
/// generator only guarantees distinct identifiers within one batch.
pub struct CardGenerator<R = ThreadRng> {
    rng: R,
}

impl CardGenerator<ThreadRng> {
    pub fn new() -> Self {
        Self { rng: rand::rng() }
    }
}

impl Default for CardGenerator<ThreadRng> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Rng> CardGenerator<R> {
    /// Create a generator over a caller-supplied RNG (seeded RNGs make tests reproducible)
    pub fn with_rng(rng: R) -> Self {
        Self { rng }
    }

    /// Generate `count` cards, optionally bound to a session and owner.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` if `count` is outside 1..=100.
    pub fn generate(
        &mut self,
        count: usize,
        session_id: Option<SessionId>,
        owner_id: Option<OwnerId>,
    ) -> BingoResult<Vec<CardDraft>> {
        if !(MIN_BATCH..=MAX_BATCH).contains(&count) {
            return Err(BingoError::invalid_argument(format!(
                "card count must be between {MIN_BATCH} and {MAX_BATCH}, got {count}"
            )));
        }

        let mut seen = HashSet::with_capacity(count);
        let mut drafts = Vec::with_capacity(count);
        while drafts.len() < count {
            let draft = self.draft(session_id, owner_id);
            if seen.insert(draft.identifier.clone()) {
                drafts.push(draft);
            }
        }

        Ok(drafts)
    }

    /// Generate a single card
    pub fn draft(&mut self, session_id: Option<SessionId>, owner_id: Option<OwnerId>) -> CardDraft {
        CardDraft {
            identifier: self.identifier(),
            verification_code: self.verification_code(),
            numbers: self.numbers(),
            session_id,
            owner_id,
        }
    }

    /// Replace a draft's identifier and code after a store collision
    pub fn redraw_identity(&mut self, draft: &mut CardDraft) {
        draft.identifier = self.identifier();
        draft.verification_code = self.verification_code();
    }

    /// Fill a 5x5 grid: five distinct balls per letter, four for N around the FREE center.
    pub fn numbers(&mut self) -> CardNumbers {
        let mut cells = [Cell::Free; CARD_CELLS];

        for letter in Letter::ALL {
            let column = letter.column();
            let count = if letter == Letter::N {
                GRID_SIZE - 1
            } else {
                GRID_SIZE
            };
            let mut balls = self.draw_distinct(letter, count).into_iter();

            for row in 0..GRID_SIZE {
                let index = row * GRID_SIZE + column;
                if index == FREE_INDEX {
                    continue;
                }
                if let Some(ball) = balls.next() {
                    cells[index] = Cell::Number(ball);
                }
            }
        }

        CardNumbers(cells)
    }

    pub fn identifier(&mut self) -> String {
        format!(
            "{IDENTIFIER_PREFIX}{}",
            self.rng.random_range(IDENTIFIER_DIGITS)
        )
    }

    pub fn verification_code(&mut self) -> String {
        self.rng.random_range(CODE_DIGITS).to_string()
    }

    /// Rejection sampling: redraw on duplicate. Every range is 15 wide, so this terminates quickly.
    fn draw_distinct(&mut self, letter: Letter, count: usize) -> Vec<Ball> {
        let range = letter.range();
        let mut drawn: Vec<Ball> = Vec::with_capacity(count);
        while drawn.len() < count {
            let candidate = Ball(self.rng.random_range(range.clone()));
            if !drawn.contains(&candidate) {
                drawn.push(candidate);
            }
        }
        drawn
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{SeedableRng, rngs::StdRng};

    fn seeded() -> CardGenerator<StdRng> {
        CardGenerator::with_rng(StdRng::seed_from_u64(7))
    }

    #[test]
    fn test_generate_rejects_out_of_range_counts() {
        let mut generator = seeded();
        assert!(generator.generate(0, None, None).is_err());
        assert!(generator.generate(101, None, None).is_err());
        assert_eq!(generator.generate(1, None, None).unwrap().len(), 1);
        assert_eq!(generator.generate(100, None, None).unwrap().len(), 100);
    }

    #[test]
    fn test_generated_card_satisfies_invariants() {
        let mut generator = seeded();
        for _ in 0..200 {
            let numbers = generator.numbers();
            // Re-validating through the checked constructor covers ranges, duplicates and FREE.
            assert_eq!(CardNumbers::new(*numbers.cells()), Ok(numbers));
            assert_eq!(numbers.get(2, 2), Cell::Free);
        }
    }

    #[test]
    fn test_identifier_and_code_shape() {
        let mut generator = seeded();
        let identifier = generator.identifier();
        assert!(identifier.starts_with(IDENTIFIER_PREFIX));
        assert_eq!(identifier.len(), IDENTIFIER_PREFIX.len() + 7);

        let code = generator.verification_code();
        assert_eq!(code.len(), 10);
        assert!(code.chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn test_batch_identifiers_are_distinct() {
        let drafts = seeded().generate(100, Some(3), Some(1)).unwrap();
        let identifiers: HashSet<_> = drafts.iter().map(|d| d.identifier.as_str()).collect();
        assert_eq!(identifiers.len(), 100);
        assert!(drafts.iter().all(|d| d.session_id == Some(3) && d.owner_id == Some(1)));
    }

    #[test]
    fn test_redraw_identity_keeps_numbers() {
        let mut generator = seeded();
        let mut draft = generator.draft(None, None);
        let numbers = draft.numbers;
        let old_identifier = draft.identifier.clone();

        generator.redraw_identity(&mut draft);
        assert_eq!(draft.numbers, numbers);
        assert_ne!(draft.identifier, old_identifier);
    }
}
