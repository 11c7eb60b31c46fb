//! Card data models: balls, cells and the 5x5 card grid.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{fmt, ops::RangeInclusive, str::FromStr};

use crate::error::{BingoError, BingoResult};
use crate::session::SessionId;

/// Card ID type
pub type CardId = i64;

/// Requesting user or facility
pub type OwnerId = i64;

/// Total number of balls in the pool
pub const BALL_COUNT: u8 = 75;

/// Balls per letter column
pub const BALLS_PER_LETTER: u8 = 15;

/// Rows and columns on a card
pub const GRID_SIZE: usize = 5;

/// Cells on a card
pub const CARD_CELLS: usize = GRID_SIZE * GRID_SIZE;

/// Index of the FREE cell (row 2, column 2)
pub const FREE_INDEX: usize = 12;

/// Column letter of a 75-ball card
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Letter {
    B,
    I,
    N,
    G,
    O,
}

impl Letter {
    pub const ALL: [Letter; GRID_SIZE] = [Letter::B, Letter::I, Letter::N, Letter::G, Letter::O];

    /// Column index of this letter on the card
    pub fn column(self) -> usize {
        self as usize
    }

    /// Ball values that belong to this letter
    pub fn range(self) -> RangeInclusive<u8> {
        let low = self.column() as u8 * BALLS_PER_LETTER + 1;
        low..=low + BALLS_PER_LETTER - 1
    }

    fn from_char(c: char) -> Option<Self> {
        match c.to_ascii_uppercase() {
            'B' => Some(Letter::B),
            'I' => Some(Letter::I),
            'N' => Some(Letter::N),
            'G' => Some(Letter::G),
            'O' => Some(Letter::O),
            _ => None,
        }
    }
}

impl fmt::Display for Letter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let c = match self {
            Letter::B => 'B',
            Letter::I => 'I',
            Letter::N => 'N',
            Letter::G => 'G',
            Letter::O => 'O',
        };
        write!(f, "{c}")
    }
}

/// A ball value in 1..=75.
///
/// Serialized as the bare integer. Parsing accepts the display form `B-4`,
/// the compact form `B4` and the bare number `4`; all normalize to the same
/// ball, and a letter that disagrees with the number is rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Ball(pub(crate) u8);

impl Ball {
    /// Create a ball, rejecting values outside the pool
    pub fn new(value: u8) -> BingoResult<Self> {
        if (1..=BALL_COUNT).contains(&value) {
            Ok(Ball(value))
        } else {
            Err(BingoError::invalid_argument(format!(
                "ball {value} is outside 1..={BALL_COUNT}"
            )))
        }
    }

    pub fn value(self) -> u8 {
        self.0
    }

    pub fn letter(self) -> Letter {
        Letter::ALL[((self.0 - 1) / BALLS_PER_LETTER) as usize]
    }

    /// Every ball in the pool, ascending
    pub fn all() -> impl Iterator<Item = Ball> {
        (1..=BALL_COUNT).map(Ball)
    }
}

impl TryFrom<u8> for Ball {
    type Error = BingoError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Ball::new(value)
    }
}

impl From<Ball> for u8 {
    fn from(ball: Ball) -> Self {
        ball.0
    }
}

impl fmt::Display for Ball {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.letter(), self.0)
    }
}

impl FromStr for Ball {
    type Err = BingoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let mut chars = trimmed.chars();
        let (letter, digits) = match chars.next() {
            Some(c) if c.is_ascii_alphabetic() => {
                let letter = Letter::from_char(c).ok_or_else(|| {
                    BingoError::invalid_argument(format!("unknown ball letter in '{trimmed}'"))
                })?;
                let rest = chars.as_str();
                (Some(letter), rest.strip_prefix('-').unwrap_or(rest))
            }
            _ => (None, trimmed),
        };

        let value: u8 = digits
            .parse()
            .map_err(|_| BingoError::invalid_argument(format!("malformed ball '{trimmed}'")))?;
        let ball = Ball::new(value)?;

        match letter {
            Some(letter) if letter != ball.letter() => Err(BingoError::invalid_argument(format!(
                "ball '{trimmed}' does not belong to column {letter}"
            ))),
            _ => Ok(ball),
        }
    }
}

/// One square of a card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "CellRepr", into = "CellRepr")]
pub enum Cell {
    /// The always-marked center square
    Free,
    Number(Ball),
}

impl Cell {
    pub fn ball(self) -> Option<Ball> {
        match self {
            Cell::Free => None,
            Cell::Number(ball) => Some(ball),
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Free => write!(f, "FREE"),
            Cell::Number(ball) => write!(f, "{ball}"),
        }
    }
}

impl FromStr for Cell {
    type Err = BingoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.eq_ignore_ascii_case("free") || trimmed == "0" {
            Ok(Cell::Free)
        } else {
            trimmed.parse().map(Cell::Number)
        }
    }
}

/// Wire form of a cell: `0` or `"FREE"` for the free square, otherwise a number or label.
#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum CellRepr {
    Number(u8),
    Label(String),
}

impl From<Cell> for CellRepr {
    fn from(cell: Cell) -> Self {
        match cell {
            Cell::Free => CellRepr::Label("FREE".to_string()),
            Cell::Number(ball) => CellRepr::Number(ball.value()),
        }
    }
}

impl TryFrom<CellRepr> for Cell {
    type Error = BingoError;

    fn try_from(repr: CellRepr) -> Result<Self, Self::Error> {
        match repr {
            CellRepr::Number(0) => Ok(Cell::Free),
            CellRepr::Number(value) => Ball::new(value).map(Cell::Number),
            CellRepr::Label(label) => label.parse(),
        }
    }
}

/// The 25 cells of a card, row-major: index `row * 5 + column`.
///
/// Column `k` holds the balls of letter `k`; the center is always [`Cell::Free`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "Vec<Cell>", into = "Vec<Cell>")]
pub struct CardNumbers(pub(crate) [Cell; CARD_CELLS]);

impl CardNumbers {
    /// Build a card from row-major cells, checking the column invariants.
    pub fn new(cells: [Cell; CARD_CELLS]) -> BingoResult<Self> {
        for (index, cell) in cells.iter().enumerate() {
            let column = index % GRID_SIZE;
            match cell {
                Cell::Free if index == FREE_INDEX => {}
                Cell::Free => {
                    return Err(BingoError::invalid_argument(format!(
                        "FREE cell at position {index}, only the center may be free"
                    )));
                }
                Cell::Number(_) if index == FREE_INDEX => {
                    return Err(BingoError::invalid_argument("center cell must be FREE"));
                }
                Cell::Number(ball) if ball.letter().column() != column => {
                    return Err(BingoError::invalid_argument(format!(
                        "{ball} cannot sit in column {}",
                        Letter::ALL[column]
                    )));
                }
                Cell::Number(_) => {}
            }
        }

        let numbers = Self(cells);
        for column in 0..GRID_SIZE {
            let balls: Vec<Ball> = numbers.column(column).iter().filter_map(|c| c.ball()).collect();
            for (i, ball) in balls.iter().enumerate() {
                if balls[i + 1..].contains(ball) {
                    return Err(BingoError::invalid_argument(format!(
                        "{ball} appears twice in column {}",
                        Letter::ALL[column]
                    )));
                }
            }
        }

        Ok(numbers)
    }

    /// Build a card from five columns of five cells each (B, I, N, G, O).
    pub fn from_columns(columns: [[Cell; GRID_SIZE]; GRID_SIZE]) -> BingoResult<Self> {
        let mut cells = [Cell::Free; CARD_CELLS];
        for (column, values) in columns.iter().enumerate() {
            for (row, cell) in values.iter().enumerate() {
                cells[row * GRID_SIZE + column] = *cell;
            }
        }
        Self::new(cells)
    }

    pub fn cells(&self) -> &[Cell; CARD_CELLS] {
        &self.0
    }

    pub fn get(&self, row: usize, column: usize) -> Cell {
        self.0[row * GRID_SIZE + column]
    }

    pub fn row(&self, row: usize) -> [Cell; GRID_SIZE] {
        std::array::from_fn(|column| self.get(row, column))
    }

    pub fn column(&self, column: usize) -> [Cell; GRID_SIZE] {
        std::array::from_fn(|row| self.get(row, column))
    }

    /// Rows of cells, as printed on a card
    pub fn rows(&self) -> [[Cell; GRID_SIZE]; GRID_SIZE] {
        std::array::from_fn(|row| self.row(row))
    }
}

/// Wire form is column-major: the five B cells, then I, N, G and O.
impl TryFrom<Vec<Cell>> for CardNumbers {
    type Error = BingoError;

    fn try_from(cells: Vec<Cell>) -> Result<Self, Self::Error> {
        if cells.len() != CARD_CELLS {
            return Err(BingoError::invalid_argument(format!(
                "a card has {CARD_CELLS} cells, got {}",
                cells.len()
            )));
        }
        let columns = std::array::from_fn(|column| {
            std::array::from_fn(|row| cells[column * GRID_SIZE + row])
        });
        Self::from_columns(columns)
    }
}

impl From<CardNumbers> for Vec<Cell> {
    fn from(numbers: CardNumbers) -> Self {
        (0..GRID_SIZE).flat_map(|column| numbers.column(column)).collect()
    }
}

/// A generated card that has not been stored yet
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardDraft {
    pub identifier: String,
    pub verification_code: String,
    pub numbers: CardNumbers,
    pub session_id: Option<SessionId>,
    pub owner_id: Option<OwnerId>,
}

/// Stored bingo card
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BingoCard {
    pub id: CardId,
    pub identifier: String,
    pub verification_code: String,
    pub numbers: CardNumbers,
    pub session_id: Option<SessionId>,
    pub owner_id: Option<OwnerId>,
    pub is_issued: bool,
    pub is_printed: bool,
    pub is_ordered: bool,
    pub is_winner: bool,
    pub win_claimed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl BingoCard {
    /// Promote a draft to a stored card with fresh status flags
    pub fn from_draft(id: CardId, draft: CardDraft, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            identifier: draft.identifier,
            verification_code: draft.verification_code,
            numbers: draft.numbers,
            session_id: draft.session_id,
            owner_id: draft.owner_id,
            is_issued: false,
            is_printed: false,
            is_ordered: false,
            is_winner: false,
            win_claimed_at: None,
            created_at,
        }
    }

    /// Set the printed flag. Returns `false` if it was already set.
    pub fn mark_printed(&mut self) -> bool {
        self.is_issued = true;
        !std::mem::replace(&mut self.is_printed, true)
    }

    /// Set the ordered flag. Returns `false` if it was already set.
    pub fn mark_ordered(&mut self) -> bool {
        self.is_issued = true;
        !std::mem::replace(&mut self.is_ordered, true)
    }

    /// Set the winner flag, stamping `win_claimed_at` only the first time.
    pub fn mark_winner(&mut self, at: DateTime<Utc>) -> bool {
        if self.is_winner {
            return false;
        }
        self.is_winner = true;
        self.win_claimed_at = Some(at);
        true
    }
}

/// A status flag change, applied by the store to the stored card in place
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CardMark {
    Printed,
    Ordered,
    Winner(DateTime<Utc>),
}

impl CardMark {
    /// Apply to `card`. Returns `false` if the flag was already set.
    pub fn apply(self, card: &mut BingoCard) -> bool {
        match self {
            CardMark::Printed => card.mark_printed(),
            CardMark::Ordered => card.mark_ordered(),
            CardMark::Winner(at) => card.mark_winner(at),
        }
    }
}
