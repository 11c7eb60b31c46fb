//! Pure win detection over a card and the set of called balls.

use serde::{Deserialize, Serialize};

use super::pattern::WinPattern;
use crate::card::{BALL_COUNT, Ball, CARD_CELLS, CardNumbers, Cell, GRID_SIZE};
use crate::error::BingoResult;

/// Set of called balls, independent of call order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct CalledSet(u128);

impl CalledSet {
    pub fn new() -> Self {
        Self(0)
    }

    /// Normalize display labels (`B-4`, `B4`, `4`) into a set.
    pub fn from_labels<I, S>(labels: I) -> BingoResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut set = Self::new();
        for label in labels {
            set.insert(label.as_ref().parse()?);
        }
        Ok(set)
    }

    /// Returns `false` if the ball was already present.
    pub fn insert(&mut self, ball: Ball) -> bool {
        let bit = 1u128 << ball.value();
        let fresh = self.0 & bit == 0;
        self.0 |= bit;
        fresh
    }

    pub fn contains(&self, ball: Ball) -> bool {
        self.0 & (1u128 << ball.value()) != 0
    }

    pub fn len(&self) -> usize {
        self.0.count_ones() as usize
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn is_full(&self) -> bool {
        self.len() == BALL_COUNT as usize
    }

    /// Balls not yet called, ascending
    pub fn remaining(&self) -> Vec<Ball> {
        Ball::all().filter(|ball| !self.contains(*ball)).collect()
    }
}

impl FromIterator<Ball> for CalledSet {
    fn from_iter<T: IntoIterator<Item = Ball>>(iter: T) -> Self {
        let mut set = Self::new();
        for ball in iter {
            set.insert(ball);
        }
        set
    }
}

impl<'a> FromIterator<&'a Ball> for CalledSet {
    fn from_iter<T: IntoIterator<Item = &'a Ball>>(iter: T) -> Self {
        iter.into_iter().copied().collect()
    }
}

/// A line that completes the standard pattern
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "index", rename_all = "snake_case")]
pub enum Line {
    Row(usize),
    Column(usize),
    /// Top-left to bottom-right
    Diagonal,
    /// Top-right to bottom-left
    AntiDiagonal,
}

impl Line {
    /// All twelve lines: rows, then columns, then diagonals
    pub fn all() -> impl Iterator<Item = Line> {
        (0..GRID_SIZE)
            .map(Line::Row)
            .chain((0..GRID_SIZE).map(Line::Column))
            .chain([Line::Diagonal, Line::AntiDiagonal])
    }

    /// Card indices covered by this line
    pub fn indices(self) -> [usize; GRID_SIZE] {
        std::array::from_fn(|i| match self {
            Line::Row(row) => row * GRID_SIZE + i,
            Line::Column(column) => i * GRID_SIZE + column,
            Line::Diagonal => i * GRID_SIZE + i,
            Line::AntiDiagonal => i * GRID_SIZE + (GRID_SIZE - 1 - i),
        })
    }
}

const CORNERS: [usize; 4] = [0, GRID_SIZE - 1, CARD_CELLS - GRID_SIZE, CARD_CELLS - 1];

/// The FREE square is always marked; a number is marked once called.
pub fn is_marked(cell: Cell, called: &CalledSet) -> bool {
    match cell {
        Cell::Free => true,
        Cell::Number(ball) => called.contains(ball),
    }
}

fn all_marked(card: &CardNumbers, called: &CalledSet, indices: &[usize]) -> bool {
    indices
        .iter()
        .all(|&index| is_marked(card.cells()[index], called))
}

/// Lines of the card whose five cells are all marked
pub fn completed_lines(card: &CardNumbers, called: &CalledSet) -> Vec<Line> {
    Line::all()
        .filter(|line| all_marked(card, called, &line.indices()))
        .collect()
}

/// Whether `card` satisfies `pattern` given the called balls.
pub fn evaluate(card: &CardNumbers, called: &CalledSet, pattern: WinPattern) -> bool {
    match pattern {
        WinPattern::Standard => Line::all().any(|line| all_marked(card, called, &line.indices())),
        WinPattern::FourCorners => all_marked(card, called, &CORNERS),
        WinPattern::Blackout => card.cells().iter().all(|cell| is_marked(*cell, called)),
    }
}
