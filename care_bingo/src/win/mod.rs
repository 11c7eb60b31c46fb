//! Win evaluation.
//!
//! Evaluation is a pure function of a card's numbers, the set of called balls
//! and the session's winning pattern. Call order is irrelevant and the FREE
//! center always counts as marked.

pub mod evaluator;
pub mod pattern;

pub use evaluator::{CalledSet, Line, completed_lines, evaluate, is_marked};
pub use pattern::WinPattern;
