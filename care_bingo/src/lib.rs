//! # Care Bingo
//!
//! The rules engine behind a care-home bingo platform: 75-ball card
//! generation, win detection, and live number-calling sessions broadcast to
//! every connected viewer.
//!
//! ## Core Modules
//!
//! - [`card`]: Card model, random generation, issuing and lookups
//! - [`win`]: Pure win evaluation for the standard, four-corners and blackout patterns
//! - [`session`]: Session state machine, per-session actors and broadcasting
//! - [`verify`]: Win claim verification against a session's called numbers
//! - [`store`]: Persistence collaborator traits and an in-memory store
//!
//! ## Example
//!
//! ```
//! use care_bingo::card::{Ball, CardGenerator};
//! use care_bingo::win::{CalledSet, WinPattern, evaluate};
//!
//! let card = CardGenerator::new().generate(1, None, None).unwrap().remove(0);
//!
//! // Calling every ball always completes the card.
//! let everything: CalledSet = Ball::all().collect();
//! assert!(evaluate(&card.numbers, &everything, WinPattern::Blackout));
//! ```

pub mod card;
pub mod error;
pub mod session;
pub mod store;
pub mod verify;
pub mod win;

pub use error::{BingoError, BingoResult, LookupTarget};
pub use verify::{WinClaim, WinVerifier};
