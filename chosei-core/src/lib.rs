//! Core types for chosei.
//!
//! This crate holds everything that does not talk to the network:
//! - `calendar` for the month grid and drag-to-select date ranges
//! - `duration` for the meeting-length dropdown
//! - `directory` for filtering and selecting organization users
//! - `schedule` for the availability grid
//! - `invite` for the per-slot invite composer and its modal state
//! - `search` for the simulated availability search

pub mod calendar;
pub mod directory;
pub mod duration;
pub mod error;
pub mod invite;
pub mod schedule;
pub mod search;

pub use error::{ChoseiError, ChoseiResult};
