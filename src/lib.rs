//! betslip — bet-slip engine for betting-shop clients.
//!
//! Library crate exposing the slip store, validation, market mapping,
//! and the two-phase submission saga for use by shell applications and
//! integration tests.

pub mod config;
pub mod types;
pub mod slip;
pub mod api;
pub mod engine;
pub mod storage;
