//! Core engine: bet settlement and the rollups built on settled bets.
//!
//! Everything here is synchronous and side-effect free: records go in,
//! derived values come out.

pub mod money;
pub mod settlement;
pub mod accountant;
pub mod performance;
pub mod cashflow;
pub mod freebets;
