//! Background jobs: the delivered-order expiry queue and the daily
//! purge sweep.

pub mod expiry;
pub mod purge;

pub use expiry::*;
pub use purge::*;
