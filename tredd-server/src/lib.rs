//! Seller daemon for the Tredd fair-exchange protocol.
//!
//! Serves encrypted, committed content streams, reveals keys against
//! deployed contracts, and claims payment once refund windows close. Also
//! hosts the development ledger the buyer CLI talks to.

pub mod config;
pub mod error;
pub mod identity;
pub mod queue;
pub mod routes;
pub mod state;
