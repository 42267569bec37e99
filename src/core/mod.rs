//! Foundational records: currencies, boxes, clients, movements and
//! transactions, plus the movement ledger they feed.

pub mod client;
pub mod currency;
pub mod ledger;
pub mod movement;
pub mod transaction;
