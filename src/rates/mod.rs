//! Exchange rates: pivot-anchored storage and cross-rate resolution.

pub mod resolver;
pub mod table;
