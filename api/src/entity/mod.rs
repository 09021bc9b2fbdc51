//! SeaORM table models
//!
//! Database-facing models, kept separate from the pure domain entities in
//! `domain::entities`. Conversions live next to the adapters that use them.

pub mod customers;
pub mod invoices;
pub mod users;
