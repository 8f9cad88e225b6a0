//! Domain core of the patrouille backend.
//!
//! Holds the verification workflow: checklist catalog, verification results,
//! Control/Inspection lifecycle, PV generation and dashboard statistics. The
//! crate has no database dependency; services talk to persistence through
//! the traits in [`store`], implemented on PostgreSQL by `patrouille-db`.

pub mod catalog;
pub mod clock;
pub(crate) mod codes;
pub mod error;
pub mod lifecycle;
pub mod pv;
pub mod services;
pub mod statistics;
pub mod store;
pub mod types;
pub mod verification;
