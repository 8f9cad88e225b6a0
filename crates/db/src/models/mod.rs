//! Row types for the verification workflow tables.
//!
//! Code columns are stored as TEXT; each row converts into its domain type
//! with `TryFrom`, failing on a value outside the domain enum.

pub mod check_item;
pub mod check_option;
pub mod controle;
pub mod infraction;
pub mod inspection;
pub mod proces_verbal;

use std::str::FromStr;

use patrouille_core::error::CoreError;

/// Parse a TEXT code column into its domain enum.
pub(crate) fn parse_code<T>(column: &str, raw: &str) -> Result<T, CoreError>
where
    T: FromStr<Err = CoreError>,
{
    raw.parse()
        .map_err(|e| CoreError::Internal(format!("Unexpected value in column {column}: {e}")))
}
