//! Audit which users can edit which tables of an enterprise geodatabase, by
//! joining an Active Directory group membership export with the catalog's
//! role grants.
#![warn(missing_docs)]

/// Table → editors resolution and the inverted indexes behind the inspection views.
pub mod access;
/// The per-target audit run.
pub mod audit;
/// Permissions catalog access: filters, the fixed query, and connectors.
pub mod catalog;
/// TOML configuration.
pub mod config;
/// Crate error type.
pub mod error;
/// Console and daily-file log sinks.
pub mod logging;
/// Loading the AD group membership export.
pub mod membership;
/// JSON mappings, console report, and CSV exports.
pub mod output;
