use std::path::PathBuf;

use thiserror::Error;

/// Every failure an audit run can surface to the operator.
#[derive(Debug, Error)]
pub enum Error {
    /// An input file (membership export or config) does not exist.
    #[error("File not found: {}", path.display())]
    FileNotFound {
        /// Path that was looked up.
        path: PathBuf,
    },
    /// The membership export lacks a column the loader needs.
    #[error("{}: missing required column '{column}'", path.display())]
    MissingColumn {
        /// Export being read.
        path: PathBuf,
        /// Header that could not be found.
        column: &'static str,
    },
    /// The membership export is not valid CSV.
    #[error("{}: malformed CSV: {source}", path.display())]
    MalformedCsv {
        /// Export being read.
        path: PathBuf,
        /// Underlying reader error.
        #[source]
        source: csv::Error,
    },
    /// The catalog could not be reached or the descriptor is unusable.
    #[error("Cannot connect to catalog '{target}': {message}")]
    Connection {
        /// Logical target name from the configuration.
        target: String,
        /// Driver-level reason.
        message: String,
    },
    /// The catalog query failed or returned rows of an unexpected shape.
    #[error("Catalog query failed on '{target}': {message}")]
    Query {
        /// Logical target name from the configuration.
        target: String,
        /// Driver-level reason.
        message: String,
    },
    /// The configuration file is invalid.
    #[error("Invalid configuration: {0}")]
    Config(String),
    /// A requested catalog target has no connection descriptor.
    #[error("Unknown catalog target '{0}': no entry in [server]")]
    UnknownTarget(String),
    /// A file could not be read.
    #[error("Failed to read {}: {source}", path.display())]
    Read {
        /// File being read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// An output file could not be written.
    #[error("Failed to write {}: {source}", path.display())]
    Write {
        /// File being written.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// A JSON mapping file could not be parsed.
    #[error("Invalid JSON in {}: {source}", path.display())]
    Json {
        /// File being parsed.
        path: PathBuf,
        /// Underlying decoder error.
        #[source]
        source: serde_json::Error,
    },
    /// An export file name would escape its directory.
    #[error("Invalid output name '{name}': {reason}")]
    InvalidOutputName {
        /// Rejected file name.
        name: String,
        /// Which rule it broke.
        reason: &'static str,
    },
    /// A CSV export could not be produced.
    #[error("Failed to export {}: {source}", path.display())]
    Export {
        /// Export destination.
        path: PathBuf,
        /// Underlying writer error.
        #[source]
        source: csv::Error,
    },
}

/// Crate-wide result alias.
pub type Result<T, E = Error> = std::result::Result<T, E>;
