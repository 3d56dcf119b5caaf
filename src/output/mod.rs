/// CSV exports of the inspection views.
pub mod export;
/// Writes and reloads the two JSON mapping files.
pub mod formatter;
/// Plain-text rendering of the editor report and the inspection views.
pub mod report;
