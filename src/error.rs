use thiserror::Error;

/// Fatal pipeline errors. Recoverable per-record conditions (missing photo,
/// unencodable PDF text) are modeled as value-level outcomes in their own
/// modules instead of variants here, so a single bad row can never abort a
/// render pass.
#[derive(Debug, Error)]
pub enum ReportError {
    /// The underlying fetch failed: unreadable file, transport error or a
    /// non-success HTTP status. Reporting halts; nothing partial is returned.
    #[error("data source unavailable: {0}")]
    SourceUnavailable(String),

    /// A required named column is absent from one of the sheets.
    #[error("sheet '{sheet}' is missing required column '{column}'")]
    SchemaMismatch { sheet: String, column: String },

    /// The mode string could not be parsed. Normal menu paths only produce
    /// valid modes, so hitting this means a caller bug or raw user input.
    #[error("invalid report mode '{0}' (expected daily, weekly or monthly)")]
    InvalidMode(String),
}
