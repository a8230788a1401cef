//! Prompt text used by the chat engine.
//!
//! All wording the model sees lives here, so changing a label touches one
//! place and tests can assert on the exact strings.

/// Opens the context block of an artifact-backed prompt.
pub const CONTEXT_HEADER: &str = "Context information:\n";

/// Label in front of the (truncated) PDF text.
pub const PDF_LABEL: &str = "PDF Content:";

/// Label in front of the (truncated) table rendering.
pub const DATA_LABEL: &str = "Data:";

/// Introduces the user's own words after the context block.
pub const QUESTION_LABEL: &str = "User question:";

/// One labelled section of the context block.
///
/// Each section starts with a blank line and ends with a newline.
pub fn context_section(label: &str, body: &str) -> String {
    format!("\n\n{label}\n{body}\n")
}

/// Wrap an assembled context block and the user's question into one prompt.
pub fn question_with_context(context: &str, question: &str) -> String {
    format!("{CONTEXT_HEADER}{context}\n\n{QUESTION_LABEL} {question}")
}
