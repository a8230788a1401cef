//! Context assembly: turn session artifacts plus a question into one prompt.
//!
//! The model only ever sees a single prompt per turn. When artifacts are
//! loaded, each one is cut to a fixed character budget and placed under its
//! own label ahead of the question. The cut is a hard character cutoff, not
//! a line or sentence boundary, which keeps request size (and cost) bounded.

use crate::prompts::{context_section, question_with_context, DATA_LABEL, PDF_LABEL};
use crate::session::SessionState;

/// First `max_chars` characters of `text`.
///
/// Counts Unicode scalar values, never splits a UTF-8 sequence, and borrows
/// instead of allocating.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => &text[..byte_idx],
        None => text,
    }
}

/// The labelled context block for the loaded artifacts, or `None` when
/// neither is loaded.
pub fn context_block(state: &SessionState, budget: usize) -> Option<String> {
    let mut context = String::new();
    if state.has_pdf() {
        context.push_str(&context_section(
            PDF_LABEL,
            truncate_chars(&state.pdf_text, budget),
        ));
    }
    if state.has_data() {
        context.push_str(&context_section(
            DATA_LABEL,
            truncate_chars(&state.data_context, budget),
        ));
    }
    if context.is_empty() {
        None
    } else {
        Some(context)
    }
}

/// Build the prompt for `message` given the session's artifacts.
///
/// Without artifacts the message is returned unchanged. Pure: the same
/// state and message always produce the same prompt.
pub fn assemble_prompt(state: &SessionState, message: &str, budget: usize) -> String {
    match context_block(state, budget) {
        Some(context) => question_with_context(&context, message),
        None => message.to_string(),
    }
}
