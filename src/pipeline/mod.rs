//! Stages that turn uploads and prompts into text, and text into a report.
//!
//! ## Data Flow
//!
//! ```text
//! upload ──▶ input ──▶ pdf / tabular ──▶ session text
//! prompt ──▶ llm (fallback) ──▶ reply ──▶ report (optional)
//! ```
//!
//! 1. [`input`]   — classify an upload by magic bytes and extension
//! 2. [`pdf`]     — extract the text layer; runs in `spawn_blocking`
//! 3. [`tabular`] — parse CSV/XLSX and render it as a text grid
//! 4. [`llm`]     — ordered fallback across candidate models; the only
//!    stage with network I/O
//! 5. [`report`]  — lay the reply out as an A4 PDF

pub mod input;
pub mod llm;
pub mod pdf;
pub mod report;
pub mod tabular;
