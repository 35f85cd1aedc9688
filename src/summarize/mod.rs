//! Transcript summarization.
//!
//! [`split_text`] cuts a transcript into overlapping character windows and
//! [`Summarizer`] reduces them through the chunk, group and final stages.

mod chunker;
mod engine;

pub use chunker::{split_text, TextChunk};
pub use engine::{
    fallback_summary, placeholder, FinalSummary, PartStatus, PartSummary, Stage, Summarizer,
    SummaryMode, REPORT_SECTIONS,
};
