//! CLI command implementations.

mod config;
mod doctor;
mod handover;
mod prompts;
mod summarize;
mod transcribe;

pub use config::run_config;
pub use doctor::run_doctor;
pub use handover::run_handover;
pub use prompts::run_prompts;
pub use summarize::run_summarize;
pub use transcribe::run_transcribe;
