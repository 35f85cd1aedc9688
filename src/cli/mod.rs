//! CLI module for Debrief.

pub mod commands;
mod output;
pub mod preflight;

pub use output::Output;

use crate::config::Settings;
use clap::{Parser, Subcommand};

/// Debrief - meeting recordings in, structured summaries out
///
/// Transcribes recordings with Whisper, summarizes them hierarchically with
/// an LLM, and turns a directory of recordings into a project handover report.
#[derive(Parser, Debug)]
#[command(name = "debrief")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Chat model used for summarization
    #[arg(long, global = true, env = "DEBRIEF_MODEL")]
    pub model: Option<String>,

    /// Directory for transcripts, summaries and reports
    #[arg(long, global = true, env = "DEBRIEF_OUTPUT_DIR")]
    pub output_dir: Option<String>,

    /// Language the summaries are written in
    #[arg(long, global = true, env = "DEBRIEF_LANGUAGE")]
    pub language: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// `-v` flags win over the configured level.
    pub fn log_level<'a>(&self, configured: &'a str) -> &'a str {
        match self.verbose {
            0 => configured,
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    }

    /// Apply command-line overrides on top of the loaded configuration.
    pub fn apply_overrides(&self, settings: &mut Settings) {
        if let Some(model) = &self.model {
            settings.llm.model = model.clone();
        }
        if let Some(dir) = &self.output_dir {
            settings.general.output_dir = dir.clone();
        }
        if let Some(language) = &self.language {
            settings.summarization.output_language = language.clone();
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Transcribe (if needed) and summarize one recording or transcript file
    Summarize {
        /// Audio/video file, or a .txt/.md transcript
        input: String,

        /// Ignore cached transcripts and summaries
        #[arg(short, long)]
        force: bool,

        /// Print the summary to stdout
        #[arg(short, long)]
        print: bool,
    },

    /// Transcribe a recording without summarizing it
    Transcribe {
        /// Audio or video file
        input: String,

        /// Write the transcript here instead of stdout
        #[arg(short, long)]
        output: Option<String>,

        /// Output format (txt, json, srt, vtt)
        #[arg(long, default_value = "txt")]
        format: String,
    },

    /// Build a handover report from a directory of meeting videos
    Handover {
        /// Directory containing the recordings
        dir: String,

        /// Reprocess every video and regenerate the analysis
        #[arg(short, long)]
        force: bool,
    },

    /// Inspect prompt templates
    Prompts {
        #[command(subcommand)]
        action: PromptsAction,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Check system requirements and configuration
    Doctor,
}

#[derive(Subcommand, Debug)]
pub enum PromptsAction {
    /// List template names
    List,

    /// Print one template as it would be used
    Show {
        /// Template name (see `debrief prompts list`)
        name: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Show configuration file path
    Path,

    /// Write the default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}
