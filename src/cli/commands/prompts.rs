//! Prompts command implementation.

use crate::cli::{Output, PromptsAction};
use crate::config::{Prompts, Settings, TEMPLATE_NAMES};
use anyhow::Result;

/// Run the prompts command.
pub fn run_prompts(action: &PromptsAction, settings: &Settings) -> Result<()> {
    let prompts = Prompts::load(
        settings.prompts.custom_dir.as_deref(),
        Some(&settings.prompts.variables),
    )?;

    match action {
        PromptsAction::List => {
            Output::header("Prompt templates");
            for name in TEMPLATE_NAMES {
                Output::list_item(name);
            }
            match &settings.prompts.custom_dir {
                Some(dir) => Output::kv("Custom directory", dir),
                None => Output::kv("Custom directory", "(none, using built-in defaults)"),
            }
        }

        PromptsAction::Show { name } => {
            let template = prompts.get_template(name)?;
            // Config variables are applied; call-time placeholders stay visible
            let rendered = prompts.render_with_custom(template, &Default::default());
            println!("{}", rendered);
        }
    }

    Ok(())
}
