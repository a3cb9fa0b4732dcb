use std::{
    env,
    io::{BufRead, Write, stdin, stdout},
    path::Path,
};

use color_eyre::Result;
use engine::{
    OpenAIImages, Prompt, Settings,
    config::{self, API_KEY_VAR, Config, Overrides, numbered_path},
    download::save_image,
    prompt::read_prompt,
};
use log::info;

use crate::cli::{Cli, Command};

pub mod cli;

pub async fn run(cli: Cli) -> Result<()> {
    let config = config::load_config()?;
    match cli.command {
        Some(Command::InitConfig) => {
            init_config(config, &cli.overrides, &config::config_path()?, stdout())
        }
        None => {
            let env_key = env::var(API_KEY_VAR).ok();
            generate(
                config,
                &cli.overrides,
                cli.prompt,
                env_key,
                stdin().lock(),
                stdout(),
            )
            .await
        }
    }
}

/// Merges `overrides` into `config` and writes the result to `path`.
pub fn init_config(
    config: Option<Config>,
    overrides: &Overrides,
    path: &Path,
    mut output: impl Write,
) -> Result<()> {
    let config = overrides.apply_to(config.unwrap_or_default());
    config.validate()?;
    config::save_config_to(path, &config)?;
    writeln!(output, "Config written to {}", path.display())?;
    Ok(())
}

/// Resolves settings, takes the prompt from `prompt` or `input`, then downloads and saves the images.
pub async fn generate(
    config: Option<Config>,
    overrides: &Overrides,
    prompt: Option<String>,
    env_key: Option<String>,
    input: impl BufRead,
    mut output: impl Write,
) -> Result<()> {
    let settings = Settings::resolve(config, overrides, env_key)?;

    let prompt = match prompt {
        Some(text) => Prompt::new(text)?,
        None => read_prompt(input, &mut output)?,
    };

    let images = OpenAIImages::from_settings(&settings)
        .get_images(&prompt)
        .await?;

    let total = images.len();
    for (index, image) in images.iter().enumerate() {
        if let Some(revised) = &image.revised_prompt {
            info!("Revised prompt: {revised}");
        }
        writeln!(output, "Image URL: {}", image.url)?;

        let path = numbered_path(&settings.output, index, total);
        save_image(&path, &image.data)?;
        writeln!(output, "Image downloaded as {}", path.display())?;
    }

    Ok(())
}
