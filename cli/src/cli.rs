use engine::Overrides;

const AFTER_HELP: &str = indoc::indoc! {"
    The API key is taken from --api-key, then OPENAI_API_KEY, then the config file.
    Run `imagegen init-config` to store the given flags as defaults.
"};

/// Generate an image from a text description
#[derive(Debug, clap::Parser)]
#[command(name = "imagegen", version, after_help = AFTER_HELP)]
pub struct Cli {
    /// Description of the image, asked for interactively when omitted
    pub prompt: Option<String>,

    #[command(flatten)]
    pub overrides: Overrides,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, clap::Subcommand)]
pub enum Command {
    /// Write the given flags to the config file
    InitConfig,
}
