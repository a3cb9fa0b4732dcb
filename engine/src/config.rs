use std::{
    fs,
    path::{Path, PathBuf},
};

use color_eyre::{
    Result,
    eyre::{WrapErr as _, ensure, eyre},
};
use log::debug;
use serde::{Deserialize, Serialize};

use crate::image_model::{DEFAULT_API_URL, ImageSize, Model};

pub const APP_NAME: &str = "imagegen";
pub const API_KEY_VAR: &str = "OPENAI_API_KEY";
pub const DEFAULT_FILE_NAME: &str = "generated_image.png";
pub const MAX_COUNT: u8 = 10;

/// Persisted settings, stored as RON in [`config_path`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    pub api_key: Option<String>,
    pub api_url: String,
    pub size: ImageSize,
    pub model: Option<Model>,
    pub count: u8,
    pub output: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: None,
            api_url: DEFAULT_API_URL.into(),
            size: ImageSize::default(),
            model: None,
            count: 1,
            output: None,
        }
    }
}

impl Config {
    pub fn validate(&self) -> Result<()> {
        let count = self.count;
        ensure!(
            (1..=MAX_COUNT).contains(&count),
            "Image count must be between 1 and {MAX_COUNT}, got {count}"
        );
        ensure!(!self.api_url.is_empty(), "The API url cannot be empty.");
        Ok(())
    }
}

/// Command line values that take precedence over the config file.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct Overrides {
    /// API key, takes precedence over OPENAI_API_KEY
    #[arg(long, global = true)]
    pub api_key: Option<String>,

    #[arg(long, global = true)]
    pub api_url: Option<String>,

    #[arg(short, long, global = true)]
    pub size: Option<ImageSize>,

    #[arg(short, long, global = true)]
    pub model: Option<Model>,

    /// Number of images to generate
    #[arg(short = 'n', long, global = true)]
    pub count: Option<u8>,

    /// Where to write the image, defaults to the executable's directory
    #[arg(short, long, global = true)]
    pub output: Option<PathBuf>,
}

impl Overrides {
    pub fn apply_to(&self, config: Config) -> Config {
        Config {
            api_key: self.api_key.clone().or(config.api_key),
            api_url: self.api_url.clone().unwrap_or(config.api_url),
            size: self.size.unwrap_or(config.size),
            model: self.model.or(config.model),
            count: self.count.unwrap_or(config.count),
            output: self.output.clone().or(config.output),
        }
    }
}

/// Effective settings for a single run.
#[derive(Debug, Clone)]
pub struct Settings {
    pub api_key: String,
    pub api_url: String,
    pub size: ImageSize,
    pub model: Option<Model>,
    pub count: u8,
    pub output: PathBuf,
}

impl Settings {
    /// Merges command line, environment and config file, in that order of precedence.
    pub fn resolve(
        config: Option<Config>,
        overrides: &Overrides,
        env_key: Option<String>,
    ) -> Result<Self> {
        let config = config.unwrap_or_default();

        let api_key = [overrides.api_key.clone(), env_key, config.api_key.clone()]
            .into_iter()
            .flatten()
            .find(|key| !key.is_empty())
            .ok_or_else(|| eyre!("{API_KEY_VAR} environment variable is not set."))?;

        let merged = overrides.apply_to(config);
        merged.validate()?;
        let Config {
            api_url,
            size,
            model,
            count,
            output,
            ..
        } = merged;

        let output = match output {
            Some(path) => path,
            None => default_output_path()?,
        };

        Ok(Settings {
            api_key,
            api_url,
            size,
            model,
            count,
            output,
        })
    }
}

pub fn config_path() -> Result<PathBuf> {
    Ok(dirs::config_local_dir()
        .ok_or(eyre!("Couldn't get config dir"))?
        .join(format!("{APP_NAME}.ron")))
}

pub fn load_config() -> Result<Option<Config>> {
    load_config_from(&config_path()?)
}

pub fn load_config_from(path: &Path) -> Result<Option<Config>> {
    if !path.exists() {
        debug!("No config at {}", path.display());
        return Ok(None);
    }

    let src = fs::read_to_string(path)?;
    let config = ron::from_str(&src).with_context(|| format!("parsing {}", path.display()))?;
    Ok(Some(config))
}

pub fn save_config(config: &Config) -> Result<PathBuf> {
    let path = config_path()?;
    save_config_to(&path, config)?;
    Ok(path)
}

pub fn save_config_to(path: &Path, config: &Config) -> Result<()> {
    config.validate()?;
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)?;
    }
    let src = ron::ser::to_string_pretty(config, ron::ser::PrettyConfig::default())?;
    Ok(fs::write(path, src)?)
}

pub fn default_output_path() -> Result<PathBuf> {
    let exe = std::env::current_exe().context("locating the running executable")?;
    let dir = exe
        .parent()
        .ok_or_else(|| eyre!("Executable has no parent dir: {}", exe.display()))?;
    Ok(dir.join(DEFAULT_FILE_NAME))
}

/// `path` itself for a single image, `<stem>_<n>.<ext>` when there are several.
pub fn numbered_path(path: &Path, index: usize, total: usize) -> PathBuf {
    if total <= 1 {
        return path.to_path_buf();
    }

    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = match path.extension() {
        Some(ext) => format!("{stem}_{}.{}", index + 1, ext.to_string_lossy()),
        None => format!("{stem}_{}", index + 1),
    };
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use expect_test::expect;
    use tempfile::TempDir;

    use super::*;

    fn key_only(key: &str) -> Config {
        Config {
            api_key: Some(key.into()),
            ..Config::default()
        }
    }

    #[test]
    fn command_line_key_wins() {
        let overrides = Overrides {
            api_key: Some("cli".into()),
            output: Some("out.png".into()),
            ..Overrides::default()
        };
        let settings =
            Settings::resolve(Some(key_only("file")), &overrides, Some("env".into())).unwrap();
        assert_eq!(settings.api_key, "cli");
    }

    #[test]
    fn env_key_beats_config_file() {
        let overrides = Overrides {
            output: Some("out.png".into()),
            ..Overrides::default()
        };
        let settings =
            Settings::resolve(Some(key_only("file")), &overrides, Some("env".into())).unwrap();
        assert_eq!(settings.api_key, "env");

        let settings =
            Settings::resolve(Some(key_only("file")), &overrides, Some(String::new())).unwrap();
        assert_eq!(settings.api_key, "file");
    }

    #[test]
    fn missing_key_is_an_error() {
        let err = Settings::resolve(None, &Overrides::default(), None).unwrap_err();
        assert_eq!(
            err.to_string(),
            "OPENAI_API_KEY environment variable is not set."
        );
    }

    #[test]
    fn defaults_match_original_request() {
        let settings = Settings::resolve(None, &Overrides::default(), Some("key".into())).unwrap();
        assert_eq!(settings.api_url, DEFAULT_API_URL);
        assert_eq!(settings.size, ImageSize::Large);
        assert_eq!(settings.count, 1);
        assert_eq!(settings.model, None);
        assert_eq!(settings.output.file_name().unwrap(), DEFAULT_FILE_NAME);
    }

    #[test]
    fn count_out_of_range() {
        for count in [0, MAX_COUNT + 1] {
            let overrides = Overrides {
                count: Some(count),
                ..Overrides::default()
            };
            assert!(Settings::resolve(None, &overrides, Some("key".into())).is_err());
        }
    }

    #[test]
    fn validate_rejects_bad_values() {
        let zero = Config {
            count: 0,
            ..Config::default()
        };
        expect![[r#"Image count must be between 1 and 10, got 0"#]]
            .assert_eq(&zero.validate().unwrap_err().to_string());

        let no_url = Config {
            api_url: String::new(),
            ..Config::default()
        };
        assert!(no_url.validate().is_err());

        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn overrides_replace_config_values() {
        let config = Config {
            size: ImageSize::Small,
            model: Some(Model::DallE2),
            ..Config::default()
        };
        let overrides = Overrides {
            size: Some(ImageSize::Tall),
            count: Some(3),
            ..Overrides::default()
        };

        let merged = overrides.apply_to(config);
        assert_eq!(merged.size, ImageSize::Tall);
        assert_eq!(merged.model, Some(Model::DallE2));
        assert_eq!(merged.count, 3);
    }

    #[test]
    fn config_round_trip() -> Result<()> {
        let dir = TempDir::new()?;
        let path = dir.path().join("nested").join("imagegen.ron");

        assert_eq!(load_config_from(&path)?, None);

        let config = Config {
            api_key: Some("sk-test".into()),
            size: ImageSize::Medium,
            model: Some(Model::DallE3),
            count: 2,
            output: Some("/tmp/out.png".into()),
            ..Config::default()
        };
        save_config_to(&path, &config)?;

        assert_eq!(load_config_from(&path)?, Some(config));
        Ok(())
    }

    #[test]
    fn invalid_config_is_not_written() -> Result<()> {
        let dir = TempDir::new()?;
        let path = dir.path().join("imagegen.ron");
        let config = Overrides {
            count: Some(0),
            ..Overrides::default()
        }
        .apply_to(Config::default());

        assert!(save_config_to(&path, &config).is_err());
        assert!(!path.exists());
        Ok(())
    }

    #[test]
    fn partial_config_uses_defaults() -> Result<()> {
        let dir = TempDir::new()?;
        let path = dir.path().join("imagegen.ron");
        fs::write(&path, r#"(size: "512x512")"#)?;

        let config = load_config_from(&path)?.unwrap();
        assert_eq!(config.size, ImageSize::Medium);
        assert_eq!(config.api_url, DEFAULT_API_URL);
        assert_eq!(config.count, 1);
        Ok(())
    }

    #[test]
    fn numbering() {
        let path = Path::new("/tmp/generated_image.png");
        assert_eq!(numbered_path(path, 0, 1), path);
        assert_eq!(
            numbered_path(path, 0, 3),
            Path::new("/tmp/generated_image_1.png")
        );
        assert_eq!(
            numbered_path(Path::new("picture"), 1, 2),
            Path::new("picture_2")
        );
    }
}
