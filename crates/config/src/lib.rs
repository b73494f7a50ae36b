//! Layered configuration for localekit.
//!
//! Sources, lowest priority first:
//! 1. built-in defaults,
//! 2. a config file (`toml`, `yaml`/`yml` or `json`, picked by extension),
//!    either given explicitly or found in the platform config directory,
//! 3. `LOCALEKIT_`-prefixed environment variables, with `__` separating
//!    nested keys (`LOCALEKIT_TRANSLATOR__TOKEN`).

pub mod error;

use crate::error::{ErrorKind, Result};
use directories::ProjectDirs;
use exn::ResultExt;
use figment::Figment;
use figment::providers::{Env, Format, Json, Serialized, Toml, Yaml};
use localekit_translate::{Model, Provider, TextFormat};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const ENV_PREFIX: &str = "LOCALEKIT_";
const DEFAULT_FILE_NAME: &str = "config.toml";

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub package: PackageConfig,
    pub cache: CacheConfig,
    pub translator: TranslatorConfig,
    /// Log the full error tree of failed operations.
    pub verbose: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct PackageConfig {
    pub path: Option<PathBuf>,
    pub locale: Option<String>,
    /// Disable language-family fallback.
    pub strict: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct CacheConfig {
    pub enabled: bool,
    pub namespace: String,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            namespace: "localekit".to_string(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct TranslatorConfig {
    pub provider: Provider,
    pub token: Option<String>,
    pub format: TextFormat,
    pub model: Model,
    pub timeout_secs: u64,
}

impl Default for TranslatorConfig {
    fn default() -> Self {
        Self {
            provider: Provider::default(),
            token: None,
            format: TextFormat::default(),
            model: Model::default(),
            timeout_secs: 30,
        }
    }
}

impl Config {
    /// Load configuration from every source.
    ///
    /// An explicit `file` must exist; without one, the default file in the
    /// platform config directory is used if present.
    pub fn load(file: Option<&Path>) -> Result<Self> {
        let figment = Self::figment(file)?;
        let config: Self = figment.extract().or_raise(|| ErrorKind::Load)?;
        Ok(config)
    }

    /// The layered [`Figment`] behind [`load`](Self::load).
    pub fn figment(file: Option<&Path>) -> Result<Figment> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));
        let file = match file {
            Some(file) if !file.exists() => exn::bail!(ErrorKind::NotFound(file.to_path_buf())),
            Some(file) => Some(file.to_path_buf()),
            None => default_file().filter(|file| file.exists()),
        };
        if let Some(file) = file {
            tracing::debug!(path = %file.display(), "Loading config file");
            figment = match file.extension().and_then(|ext| ext.to_str()) {
                Some("toml") => figment.merge(Toml::file(&file)),
                Some("yaml" | "yml") => figment.merge(Yaml::file(&file)),
                Some("json") => figment.merge(Json::file(&file)),
                _ => exn::bail!(ErrorKind::UnsupportedFormat(file)),
            };
        }
        Ok(figment.merge(Env::prefixed(ENV_PREFIX).split("__")))
    }
}

/// `config.toml` in the platform config directory, e.g.
/// `~/.config/localekit/config.toml` on Linux.
pub fn default_file() -> Option<PathBuf> {
    ProjectDirs::from("", "", "localekit").map(|dirs| dirs.config_dir().join(DEFAULT_FILE_NAME))
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;
    use rstest::rstest;

    #[test]
    fn test_defaults() {
        Jail::expect_with(|_jail| {
            let config: Config = Config::figment(None).unwrap().extract()?;
            assert_eq!(config.cache.namespace, "localekit");
            assert!(config.cache.enabled);
            assert_eq!(config.translator.provider, Provider::Yandex);
            assert_eq!(config.translator.timeout_secs, 30);
            assert!(!config.verbose);
            Ok(())
        });
    }

    #[test]
    fn test_toml_file() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "localekit.toml",
                r#"
                verbose = true

                [package]
                path = "labels.db"
                locale = "en-GB"
                strict = true

                [translator]
                provider = "google"
                model = "pbmt"
                format = "html"
                "#,
            )?;
            let config = Config::load(Some(Path::new("localekit.toml"))).unwrap();
            assert!(config.verbose);
            assert_eq!(config.package.path, Some(PathBuf::from("labels.db")));
            assert_eq!(config.package.locale.as_deref(), Some("en-GB"));
            assert!(config.package.strict);
            assert_eq!(config.translator.provider, Provider::Google);
            assert_eq!(config.translator.model, Model::PhraseBased);
            assert_eq!(config.translator.format, TextFormat::Html);
            Ok(())
        });
    }

    #[rstest]
    #[case("localekit.yaml", "cache:\n  enabled: false\n  namespace: app\n")]
    #[case("localekit.yml", "cache:\n  enabled: false\n  namespace: app\n")]
    #[case("localekit.json", r#"{"cache": {"enabled": false, "namespace": "app"}}"#)]
    fn test_other_formats(#[case] name: &str, #[case] contents: &str) {
        Jail::expect_with(|jail| {
            jail.create_file(name, contents)?;
            let config = Config::load(Some(Path::new(name))).unwrap();
            assert!(!config.cache.enabled);
            assert_eq!(config.cache.namespace, "app");
            Ok(())
        });
    }

    #[test]
    fn test_env_overrides_file() {
        Jail::expect_with(|jail| {
            jail.create_file("localekit.toml", "[translator]\ntoken = \"from-file\"\ntimeout_secs = 5\n")?;
            jail.set_env("LOCALEKIT_TRANSLATOR__TOKEN", "from-env");
            jail.set_env("LOCALEKIT_VERBOSE", "true");
            let config = Config::load(Some(Path::new("localekit.toml"))).unwrap();
            assert_eq!(config.translator.token.as_deref(), Some("from-env"));
            assert_eq!(config.translator.timeout_secs, 5);
            assert!(config.verbose);
            Ok(())
        });
    }

    #[test]
    fn test_missing_explicit_file() {
        Jail::expect_with(|_jail| {
            let err = Config::load(Some(Path::new("missing.toml"))).unwrap_err();
            assert!(matches!(&*err, ErrorKind::NotFound(_)));
            Ok(())
        });
    }

    #[test]
    fn test_unsupported_format() {
        Jail::expect_with(|jail| {
            jail.create_file("localekit.ini", "verbose = true")?;
            let err = Config::load(Some(Path::new("localekit.ini"))).unwrap_err();
            assert!(matches!(&*err, ErrorKind::UnsupportedFormat(_)));
            Ok(())
        });
    }

    #[test]
    fn test_invalid_value() {
        Jail::expect_with(|jail| {
            jail.create_file("localekit.toml", "[translator]\nprovider = \"babelfish\"\n")?;
            let err = Config::load(Some(Path::new("localekit.toml"))).unwrap_err();
            assert!(matches!(&*err, ErrorKind::Load));
            Ok(())
        });
    }
}
