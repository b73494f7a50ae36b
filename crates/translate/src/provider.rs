use crate::error::{Error, ErrorKind};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

/// Translation service backing a [`Translator`](crate::Translator).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    /// Yandex Translate API v1.5.
    #[default]
    Yandex,
    /// Google Cloud Translation API v2.
    Google,
}

impl Provider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Yandex => "yandex",
            Self::Google => "google",
        }
    }
}

impl FromStr for Provider {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "yandex" => Ok(Self::Yandex),
            "google" => Ok(Self::Google),
            _ => exn::bail!(ErrorKind::InvalidArgument("provider")),
        }
    }
}

impl Display for Provider {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.as_str())
    }
}

/// Format of the texts sent for translation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TextFormat {
    #[default]
    #[serde(alias = "plain")]
    Text,
    Html,
}

impl TextFormat {
    /// Value of the `format` parameter for the given provider.
    pub(crate) fn param(&self, provider: Provider) -> &'static str {
        match (self, provider) {
            (Self::Html, _) => "html",
            (Self::Text, Provider::Yandex) => "plain",
            (Self::Text, Provider::Google) => "text",
        }
    }
}

impl FromStr for TextFormat {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" | "plain" => Ok(Self::Text),
            "html" => Ok(Self::Html),
            _ => exn::bail!(ErrorKind::InvalidArgument("format")),
        }
    }
}

/// Translation model; only honoured by Google.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
pub enum Model {
    #[default]
    #[serde(rename = "nmt", alias = "neural")]
    Neural,
    #[serde(rename = "pbmt", alias = "phrase-based")]
    PhraseBased,
}

impl Model {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Neural => "nmt",
            Self::PhraseBased => "pbmt",
        }
    }
}

impl FromStr for Model {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "nmt" | "neural" => Ok(Self::Neural),
            "pbmt" | "phrase-based" => Ok(Self::PhraseBased),
            _ => exn::bail!(ErrorKind::InvalidArgument("model")),
        }
    }
}
