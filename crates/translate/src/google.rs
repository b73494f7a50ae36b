//! Google Cloud Translation API v2.
//!
//! Requests are `GET`s with the parameters in the query string. Successful
//! responses wrap their payload in `data`; failures carry an `error` object
//! instead.

use crate::error::{ErrorKind, ProviderStatus, Result};
use crate::provider::{Model, Provider, TextFormat};
use crate::transport::{HttpTransport, Request};
use exn::ResultExt;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;

const BASE_URL: &str = "https://translation.googleapis.com/language/translate/v2";

/// Google's code for an undetermined language.
const UNDETERMINED: &str = "und";

#[derive(Deserialize)]
struct Envelope<T> {
    data: Option<T>,
    error: Option<ApiError>,
}

#[derive(Deserialize)]
struct ApiError {
    code: i64,
    message: Option<String>,
}

#[derive(Deserialize)]
struct Translations {
    translations: Vec<Translation>,
}

#[derive(Deserialize)]
struct Translation {
    #[serde(rename = "translatedText")]
    translated_text: Option<String>,
}

#[derive(Deserialize)]
struct Detections {
    detections: Vec<Vec<Detection>>,
}

#[derive(Deserialize)]
struct Detection {
    language: Option<String>,
}

#[derive(Deserialize)]
struct Languages {
    languages: Vec<Language>,
}

#[derive(Deserialize)]
struct Language {
    language: Option<String>,
    name: Option<String>,
}

/// Translate `texts` into `target`, one result per text, in order.
pub(crate) async fn translate(
    transport: &dyn HttpTransport,
    token: &str,
    texts: &[String],
    target: &str,
    source: Option<&str>,
    format: TextFormat,
    model: Model,
) -> Result<Vec<Option<String>>> {
    let mut request = Request::get(BASE_URL)
        .param("key", token)
        .param("target", target)
        .param("format", format.param(Provider::Google))
        .param("model", model.code());
    if let Some(source) = source {
        request = request.param("source", source);
    }
    for text in texts {
        request = request.param("q", text.as_str());
    }
    let data: Translations = parse(&transport.send(request).await?)?;
    if data.translations.len() != texts.len() {
        exn::bail!(invalid());
    }
    Ok(data.translations.into_iter().map(|t| t.translated_text).collect())
}

/// Detect the language of each text in a single request.
pub(crate) async fn detect(transport: &dyn HttpTransport, token: &str, texts: &[String]) -> Result<Vec<Option<String>>> {
    let mut request = Request::get(format!("{BASE_URL}/detect")).param("key", token);
    for text in texts {
        request = request.param("q", text.as_str());
    }
    let data: Detections = parse(&transport.send(request).await?)?;
    if data.detections.len() != texts.len() {
        exn::bail!(invalid());
    }
    Ok(data
        .detections
        .into_iter()
        .map(|candidates| {
            candidates
                .into_iter()
                .next()
                .and_then(|d| d.language)
                .filter(|language| !language.is_empty() && language != UNDETERMINED)
        })
        .collect())
}

/// Supported languages, with names in the `ui` language.
pub(crate) async fn languages(transport: &dyn HttpTransport, token: &str, ui: &str) -> Result<BTreeMap<String, String>> {
    let request = Request::get(format!("{BASE_URL}/languages")).param("key", token).param("target", ui);
    let data: Languages = parse(&transport.send(request).await?)?;
    if data.languages.is_empty() {
        exn::bail!(invalid());
    }
    Ok(data
        .languages
        .into_iter()
        .filter_map(|l| match (l.language, l.name) {
            (Some(code), Some(name)) if !code.is_empty() && !name.is_empty() => Some((code, name)),
            _ => None,
        })
        .collect())
}

fn parse<T: DeserializeOwned>(body: &str) -> Result<T> {
    let envelope: Envelope<T> = serde_json::from_str(body).or_raise(invalid)?;
    if let Some(error) = envelope.error {
        exn::bail!(ErrorKind::Provider(ProviderStatus::new(Provider::Google, error.code, error.message)));
    }
    match envelope.data {
        Some(data) => Ok(data),
        None => exn::bail!(invalid()),
    }
}

fn invalid() -> ErrorKind {
    ErrorKind::InvalidProviderResponse(Provider::Google)
}
