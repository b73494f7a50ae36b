//! Yandex Translate API v1.5.
//!
//! Every endpoint takes a form-encoded `POST` and answers with a JSON body
//! carrying its own `code`; anything other than `200` is an error status.

use crate::error::{ErrorKind, ProviderStatus, Result};
use crate::provider::{Provider, TextFormat};
use crate::transport::{HttpTransport, Request};
use exn::ResultExt;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;

const BASE_URL: &str = "https://translate.yandex.net/api/v1.5/tr.json";

/// Longest text accepted, in UTF-16 code units.
pub const MAX_TEXT_LENGTH: usize = 10_000;

#[derive(Deserialize)]
struct TranslateResponse {
    code: Option<i64>,
    message: Option<String>,
    text: Option<Vec<Option<String>>>,
}

#[derive(Deserialize)]
struct DetectResponse {
    code: Option<i64>,
    message: Option<String>,
    lang: Option<String>,
}

#[derive(Deserialize)]
struct LanguagesResponse {
    code: Option<i64>,
    message: Option<String>,
    langs: Option<BTreeMap<String, String>>,
}

/// Translate `texts` into `target`, one result per text, in order.
pub(crate) async fn translate(
    transport: &dyn HttpTransport,
    token: &str,
    texts: &[String],
    target: &str,
    source: Option<&str>,
    format: TextFormat,
) -> Result<Vec<Option<String>>> {
    let lang = match source {
        Some(source) => format!("{source}-{target}"),
        None => target.to_string(),
    };
    let mut request = Request::post(format!("{BASE_URL}/translate"))
        .param("key", token)
        .param("lang", lang)
        .param("format", format.param(Provider::Yandex));
    for text in texts {
        request = request.param("text", text.as_str());
    }
    let response: TranslateResponse = parse(&transport.send(request).await?)?;
    check(response.code, response.message)?;
    match response.text {
        Some(translations) if translations.len() == texts.len() => Ok(translations),
        _ => exn::bail!(invalid()),
    }
}

/// Detect the language of a single text. The API has no batch form.
pub(crate) async fn detect(transport: &dyn HttpTransport, token: &str, text: &str, hints: &[String]) -> Result<Option<String>> {
    let mut request = Request::post(format!("{BASE_URL}/detect")).param("key", token).param("text", text);
    if !hints.is_empty() {
        request = request.param("hint", hints.join(","));
    }
    let response: DetectResponse = parse(&transport.send(request).await?)?;
    check(response.code, response.message)?;
    Ok(response.lang.filter(|lang| !lang.is_empty()))
}

/// Supported languages, with names in the `ui` language.
pub(crate) async fn languages(transport: &dyn HttpTransport, token: &str, ui: &str) -> Result<BTreeMap<String, String>> {
    let request = Request::post(format!("{BASE_URL}/getLangs")).param("key", token).param("ui", ui);
    let response: LanguagesResponse = parse(&transport.send(request).await?)?;
    // Success responses carry no code at all.
    if let Some(code) = response.code
        && code != 200
    {
        exn::bail!(ErrorKind::Provider(ProviderStatus::new(Provider::Yandex, code, response.message)));
    }
    let Some(langs) = response.langs else {
        exn::bail!(invalid());
    };
    Ok(langs.into_iter().filter(|(code, name)| !code.is_empty() && !name.is_empty()).collect())
}

fn parse<T: DeserializeOwned>(body: &str) -> Result<T> {
    serde_json::from_str(body).or_raise(invalid)
}

fn check(code: Option<i64>, message: Option<String>) -> Result<()> {
    match code {
        Some(200) => Ok(()),
        Some(code) => exn::bail!(ErrorKind::Provider(ProviderStatus::new(Provider::Yandex, code, message))),
        None => exn::bail!(invalid()),
    }
}

fn invalid() -> ErrorKind {
    ErrorKind::InvalidProviderResponse(Provider::Yandex)
}
