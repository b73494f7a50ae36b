//! localekit command-line interface.
//!
//! Looks up labels in a package and drives the translation client, mostly as
//! a way to exercise both against real data.

use clap::{Args, Parser, Subcommand};
use derive_more::{Display, Error};
use exn::{OptionExt, ResultExt};
use localekit_cache::{CacheHandle, MemoryCache};
use localekit_config::Config;
use localekit_package::{LabelId, Package};
use localekit_translate::{ReqwestTransport, Translator};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

type Error = exn::Exn<ErrorKind>;
type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error)]
enum ErrorKind {
    #[display("invalid configuration")]
    Config,
    #[display("missing {_0}")]
    Missing(#[error(not(source))] &'static str),
    #[display("package lookup failed")]
    Package,
    #[display("translation request failed")]
    Translate,
}

#[derive(Debug, Parser)]
#[command(name = "localekit", version, about = "Localized labels and cached translations")]
struct Cli {
    /// Config file (toml, yaml or json).
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Increase log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Args)]
struct PackageArgs {
    /// Package database; defaults to `package.path` from the config.
    #[arg(long)]
    db: Option<PathBuf>,
}

#[derive(Debug, Args)]
struct LocaleArgs {
    /// Locale code; defaults to `package.locale` from the config.
    #[arg(long)]
    locale: Option<String>,
    /// Do not fall back to the language family.
    #[arg(long)]
    strict: bool,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print the given labels.
    Labels {
        #[command(flatten)]
        package: PackageArgs,
        #[command(flatten)]
        locale: LocaleArgs,
        /// Skip the cache.
        #[arg(long)]
        fresh: bool,
        #[arg(required = true)]
        ids: Vec<String>,
    },
    /// Print every label of a locale.
    AllLabels {
        #[command(flatten)]
        package: PackageArgs,
        #[command(flatten)]
        locale: LocaleArgs,
    },
    /// List the locales of a package.
    Locales {
        #[command(flatten)]
        package: PackageArgs,
    },
    /// Check whether a locale is supported by a package.
    Supported {
        #[command(flatten)]
        package: PackageArgs,
        code: String,
        #[arg(long)]
        strict: bool,
    },
    /// Translate texts.
    Translate {
        #[arg(long)]
        to: String,
        #[arg(long)]
        from: Option<String>,
        #[arg(long)]
        fresh: bool,
        #[arg(required = true)]
        texts: Vec<String>,
    },
    /// Detect the language of texts.
    Detect {
        #[arg(long = "hint")]
        hints: Vec<String>,
        #[arg(long)]
        fresh: bool,
        #[arg(required = true)]
        texts: Vec<String>,
    },
    /// List the languages supported by the translation provider.
    Languages {
        /// Language to print language names in.
        #[arg(long)]
        ui: Option<String>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e:?}");
            ExitCode::FAILURE
        },
    }
}

fn init_tracing(verbosity: u8) {
    let default = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
}

async fn run(cli: Cli) -> Result<()> {
    let mut config = Config::load(cli.config.as_deref()).or_raise(|| ErrorKind::Config)?;
    config.verbose |= cli.verbose > 0;
    let cache = cache(&config);

    match cli.command {
        Command::Labels { package, locale, fresh, ids } => {
            let mut package = open_package(&config, cache, package, Some(locale)).await?;
            let labels = package.labels(ids, fresh).await.or_raise(|| ErrorKind::Package)?;
            print_labels(labels.into_iter().collect());
        },
        Command::AllLabels { package, locale } => {
            let package = open_package(&config, cache, package, Some(locale)).await?;
            let labels = package.all_labels().await.or_raise(|| ErrorKind::Package)?;
            print_labels(labels.into_iter().collect());
        },
        Command::Locales { package } => {
            let package = open_package(&config, cache, package, None).await?;
            let mut locales = package.supported_locales().await.or_raise(|| ErrorKind::Package)?;
            locales.sort_by(|a, b| a.code.cmp(&b.code));
            for locale in locales {
                let locked = if locale.locked { "\tlocked" } else { "" };
                println!("{}\t{}{locked}", locale.code, locale.language);
            }
        },
        Command::Supported { package, code, strict } => {
            let package = open_package(&config, cache, package, None).await?;
            let supported = package.is_locale_supported(&code, strict).await.or_raise(|| ErrorKind::Package)?;
            println!("{supported}");
        },
        Command::Translate { to, from, fresh, texts } => {
            let translator = translator(&config, cache)?;
            let translated = translator
                .translate(texts, &to, from.as_deref(), fresh)
                .await
                .or_raise(|| ErrorKind::Translate)?;
            print_results(translated.into_iter().collect());
        },
        Command::Detect { hints, fresh, texts } => {
            let translator = translator(&config, cache)?;
            let detected = translator.detect_language(texts, &hints, fresh).await.or_raise(|| ErrorKind::Translate)?;
            print_results(detected.into_iter().collect());
        },
        Command::Languages { ui } => {
            let translator = translator(&config, cache)?;
            let languages = translator.supported_languages(ui.as_deref()).await.or_raise(|| ErrorKind::Translate)?;
            for (code, name) in languages {
                println!("{code}\t{name}");
            }
        },
    }
    Ok(())
}

fn cache(config: &Config) -> Option<CacheHandle> {
    config
        .cache
        .enabled
        .then(|| Arc::new(MemoryCache::default().with_namespace(config.cache.namespace.clone())) as CacheHandle)
}

async fn open_package(
    config: &Config,
    cache: Option<CacheHandle>,
    args: PackageArgs,
    locale: Option<LocaleArgs>,
) -> Result<Package> {
    let path = args.db.or_else(|| config.package.path.clone()).ok_or_raise(|| ErrorKind::Missing("package path (--db)"))?;
    let mut package = match cache {
        Some(cache) => Package::new().with_cache(cache),
        None => Package::new(),
    };
    package.set_verbose(config.verbose);
    package.set_path(&path).await.or_raise(|| ErrorKind::Package)?;
    if let Some(args) = locale {
        let code = args.locale.or_else(|| config.package.locale.clone()).ok_or_raise(|| ErrorKind::Missing("locale (--locale)"))?;
        let resolved = package
            .set_locale(&code, args.strict || config.package.strict)
            .await
            .or_raise(|| ErrorKind::Package)?;
        if resolved.fallback {
            tracing::info!(requested = %code, effective = %resolved.code, "Using language family");
        }
    }
    Ok(package)
}

fn translator(config: &Config, cache: Option<CacheHandle>) -> Result<Translator> {
    let settings = &config.translator;
    let token = settings.token.clone().ok_or_raise(|| ErrorKind::Missing("translator token (LOCALEKIT_TRANSLATOR__TOKEN)"))?;
    let transport = ReqwestTransport::new(Duration::from_secs(settings.timeout_secs)).or_raise(|| ErrorKind::Translate)?;
    let mut translator = Translator::new(settings.provider, token, Arc::new(transport))
        .or_raise(|| ErrorKind::Translate)?
        .with_format(settings.format)
        .with_model(settings.model);
    if let Some(cache) = cache {
        translator = translator.with_cache(cache);
    }
    translator.set_verbose(config.verbose);
    Ok(translator)
}

fn print_labels(labels: BTreeMap<LabelId, String>) {
    for (id, value) in labels {
        println!("{id}\t{value}");
    }
}

fn print_results(results: BTreeMap<String, Option<String>>) {
    for (text, result) in results {
        println!("{text}\t{}", result.as_deref().unwrap_or("-"));
    }
}
