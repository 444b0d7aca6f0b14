use std::collections::HashMap;

use fluent_templates::{
    fluent_bundle::{FluentArgs, FluentValue},
    static_loader, Loader,
};
use once_cell::sync::Lazy;
use unic_langid::LanguageIdentifier;

static_loader! {
    static LOCALES = {
        locales: "./locales",
        fallback_language: "uz",
    };
}

/// Default language identifier. The bot currently speaks Uzbek only; the
/// language parameter stays in the lookup API so more locales can be added
/// without touching call sites.
static DEFAULT_LANG: Lazy<LanguageIdentifier> =
    Lazy::new(|| "uz".parse().unwrap_or_else(|_| LanguageIdentifier::default()));

/// Returns a localized string for the given key.
/// Converts literal `\n` sequences to actual newlines for proper Telegram formatting.
pub fn t(lang: &LanguageIdentifier, key: &str) -> String {
    let text = LOCALES
        .lookup(lang, key)
        .unwrap_or_else(|| LOCALES.lookup(&DEFAULT_LANG, key).unwrap_or_else(|| key.to_string()));
    text.replace("\\n", "\n")
}

/// Returns a localized string with arguments for interpolation.
/// Converts literal `\n` sequences to actual newlines for proper Telegram formatting.
pub fn t_args(lang: &LanguageIdentifier, key: &str, args: &FluentArgs) -> String {
    let args_map: HashMap<String, FluentValue> = args.iter().map(|(k, v)| (k.to_string(), v.clone())).collect();

    let text = LOCALES.lookup_with_args(lang, key, &args_map).unwrap_or_else(|| {
        LOCALES
            .lookup_with_args(&DEFAULT_LANG, key, &args_map)
            .unwrap_or_else(|| key.to_string())
    });
    text.replace("\\n", "\n")
}

/// Returns a localized string in the default language.
pub fn tr(key: &str) -> String {
    t(&DEFAULT_LANG, key)
}

/// Returns a localized string with arguments in the default language.
pub fn tr_args(key: &str, args: &FluentArgs) -> String {
    t_args(&DEFAULT_LANG, key, args)
}
