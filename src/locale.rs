use failure::{Error, ResultExt};
use serde_json::from_str;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

pub const DEFAULT_LANG: &str = "en";
pub const LOCALE_DIR: &str = "locales";

/// Message table for headlines and table headers.
/// Message ids are the English texts, unknown ids translate to themselves.
#[derive(Debug, Clone, Default)]
pub struct Locale {
    messages: HashMap<String, String>
}

impl Locale {
    pub fn english() -> Locale {
        Locale::default()
    }

    pub fn from_json(json: &str) -> Result<Locale, Error> {
        let messages: HashMap<String, String> = from_str(json)?;
        Ok(Locale { messages })
    }

    pub fn load(dir: &Path, lang: &str) -> Result<Locale, Error> {
        if lang == DEFAULT_LANG {
            return Ok(Locale::english());
        }
        let file = dir.join(format!("{}.json", lang));
        let json = fs::read_to_string(&file)
            .with_context(|_| format!("No translation for `{}`: {}", lang, file.display()))?;
        let locale = Locale::from_json(&json)
            .with_context(|_| format!("Can't parse: {}", file.display()))?;
        Ok(locale)
    }

    pub fn tr<'a>(&'a self, msg: &'a str) -> &'a str {
        match self.messages.get(msg) {
            Some(t) => t.as_str(),
            None => msg
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_english_is_identity() {
        let l = Locale::english();
        assert_eq!(l.tr("Mean"), "Mean");
    }

    #[test]
    fn test_translation_with_fallback() {
        let l = Locale::from_json(r#"{"Game": "Spiel", "Mean": "Schnitt"}"#).unwrap();
        assert_eq!(l.tr("Game"), "Spiel");
        assert_eq!(l.tr("SD"), "SD");
    }

    #[test]
    fn test_missing_language_is_error() {
        let dir = Path::new("no-such-locales-dir");
        assert!(Locale::load(dir, "xx").is_err());
        assert!(Locale::load(dir, "en").is_ok());
    }

    #[test]
    fn test_shipped_german() {
        let l = Locale::load(Path::new(env!("CARGO_MANIFEST_DIR")).join(LOCALE_DIR).as_path(), "de")
            .unwrap();
        assert_eq!(l.tr("Top"), "Top");
        assert_eq!(l.tr("Ratings"), "Bewertungen");
    }
}
