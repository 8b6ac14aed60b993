//! Known countries, languages and which languages each country serves.

use std::collections::BTreeMap;

use crate::error::CoreError;
use crate::identity::{PageIdentity, DEFAULT_COUNTRY};

/// Language used when a caller does not name one.
pub const DEFAULT_LANGUAGE: &str = "en";

/// A supported country.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Country {
    pub code: String,
    pub name: String,
}

/// A supported content language.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Language {
    pub code: String,
    pub name: String,
    pub native_name: String,
}

/// Locale catalogue used to vet page identities before they are persisted.
#[derive(Debug, Clone)]
pub struct LocaleCatalog {
    countries: Vec<Country>,
    languages: Vec<Language>,
    country_languages: BTreeMap<String, Vec<String>>,
}

impl Default for LocaleCatalog {
    fn default() -> Self {
        let country = |code: &str, name: &str| Country {
            code: code.into(),
            name: name.into(),
        };
        let language = |code: &str, name: &str, native: &str| Language {
            code: code.into(),
            name: name.into(),
            native_name: native.into(),
        };
        let codes = |list: &[&str]| list.iter().map(|c| c.to_string()).collect::<Vec<_>>();

        Self {
            countries: vec![
                country(DEFAULT_COUNTRY, "Global"),
                country("ae", "United Arab Emirates"),
                country("iq", "Iraq"),
                country("us", "United States"),
            ],
            languages: vec![
                language("en", "English", "English"),
                language("ar", "Arabic", "العربية"),
            ],
            country_languages: BTreeMap::from([
                (DEFAULT_COUNTRY.to_string(), codes(&["en", "ar"])),
                ("ae".to_string(), codes(&["en", "ar"])),
                ("iq".to_string(), codes(&["en", "ar"])),
                ("us".to_string(), codes(&["en"])),
            ]),
        }
    }
}

impl LocaleCatalog {
    pub fn is_known_country(&self, code: &str) -> bool {
        self.countries.iter().any(|c| c.code == code)
    }

    /// Languages served in `country_code`, in preference order.
    ///
    /// Unknown countries fall back to [`DEFAULT_LANGUAGE`] only.
    pub fn supported_languages(&self, country_code: &str) -> Vec<&Language> {
        let default = [DEFAULT_LANGUAGE.to_string()];
        let codes = self
            .country_languages
            .get(country_code)
            .map(Vec::as_slice)
            .unwrap_or(&default[..]);
        codes
            .iter()
            .filter_map(|code| self.languages.iter().find(|l| &l.code == code))
            .collect()
    }

    /// Reject identities naming an unknown country or a language the country
    /// does not serve.
    pub fn check(&self, identity: &PageIdentity) -> Result<(), CoreError> {
        if !self.is_known_country(&identity.country_code) {
            return Err(CoreError::Validation(format!(
                "Unknown country '{}'. Valid countries: {}",
                identity.country_code,
                self.countries
                    .iter()
                    .map(|c| c.code.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            )));
        }
        if let Some(lang) = identity.language() {
            let supported = self.supported_languages(&identity.country_code);
            if !supported.iter().any(|l| l.code == lang) {
                return Err(CoreError::Validation(format!(
                    "Language '{lang}' is not served in '{}'",
                    identity.country_code
                )));
            }
        }
        Ok(())
    }
}
