//! Site locales

use crate::error::QaError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Two-letter lowercase language code used as the first path segment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Locale([u8; 2]);

impl Locale {
    /// Parse a locale code; only `[a-z]{2}` is accepted
    pub fn parse(value: &str) -> Result<Self, QaError> {
        match value.as_bytes() {
            [a, b] if a.is_ascii_lowercase() && b.is_ascii_lowercase() => Ok(Self([*a, *b])),
            _ => Err(QaError::InvalidLocale(value.to_string())),
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        // Always two ASCII letters
        std::str::from_utf8(&self.0).unwrap_or("??")
    }

    /// Locale of a URL path (`/de/about` → `de`)
    #[must_use]
    pub fn from_path(path: &str) -> Option<Self> {
        let first = path.trim_start_matches('/').split(['/', '?', '#']).next()?;
        Self::parse(first).ok()
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Locale {
    type Err = QaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Locale {
    type Error = QaError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Locale> for String {
    fn from(locale: Locale) -> Self {
        locale.as_str().to_string()
    }
}

/// Configured locales and the default one
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LocaleSet {
    locales: Vec<Locale>,
    default: Locale,
}

impl LocaleSet {
    /// Validate that `default` is one of `locales`
    pub fn new(locales: Vec<Locale>, default: Locale) -> Result<Self, QaError> {
        if !locales.contains(&default) {
            return Err(QaError::UnknownDefaultLocale(default.to_string()));
        }
        Ok(Self { locales, default })
    }

    /// Parse from strings
    pub fn parse<S: AsRef<str>>(locales: &[S], default: &str) -> Result<Self, QaError> {
        let locales = locales
            .iter()
            .map(|l| Locale::parse(l.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(locales, Locale::parse(default)?)
    }

    pub fn locales(&self) -> &[Locale] {
        &self.locales
    }

    #[must_use]
    pub fn default_locale(&self) -> Locale {
        self.default
    }

    #[must_use]
    pub fn contains(&self, locale: Locale) -> bool {
        self.locales.contains(&locale)
    }

    /// Configured locale that prefixes `path`, if any
    #[must_use]
    pub fn locale_of(&self, path: &str) -> Option<Locale> {
        Locale::from_path(path).filter(|l| self.contains(*l))
    }
}
