//! Critical route allowlist

use crate::locale::{Locale, LocaleSet};
use serde::{Deserialize, Serialize};

/// Routes that get the full probe, compared with the locale prefix removed.
/// The empty route is the locale home page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CriticalRoutes(Vec<String>);

impl Default for CriticalRoutes {
    fn default() -> Self {
        Self::new([
            "",
            "architecture",
            "research",
            "services",
            "about",
            "contact",
            "privacy",
            "imprint",
        ])
    }
}

impl CriticalRoutes {
    pub fn new<S: Into<String>>(routes: impl IntoIterator<Item = S>) -> Self {
        Self(
            routes
                .into_iter()
                .map(|r| r.into().trim_matches('/').to_string())
                .collect(),
        )
    }

    pub fn routes(&self) -> &[String] {
        &self.0
    }

    /// Whether `path` is a critical route under any configured locale
    #[must_use]
    pub fn is_critical(&self, path: &str, locales: &LocaleSet) -> bool {
        let route = route_of(path, locales);
        self.0.iter().any(|r| *r == route)
    }
}

/// Path with query, fragment, configured locale prefix and surrounding slashes removed.
/// A two-letter segment that is not a configured locale (`/ai/overview`) stays part of the route.
#[must_use]
pub fn route_of<'p>(path: &'p str, locales: &LocaleSet) -> &'p str {
    strip_locale(path, locales.locale_of(path))
}

fn strip_locale(path: &str, locale: Option<Locale>) -> &str {
    let path = path.split(['?', '#']).next().unwrap_or_default().trim_matches('/');
    let Some(locale) = locale else {
        return path;
    };
    match path.split_once('/') {
        Some((first, rest)) if first == locale.as_str() => rest.trim_matches('/'),
        None if path == locale.as_str() => "",
        _ => path,
    }
}

/// Screenshot file name, `<locale>_<route>.png`, with `home` for the locale root
#[must_use]
pub fn screenshot_name(locale: Option<Locale>, path: &str) -> String {
    let route = match strip_locale(path, locale) {
        "" => "home".to_string(),
        other => other.replace('/', "_"),
    };
    let locale = locale.map_or_else(|| "xx".to_string(), |l| l.to_string());
    format!("{locale}_{route}.png")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn locales() -> LocaleSet {
        LocaleSet::parse(&["en", "de", "fr", "es"], "en").unwrap()
    }

    #[test]
    fn strips_locale_prefix() {
        let locales = locales();
        assert_eq!(route_of("/en", &locales), "");
        assert_eq!(route_of("/en/", &locales), "");
        assert_eq!(route_of("/de/about", &locales), "about");
        assert_eq!(route_of("/fr/research/edge?x=1", &locales), "research/edge");
        assert_eq!(route_of("/about", &locales), "about");
    }

    #[test]
    fn unconfigured_two_letter_segment_is_a_route() {
        let locales = locales();
        assert_eq!(route_of("/ai/overview", &locales), "ai/overview");
        assert_eq!(route_of("/ai", &locales), "ai");
        let routes = CriticalRoutes::default();
        assert!(!routes.is_critical("/ai", &locales));
        assert!(!routes.is_critical("/ai/about", &locales));
        assert!(routes.is_critical("/es/about", &locales));
    }

    #[test]
    fn default_allowlist() {
        let locales = locales();
        let routes = CriticalRoutes::default();
        assert_eq!(routes.routes().len(), 8);
        for path in ["/en", "/de/architecture", "/fr/imprint/", "/es/privacy"] {
            assert!(routes.is_critical(path, &locales), "{path}");
        }
        for path in ["/en/research/edge-caching", "/en/blog", "/de/about/team", "/it/about"] {
            assert!(!routes.is_critical(path, &locales), "{path}");
        }
    }

    #[test]
    fn screenshot_names() {
        let de = Locale::parse("de").ok();
        assert_eq!(screenshot_name(de, "/de"), "de_home.png");
        assert_eq!(screenshot_name(de, "/de/about"), "de_about.png");
        assert_eq!(screenshot_name(None, "/about"), "xx_about.png");
        assert_eq!(screenshot_name(None, "/ai/overview"), "xx_ai_overview.png");
    }
}
