use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A language/country/variant triple, written `en_US` or `en-US`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Locale {
    language: String,
    country: Option<String>,
    variant: Option<String>,
}

impl Locale {
    pub fn new(language: impl Into<String>) -> Self {
        Self {
            language: language.into().to_ascii_lowercase(),
            country: None,
            variant: None,
        }
    }

    pub fn with_country(mut self, country: impl Into<String>) -> Self {
        self.country = Some(country.into().to_ascii_uppercase());
        self
    }

    pub fn with_variant(mut self, variant: impl Into<String>) -> Self {
        self.variant = Some(variant.into());
        self
    }

    /// Parse a locale tag. Returns `None` for an empty or malformed tag.
    pub fn parse(tag: &str) -> Option<Self> {
        let mut parts = tag.trim().split(['_', '-']);
        let language = parts.next().filter(|l| !l.is_empty())?;
        if !language.chars().all(|c| c.is_ascii_alphabetic()) {
            return None;
        }

        let mut locale = Locale::new(language);
        if let Some(country) = parts.next().filter(|c| !c.is_empty()) {
            locale = locale.with_country(country);
        }
        let rest: Vec<&str> = parts.filter(|p| !p.is_empty()).collect();
        if !rest.is_empty() {
            locale = locale.with_variant(rest.join("_"));
        }
        Some(locale)
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    pub fn country(&self) -> Option<&str> {
        self.country.as_deref()
    }

    pub fn variant(&self) -> Option<&str> {
        self.variant.as_deref()
    }

    /// Canonical tag using underscores (`en_US`).
    pub fn tag(&self) -> String {
        self.candidates()
            .into_iter()
            .next()
            .unwrap_or_else(|| self.language.clone())
    }

    /// Bundle-name suffixes from most to least specific (`en_US_x`, `en_US`, `en`).
    pub fn candidates(&self) -> Vec<String> {
        let mut out = Vec::with_capacity(3);
        if let Some(country) = &self.country {
            if let Some(variant) = &self.variant {
                out.push(format!("{}_{}_{}", self.language, country, variant));
            }
            out.push(format!("{}_{}", self.language, country));
        }
        out.push(self.language.clone());
        out
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.tag())
    }
}

impl FromStr for Locale {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Locale::parse(s).ok_or_else(|| format!("invalid locale tag: {s:?}"))
    }
}

impl TryFrom<String> for Locale {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Locale> for String {
    fn from(locale: Locale) -> Self {
        locale.tag()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_underscore_and_dash() {
        let a = Locale::parse("en_US").unwrap();
        let b = Locale::parse("en-us").unwrap();
        assert_eq!(a, b);
        assert_eq!(a.language(), "en");
        assert_eq!(a.country(), Some("US"));
        assert_eq!(a.tag(), "en_US");
    }

    #[test]
    fn test_candidates_most_specific_first() {
        let locale = Locale::parse("de_CH_1901").unwrap();
        assert_eq!(locale.candidates(), vec!["de_CH_1901", "de_CH", "de"]);
        assert_eq!(Locale::new("fr").candidates(), vec!["fr"]);
    }

    #[test]
    fn test_rejects_garbage() {
        assert!(Locale::parse("").is_none());
        assert!(Locale::parse("12_US").is_none());
    }
}
