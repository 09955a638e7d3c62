//! Localized property resources.
//!
//! A resource is a family of `.properties` files: `OrderUiLabels.properties`
//! holds the base messages and `OrderUiLabels_fr.properties`,
//! `OrderUiLabels_fr_CA.properties` override them for narrower locales.
//! [`FilePropertySource`] merges the family for a locale and caches the
//! result.

use crate::error::PropertyError;
use lru::LruCache;
use once_cell::sync::Lazy;
use parking_lot::{Mutex, RwLock};
use regex::Regex;
use screenkit_types::{Locale, ResourceBundle, Value};
use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

const DEFAULT_CACHE_SIZE: usize = 64;

/// `{index}` or `{index,format...}` inside a message pattern
static ARGUMENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*(\d+)\s*(?:,.*)?$").expect("valid argument regex"));

/// Loads resource bundles for a locale.
pub trait PropertySource: Send + Sync {
    /// The merged bundle of `resource` for `locale` (`None` for the base file only).
    fn bundle(
        &self,
        resource: &str,
        locale: Option<&Locale>,
    ) -> Result<Arc<ResourceBundle>, PropertyError>;

    /// A single localized message
    fn message(
        &self,
        resource: &str,
        key: &str,
        locale: Option<&Locale>,
    ) -> Result<Option<String>, PropertyError> {
        Ok(self.bundle(resource, locale)?.get(key).map(str::to_string))
    }

    /// A single message from the base file, ignoring locale
    fn property(&self, resource: &str, key: &str) -> Result<Option<String>, PropertyError> {
        self.message(resource, key, None)
    }
}

/// Strip a trailing `.properties` so `Foo` and `Foo.properties` name the same resource
fn resource_name(resource: &str) -> &str {
    resource.strip_suffix(".properties").unwrap_or(resource)
}

fn locale_label(locale: Option<&Locale>) -> String {
    locale.map(Locale::tag).unwrap_or_else(|| "none".to_string())
}

/// Bundles read from `.properties` files under one or more root directories.
///
/// The first root holding a given file wins.
pub struct FilePropertySource {
    roots: Vec<PathBuf>,
    cache: Mutex<LruCache<(String, String), Arc<ResourceBundle>>>,
}

impl FilePropertySource {
    pub fn new(roots: Vec<PathBuf>) -> Self {
        Self::with_cache_size(roots, DEFAULT_CACHE_SIZE)
    }

    pub fn with_cache_size(roots: Vec<PathBuf>, cache_size: usize) -> Self {
        let capacity = NonZeroUsize::new(cache_size).unwrap_or(NonZeroUsize::MIN);
        Self {
            roots,
            cache: Mutex::new(LruCache::new(capacity)),
        }
    }

    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }

    fn find_file(&self, file_name: &str) -> Option<PathBuf> {
        self.roots
            .iter()
            .map(|root| root.join(file_name))
            .find(|path| path.is_file())
    }

    fn read_file(path: &Path) -> Result<HashMap<String, String>, PropertyError> {
        let text = std::fs::read_to_string(path).map_err(|source| PropertyError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(parse_properties(&text))
    }

    fn load(&self, name: &str, locale: Option<&Locale>) -> Result<ResourceBundle, PropertyError> {
        // least specific first so narrower files override
        let mut suffixes = vec![String::new()];
        if let Some(locale) = locale {
            suffixes.extend(locale.candidates().into_iter().rev().map(|c| format!("_{c}")));
        }

        let mut entries = HashMap::new();
        let mut found = false;
        for suffix in suffixes {
            let file_name = format!("{name}{suffix}.properties");
            if let Some(path) = self.find_file(&file_name) {
                debug!(path = %path.display(), "loading properties");
                entries.extend(Self::read_file(&path)?);
                found = true;
            }
        }

        if !found {
            return Err(PropertyError::NotFound {
                resource: name.to_string(),
                locale: locale_label(locale),
            });
        }
        Ok(ResourceBundle::new(name, locale.cloned(), entries))
    }
}

impl PropertySource for FilePropertySource {
    fn bundle(
        &self,
        resource: &str,
        locale: Option<&Locale>,
    ) -> Result<Arc<ResourceBundle>, PropertyError> {
        let name = resource_name(resource);
        let key = (name.to_string(), locale_label(locale));
        if let Some(bundle) = self.cache.lock().get(&key) {
            return Ok(bundle.clone());
        }

        let bundle = Arc::new(self.load(name, locale)?);
        self.cache.lock().put(key, bundle.clone());
        Ok(bundle)
    }
}

/// Bundles registered in memory, keyed by resource and locale tag.
///
/// Lookups fall back through the locale candidates to the base entries, the
/// same way file families merge.
#[derive(Default)]
pub struct MemoryPropertySource {
    resources: RwLock<HashMap<String, HashMap<String, HashMap<String, String>>>>,
}

impl MemoryPropertySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register entries for `resource`; `locale` of `None` sets the base entries.
    pub fn insert<I, K, V>(&self, resource: &str, locale: Option<&str>, entries: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut resources = self.resources.write();
        let family = resources.entry(resource_name(resource).to_string()).or_default();
        let slot = family.entry(locale.unwrap_or_default().to_string()).or_default();
        slot.extend(entries.into_iter().map(|(k, v)| (k.into(), v.into())));
    }

    pub fn with_resource<I, K, V>(self, resource: &str, locale: Option<&str>, entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.insert(resource, locale, entries);
        self
    }
}

impl PropertySource for MemoryPropertySource {
    fn bundle(
        &self,
        resource: &str,
        locale: Option<&Locale>,
    ) -> Result<Arc<ResourceBundle>, PropertyError> {
        let name = resource_name(resource);
        let resources = self.resources.read();
        let family = resources.get(name).ok_or_else(|| PropertyError::NotFound {
            resource: name.to_string(),
            locale: locale_label(locale),
        })?;

        let mut tags = vec![String::new()];
        if let Some(locale) = locale {
            tags.extend(locale.candidates().into_iter().rev());
        }
        let mut entries = HashMap::new();
        for tag in tags {
            if let Some(layer) = family.get(&tag) {
                entries.extend(layer.iter().map(|(k, v)| (k.clone(), v.clone())));
            }
        }
        Ok(Arc::new(ResourceBundle::new(name, locale.cloned(), entries)))
    }
}

/// Parse `.properties` text: `key=value`, `key: value` or `key value`
/// lines, `#`/`!` comments, backslash continuations and escapes.
pub fn parse_properties(text: &str) -> HashMap<String, String> {
    let mut entries = HashMap::new();
    let mut lines = text.lines();

    while let Some(line) = lines.next() {
        let mut logical = line.trim_start().to_string();
        if logical.is_empty() || logical.starts_with('#') || logical.starts_with('!') {
            continue;
        }
        while ends_with_continuation(&logical) {
            logical.pop();
            match lines.next() {
                Some(next) => logical.push_str(next.trim_start()),
                None => break,
            }
        }

        let (key, value) = split_entry(&logical);
        entries.insert(unescape(key), unescape(value));
    }
    entries
}

/// An odd number of trailing backslashes continues the line
fn ends_with_continuation(line: &str) -> bool {
    line.chars().rev().take_while(|&c| c == '\\').count() % 2 == 1
}

fn split_entry(line: &str) -> (&str, &str) {
    let mut escaped = false;
    for (i, c) in line.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' => escaped = true,
            '=' | ':' => return (&line[..i], line[i + 1..].trim_start()),
            c if c.is_whitespace() => {
                let rest = line[i..].trim_start();
                let rest = rest
                    .strip_prefix('=')
                    .or_else(|| rest.strip_prefix(':'))
                    .unwrap_or(rest);
                return (&line[..i], rest.trim_start());
            }
            _ => {}
        }
    }
    (line, "")
}

fn unescape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('t') => out.push('\t'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('f') => out.push('\u{c}'),
            Some('u') => {
                let hex: String = chars.by_ref().take(4).collect();
                match u32::from_str_radix(&hex, 16).ok().and_then(char::from_u32) {
                    Some(ch) => out.push(ch),
                    None => {
                        out.push_str("\\u");
                        out.push_str(&hex);
                    }
                }
            }
            Some(other) => out.push(other),
            None => {}
        }
    }
    out
}

/// Substitute `{n}` placeholders with positional arguments.
///
/// Text inside single quotes is literal and `''` is a single quote. An index
/// with no matching argument is left as written.
pub fn format_message(pattern: &str, args: &[Value]) -> String {
    let mut out = String::with_capacity(pattern.len());
    let mut chars = pattern.chars().peekable();
    let mut quoted = false;

    while let Some(c) = chars.next() {
        match c {
            '\'' => {
                if chars.peek() == Some(&'\'') {
                    chars.next();
                    out.push('\'');
                } else {
                    quoted = !quoted;
                }
            }
            '{' if !quoted => {
                let mut inner = String::new();
                let mut closed = false;
                for c in chars.by_ref() {
                    if c == '}' {
                        closed = true;
                        break;
                    }
                    inner.push(c);
                }
                let arg = ARGUMENT
                    .captures(&inner)
                    .and_then(|caps| caps[1].parse::<usize>().ok())
                    .and_then(|idx| args.get(idx));
                match (closed, arg) {
                    (true, Some(value)) => out.push_str(&value.to_string()),
                    (true, None) => {
                        out.push('{');
                        out.push_str(&inner);
                        out.push('}');
                    }
                    (false, _) => {
                        out.push('{');
                        out.push_str(&inner);
                    }
                }
            }
            c => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_parse_properties() {
        let text = "# comment\n! also comment\nCommonSave=Save\nCommonCancel : Cancel\nspaced value\n\
                    multi=first \\\n    second\nescaped\\=key=a\\tb\nunicode=caf\\u00e9\nempty=\n";
        let entries = parse_properties(text);
        assert_eq!(entries["CommonSave"], "Save");
        assert_eq!(entries["CommonCancel"], "Cancel");
        assert_eq!(entries["spaced"], "value");
        assert_eq!(entries["multi"], "first second");
        assert_eq!(entries["escaped=key"], "a\tb");
        assert_eq!(entries["unicode"], "café");
        assert_eq!(entries["empty"], "");
        assert_eq!(entries.len(), 7);
    }

    #[test]
    fn test_file_source_merges_locale_family() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("OrderUiLabels.properties"),
            "OrderTitle=Orders\nOrderOnly=base\n",
        )
        .unwrap();
        fs::write(dir.path().join("OrderUiLabels_fr.properties"), "OrderTitle=Commandes\n").unwrap();

        let source = FilePropertySource::new(vec![dir.path().to_path_buf()]);
        let fr = Locale::parse("fr_CA").unwrap();
        let bundle = source.bundle("OrderUiLabels", Some(&fr)).unwrap();
        assert_eq!(bundle.get("OrderTitle"), Some("Commandes"));
        assert_eq!(bundle.get("OrderOnly"), Some("base"));

        assert_eq!(
            source.property("OrderUiLabels.properties", "OrderTitle").unwrap(),
            Some("Orders".to_string())
        );
    }

    #[test]
    fn test_file_source_caches_bundles() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("App.properties"), "k=v\n").unwrap();
        let source = FilePropertySource::with_cache_size(vec![dir.path().to_path_buf()], 4);

        let first = source.bundle("App", None).unwrap();
        let second = source.bundle("App", None).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_missing_resource() {
        let dir = TempDir::new().unwrap();
        let source = FilePropertySource::new(vec![dir.path().to_path_buf()]);
        let err = source.bundle("Nope", None).unwrap_err();
        assert!(matches!(err, PropertyError::NotFound { .. }));
    }

    #[test]
    fn test_memory_source_locale_fallback() {
        let source = MemoryPropertySource::new()
            .with_resource("CommonUiLabels", None, [("CommonSave", "Save"), ("CommonAdd", "Add")])
            .with_resource("CommonUiLabels", Some("de"), [("CommonSave", "Speichern")]);

        let de = Locale::parse("de_AT").unwrap();
        assert_eq!(
            source.message("CommonUiLabels", "CommonSave", Some(&de)).unwrap(),
            Some("Speichern".to_string())
        );
        assert_eq!(
            source.message("CommonUiLabels", "CommonAdd", Some(&de)).unwrap(),
            Some("Add".to_string())
        );
        assert_eq!(
            source.property("CommonUiLabels", "CommonSave").unwrap(),
            Some("Save".to_string())
        );
    }

    #[test]
    fn test_format_message() {
        let args = vec![Value::from("Widget"), Value::from(3)];
        assert_eq!(
            format_message("{1} units of {0}", &args),
            "3 units of Widget"
        );
        assert_eq!(format_message("{0,number,integer}", &args), "Widget");
        assert_eq!(format_message("It''s '{0}' {0}", &args), "It's {0} Widget");
        assert_eq!(format_message("{5} stays", &args), "{5} stays");
    }
}
