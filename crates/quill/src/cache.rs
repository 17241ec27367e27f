//! Process-wide compiled template cache.
//!
//! Compiled templates are keyed by the SHA-256 digest of their exact source
//! text. Each entry also keeps the source it was compiled from and a hit is
//! only served when the sources match, so a digest collision degrades to a
//! recompile instead of returning the wrong template.
//!
//! Caching never changes what a template renders; it only skips compilation.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use once_cell::sync::Lazy;
use sha2::{Digest, Sha256};
use tracing::{debug, trace};

static CACHE: Lazy<RwLock<Cache>> = Lazy::new(|| RwLock::new(Cache::default()));

#[derive(Default)]
struct Cache {
    entries: HashMap<String, CacheEntry>,
    hits: u64,
    misses: u64,
}

struct CacheEntry {
    source: String,
    template: handlebars::Template,
}

/// A snapshot of cache counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub entries: usize,
}

/// Hex SHA-256 digest of a template source.
pub fn digest(source: &str) -> String {
    let hash = Sha256::digest(source.as_bytes());
    hash.iter().map(|byte| format!("{:02x}", byte)).collect()
}

/// Compiles `source`, consulting and populating the cache when `use_cache`.
pub(crate) fn compile(
    source: &str,
    use_cache: bool,
) -> Result<handlebars::Template, handlebars::TemplateError> {
    if !use_cache {
        return handlebars::Template::compile(source);
    }

    let key = digest(source);
    {
        let mut cache = CACHE.write().unwrap_or_else(PoisonError::into_inner);
        match cache.entries.get(&key) {
            Some(entry) if entry.source == source => {
                let template = entry.template.clone();
                cache.hits += 1;
                trace!(digest = %key, "template cache hit");
                return Ok(template);
            }
            Some(_) => debug!(digest = %key, "template cache digest collision, recompiling"),
            None => {}
        }
        cache.misses += 1;
    }

    let template = handlebars::Template::compile(source)?;
    CACHE
        .write()
        .unwrap_or_else(PoisonError::into_inner)
        .entries
        .insert(
            key,
            CacheEntry {
                source: source.to_string(),
                template: template.clone(),
            },
        );
    trace!("template cache miss, compiled and stored");
    Ok(template)
}

/// True if a compiled form of exactly `source` is cached.
pub fn contains(source: &str) -> bool {
    CACHE
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .entries
        .get(&digest(source))
        .is_some_and(|entry| entry.source == source)
}

pub fn stats() -> CacheStats {
    let cache = CACHE.read().unwrap_or_else(PoisonError::into_inner);
    CacheStats {
        hits: cache.hits,
        misses: cache.misses,
        entries: cache.entries.len(),
    }
}

/// Drops every entry and resets the counters.
pub fn clear() {
    let mut cache = CACHE.write().unwrap_or_else(PoisonError::into_inner);
    *cache = Cache::default();
    debug!("template cache cleared");
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_digest_is_stable_hex() {
        let d = digest("hello");
        assert_eq!(d.len(), 64);
        assert_eq!(d, digest("hello"));
        assert_ne!(d, digest("hello "));
        assert_eq!(
            digest(""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    #[serial]
    fn test_hit_and_miss_counting() {
        clear();
        let source = "cache unit {{x}}";
        let before = stats();
        compile(source, true).unwrap();
        compile(source, true).unwrap();
        let after = stats();
        assert!(after.misses > before.misses);
        assert!(after.hits > before.hits);
        assert!(contains(source));
    }

    #[test]
    #[serial]
    fn test_clear_empties_cache() {
        compile("cache clear {{x}}", true).unwrap();
        clear();
        assert!(!contains("cache clear {{x}}"));
    }

    #[test]
    fn test_disabled_cache_is_bypassed() {
        compile("uncached unit {{y}}", false).unwrap();
        assert!(!contains("uncached unit {{y}}"));
    }

    #[test]
    fn test_compile_errors_are_not_cached() {
        assert!(compile("{{#if a}}{{/each}} unit", true).is_err());
        assert!(!contains("{{#if a}}{{/each}} unit"));
    }
}
