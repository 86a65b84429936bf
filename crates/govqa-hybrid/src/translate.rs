//! Query translation behind an injected, bounded cache.

use std::sync::Arc;

use govqa_core::traits::{KeyValueCache, Translator};
use govqa_core::types::Language;
use moka::sync::Cache;
use tracing::{debug, warn};

/// `(source, target, text)`.
pub type TranslationKey = (Language, Language, String);

pub type SharedTranslationCache = Arc<dyn KeyValueCache<TranslationKey, String>>;

/// Bounded translation cache backed by moka (TinyLFU admission).
pub struct MokaTranslationCache {
    cache: Cache<TranslationKey, String>,
    capacity: u64,
}

impl MokaTranslationCache {
    pub fn new(capacity: u64) -> Self {
        Self { cache: Cache::builder().max_capacity(capacity).build(), capacity }
    }

    pub fn len(&self) -> u64 {
        self.cache.run_pending_tasks();
        self.cache.entry_count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl KeyValueCache<TranslationKey, String> for MokaTranslationCache {
    fn get(&self, key: &TranslationKey) -> Option<String> {
        self.cache.get(key)
    }

    fn insert(&self, key: TranslationKey, value: String) {
        self.cache.insert(key, value);
    }

    fn capacity(&self) -> u64 {
        self.capacity
    }
}

/// Wraps a translator with a caller-owned cache. Failures are never cached.
#[derive(Clone)]
pub struct CachedTranslator {
    inner: Arc<dyn Translator>,
    cache: SharedTranslationCache,
}

impl CachedTranslator {
    pub fn new(inner: Arc<dyn Translator>, cache: SharedTranslationCache) -> Self {
        Self { inner, cache }
    }

    pub fn with_capacity(inner: Arc<dyn Translator>, capacity: u64) -> Self {
        Self::new(inner, Arc::new(MokaTranslationCache::new(capacity)))
    }

    pub fn cache(&self) -> &SharedTranslationCache {
        &self.cache
    }

    /// Translate, or hand back `text` unchanged when the service fails.
    pub fn translate_or_original(&self, text: &str, source: Language, target: Language) -> String {
        match self.translate(text, source, target) {
            Ok(translated) => translated,
            Err(err) => {
                warn!(error = %format!("{err:#}"), from = source.code(), to = target.code(), "translation failed, using original text");
                text.to_string()
            }
        }
    }
}

impl Translator for CachedTranslator {
    fn translate(&self, text: &str, source: Language, target: Language) -> anyhow::Result<String> {
        if source == target || text.trim().is_empty() {
            return Ok(text.to_string());
        }
        let key = (source, target, text.to_string());
        if let Some(hit) = self.cache.get(&key) {
            debug!(from = source.code(), to = target.code(), "translation cache hit");
            return Ok(hit);
        }
        let translated = self.inner.translate(text, source, target)?;
        self.cache.insert(key, translated.clone());
        Ok(translated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Counting {
        calls: AtomicUsize,
        fail: bool,
    }

    impl Translator for Counting {
        fn translate(&self, text: &str, _source: Language, _target: Language) -> anyhow::Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                anyhow::bail!("service down");
            }
            Ok(format!("ar:{text}"))
        }
    }

    #[test]
    fn second_lookup_hits_cache() {
        let inner = Arc::new(Counting { calls: AtomicUsize::new(0), fail: false });
        let translator = CachedTranslator::with_capacity(inner.clone(), 16);
        let a = translator.translate("driving license", Language::English, Language::Arabic).unwrap();
        let b = translator.translate("driving license", Language::English, Language::Arabic).unwrap();
        assert_eq!(a, "ar:driving license");
        assert_eq!(a, b);
        assert_eq!(inner.calls.load(Ordering::SeqCst), 1);
        assert_eq!(translator.cache().capacity(), 16);
    }

    #[test]
    fn failure_falls_back_and_is_not_cached() {
        let inner = Arc::new(Counting { calls: AtomicUsize::new(0), fail: true });
        let translator = CachedTranslator::with_capacity(inner.clone(), 16);
        assert_eq!(translator.translate_or_original("museum", Language::English, Language::Arabic), "museum");
        assert_eq!(translator.translate_or_original("museum", Language::English, Language::Arabic), "museum");
        assert_eq!(inner.calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn same_language_is_passthrough() {
        let inner = Arc::new(Counting { calls: AtomicUsize::new(0), fail: false });
        let translator = CachedTranslator::with_capacity(inner.clone(), 16);
        assert_eq!(translator.translate("رخصة", Language::Arabic, Language::Arabic).unwrap(), "رخصة");
        assert_eq!(inner.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn moka_cache_is_bounded() {
        let cache = MokaTranslationCache::new(4);
        for i in 0..64 {
            cache.insert((Language::English, Language::Arabic, format!("q{i}")), format!("t{i}"));
        }
        assert!(cache.len() <= 4);
    }
}
