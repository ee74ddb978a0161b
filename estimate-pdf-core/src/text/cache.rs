//! Memoized text measurement and wrapping.
//!
//! Long tables repeat the same cell values (units, rates, status words), so
//! widths and wrap results are cached per document. The cache is owned by
//! whoever renders and is dropped with it; nothing here is global.

use crate::text::metrics::{measure_text, truncate_lines, wrap_text};
use crate::text::Font;
use std::collections::HashMap;
use std::hash::Hash;

/// Least-recently-used map with a fixed capacity.
pub struct LruCache<K: Clone + Eq + Hash, V> {
    capacity: usize,
    tick: u64,
    map: HashMap<K, (V, u64)>,
}

impl<K: Clone + Eq + Hash, V> LruCache<K, V> {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            tick: 0,
            map: HashMap::with_capacity(capacity.min(1024)),
        }
    }

    pub fn get(&mut self, key: &K) -> Option<&V> {
        self.tick += 1;
        let tick = self.tick;
        match self.map.get_mut(key) {
            Some(entry) => {
                entry.1 = tick;
                Some(&entry.0)
            }
            None => None,
        }
    }

    pub fn put(&mut self, key: K, value: V) {
        self.tick += 1;
        if !self.map.contains_key(&key) && self.map.len() >= self.capacity {
            let oldest = self
                .map
                .iter()
                .min_by_key(|(_, (_, used))| *used)
                .map(|(k, _)| k.clone());
            if let Some(oldest) = oldest {
                self.map.remove(&oldest);
            }
        }
        self.map.insert(key, (value, self.tick));
    }

    pub fn clear(&mut self) {
        self.map.clear();
        self.tick = 0;
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct WidthKey {
    text: String,
    font: Font,
    size_bits: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct WrapKey {
    text: String,
    font: Font,
    size_bits: u64,
    width_bits: u64,
    max_lines: usize,
}

/// Hit/miss counters for a [`LayoutCache`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub entries: usize,
}

impl CacheStats {
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// Per-document cache of text widths and wrapped lines.
pub struct LayoutCache {
    widths: LruCache<WidthKey, f64>,
    wraps: LruCache<WrapKey, Vec<String>>,
    hits: u64,
    misses: u64,
}

impl Default for LayoutCache {
    fn default() -> Self {
        Self::new(4096)
    }
}

impl LayoutCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            widths: LruCache::new(capacity),
            wraps: LruCache::new(capacity),
            hits: 0,
            misses: 0,
        }
    }

    pub fn measure(&mut self, text: &str, font: Font, font_size: f64) -> f64 {
        let key = WidthKey {
            text: text.to_string(),
            font,
            size_bits: font_size.to_bits(),
        };
        if let Some(width) = self.widths.get(&key) {
            self.hits += 1;
            return *width;
        }
        self.misses += 1;
        let width = measure_text(text, font, font_size);
        self.widths.put(key, width);
        width
    }

    /// Wraps `text` to `max_width`, capping the result at `max_lines`
    /// (0 means no cap).
    pub fn wrap(
        &mut self,
        text: &str,
        font: Font,
        font_size: f64,
        max_width: f64,
        max_lines: usize,
    ) -> Vec<String> {
        let key = WrapKey {
            text: text.to_string(),
            font,
            size_bits: font_size.to_bits(),
            width_bits: max_width.to_bits(),
            max_lines,
        };
        if let Some(lines) = self.wraps.get(&key) {
            self.hits += 1;
            return lines.clone();
        }
        self.misses += 1;
        let lines = truncate_lines(
            wrap_text(text, font, font_size, max_width),
            max_lines,
            font,
            font_size,
            max_width,
        );
        self.wraps.put(key, lines.clone());
        lines
    }

    pub fn clear(&mut self) {
        self.widths.clear();
        self.wraps.clear();
        self.hits = 0;
        self.misses = 0;
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits,
            misses: self.misses,
            entries: self.widths.len() + self.wraps.len(),
        }
    }
}
