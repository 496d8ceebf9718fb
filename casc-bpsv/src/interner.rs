//! String interning for efficient memory usage with repeated values

use dashmap::DashMap;
use std::sync::Arc;

/// Thread-safe string interner for deduplicating repeated string values
///
/// This implementation uses Arc to share string data across multiple
/// references, significantly reducing memory usage when the same strings
/// appear multiple times (common in BPSV config files).
#[derive(Debug, Clone)]
pub struct StringInterner {
    /// Map from string content to its interned Arc
    pool: Arc<DashMap<String, Arc<String>>>,
    /// Statistics
    stats: Arc<InternerStats>,
}

#[derive(Debug, Default)]
struct InternerStats {
    lookups: std::sync::atomic::AtomicUsize,
    hits: std::sync::atomic::AtomicUsize,
    unique_strings: std::sync::atomic::AtomicUsize,
}

impl StringInterner {
    /// Create a new string interner
    pub fn new() -> Self {
        Self {
            pool: Arc::new(DashMap::new()),
            stats: Arc::new(InternerStats::default()),
        }
    }

    /// Create a new string interner with pre-allocated capacity
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            pool: Arc::new(DashMap::with_capacity(capacity)),
            stats: Arc::new(InternerStats::default()),
        }
    }

    /// Intern a string, returning an Arc to the shared instance
    ///
    /// If the string already exists in the pool, returns the existing Arc.
    /// Otherwise, adds it to the pool and returns a new Arc.
    pub fn intern(&self, s: &str) -> Arc<String> {
        self.stats
            .lookups
            .fetch_add(1, std::sync::atomic::Ordering::Relaxed);

        // Check if string already exists
        if let Some(existing) = self.pool.get(s) {
            self.stats
                .hits
                .fetch_add(1, std::sync::atomic::Ordering::Relaxed);
            Arc::clone(&*existing)
        } else {
            // Create new interned string
            let arc_str = Arc::new(s.to_string());
            self.pool.insert(s.to_string(), Arc::clone(&arc_str));
            self.stats
                .unique_strings
                .fetch_add(1, std::sync::atomic::Ordering::Relaxed);
            arc_str
        }
    }

    /// Intern a string that we already own
    pub fn intern_owned(&self, s: String) -> Arc<String> {
        self.stats
            .lookups
            .fetch_add(1, std::sync::atomic::Ordering::Relaxed);

        // Check if string already exists
        if let Some(existing) = self.pool.get(&s) {
            self.stats
                .hits
                .fetch_add(1, std::sync::atomic::Ordering::Relaxed);
            Arc::clone(&*existing)
        } else {
            // Create new interned string
            let arc_str = Arc::new(s.clone());
            self.pool.insert(s, Arc::clone(&arc_str));
            self.stats
                .unique_strings
                .fetch_add(1, std::sync::atomic::Ordering::Relaxed);
            arc_str
        }
    }

    /// Get the number of unique strings in the pool
    pub fn unique_count(&self) -> usize {
        self.pool.len()
    }

    /// Get memory statistics
    pub fn memory_usage(&self) -> MemoryStats {
        let mut total_bytes = 0;
        let mut total_references = 0;

        for entry in self.pool.iter() {
            let string = entry.value();
            total_bytes += string.len() + std::mem::size_of::<String>();
            total_references += Arc::strong_count(string);
        }

        MemoryStats {
            unique_strings: self.pool.len(),
            total_bytes,
            total_references,
            deduplication_ratio: if total_references > 0 {
                (total_references as f64) / (self.pool.len() as f64)
            } else {
                0.0
            },
        }
    }

    /// Clear the interner pool
    pub fn clear(&self) {
        self.pool.clear();
        self.stats
            .unique_strings
            .store(0, std::sync::atomic::Ordering::Relaxed);
    }

    /// Get hit rate statistics
    pub fn hit_rate(&self) -> f64 {
        let lookups = self
            .stats
            .lookups
            .load(std::sync::atomic::Ordering::Relaxed);
        let hits = self.stats.hits.load(std::sync::atomic::Ordering::Relaxed);

        if lookups > 0 {
            (hits as f64) / (lookups as f64)
        } else {
            0.0
        }
    }
}

impl Default for StringInterner {
    fn default() -> Self {
        Self::new()
    }
}

/// Memory usage statistics for the interner
#[derive(Debug, Clone)]
pub struct MemoryStats {
    /// Number of unique strings stored
    pub unique_strings: usize,
    /// Total bytes used by string data
    pub total_bytes: usize,
    /// Total number of references to interned strings
    pub total_references: usize,
    /// Ratio of references to unique strings (higher = more deduplication)
    pub deduplication_ratio: f64,
}

/// Interned value wrapper for BPSV values
#[derive(Debug, Clone, PartialEq)]
pub enum InternedValue {
    /// Interned string value
    String(Arc<String>),
    /// Interned hex value
    Hex(Arc<String>),
    /// Decimal value (not interned as numbers are small)
    Decimal(i64),
    /// Empty value
    Empty,
}

impl InternedValue {
    /// Convert from a regular BpsvValue using an interner
    pub fn from_bpsv_value(value: crate::value::BpsvValue, interner: &StringInterner) -> Self {
        match value {
            crate::value::BpsvValue::String(s) => InternedValue::String(interner.intern_owned(s)),
            crate::value::BpsvValue::Hex(h) => InternedValue::Hex(interner.intern_owned(h)),
            crate::value::BpsvValue::Decimal(d) => InternedValue::Decimal(d),
            crate::value::BpsvValue::Empty => InternedValue::Empty,
        }
    }

    /// Get as string reference
    pub fn as_str(&self) -> Option<&str> {
        match self {
            InternedValue::String(s) | InternedValue::Hex(s) => Some(s.as_str()),
            _ => None,
        }
    }
}
