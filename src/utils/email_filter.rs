use autoscale_cuckoo_filter::CuckooFilter;
use std::sync::RwLock;

/// Expected capacity and false-positive rate.
/// Tune these based on real user counts.
const FILTER_CAPACITY: usize = 100_000;
const FALSE_POSITIVE_RATE: f64 = 0.001;

/// Probabilistic set of registered emails. A negative answer is definitive.
pub struct EmailFilter {
    inner: RwLock<CuckooFilter<String>>,
}

impl Default for EmailFilter {
    fn default() -> Self {
        Self {
            inner: RwLock::new(CuckooFilter::new(FILTER_CAPACITY, FALSE_POSITIVE_RATE)),
        }
    }
}

impl EmailFilter {
    /// Check if an email might be registered (false positives possible).
    /// A poisoned lock answers "maybe" so the caller falls back to the store.
    pub fn might_exist(&self, email: &str) -> bool {
        match self.inner.read() {
            Ok(filter) => filter.contains(&email.to_string()),
            Err(_) => true,
        }
    }

    pub fn insert(&self, email: &str) {
        if let Ok(mut filter) = self.inner.write() {
            filter.add(&email.to_string());
        }
    }

    pub fn remove(&self, email: &str) {
        if let Ok(mut filter) = self.inner.write() {
            filter.remove(&email.to_string());
        }
    }

    /// Insert a batch of normalized emails under one lock.
    pub fn insert_batch(&self, emails: &[String]) {
        if let Ok(mut filter) = self.inner.write() {
            for email in emails {
                filter.add(email);
            }
        }
    }
}
