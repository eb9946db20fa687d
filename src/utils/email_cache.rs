use moka::future::Cache;
use std::time::Duration;

/// Recently seen registered emails. `true` means taken; absence means unknown.
#[derive(Clone)]
pub struct EmailCache {
    inner: Cache<String, bool>,
}

impl Default for EmailCache {
    fn default() -> Self {
        Self {
            inner: Cache::builder()
                .max_capacity(500_000) // tune based on memory
                .time_to_live(Duration::from_secs(86400)) // 24h TTL
                .build(),
        }
    }
}

impl EmailCache {
    pub async fn mark_taken(&self, email: &str) {
        self.inner.insert(email.to_string(), true).await;
    }

    pub async fn is_taken(&self, email: &str) -> bool {
        self.inner.get(email).await.unwrap_or(false)
    }

    pub async fn forget(&self, email: &str) {
        self.inner.invalidate(email).await;
    }

    /// Batch mark emails as taken
    pub async fn mark_batch(&self, emails: &[String]) {
        let futures: Vec<_> = emails
            .iter()
            .map(|e| self.inner.insert(e.clone(), true))
            .collect();

        // Await all insertions concurrently
        futures::future::join_all(futures).await;
    }
}
