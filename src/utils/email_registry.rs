use crate::error::StoreError;
use crate::store::UserStore;
use crate::utils::email_cache::EmailCache;
use crate::utils::email_filter::EmailFilter;

/// Email availability in front of the user store: cuckoo filter for fast
/// negatives, moka cache for fast positives, store as the source of truth.
#[derive(Default)]
pub struct EmailRegistry {
    filter: EmailFilter,
    cache: EmailCache,
}

impl EmailRegistry {
    /// `email` must already be normalized.
    pub async fn is_available(&self, email: &str, users: &dyn UserStore) -> Result<bool, StoreError> {
        // 1️⃣ Cuckoo filter: fast negative
        if !self.filter.might_exist(email) {
            return Ok(true);
        }

        // 2️⃣ Moka cache: fast positive
        if self.cache.is_taken(email).await {
            return Ok(false);
        }

        // 3️⃣ Store fallback
        let taken = users.find_by_email(email).await?.is_some();
        if taken {
            self.cache.mark_taken(email).await;
        }
        Ok(!taken)
    }

    pub async fn register(&self, email: &str) {
        self.filter.insert(email);
        self.cache.mark_taken(email).await;
    }

    pub async fn release(&self, email: &str) {
        self.filter.remove(email);
        self.cache.forget(email).await;
    }

    /// Loads every stored email in batches.
    pub async fn warmup(&self, users: &dyn UserStore, batch_size: usize) -> Result<usize, StoreError> {
        let emails = users.all_emails().await?;
        for batch in emails.chunks(batch_size.max(1)) {
            self.filter.insert_batch(batch);
            self.cache.mark_batch(batch).await;
        }

        log::info!("Email registry warmup complete: {} users", emails.len());
        Ok(emails.len())
    }
}
