/// In-memory response collection synchronised with a persistence backend.
///
/// The in-memory list is the source of truth for the session: a failed or non-durable
/// write is reported through the notifier but never rolls a mutation back.
use std::collections::HashSet;
use std::time::{SystemTime, UNIX_EPOCH};

use tracing::{debug, info, warn};

use crate::backend::{PersistenceBackend, WriteOutcome};
use crate::error::ValidationError;
use crate::model::{default_responses, Category, ResponseRecord};
use crate::notify::{NoticeKind, Notifier};

const TITLE_SAVED: &str = "تم الحفظ بنجاح";
const TITLE_DELETED: &str = "تم الحذف";
const TITLE_COPIED: &str = "تم النسخ";
const TITLE_ERROR: &str = "خطأ";
const TITLE_NOT_DURABLE: &str = "لم يتم الحفظ بشكل دائم";
const TITLE_LOAD_FAILED: &str = "تعذر تحميل الردود";

/// Where the collection came from on `load`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadSource {
    Stored,
    Defaults,
    AlreadyLoaded,
}

/// A category with at least one record, in display order.
#[derive(Debug)]
pub struct Section<'a> {
    pub category: Category,
    pub records: Vec<&'a ResponseRecord>,
}

pub struct ResponseStore<B, N> {
    backend: B,
    notifier: N,
    records: Vec<ResponseRecord>,
    loaded: bool,
}

impl<B: PersistenceBackend, N: Notifier> ResponseStore<B, N> {
    pub fn new(backend: B, notifier: N) -> Self {
        Self {
            backend,
            notifier,
            records: Vec::new(),
            loaded: false,
        }
    }

    /// Populate the collection from the backend, once per session.
    ///
    /// Falls back to the default collection (and stores it) when nothing was ever
    /// written or the read fails.
    pub async fn load(&mut self) -> LoadSource {
        if self.loaded {
            debug!("collection already loaded, ignoring");
            return LoadSource::AlreadyLoaded;
        }
        self.loaded = true;

        match self.backend.read().await {
            Ok(Some(records)) => {
                self.records = dedup_ids(records);
                info!(records = self.records.len(), "loaded stored collection");
                LoadSource::Stored
            }
            Ok(None) => {
                info!("no stored collection, starting from defaults");
                self.records = default_responses();
                self.persist().await;
                LoadSource::Defaults
            }
            Err(e) => {
                warn!(error = %e, "failed to read stored collection, starting from defaults");
                self.notifier
                    .notify(NoticeKind::Error, TITLE_LOAD_FAILED, &e.to_string());
                self.records = default_responses();
                self.persist().await;
                LoadSource::Defaults
            }
        }
    }

    /// Append a new record. Title and content must be non-blank; the category is not
    /// checked against [`Category`].
    pub async fn add(
        &mut self,
        title: &str,
        content: &str,
        category: &str,
    ) -> Result<ResponseRecord, ValidationError> {
        let validation = if title.trim().is_empty() {
            Err(ValidationError::EmptyTitle)
        } else if content.trim().is_empty() {
            Err(ValidationError::EmptyContent)
        } else {
            Ok(())
        };
        if let Err(e) = validation {
            debug!(error = %e, "rejected new response");
            self.notifier
                .notify(NoticeKind::Error, TITLE_ERROR, "يرجى ملء جميع الحقول المطلوبة");
            return Err(e);
        }

        if Category::from_key(category).is_none() {
            warn!(category, "adding response with unknown category");
        }

        let record = ResponseRecord {
            id: self.next_id(),
            title: title.to_string(),
            content: content.to_string(),
            category: category.to_string(),
        };
        self.records.push(record.clone());
        info!(id = %record.id, category, records = self.records.len(), "response added");

        self.persist().await;
        self.notifier
            .notify(NoticeKind::Success, TITLE_SAVED, "تم إضافة الرد الجديد بنجاح");
        Ok(record)
    }

    /// Remove the record with `id`. An unknown id changes nothing and stores nothing.
    pub async fn delete(&mut self, id: &str) -> Option<ResponseRecord> {
        let Some(index) = self.records.iter().position(|r| r.id == id) else {
            debug!(id, "delete of unknown response ignored");
            return None;
        };
        let removed = self.records.remove(index);
        info!(id, records = self.records.len(), "response deleted");

        self.persist().await;
        self.notifier.notify(
            NoticeKind::Success,
            TITLE_DELETED,
            &format!("تم حذف \"{}\"", removed.title),
        );
        Some(removed)
    }

    /// Records in `category`, in collection order. Cloning the iterator restarts it.
    pub fn by_category<'a>(
        &'a self,
        category: &'a str,
    ) -> impl Iterator<Item = &'a ResponseRecord> + Clone + 'a {
        self.records.iter().filter(move |r| r.category == category)
    }

    /// Non-empty categories in display order.
    pub fn sections(&self) -> Vec<Section<'_>> {
        Category::ALL
            .into_iter()
            .filter_map(|category| {
                let records: Vec<_> = self.by_category(category.key()).collect();
                (!records.is_empty()).then_some(Section { category, records })
            })
            .collect()
    }

    pub fn get(&self, id: &str) -> Option<&ResponseRecord> {
        self.records.iter().find(|r| r.id == id)
    }

    /// Content to place on the clipboard for `id`.
    pub fn copy(&self, id: &str) -> Option<&str> {
        match self.get(id) {
            Some(record) => {
                self.notifier.notify(
                    NoticeKind::Success,
                    TITLE_COPIED,
                    &format!("تم نسخ \"{}\" إلى الحافظة", record.title),
                );
                Some(record.content.as_str())
            }
            None => {
                self.notifier
                    .notify(NoticeKind::Error, TITLE_ERROR, &format!("الرد غير موجود: {id}"));
                None
            }
        }
    }

    pub fn records(&self) -> &[ResponseRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    async fn persist(&self) {
        match self.backend.write(&self.records).await {
            Ok(WriteOutcome::Durable) => {}
            Ok(WriteOutcome::NotDurable { reason }) => {
                self.notifier
                    .notify(NoticeKind::Warning, TITLE_NOT_DURABLE, &reason);
            }
            Err(e) => {
                warn!(error = %e, records = self.records.len(), "failed to persist collection");
                self.notifier
                    .notify(NoticeKind::Error, TITLE_NOT_DURABLE, &e.to_string());
            }
        }
    }

    /// Creation time in milliseconds, bumped past any id already taken.
    fn next_id(&self) -> String {
        let mut candidate = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis())
            .unwrap_or(0);
        loop {
            let id = candidate.to_string();
            if self.get(&id).is_none() {
                return id;
            }
            candidate += 1;
        }
    }
}

fn dedup_ids(records: Vec<ResponseRecord>) -> Vec<ResponseRecord> {
    let mut seen = HashSet::with_capacity(records.len());
    let total = records.len();
    let unique: Vec<_> = records
        .into_iter()
        .filter(|r| seen.insert(r.id.clone()))
        .collect();
    if unique.len() != total {
        warn!(
            dropped = total - unique.len(),
            "stored collection had duplicate ids, kept first occurrences"
        );
    }
    unique
}
