/// Outbound notices toward the presentation layer.
///
/// The store reports outcomes through [`Notifier::notify`] and never waits on delivery.
/// [`NoticeBoard`] logs each notice and buffers it until the server drains it into the
/// tool result.
use std::sync::{Arc, Mutex};

use schemars::JsonSchema;
use serde::Serialize;
use tracing::{error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum NoticeKind {
    Success,
    Error,
    Warning,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, JsonSchema)]
pub struct Notice {
    pub kind: NoticeKind,
    pub title: String,
    pub description: String,
}

pub trait Notifier: Send + Sync {
    fn notify(&self, kind: NoticeKind, title: &str, description: &str);
}

impl<N: Notifier + ?Sized> Notifier for Arc<N> {
    fn notify(&self, kind: NoticeKind, title: &str, description: &str) {
        (**self).notify(kind, title, description);
    }
}

#[derive(Default)]
pub struct NoticeBoard {
    pending: Mutex<Vec<Notice>>,
}

impl NoticeBoard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take every notice posted since the last drain, oldest first.
    pub fn drain(&self) -> Vec<Notice> {
        match self.pending.lock() {
            Ok(mut pending) => std::mem::take(&mut *pending),
            Err(poisoned) => std::mem::take(&mut *poisoned.into_inner()),
        }
    }
}

impl Notifier for NoticeBoard {
    fn notify(&self, kind: NoticeKind, title: &str, description: &str) {
        match kind {
            NoticeKind::Success => info!(title, description, "notice"),
            NoticeKind::Warning => warn!(title, description, "notice"),
            NoticeKind::Error => error!(title, description, "notice"),
        }
        let notice = Notice {
            kind,
            title: title.to_string(),
            description: description.to_string(),
        };
        match self.pending.lock() {
            Ok(mut pending) => pending.push(notice),
            Err(poisoned) => poisoned.into_inner().push(notice),
        }
    }
}
