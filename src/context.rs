//! Collaborators handed to the view's entry points.
//!
//! Nothing here is global. The host passes a [`Notifier`] and a
//! [`SessionAccessor`] into every action that talks to the store, so the
//! engine can be driven in isolation.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};

/// Severity of a user notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NoticeLevel {
    Info,
    Success,
    Error,
}

/// A toast-style message for the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            message: message.into(),
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }
}

/// Sink for user notices.
pub trait Notifier: Send + Sync {
    fn notify(&self, notice: Notice);
}

/// Signed-in user as seen by the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionUser {
    pub id: String,
    pub username: String,
}

/// Read access to the current session.
pub trait SessionAccessor: Send + Sync {
    /// `None` when nobody is signed in.
    fn current_user(&self) -> Option<SessionUser>;
}

/// Collaborators for one action.
#[derive(Clone, Copy)]
pub struct ActionContext<'a> {
    pub notifier: &'a dyn Notifier,
    pub session: &'a dyn SessionAccessor,
}

impl<'a> ActionContext<'a> {
    pub fn new(notifier: &'a dyn Notifier, session: &'a dyn SessionAccessor) -> Self {
        Self { notifier, session }
    }

    pub fn notify(&self, notice: Notice) {
        self.notifier.notify(notice);
    }

    /// Username for log fields, `"anonymous"` without a session.
    pub fn actor(&self) -> String {
        self.session
            .current_user()
            .map(|u| u.username)
            .unwrap_or_else(|| "anonymous".to_string())
    }
}

/// Notifier that only logs. Handy for headless hosts.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, notice: Notice) {
        match notice.level {
            NoticeLevel::Error => tracing::warn!(text = %notice.message, "user notice"),
            _ => tracing::info!(level = ?notice.level, text = %notice.message, "user notice"),
        }
    }
}

/// Notifier that keeps every notice for later inspection by a UI loop.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    notices: Mutex<Vec<Notice>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take every notice recorded so far.
    pub fn drain(&self) -> Vec<Notice> {
        match self.notices.lock() {
            Ok(mut notices) => std::mem::take(&mut *notices),
            Err(poisoned) => std::mem::take(&mut *poisoned.into_inner()),
        }
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notice: Notice) {
        match self.notices.lock() {
            Ok(mut notices) => notices.push(notice),
            Err(poisoned) => poisoned.into_inner().push(notice),
        }
    }
}

/// Fixed session, or none.
#[derive(Debug, Default, Clone)]
pub struct StaticSession(pub Option<SessionUser>);

impl StaticSession {
    pub fn signed_in(id: impl Into<String>, username: impl Into<String>) -> Self {
        Self(Some(SessionUser {
            id: id.into(),
            username: username.into(),
        }))
    }

    pub fn anonymous() -> Self {
        Self(None)
    }
}

impl SessionAccessor for StaticSession {
    fn current_user(&self) -> Option<SessionUser> {
        self.0.clone()
    }
}

/// Shared "loading" flag a UI can poll while an action runs.
#[derive(Debug, Default, Clone)]
pub struct BusyIndicator(Arc<AtomicBool>);

impl BusyIndicator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_busy(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// Raise the flag. Returns `None` if it was already raised.
    pub fn enter(&self) -> Option<BusyGuard> {
        self.0
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .ok()
            .map(|_| BusyGuard(Arc::clone(&self.0)))
    }
}

/// Lowers the busy flag when dropped, whatever the outcome.
#[derive(Debug)]
pub struct BusyGuard(Arc<AtomicBool>);

impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_busy_guard_clears_on_drop() {
        let busy = BusyIndicator::new();
        {
            let _guard = busy.enter().unwrap();
            assert!(busy.is_busy());
            assert!(busy.enter().is_none());
        }
        assert!(!busy.is_busy());
    }

    #[test]
    fn test_busy_guard_clears_on_early_return() {
        fn work(busy: &BusyIndicator) -> Result<(), String> {
            let _guard = busy.enter().ok_or("busy")?;
            Err("boom".to_string())
        }
        let busy = BusyIndicator::new();
        assert!(work(&busy).is_err());
        assert!(!busy.is_busy());
    }

    #[test]
    fn test_recording_notifier_drains() {
        let notifier = RecordingNotifier::new();
        notifier.notify(Notice::success("ok"));
        notifier.notify(Notice::error("bad"));
        let notices = notifier.drain();
        assert_eq!(notices.len(), 2);
        assert_eq!(notices[1].level, NoticeLevel::Error);
        assert!(notifier.drain().is_empty());
    }

    #[test]
    fn test_actor_falls_back_to_anonymous() {
        let notifier = RecordingNotifier::new();
        let session = StaticSession::anonymous();
        assert_eq!(ActionContext::new(&notifier, &session).actor(), "anonymous");

        let session = StaticSession::signed_in("u1", "ops");
        assert_eq!(ActionContext::new(&notifier, &session).actor(), "ops");
    }

    #[test]
    fn test_tracing_notifier_records_text_once() {
        use tracing::field::{Field, Visit};
        use tracing_subscriber::layer::{Context, SubscriberExt};
        use tracing_subscriber::Layer;

        #[derive(Clone, Default)]
        struct FieldNames(Arc<Mutex<Vec<String>>>);

        struct Collect<'a>(&'a mut Vec<String>);

        impl Visit for Collect<'_> {
            fn record_debug(&mut self, field: &Field, _value: &dyn std::fmt::Debug) {
                self.0.push(field.name().to_string());
            }
        }

        impl<S: tracing::Subscriber> Layer<S> for FieldNames {
            fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
                let mut names = self.0.lock().unwrap();
                event.record(&mut Collect(&mut *names));
            }
        }

        let names = FieldNames::default();
        let subscriber = tracing_subscriber::registry().with(names.clone());
        tracing::subscriber::with_default(subscriber, || {
            TracingNotifier.notify(Notice::error("disk full"));
            TracingNotifier.notify(Notice::info("saved"));
        });

        let names = names.0.lock().unwrap();
        assert_eq!(names.iter().filter(|n| n.as_str() == "message").count(), 2);
        assert_eq!(names.iter().filter(|n| n.as_str() == "text").count(), 2);
    }
}
