//! Fleet Deploy Library
//!
//! Standalone list synchronization engine for deployment dashboards.
//!
//! # Design
//!
//! The engine keeps a client-held copy of remote deployment records
//! consistent across search, pagination, multi-row selection, optimistic
//! status edits and bulk deletes with partial failure. It knows nothing
//! about HTTP, rendering or auth tokens. You implement the
//! [`ResourceStore`] trait for your backend, pass a [`Notifier`] and a
//! [`SessionAccessor`] into each action, and the view handles the rest.
//!
//! # Usage
//!
//! ```ignore
//! use fleet_deploy_rs::{
//!     ActionContext, DeploymentList, DeploymentStatus, MemoryResourceStore,
//!     RecordingNotifier, StaticSession, ViewConfig,
//! };
//! use std::sync::Arc;
//!
//! let store = Arc::new(MemoryResourceStore::with_records(records));
//! let mut list = DeploymentList::new(store, ViewConfig::default())?;
//!
//! let notifier = RecordingNotifier::new();
//! let session = StaticSession::signed_in("u1", "ops");
//! let ctx = ActionContext::new(&notifier, &session);
//!
//! list.refresh(&ctx).await?;
//! list.set_query("checkout");
//! list.toggle_select_all();
//! let result = list.delete_selected(&ctx).await?;
//! println!("{} deleted, {} failed", result.success_count, result.error_count);
//! ```

pub mod bulk;
pub mod context;
pub mod editor;
pub mod error;
pub mod filter;
pub mod pagination;
pub mod selection;
pub mod state;
pub mod store;
pub mod types;
pub mod view;

// Re-export the main types at crate root for convenience
pub use bulk::{BulkCoordinator, BulkMode, BulkOperationResult, FailedItem};
pub use context::{
    ActionContext, BusyGuard, BusyIndicator, Notice, NoticeLevel, Notifier, RecordingNotifier,
    SessionAccessor, SessionUser, StaticSession, TracingNotifier,
};
pub use editor::{ConfirmAction, EditOutcome, SaveTicket, StatusEditor};
pub use error::{MessageCategory, SyncError};
pub use filter::{filter_deployments, FilterState};
pub use pagination::{paginate, total_pages, PageState, PageWindow};
pub use selection::SelectionSet;
pub use state::{EditPhase, StatusDraft};
#[cfg(feature = "file-storage")]
pub use store::FileResourceStore;
pub use store::{MemoryResourceStore, ResourceStore};
pub use types::*;
pub use view::{
    compute_window, BulkReceipt, DeploymentList, ListWindow, PendingBulkDelete, PendingSave,
    RowView, SaveReceipt, ViewConfig,
};
