//! Deployment List View
//!
//! Owns everything the screen derives from the fetched records: filters,
//! the page, the selection and the open status drafts. The derived window
//! is a pure function of `(records, filter, page)`, recomputed on demand by
//! [`compute_window`]; there is no hidden dependency tracking.
//!
//! Every write goes to the store and is followed by a re-fetch. Local
//! copies are never patched in place.

use std::collections::HashSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::bulk::{BulkCoordinator, BulkMode, BulkOperationResult};
use crate::context::{ActionContext, BusyGuard, BusyIndicator, Notice};
use crate::editor::{ConfirmAction, EditOutcome, SaveTicket, StatusEditor};
use crate::error::SyncError;
use crate::filter::{filter_deployments, FilterState};
use crate::pagination::PageState;
use crate::selection::SelectionSet;
use crate::state::{EditPhase, StatusDraft};
use crate::store::ResourceStore;
use crate::types::{Deployment, DeploymentId, DeploymentStatus, ProjectId};

/// Generic notice for failures of the bulk coordinator itself.
const BULK_FAILED: &str = "Bulk delete failed. Please try again.";

/// View configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewConfig {
    /// Page size on first load and after a scope reset.
    pub default_page_size: usize,
    /// Page sizes offered by the page-size picker.
    pub page_size_options: Vec<usize>,
    /// Largest page size accepted.
    pub max_page_size: usize,
    /// How bulk deletes are issued.
    pub bulk_mode: BulkMode,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            default_page_size: 10,
            page_size_options: vec![5, 10, 25, 50],
            max_page_size: 100,
            bulk_mode: BulkMode::Sequential,
        }
    }
}

impl ViewConfig {
    pub fn validate(&self) -> Result<(), SyncError> {
        if self.max_page_size == 0 {
            return Err(SyncError::InvalidInput("max_page_size must be positive".into()));
        }
        self.check_page_size(self.default_page_size)?;
        for size in &self.page_size_options {
            self.check_page_size(*size)?;
        }
        if let BulkMode::Concurrent { limit: 0 } = self.bulk_mode {
            return Err(SyncError::InvalidInput("bulk concurrency limit must be positive".into()));
        }
        Ok(())
    }

    fn check_page_size(&self, size: usize) -> Result<(), SyncError> {
        if size == 0 || size > self.max_page_size {
            return Err(SyncError::InvalidInput(format!(
                "page size {} outside 1..={}",
                size, self.max_page_size
            )));
        }
        Ok(())
    }
}

/// Derived page of the list.
#[derive(Debug, Clone, PartialEq)]
pub struct ListWindow<'a> {
    pub items: Vec<&'a Deployment>,
    pub total_items: usize,
    pub total_pages: usize,
    pub current_page: usize,
}

impl ListWindow<'_> {
    pub fn ids(&self) -> Vec<DeploymentId> {
        self.items.iter().map(|r| r.id.clone()).collect()
    }
}

/// Filter, sort and slice `records`.
pub fn compute_window<'a>(
    records: &'a [Deployment],
    filter: &FilterState,
    page: &PageState,
) -> ListWindow<'a> {
    let filtered = filter_deployments(records, filter);
    let window = page.window(&filtered);
    ListWindow {
        items: window.items.to_vec(),
        total_items: window.total_items,
        total_pages: window.total_pages,
        current_page: window.page,
    }
}

/// One rendered row.
#[derive(Debug, Clone, PartialEq)]
pub struct RowView<'a> {
    pub record: &'a Deployment,
    /// Optimistic status: the draft candidate while editing or saving.
    pub status: DeploymentStatus,
    pub phase: EditPhase,
    pub selected: bool,
    /// Inline error from the last failed status save.
    pub error: Option<&'a str>,
}

/// A status save taken out of the view by
/// [`DeploymentList::begin_status_save`].
///
/// Owns everything the request needs, so it can be sent from another task.
/// Hand it back through [`DeploymentList::abandon_status_save`] if it will
/// not be sent; dropping it leaves the row in `Saving`.
pub struct PendingSave<S: ResourceStore + ?Sized> {
    ticket: SaveTicket,
    // None without a session: sending fails without a request
    store: Option<Arc<S>>,
}

impl<S: ResourceStore + ?Sized> PendingSave<S> {
    pub fn ticket(&self) -> &SaveTicket {
        &self.ticket
    }

    /// Issue the update.
    pub async fn send(self) -> SaveReceipt {
        let result = match &self.store {
            Some(store) => store.update(&self.ticket.id, &self.ticket.payload).await,
            None => Err(SyncError::Unauthorized),
        };
        SaveReceipt {
            ticket: self.ticket,
            result,
        }
    }
}

/// The store's answer to a [`PendingSave`].
#[derive(Debug)]
pub struct SaveReceipt {
    ticket: SaveTicket,
    result: Result<Deployment, SyncError>,
}

impl SaveReceipt {
    pub fn ticket(&self) -> &SaveTicket {
        &self.ticket
    }
}

/// A bulk delete taken out of the view by
/// [`DeploymentList::begin_bulk_delete`]. Holds the bulk busy flag.
pub struct PendingBulkDelete<S: ResourceStore + ?Sized> {
    ids: Vec<DeploymentId>,
    listed: HashSet<DeploymentId>,
    coordinator: BulkCoordinator,
    store: Arc<S>,
    guard: BusyGuard,
}

impl<S: ResourceStore + ?Sized> PendingBulkDelete<S> {
    pub fn ids(&self) -> &[DeploymentId] {
        &self.ids
    }

    /// Issue the deletes.
    pub async fn run(self) -> BulkReceipt {
        let result = self
            .coordinator
            .delete_listed(self.store.as_ref(), &self.ids, |id| self.listed.contains(id))
            .await;
        BulkReceipt {
            result,
            guard: self.guard,
        }
    }
}

/// Outcome of a [`PendingBulkDelete`], still holding the busy flag.
#[derive(Debug)]
pub struct BulkReceipt {
    result: BulkOperationResult,
    guard: BusyGuard,
}

impl BulkReceipt {
    pub fn result(&self) -> &BulkOperationResult {
        &self.result
    }
}

/// The deployment list engine.
///
/// Parameterized by the store. Hand it an `Arc<dyn ResourceStore>` or a
/// concrete store.
pub struct DeploymentList<S: ResourceStore + ?Sized> {
    store: Arc<S>,
    config: ViewConfig,
    records: Vec<Deployment>,
    filter: FilterState,
    page: PageState,
    /// First page at the configured default size.
    default_page: PageState,
    selection: SelectionSet,
    editor: StatusEditor,
    bulk: BulkCoordinator,
    bulk_busy: BusyIndicator,
    fetching: BusyIndicator,
}

impl<S: ResourceStore + ?Sized> DeploymentList<S> {
    /// Create an empty view. Call [`refresh`](Self::refresh) to load.
    pub fn new(store: Arc<S>, config: ViewConfig) -> Result<Self, SyncError> {
        config.validate()?;
        let default_page = PageState::new(config.default_page_size)?;
        Ok(Self {
            store,
            page: default_page,
            default_page,
            bulk: BulkCoordinator::new(config.bulk_mode),
            config,
            records: Vec::new(),
            filter: FilterState::default(),
            selection: SelectionSet::new(),
            editor: StatusEditor::new(),
            bulk_busy: BusyIndicator::new(),
            fetching: BusyIndicator::new(),
        })
    }

    // ═══════════════════════════════════════════════════════════════
    // DERIVED VIEW
    // ═══════════════════════════════════════════════════════════════

    pub fn window(&self) -> ListWindow<'_> {
        compute_window(&self.records, &self.filter, &self.page)
    }

    pub fn rows(&self) -> Vec<RowView<'_>> {
        self.window()
            .items
            .into_iter()
            .map(|record| {
                let draft = self.editor.draft(&record.id);
                RowView {
                    record,
                    status: self.editor.displayed_status(record),
                    phase: self.editor.phase(&record.id),
                    selected: self.selection.is_selected(&record.id),
                    error: draft.and_then(|d| d.error.as_deref()),
                }
            })
            .collect()
    }

    /// Ids on the current page, in display order.
    pub fn visible_ids(&self) -> Vec<DeploymentId> {
        self.window().ids()
    }

    pub fn records(&self) -> &[Deployment] {
        &self.records
    }

    pub fn record(&self, id: &DeploymentId) -> Option<&Deployment> {
        self.records.iter().find(|r| &r.id == id)
    }

    pub fn filter(&self) -> &FilterState {
        &self.filter
    }

    pub fn page_state(&self) -> PageState {
        self.page
    }

    pub fn config(&self) -> &ViewConfig {
        &self.config
    }

    /// Either a fetch or a bulk operation is running.
    pub fn is_loading(&self) -> bool {
        self.fetching.is_busy() || self.bulk_busy.is_busy()
    }

    /// Handle a UI can poll from elsewhere while a bulk delete runs.
    pub fn bulk_indicator(&self) -> BusyIndicator {
        self.bulk_busy.clone()
    }

    fn filtered_count(&self) -> usize {
        filter_deployments(&self.records, &self.filter).len()
    }

    // ═══════════════════════════════════════════════════════════════
    // FETCH
    // ═══════════════════════════════════════════════════════════════

    /// Re-fetch the list and adopt it as truth.
    ///
    /// The page survives content-only changes and is clamped when the
    /// count shrank. Selections and drafts of vanished records are
    /// dropped, as are drafts whose status changed underneath them.
    #[tracing::instrument(name = "view.refresh", skip(self, ctx), fields(actor = %ctx.actor()))]
    pub async fn refresh(&mut self, ctx: &ActionContext<'_>) -> Result<usize, SyncError> {
        let _guard = self.fetching.enter();

        let records = match self.store.list().await {
            Ok(records) => records,
            Err(err) => {
                tracing::warn!(error = %err, "failed to fetch deployments");
                ctx.notify(Notice::error(err.user_message()));
                return Err(err);
            }
        };

        self.records = records;

        let existing: HashSet<&DeploymentId> = self.records.iter().map(|r| &r.id).collect();
        let pruned = self.selection.retain_existing(&existing);
        let dropped = self.editor.reconcile(&self.records);
        let total = self.filtered_count();
        self.page.clamp(total);

        tracing::info!(
            records = self.records.len(),
            visible = total,
            page = self.page.current_page(),
            pruned_selection = pruned,
            dropped_drafts = dropped,
            "deployments refreshed"
        );
        Ok(self.records.len())
    }

    // ═══════════════════════════════════════════════════════════════
    // FILTER & PAGE
    // ═══════════════════════════════════════════════════════════════

    /// Replace the filter. Always back to page 1.
    pub fn set_filter(&mut self, filter: FilterState) {
        self.filter = filter;
        self.page.reset();
    }

    pub fn set_query(&mut self, query: impl Into<String>) {
        let filter = FilterState {
            query: query.into(),
            ..self.filter.clone()
        };
        self.set_filter(filter);
    }

    pub fn set_status_filter(&mut self, status: Option<DeploymentStatus>) {
        let filter = FilterState {
            status,
            ..self.filter.clone()
        };
        self.set_filter(filter);
    }

    pub fn set_project_filter(&mut self, project: Option<ProjectId>) {
        let filter = FilterState {
            project,
            ..self.filter.clone()
        };
        self.set_filter(filter);
    }

    /// Navigate. Out-of-range pages clamp to the nearest valid one.
    pub fn set_page(&mut self, page: usize) -> usize {
        let total = self.filtered_count();
        self.page.set_page(page, total);
        self.page.current_page()
    }

    /// Change the page size. Always back to page 1.
    pub fn set_page_size(&mut self, size: usize) -> Result<(), SyncError> {
        self.config.check_page_size(size)?;
        self.page.set_page_size(size)
    }

    /// The collection scope changed: drop records, filters, selection and
    /// drafts, and go back to the first page at the default size.
    pub fn reset_scope(&mut self) {
        self.records.clear();
        self.filter = FilterState::default();
        self.selection.clear();
        self.editor.clear();
        self.page = self.default_page;
    }

    // ═══════════════════════════════════════════════════════════════
    // SELECTION
    // ═══════════════════════════════════════════════════════════════

    /// Flip one row. Only rows on the current page can be toggled.
    pub fn toggle_select(&mut self, id: &DeploymentId) -> Result<bool, SyncError> {
        if !self.visible_ids().contains(id) {
            return Err(SyncError::InvalidInput(format!(
                "deployment {} is not on the current page",
                id
            )));
        }
        Ok(self.selection.toggle(id))
    }

    /// Header checkbox: select or clear the current page only.
    pub fn toggle_select_all(&mut self) {
        let visible = self.visible_ids();
        self.selection.toggle_all(&visible);
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    pub fn is_selected(&self, id: &DeploymentId) -> bool {
        self.selection.is_selected(id)
    }

    pub fn is_all_selected(&self) -> bool {
        self.selection.is_all_selected(&self.visible_ids())
    }

    pub fn is_indeterminate(&self) -> bool {
        self.selection.is_indeterminate(&self.visible_ids())
    }

    /// Selected ids across all pages, in selection order.
    pub fn selected_ids(&self) -> &[DeploymentId] {
        self.selection.ids()
    }

    // ═══════════════════════════════════════════════════════════════
    // STATUS EDITS
    // ═══════════════════════════════════════════════════════════════

    /// Open the status control for `id`.
    pub fn edit_status(&mut self, id: &DeploymentId) -> Result<(), SyncError> {
        let record = self
            .records
            .iter()
            .find(|r| &r.id == id)
            .ok_or_else(|| not_found(id))?;
        self.editor.begin(record)
    }

    /// Pick a candidate in the open control. Local only.
    pub fn choose_status(&mut self, id: &DeploymentId, status: DeploymentStatus) -> Result<(), SyncError> {
        self.editor.choose(id, status)
    }

    /// Close the control (cancel or click outside).
    pub fn cancel_status(&mut self, id: &DeploymentId) -> Result<bool, SyncError> {
        self.editor.cancel(id)
    }

    pub fn status_phase(&self, id: &DeploymentId) -> EditPhase {
        self.editor.phase(id)
    }

    pub fn status_draft(&self, id: &DeploymentId) -> Option<&StatusDraft> {
        self.editor.draft(id)
    }

    /// Commit `status` for `id`.
    ///
    /// Same status: the control closes without a request. Otherwise the
    /// full record is sent with the new status; on success the list is
    /// re-fetched, on failure the control stays open at the old status
    /// with an inline error and no global notice is raised.
    #[tracing::instrument(
        name = "view.confirm_status",
        skip(self, ctx),
        fields(id = %id, status = %status, actor = %ctx.actor())
    )]
    pub async fn confirm_status(
        &mut self,
        id: &DeploymentId,
        status: DeploymentStatus,
        ctx: &ActionContext<'_>,
    ) -> Result<EditOutcome, SyncError> {
        let Some(pending) = self.begin_status_save(id, status, ctx)? else {
            return Ok(EditOutcome::Unchanged);
        };
        let receipt = pending.send().await;
        Ok(self.finish_status_save(receipt, ctx).await)
    }

    /// First half of [`confirm_status`](Self::confirm_status).
    ///
    /// Moves the row into `Saving` and returns the request to send, or
    /// `None` when the status is unchanged. The view stays usable while the
    /// request runs; the same row refuses edits with `SaveInProgress`
    /// until the receipt comes back through
    /// [`finish_status_save`](Self::finish_status_save).
    pub fn begin_status_save(
        &mut self,
        id: &DeploymentId,
        status: DeploymentStatus,
        ctx: &ActionContext<'_>,
    ) -> Result<Option<PendingSave<S>>, SyncError> {
        let record = self.find(id)?.clone();

        if self.editor.phase(id) == EditPhase::Viewing {
            self.editor.begin(&record)?;
        }
        self.editor.choose(id, status)?;

        match self.editor.begin_save(&record)? {
            ConfirmAction::Unchanged => Ok(None),
            ConfirmAction::Save(ticket) => Ok(Some(PendingSave {
                ticket,
                store: ctx.session.current_user().map(|_| Arc::clone(&self.store)),
            })),
        }
    }

    /// Give back a save that will not be sent. The row returns to
    /// `Editing` with its candidate.
    pub fn abandon_status_save(&mut self, pending: PendingSave<S>) {
        self.editor.abandon_save(&pending.ticket);
    }

    /// Second half of [`confirm_status`](Self::confirm_status).
    pub async fn finish_status_save(
        &mut self,
        receipt: SaveReceipt,
        ctx: &ActionContext<'_>,
    ) -> EditOutcome {
        let SaveReceipt { ticket, result } = receipt;
        let outcome = self.editor.finish_save(&ticket, result);
        if outcome == EditOutcome::Saved {
            ctx.notify(Notice::success(format!(
                "Deployment status updated to {}",
                ticket.to
            )));
            // Already reported by `refresh`; the save itself stands.
            let _ = self.refresh(ctx).await;
        }
        outcome
    }

    // ═══════════════════════════════════════════════════════════════
    // BULK
    // ═══════════════════════════════════════════════════════════════

    /// Delete every currently selected deployment.
    pub async fn delete_selected(
        &mut self,
        ctx: &ActionContext<'_>,
    ) -> Result<BulkOperationResult, SyncError> {
        let ids = self.selection.ids().to_vec();
        self.bulk_delete(&ids, ctx).await
    }

    /// Delete `ids`, tolerating per-item failure.
    ///
    /// Afterwards the selection is cleared and the list re-fetched whatever
    /// happened, and at most one success and one error summary are
    /// notified. Failures of the operation as a whole (no session, another
    /// bulk delete running) produce a single generic notice and an `Err`.
    #[tracing::instrument(
        name = "view.bulk_delete",
        skip(self, ids, ctx),
        fields(count = ids.len(), actor = %ctx.actor())
    )]
    pub async fn bulk_delete(
        &mut self,
        ids: &[DeploymentId],
        ctx: &ActionContext<'_>,
    ) -> Result<BulkOperationResult, SyncError> {
        let Some(pending) = self.begin_bulk_delete(ids, ctx)? else {
            return Ok(BulkOperationResult::default());
        };
        let receipt = pending.run().await;
        Ok(self.finish_bulk_delete(receipt, ctx).await)
    }

    /// First half of [`bulk_delete`](Self::bulk_delete).
    ///
    /// Raises the bulk busy flag and returns the batch to run, or `None`
    /// for an empty batch. The flag stays up until the receipt is handed
    /// to [`finish_bulk_delete`](Self::finish_bulk_delete) or dropped.
    pub fn begin_bulk_delete(
        &mut self,
        ids: &[DeploymentId],
        ctx: &ActionContext<'_>,
    ) -> Result<Option<PendingBulkDelete<S>>, SyncError> {
        let Some(guard) = self.bulk_busy.enter() else {
            ctx.notify(Notice::error(BULK_FAILED));
            return Err(SyncError::InvalidState("bulk operation already running".into()));
        };

        if ctx.session.current_user().is_none() {
            tracing::warn!("bulk delete refused without a session");
            ctx.notify(Notice::error(BULK_FAILED));
            return Err(SyncError::Unauthorized);
        }

        if ids.is_empty() {
            ctx.notify(Notice::info("No deployments selected"));
            return Ok(None);
        }

        let listed = ids
            .iter()
            .filter(|id| self.record(id).is_some())
            .cloned()
            .collect();

        Ok(Some(PendingBulkDelete {
            ids: ids.to_vec(),
            listed,
            coordinator: self.bulk,
            store: Arc::clone(&self.store),
            guard,
        }))
    }

    /// Second half of [`bulk_delete`](Self::bulk_delete).
    pub async fn finish_bulk_delete(
        &mut self,
        receipt: BulkReceipt,
        ctx: &ActionContext<'_>,
    ) -> BulkOperationResult {
        let BulkReceipt { result, guard } = receipt;

        self.selection.clear();
        // Already reported by `refresh`; the deletes themselves stand.
        let _ = self.refresh(ctx).await;

        for notice in result.summary_notices() {
            ctx.notify(notice);
        }
        drop(guard);
        result
    }

    fn find(&self, id: &DeploymentId) -> Result<&Deployment, SyncError> {
        self.record(id).ok_or_else(|| not_found(id))
    }
}

fn not_found(id: &DeploymentId) -> SyncError {
    SyncError::NotFound(format!("deployment {}", id))
}
