//! Generic entity page controller.
//!
//! One [`EntityController`] backs one entity page. It loads the current
//! page through the shared [`QueryCache`](campus_client::QueryCache), owns
//! the page's dialogs, and routes every write through the same sequence:
//!
//! 1. execute the mutation once (never retried)
//! 2. invalidate every cache entry the write made stale
//! 3. notify
//! 4. reload the current page
//!
//! Read failures move the page into [`PageState::Error`]. Write failures
//! leave the list as it was and are only notified. Every failure reaches
//! the notifier; none is left unhandled.
//!
//! Page state sits behind a synchronous mutex that is never held across an
//! await point. After [`EntityController::dispose`] no fetch result is
//! applied any more.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use serde_json::Value;
use tokio_util::sync::CancellationToken;
use validator::Validate;

use campus_client::{ApiError, FailureKind};
use campus_core::cascade::OptionsState;
use campus_core::error::CoreError;
use campus_core::models::{describe_validation_errors, Entity, EntityDraft};
use campus_core::mutation::MutationIntent;
use campus_core::pagination::{PageLink, PageMeta, PagedCollection, Paginator};
use campus_core::query::{ParentScope, QueryKey};
use campus_core::status::WireEnum;
use campus_core::types::EntityId;

use crate::assign::Assignment;
use crate::cascade::{fetch_options, CascadeController};
use crate::context::AdminContext;
use crate::dialog::Dialog;
use crate::error::AdminError;
use crate::forms::{no_dialog, DeleteConfirmation, FormMode, FormState, SubmitGuard};
use crate::notify::{describe_api_error, Notification};
use crate::status_dialog::StatusChange;

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub enum PageState<E> {
    Idle,
    /// A fetch is outstanding. The previous page stays displayable.
    Loading {
        previous: Option<Arc<PagedCollection<E>>>,
    },
    Ready(Arc<PagedCollection<E>>),
    Error {
        kind: FailureKind,
        message: String,
    },
}

impl<E> PageState<E> {
    fn collection(&self) -> Option<Arc<PagedCollection<E>>> {
        match self {
            PageState::Loading { previous } => previous.clone(),
            PageState::Ready(page) => Some(Arc::clone(page)),
            PageState::Idle | PageState::Error { .. } => None,
        }
    }
}

/// Coarse page phase for the view layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PagePhase {
    Idle,
    Loading,
    Ready,
    /// Ready, with at least one mutation in flight.
    Mutating,
    Error,
}

/// Everything a view needs to render one entity page.
#[derive(Debug, Clone)]
pub struct PageView<E> {
    pub items: Vec<E>,
    pub meta: PageMeta,
    pub phase: PagePhase,
    pub is_loading: bool,
    pub is_error: bool,
    pub error: Option<String>,
    /// Ids of rows with a mutation in flight.
    pub busy: Vec<EntityId>,
    pub window: Vec<PageLink>,
    /// e.g. "Showing 1 to 10 of 42 departments".
    pub summary: String,
}

pub(crate) struct PageInner<E: Entity> {
    state: PageState<E>,
    paginator: Paginator,
    /// Bumped on every load; older fetch results are dropped.
    generation: u64,
    mutations: usize,
    busy: HashMap<EntityId, usize>,
    form: Dialog<FormState<E::Draft>>,
    status: Dialog<StatusChange<E::Status>>,
    delete: Dialog<DeleteConfirmation>,
    assign: Dialog<Assignment>,
}

impl<E: Entity> PageInner<E> {
    fn new(page_size: u32) -> Self {
        Self {
            state: PageState::Idle,
            paginator: Paginator::new(page_size),
            generation: 0,
            mutations: 0,
            busy: HashMap::new(),
            form: Dialog::default(),
            status: Dialog::default(),
            delete: Dialog::default(),
            assign: Dialog::default(),
        }
    }

    fn phase(&self) -> PagePhase {
        match &self.state {
            PageState::Idle => PagePhase::Idle,
            PageState::Loading { .. } => PagePhase::Loading,
            PageState::Ready(_) if self.mutations > 0 => PagePhase::Mutating,
            PageState::Ready(_) => PagePhase::Ready,
            PageState::Error { .. } => PagePhase::Error,
        }
    }

    fn mark_busy(&mut self, id: &EntityId) {
        *self.busy.entry(id.clone()).or_default() += 1;
    }

    fn release(&mut self, id: &EntityId) {
        if let Some(count) = self.busy.get_mut(id) {
            *count -= 1;
            if *count == 0 {
                self.busy.remove(id);
            }
        }
    }
}

fn parent_scope<E: Entity>(id: Option<&EntityId>) -> Option<ParentScope> {
    E::KIND
        .parent()
        .zip(id)
        .map(|(kind, id)| ParentScope::new(kind, id.clone()))
}

/// Close `dialog` after a successful submit, or release its guard after a
/// failed one. Ignored when the dialog was reopened meanwhile.
fn settle_dialog<S>(
    dialog: &mut Dialog<S>,
    generation: u64,
    ok: bool,
    guard: impl FnOnce(&mut S) -> &mut SubmitGuard,
) {
    if dialog.generation() != generation {
        return;
    }
    if ok {
        dialog.close();
    } else if let Some(state) = dialog.state_mut() {
        guard(state).finish();
    }
}

// ---------------------------------------------------------------------------
// Controller
// ---------------------------------------------------------------------------

pub struct EntityController<E: Entity> {
    ctx: AdminContext,
    parent: Option<ParentScope>,
    inner: Mutex<PageInner<E>>,
    cascade: CascadeController,
    cancel: CancellationToken,
}

impl<E: Entity> EntityController<E> {
    /// Controller for the page listing `E`, optionally scoped to a parent
    /// (e.g. the courses of one department).
    pub fn new(ctx: AdminContext, parent: Option<ParentScope>) -> Self {
        let cascade = CascadeController::new(E::CASCADE, ctx.client.clone(), ctx.cache.clone());
        let cancel = ctx.shutdown.child_token();
        Self {
            inner: Mutex::new(PageInner::new(ctx.page_size)),
            ctx,
            parent,
            cascade,
            cancel,
        }
    }

    fn lock(&self) -> MutexGuard<'_, PageInner<E>> {
        self.inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn parent(&self) -> Option<&ParentScope> {
        self.parent.as_ref()
    }

    pub fn cascade(&self) -> &CascadeController {
        &self.cascade
    }

    pub fn phase(&self) -> PagePhase {
        self.lock().phase()
    }

    pub fn is_busy(&self, id: &str) -> bool {
        self.lock().busy.contains_key(id)
    }

    pub fn view(&self) -> PageView<E> {
        let inner = self.lock();
        let meta = inner.paginator.meta();
        let phase = inner.phase();
        let items = inner
            .state
            .collection()
            .map(|page| page.items.clone())
            .unwrap_or_default();
        let error = match &inner.state {
            PageState::Error { message, .. } => Some(message.clone()),
            _ => None,
        };
        let mut busy: Vec<EntityId> = inner.busy.keys().cloned().collect();
        busy.sort();

        PageView {
            items,
            meta,
            phase,
            is_loading: phase == PagePhase::Loading,
            is_error: phase == PagePhase::Error,
            error,
            busy,
            window: meta.window(),
            summary: meta.summary(E::KIND.plural()),
        }
    }

    /// Stop applying results to this page. Pending fetches still complete
    /// and fill the shared cache.
    pub fn dispose(&self) {
        self.cancel.cancel();
        let mut inner = self.lock();
        inner.form.close();
        inner.status.close();
        inner.delete.close();
        inner.assign.close();
        tracing::debug!(resource = E::KIND.resource(), "Page disposed");
    }

    pub fn is_disposed(&self) -> bool {
        self.cancel.is_cancelled()
    }

    // ---- Loading ----

    /// Fetch the current page.
    ///
    /// If the server total no longer reaches the current page, the page
    /// moves back to the last one and is fetched again.
    pub async fn load(&self) -> Result<(), AdminError> {
        loop {
            let (cursor, generation) = {
                let mut inner = self.lock();
                inner.generation += 1;
                let previous = inner.state.collection();
                inner.state = PageState::Loading { previous };
                (inner.paginator.cursor(), inner.generation)
            };

            let key = QueryKey::collection(E::KIND, self.parent.clone(), cursor);
            let client = self.ctx.client.clone();
            let parent = self.parent.clone();
            let fetch = self.ctx.cache.get_or_fetch(key, move || async move {
                client.list::<E>(parent.as_ref(), cursor).await
            });

            let result = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => {
                    tracing::debug!(resource = E::KIND.resource(), "Page disposed, dropping fetch");
                    return Err(AdminError::Cancelled);
                }
                result = fetch => result,
            };

            let err = {
                let mut inner = self.lock();
                if inner.generation != generation {
                    return Ok(());
                }
                match result {
                    Ok(page) => {
                        if inner.paginator.set_total(page.total_items) {
                            tracing::debug!(
                                resource = E::KIND.resource(),
                                page = inner.paginator.page(),
                                "Page out of range, moving back",
                            );
                            continue;
                        }
                        inner.state = PageState::Ready(page);
                        return Ok(());
                    }
                    Err(err) => {
                        inner.state = PageState::Error {
                            kind: err.kind(),
                            message: describe_api_error(&err),
                        };
                        err
                    }
                }
            };

            tracing::warn!(resource = E::KIND.resource(), error = %err, "Failed to load page");
            let err = AdminError::Api(err);
            self.report(&err).await;
            return Err(err);
        }
    }

    pub async fn next_page(&self) -> Result<bool, AdminError> {
        let moved = self.lock().paginator.next_page();
        if moved {
            self.load().await?;
        }
        Ok(moved)
    }

    pub async fn prev_page(&self) -> Result<bool, AdminError> {
        let moved = self.lock().paginator.prev_page();
        if moved {
            self.load().await?;
        }
        Ok(moved)
    }

    pub async fn go_to(&self, page: u32) -> Result<bool, AdminError> {
        let moved = self.lock().paginator.go_to(page);
        if moved {
            self.load().await?;
        }
        Ok(moved)
    }

    pub async fn set_page_size(&self, page_size: u32) -> Result<(), AdminError> {
        self.lock().paginator.set_page_size(page_size);
        self.load().await
    }

    // ---- Create / edit form ----

    pub fn form(&self) -> Option<FormState<E::Draft>> {
        self.lock().form.state().cloned()
    }

    /// Open an empty create form.
    pub async fn create(&self) -> Result<(), AdminError> {
        if !E::CREATABLE {
            return Err(CoreError::Forbidden(format!(
                "{} cannot be created from the dashboard",
                E::KIND.plural()
            ))
            .into());
        }
        self.lock().form.open(FormState::create());
        self.cascade.start().await;
        Ok(())
    }

    /// Open the edit form pre-filled from `entity`, with its cascade
    /// hydrated from the entity's relation chain.
    pub async fn edit(&self, entity: &E) {
        let previous_parent = parent_scope::<E>(entity.parent_id());
        self.lock().form.open(FormState::edit(
            entity.id().clone(),
            entity.to_draft(),
            previous_parent,
        ));
        self.cascade.hydrate(&entity.cascade_values()).await;
    }

    pub fn update_draft(&self, f: impl FnOnce(&mut E::Draft)) -> Result<(), AdminError> {
        let mut inner = self.lock();
        let form = inner.form.state_mut().ok_or_else(|| no_dialog("form"))?;
        f(&mut form.draft);
        Ok(())
    }

    pub async fn select_cascade(
        &self,
        index: usize,
        value: Option<EntityId>,
    ) -> Result<(), AdminError> {
        self.cascade.select(index, value).await
    }

    pub fn close_form(&self) {
        self.lock().form.close();
    }

    /// Validate and submit the open form.
    pub async fn submit_form(&self) -> Result<Value, AdminError> {
        // An unset cascade never clears the parent the draft already has.
        let cascade_parent = self.cascade.last_value();
        let cascade_check = self.cascade.validate();

        let (intent, generation) = {
            let mut inner = self.lock();
            let generation = inner.form.generation();
            let form = inner.form.state_mut().ok_or_else(|| no_dialog("form"))?;
            if form.guard.is_submitting() {
                return Err(AdminError::Busy);
            }

            if let Some(parent) = cascade_parent {
                form.draft.set_parent(Some(parent));
            }
            if let Err(errors) = form.draft.validate() {
                form.errors = describe_validation_errors(&errors);
                return Err(AdminError::FormInvalid(errors));
            }
            if let Err(e) = cascade_check {
                form.errors = vec![e.to_string()];
                return Err(e);
            }

            let payload = serde_json::to_value(&form.draft).map_err(|e| {
                CoreError::Internal(format!("Failed to encode {} form: {e}", E::KIND.singular()))
            })?;
            let parent = parent_scope::<E>(form.draft.parent());
            let intent = match &form.mode {
                FormMode::Create => MutationIntent::create(E::KIND, payload).with_parent(parent),
                FormMode::Edit {
                    id,
                    previous_parent,
                } => MutationIntent::update(E::KIND, id.clone(), payload)
                    .with_parent(parent)
                    .with_previous_parent(previous_parent.clone()),
            };

            form.guard.begin()?;
            form.errors.clear();
            (intent, generation)
        };

        self.run_mutation(intent, move |inner, outcome| {
            if let Err(e) = outcome {
                if inner.form.generation() == generation {
                    if let Some(form) = inner.form.state_mut() {
                        form.errors = vec![Notification::from_error(e).description];
                    }
                }
            }
            settle_dialog(&mut inner.form, generation, outcome.is_ok(), |f| &mut f.guard);
        })
        .await
    }

    // ---- Delete with confirmation ----

    pub fn delete_confirmation(&self) -> Option<DeleteConfirmation> {
        self.lock().delete.state().cloned()
    }

    /// Ask for confirmation before deleting `entity`. Nothing is sent until
    /// [`Self::confirm_delete`].
    pub fn request_delete(&self, entity: &E) {
        self.lock().delete.open(DeleteConfirmation {
            id: entity.id().clone(),
            name: entity.display_name().to_string(),
            parent: parent_scope::<E>(entity.parent_id()),
            guard: SubmitGuard::default(),
        });
    }

    pub fn cancel_delete(&self) {
        self.lock().delete.close();
    }

    pub async fn confirm_delete(&self) -> Result<(), AdminError> {
        let (intent, generation) = {
            let mut inner = self.lock();
            let generation = inner.delete.generation();
            let confirm = inner
                .delete
                .state_mut()
                .ok_or_else(|| no_dialog("delete confirmation"))?;
            confirm.guard.begin()?;
            let intent = MutationIntent::delete(E::KIND, confirm.id.clone())
                .with_parent(confirm.parent.clone());
            (intent, generation)
        };

        self.run_mutation(intent, move |inner, outcome| {
            settle_dialog(&mut inner.delete, generation, outcome.is_ok(), |c| &mut c.guard);
        })
        .await
        .map(|_| ())
    }

    // ---- Status change ----

    pub fn status_change(&self) -> Option<StatusChange<E::Status>> {
        self.lock().status.state().cloned()
    }

    /// Open the status selector with the entity's current status selected.
    pub fn open_status(&self, entity: &E) {
        self.lock().status.open(StatusChange::new(
            entity.id().clone(),
            entity.display_name(),
            entity.status(),
        ));
    }

    pub fn select_status(&self, status: E::Status) -> Result<(), AdminError> {
        let mut inner = self.lock();
        let change = inner.status.state_mut().ok_or_else(|| no_dialog("status"))?;
        change.select(status);
        Ok(())
    }

    pub fn close_status(&self) {
        self.lock().status.close();
    }

    /// Submit the selected status. Rejected without a request when it
    /// equals the current one.
    pub async fn submit_status(&self) -> Result<(), AdminError> {
        let (intent, generation) = {
            let mut inner = self.lock();
            let generation = inner.status.generation();
            let change = inner.status.state_mut().ok_or_else(|| no_dialog("status"))?;
            if change.is_unchanged() {
                return Err(CoreError::Validation(format!(
                    "{} is already {}",
                    change.name,
                    change.selected.label()
                ))
                .into());
            }
            change.guard.begin()?;
            let intent = MutationIntent::change_status(E::KIND, change.id.clone(), change.selected);
            (intent, generation)
        };

        self.run_mutation(intent, move |inner, outcome| {
            settle_dialog(&mut inner.status, generation, outcome.is_ok(), |c| &mut c.guard);
        })
        .await
        .map(|_| ())
    }

    // ---- Relation assignment ----

    pub fn assignment(&self) -> Option<Assignment> {
        self.lock().assign.state().cloned()
    }

    /// Open the assignment dialog for `entity` and load its candidates.
    pub async fn open_assign(&self, entity: &E) -> Result<(), AdminError> {
        let relation = E::ASSIGNABLE.ok_or_else(|| {
            CoreError::Validation(format!(
                "Nothing can be assigned to a {}",
                E::KIND.singular()
            ))
        })?;
        let key = Assignment::candidates_key(relation, entity);

        let generation = {
            let mut assignment = Assignment::new(relation, entity);
            assignment.candidates = match key {
                Some(_) => OptionsState::Loading,
                None => OptionsState::Loaded(Vec::new()),
            };
            self.lock().assign.open(assignment)
        };

        let Some(key) = key else {
            tracing::debug!(
                relation = relation.label(),
                id = %entity.id(),
                "No scope to draw assignment candidates from",
            );
            return Ok(());
        };

        let candidates = match fetch_options(&self.ctx.client, &self.ctx.cache, &key).await {
            Ok(options) => OptionsState::Loaded(Vec::clone(&options)),
            Err(e) => {
                tracing::warn!(%key, error = %e, "Failed to load assignment candidates");
                OptionsState::Failed(format!("Failed to load {}", key.kind().plural()))
            }
        };

        let mut inner = self.lock();
        if inner.assign.generation() == generation {
            if let Some(assignment) = inner.assign.state_mut() {
                assignment.candidates = candidates;
            }
        }
        Ok(())
    }

    pub fn select_assignee(&self, id: Option<EntityId>) -> Result<(), AdminError> {
        let mut inner = self.lock();
        let assignment = inner.assign.state_mut().ok_or_else(|| no_dialog("assignment"))?;
        assignment.select(id);
        Ok(())
    }

    pub fn close_assign(&self) {
        self.lock().assign.close();
    }

    pub async fn submit_assign(&self) -> Result<(), AdminError> {
        let (intent, generation) = {
            let mut inner = self.lock();
            let generation = inner.assign.generation();
            let assignment = inner.assign.state_mut().ok_or_else(|| no_dialog("assignment"))?;
            if assignment.guard.is_submitting() {
                return Err(AdminError::Busy);
            }
            let next = assignment.check()?.clone();
            assignment.guard.begin()?;
            let intent = MutationIntent::assign(
                assignment.relation,
                assignment.owner_id.clone(),
                assignment.current.clone(),
                next,
            );
            (intent, generation)
        };

        self.run_mutation(intent, move |inner, outcome| {
            settle_dialog(&mut inner.assign, generation, outcome.is_ok(), |a| &mut a.guard);
        })
        .await
        .map(|_| ())
    }

    // ---- Mutation pipeline ----

    /// Run a side action that has no dialog of its own.
    pub(crate) async fn run_action(&self, intent: MutationIntent) -> Result<Value, AdminError> {
        self.run_mutation(intent, |_, _| {}).await
    }

    async fn run_mutation<F>(&self, intent: MutationIntent, settle: F) -> Result<Value, AdminError>
    where
        F: FnOnce(&mut PageInner<E>, Result<&Value, &AdminError>) + Send,
    {
        let target = intent.target_id.clone();
        {
            let mut inner = self.lock();
            inner.mutations += 1;
            if let Some(id) = &target {
                inner.mark_busy(id);
            }
        }

        let result = self.ctx.client.execute(&intent).await.map_err(AdminError::from);

        {
            let mut inner = self.lock();
            inner.mutations -= 1;
            if let Some(id) = &target {
                inner.release(id);
            }
            settle(&mut *inner, result.as_ref());
        }

        match result {
            Ok(data) => {
                for pattern in intent.invalidations() {
                    self.ctx.cache.invalidate(&pattern).await;
                }
                tracing::info!(
                    resource = E::KIND.resource(),
                    op = intent.op_name(),
                    id = ?intent.target_id,
                    "Mutation applied",
                );
                self.ctx
                    .notifier
                    .notify(Notification::success(intent.success_message()));

                if !self.is_disposed() {
                    if let Err(e) = self.load().await {
                        tracing::debug!(error = %e, "Reload after mutation failed");
                    }
                }
                Ok(data)
            }
            Err(err) => {
                self.report(&err).await;
                Err(err)
            }
        }
    }

    /// Notify a failure. An API rejection of the session also ends it.
    async fn report(&self, err: &AdminError) {
        self.ctx.notifier.notify(Notification::from_error(err));
        if matches!(err.api(), Some(ApiError::Unauthorized(_))) {
            tracing::warn!(resource = E::KIND.resource(), "Session rejected, logging out");
            self.ctx.cache.clear().await;
            self.ctx.auth.logout().await;
        }
    }
}
