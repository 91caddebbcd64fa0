use std::{
    collections::VecDeque,
    future::Future,
    pin::Pin,
    sync::{Arc, Mutex},
    task::{Context, Poll},
};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::{oneshot, watch};
use tracing::{debug, warn};
use uuid::Uuid;

/// Kind of action being confirmed; selects the default dialog copy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionType {
    Create,
    Update,
    Delete,
    Restore,
    #[default]
    Custom,
}

impl ActionType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
            Self::Restore => "restore",
            Self::Custom => "custom",
        }
    }

    pub fn default_title(self) -> &'static str {
        match self {
            Self::Create => "Confirm Creation",
            Self::Update => "Confirm Changes",
            Self::Delete => "Confirm Deletion",
            Self::Restore => "Confirm Restoration",
            Self::Custom => "Confirm Action",
        }
    }

    pub fn default_description(self) -> &'static str {
        match self {
            Self::Create => "Are you sure you want to create this record?",
            Self::Update => "Are you sure you want to save these changes?",
            Self::Delete => {
                "Are you sure you want to delete this item? This action cannot be undone."
            }
            Self::Restore => "Are you sure you want to restore this item?",
            Self::Custom => "Are you sure you want to proceed with this action?",
        }
    }

    pub fn default_confirm_label(self) -> &'static str {
        match self {
            Self::Create => "Create",
            Self::Update => "Save Changes",
            Self::Delete => "Delete",
            Self::Restore => "Restore",
            Self::Custom => "Confirm",
        }
    }
}

pub const DEFAULT_CANCEL_LABEL: &str = "Cancel";

/// Caller-supplied description of what needs confirming. Every field is
/// optional; unset fields fall back to the copy for `action_type`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmationRequest {
    #[serde(default)]
    pub action_type: ActionType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confirm_label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cancel_label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destructive: Option<bool>,
}

impl ConfirmationRequest {
    pub fn new(action_type: ActionType) -> Self {
        Self {
            action_type,
            ..Self::default()
        }
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn confirm_label(mut self, label: impl Into<String>) -> Self {
        self.confirm_label = Some(label.into());
        self
    }

    pub fn cancel_label(mut self, label: impl Into<String>) -> Self {
        self.cancel_label = Some(label.into());
        self
    }

    pub fn destructive(mut self, destructive: bool) -> Self {
        self.destructive = Some(destructive);
        self
    }

    /// Resolves the request into the dialog the UI renders.
    pub fn resolve(self) -> ConfirmationDialog {
        let action = self.action_type;
        ConfirmationDialog {
            id: Uuid::new_v4(),
            action_type: action,
            title: self
                .title
                .unwrap_or_else(|| action.default_title().to_string()),
            description: self
                .description
                .unwrap_or_else(|| action.default_description().to_string()),
            confirm_label: self
                .confirm_label
                .unwrap_or_else(|| action.default_confirm_label().to_string()),
            cancel_label: self
                .cancel_label
                .unwrap_or_else(|| DEFAULT_CANCEL_LABEL.to_string()),
            destructive: self
                .destructive
                .unwrap_or(action == ActionType::Delete),
        }
    }
}

/// Fully resolved dialog, ready for rendering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmationDialog {
    pub id: Uuid,
    pub action_type: ActionType,
    pub title: String,
    pub description: String,
    pub confirm_label: String,
    pub cancel_label: String,
    pub destructive: bool,
}

/// How a dialog was dismissed without confirming.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DismissReason {
    Backdrop,
    Escape,
}

/// The user's answer to the visible dialog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Confirm,
    Cancel,
    Dismiss(DismissReason),
}

impl Decision {
    pub fn is_confirmed(self) -> bool {
        matches!(self, Self::Confirm)
    }
}

/// Errors returned to the UI layer when answering a dialog. These never
/// reach the caller awaiting [`ConfirmationCoordinator::confirm`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfirmError {
    #[error("no confirmation dialog is currently visible")]
    NoActiveDialog,
    #[error("dialog {answered} is not the visible dialog ({visible})")]
    StaleDialog { answered: Uuid, visible: Uuid },
}

struct Entry {
    dialog: ConfirmationDialog,
    responder: oneshot::Sender<bool>,
}

#[derive(Default)]
struct Slot {
    active: Option<Entry>,
    queue: VecDeque<Entry>,
    closed: bool,
}

struct Shared {
    slot: Mutex<Slot>,
    visible: watch::Sender<Option<ConfirmationDialog>>,
}

/// Owned confirmation context. One instance is created at application start
/// and handed to every call site that needs to gate an action.
///
/// At most one dialog is visible at a time; overlapping requests wait in a
/// FIFO queue and every request settles exactly once.
#[derive(Clone)]
pub struct ConfirmationCoordinator {
    shared: Arc<Shared>,
}

impl Default for ConfirmationCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfirmationCoordinator {
    pub fn new() -> Self {
        let (visible, _) = watch::channel(None);
        Self {
            shared: Arc::new(Shared {
                slot: Mutex::new(Slot::default()),
                visible,
            }),
        }
    }

    /// Asks the user to confirm `request`.
    ///
    /// The request is registered before this returns, so the order of calls
    /// is the order in which dialogs are shown.
    pub fn confirm(&self, request: ConfirmationRequest) -> PendingConfirmation {
        let (responder, receiver) = oneshot::channel();
        let dialog = request.resolve();
        let dialog_id = dialog.id;

        let mut slot = self.shared.slot.lock().expect("confirmation slot guard");
        if slot.closed {
            warn!(stage = "confirm", dialog_id = %dialog_id, "coordinator shut down; treating request as cancelled");
            let _ = responder.send(false);
            return PendingConfirmation { receiver };
        }

        let shown_before = slot.active.as_ref().map(|entry| entry.dialog.id);
        slot.queue.retain(|entry| !entry.responder.is_closed());
        if slot
            .active
            .as_ref()
            .is_some_and(|entry| entry.responder.is_closed())
        {
            debug!(stage = "confirm", "visible confirmation abandoned by its caller");
            slot.active = None;
        }

        slot.queue.push_back(Entry { dialog, responder });
        if slot.active.is_none() {
            promote_next(&mut slot);
        } else {
            debug!(stage = "confirm", dialog_id = %dialog_id, queued = slot.queue.len(), "confirmation queued behind visible dialog");
        }

        let shown = slot.active.as_ref().map(|entry| entry.dialog.clone());
        if shown.as_ref().map(|dialog| dialog.id) != shown_before {
            self.publish(shown);
        }

        PendingConfirmation { receiver }
    }

    /// Answers the visible dialog and advances the queue.
    pub fn respond(&self, dialog_id: Uuid, decision: Decision) -> Result<(), ConfirmError> {
        let mut slot = self.shared.slot.lock().expect("confirmation slot guard");
        let visible = slot
            .active
            .as_ref()
            .map(|entry| entry.dialog.id)
            .ok_or(ConfirmError::NoActiveDialog)?;
        if visible != dialog_id {
            return Err(ConfirmError::StaleDialog {
                answered: dialog_id,
                visible,
            });
        }

        if let Some(entry) = slot.active.take() {
            debug!(stage = "confirm", %dialog_id, ?decision, "confirmation answered");
            // The caller may have stopped waiting; nothing to do then.
            let _ = entry.responder.send(decision.is_confirmed());
        }

        promote_next(&mut slot);
        self.publish(slot.active.as_ref().map(|entry| entry.dialog.clone()));
        Ok(())
    }

    /// The dialog currently shown to the user.
    pub fn active(&self) -> Option<ConfirmationDialog> {
        self.shared.visible.borrow().clone()
    }

    /// Observes changes of the visible dialog.
    pub fn subscribe(&self) -> watch::Receiver<Option<ConfirmationDialog>> {
        self.shared.visible.subscribe()
    }

    /// Number of requests waiting behind the visible dialog.
    pub fn pending_len(&self) -> usize {
        self.shared
            .slot
            .lock()
            .expect("confirmation slot guard")
            .queue
            .iter()
            .filter(|entry| !entry.responder.is_closed())
            .count()
    }

    /// Tears the context down: every outstanding request resolves `false`
    /// and later requests resolve `false` immediately.
    pub fn shutdown(&self) {
        let mut slot = self.shared.slot.lock().expect("confirmation slot guard");
        if slot.closed {
            return;
        }
        slot.closed = true;

        let outstanding: Vec<Entry> = slot
            .active
            .take()
            .into_iter()
            .chain(slot.queue.drain(..))
            .collect();
        let cancelled = outstanding.len();
        for entry in outstanding {
            let _ = entry.responder.send(false);
        }
        self.publish(None);
        debug!(stage = "confirm", cancelled, "confirmation coordinator shut down");
    }

    pub fn is_shut_down(&self) -> bool {
        self.shared
            .slot
            .lock()
            .expect("confirmation slot guard")
            .closed
    }

    fn publish(&self, dialog: Option<ConfirmationDialog>) {
        self.shared.visible.send_replace(dialog);
    }
}

/// Moves the oldest queued request whose caller is still waiting into the
/// visible slot. Requests whose future was dropped are discarded.
fn promote_next(slot: &mut Slot) {
    slot.active = None;
    while let Some(entry) = slot.queue.pop_front() {
        if entry.responder.is_closed() {
            debug!(stage = "confirm", dialog_id = %entry.dialog.id, "skipping abandoned confirmation");
            continue;
        }
        debug!(stage = "confirm", dialog_id = %entry.dialog.id, action = entry.dialog.action_type.as_str(), "showing confirmation");
        slot.active = Some(entry);
        break;
    }
}

/// Future returned by [`ConfirmationCoordinator::confirm`]; resolves to
/// `true` only when the user explicitly confirmed.
#[must_use = "the confirmation result decides whether the action may proceed"]
pub struct PendingConfirmation {
    receiver: oneshot::Receiver<bool>,
}

impl Future for PendingConfirmation {
    type Output = bool;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.receiver)
            .poll(cx)
            .map(|result| result.unwrap_or(false))
    }
}
