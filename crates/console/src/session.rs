//! Explicit per-operator edit state.

use rolegate_access::{User, ValidationError};
use rolegate_core::{DomainError, DomainResult, UserId};

/// Edit state for one operator.
///
/// Holds at most one selected user as a *draft*: a working copy that edits are
/// applied to. The stored user only changes on commit; dropping the selection
/// drops the draft with it.
#[derive(Debug, Clone, Default)]
pub struct Session {
    selection: Option<Selection>,
}

#[derive(Debug, Clone)]
pub(crate) struct Selection {
    pub(crate) draft: User,
    pub(crate) pending_changes: bool,
    pub(crate) errors: Vec<ValidationError>,
}

impl Selection {
    pub(crate) fn new(user: User) -> Self {
        let errors = user.validate();
        Self {
            draft: user,
            pending_changes: false,
            errors,
        }
    }

    pub(crate) fn revalidate(&mut self) -> &[ValidationError] {
        self.errors = self.draft.validate();
        &self.errors
    }

    /// Record an applied edit.
    pub(crate) fn touched(&mut self) {
        self.pending_changes = true;
        self.revalidate();
    }
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn selected_user_id(&self) -> Option<UserId> {
        self.selection.as_ref().map(|s| s.draft.id)
    }

    /// The selected user as currently edited.
    pub fn draft(&self) -> Option<&User> {
        self.selection.as_ref().map(|s| &s.draft)
    }

    pub fn pending_changes(&self) -> bool {
        self.selection.as_ref().is_some_and(|s| s.pending_changes)
    }

    pub fn errors(&self) -> &[ValidationError] {
        self.selection
            .as_ref()
            .map(|s| s.errors.as_slice())
            .unwrap_or(&[])
    }

    pub fn is_selected(&self, user_id: UserId) -> bool {
        self.selected_user_id() == Some(user_id)
    }

    /// Replace the selection, returning the one that was dropped.
    pub(crate) fn replace(&mut self, selection: Option<Selection>) -> Option<Selection> {
        std::mem::replace(&mut self.selection, selection)
    }

    pub(crate) fn selection_mut(&mut self) -> Option<&mut Selection> {
        self.selection.as_mut()
    }

    /// The selection, provided it is `user_id`'s.
    pub(crate) fn selection_for(&mut self, user_id: UserId) -> DomainResult<&mut Selection> {
        match self.selection.as_mut() {
            Some(selection) if selection.draft.id == user_id => Ok(selection),
            _ => Err(DomainError::not_selected(user_id)),
        }
    }
}
