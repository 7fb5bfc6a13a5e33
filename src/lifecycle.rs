//! Create / edit / save / delete state machine behind the edit modal
//!
//! # States
//! - `Idle`: modal closed
//! - `Editing`: modal open, bound to one button id
//!
//! Each UI callback delivers exactly one `UiEvent`, matched exhaustively
//! against the current state. Events with no transition from the current
//! state leave it unchanged.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::store::EntityStore;
use crate::types::{Button, ButtonId, ButtonPatch, placeholder_label};

/// One UI interaction
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum UiEvent {
    /// "Create Button"
    Create,
    /// A marker was clicked
    Click { id: ButtonId },
    /// Modal "Save"; an absent field is left untouched
    Save {
        #[serde(default)]
        text: Option<String>,
        #[serde(default, rename = "additionalText", alias = "additional_text")]
        additional_text: Option<String>,
    },
    /// Modal "Delete"
    Delete,
    /// Edit-mode switch
    SetEditMode { enabled: bool },
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum ModalState {
    #[default]
    Idle,
    Editing {
        id: ButtonId,
        text: String,
        additional_text: String,
    },
}

/// What an event did
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum Transition {
    Created(ButtonId),
    Opened(ButtonId),
    Saved(ButtonId),
    Deleted(ButtonId),
    /// Save/Delete whose button vanished while the modal was open
    Closed(ButtonId),
    EditModeChanged,
    Ignored,
}

/// Modal contents for the UI to render
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModalView {
    pub open: bool,
    pub button_id: Option<ButtonId>,
    pub text: String,
    pub additional_text: String,
    pub edit_mode: bool,
}

#[derive(Debug, Default)]
pub struct LifecycleController {
    state: ModalState,
    edit_mode: bool,
}

impl LifecycleController {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub fn state(&self) -> &ModalState {
        &self.state
    }

    pub fn dispatch(&mut self, event: UiEvent, store: &mut EntityStore) -> Transition {
        match (self.bound_id(), event) {
            (_, UiEvent::SetEditMode { enabled }) => {
                self.edit_mode = enabled;
                Transition::EditModeChanged
            }

            (None, UiEvent::Create) => {
                let id = store.allocate_id();
                store.upsert(id, &ButtonPatch::full(Button::spawned(id)));
                info!(id = %id, "Created button");
                Transition::Created(id)
            }

            (None, UiEvent::Click { id }) if self.edit_mode => {
                let (text, additional_text) = match store.get(id) {
                    Some(button) => (button.text.clone(), button.additional_text.clone()),
                    None => (placeholder_label(id), String::new()),
                };
                self.state = ModalState::Editing {
                    id,
                    text,
                    additional_text,
                };
                debug!(id = %id, "Opened button for editing");
                Transition::Opened(id)
            }

            (Some(id), UiEvent::Save { text, additional_text }) => {
                self.state = ModalState::Idle;
                if !store.contains(id) {
                    debug!(id = %id, "Save for vanished button ignored");
                    return Transition::Closed(id);
                }
                store.upsert(
                    id,
                    &ButtonPatch {
                        text,
                        additional_text,
                        ..ButtonPatch::default()
                    },
                );
                info!(id = %id, "Saved button text");
                Transition::Saved(id)
            }

            (Some(id), UiEvent::Delete) => {
                self.state = ModalState::Idle;
                if store.delete(id) {
                    info!(id = %id, "Deleted button");
                    Transition::Deleted(id)
                } else {
                    debug!(id = %id, "Delete for vanished button ignored");
                    Transition::Closed(id)
                }
            }

            (_, event) => {
                debug!(?event, state = ?self.state, "Event has no transition from current state");
                Transition::Ignored
            }
        }
    }

    /// Id the modal is bound to, if open
    fn bound_id(&self) -> Option<ButtonId> {
        match self.state {
            ModalState::Idle => None,
            ModalState::Editing { id, .. } => Some(id),
        }
    }

    pub fn view(&self) -> ModalView {
        match &self.state {
            ModalState::Idle => ModalView {
                open: false,
                button_id: None,
                text: String::new(),
                additional_text: String::new(),
                edit_mode: self.edit_mode,
            },
            ModalState::Editing {
                id,
                text,
                additional_text,
            } => ModalView {
                open: true,
                button_id: Some(*id),
                text: text.clone(),
                additional_text: additional_text.clone(),
                edit_mode: self.edit_mode,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(raw: u64) -> ButtonId {
        ButtonId::new(raw)
    }

    fn editing() -> LifecycleController {
        let mut controller = LifecycleController::new();
        controller.edit_mode = true;
        controller
    }

    fn save(text: &str, note: &str) -> UiEvent {
        UiEvent::Save {
            text: Some(text.to_string()),
            additional_text: Some(note.to_string()),
        }
    }

    #[test]
    fn test_create_stays_idle() {
        let mut store = EntityStore::new();
        let mut controller = LifecycleController::new();

        assert_eq!(controller.dispatch(UiEvent::Create, &mut store), Transition::Created(id(1)));
        assert_eq!(controller.dispatch(UiEvent::Create, &mut store), Transition::Created(id(2)));
        assert_eq!(controller.state(), &ModalState::Idle);

        let second = store.get(id(2)).unwrap();
        assert_eq!((second.x, second.y), (50.0, 100.0));
        assert_eq!(second.text, "Drag/Resize 2");
    }

    #[test]
    fn test_click_without_edit_mode_is_no_op() {
        let mut store = EntityStore::new();
        let mut controller = LifecycleController::new();
        controller.dispatch(UiEvent::Create, &mut store);

        assert_eq!(controller.dispatch(UiEvent::Click { id: id(1) }, &mut store), Transition::Ignored);
        assert!(!controller.view().open);
    }

    #[test]
    fn test_full_scenario() {
        let mut store = EntityStore::new();
        let mut controller = editing();
        controller.dispatch(UiEvent::Create, &mut store);
        store.upsert(id(1), &ButtonPatch { x: Some(120.0), y: Some(80.0), ..ButtonPatch::default() });

        assert_eq!(controller.dispatch(UiEvent::Click { id: id(1) }, &mut store), Transition::Opened(id(1)));
        let view = controller.view();
        assert!(view.open);
        assert_eq!(view.button_id, Some(id(1)));
        assert_eq!(view.text, "Drag/Resize 1");

        assert_eq!(controller.dispatch(save("Paris", "Capital"), &mut store), Transition::Saved(id(1)));
        let button = store.get(id(1)).unwrap();
        assert_eq!(button.text, "Paris");
        assert_eq!(button.additional_text, "Capital");
        assert_eq!((button.x, button.y, button.width, button.height), (120.0, 80.0, 100.0, 50.0));
        assert_eq!(controller.view().button_id, None);

        controller.dispatch(UiEvent::Click { id: id(1) }, &mut store);
        assert_eq!(controller.view().text, "Paris");
        assert_eq!(controller.view().additional_text, "Capital");
        assert_eq!(controller.dispatch(UiEvent::Delete, &mut store), Transition::Deleted(id(1)));
        assert!(store.all().is_empty());
        assert!(!controller.view().open);
    }

    #[test]
    fn test_click_unknown_id_shows_placeholder() {
        let mut store = EntityStore::new();
        let mut controller = editing();
        controller.dispatch(UiEvent::Click { id: id(9) }, &mut store);

        let view = controller.view();
        assert_eq!(view.text, "Drag/Resize 9");
        assert_eq!(view.additional_text, "");
    }

    #[test]
    fn test_save_for_vanished_button_does_not_resurrect() {
        let mut store = EntityStore::new();
        let mut controller = editing();
        controller.dispatch(UiEvent::Create, &mut store);
        controller.dispatch(UiEvent::Click { id: id(1) }, &mut store);
        store.delete(id(1));

        assert_eq!(controller.dispatch(save("x", "y"), &mut store), Transition::Closed(id(1)));
        assert!(store.get(id(1)).is_none());
        assert_eq!(controller.state(), &ModalState::Idle);
    }

    #[test]
    fn test_save_without_fields_keeps_text() {
        let mut store = EntityStore::new();
        let mut controller = editing();
        controller.dispatch(UiEvent::Create, &mut store);
        controller.dispatch(UiEvent::Click { id: id(1) }, &mut store);
        controller.dispatch(UiEvent::Save { text: None, additional_text: Some("note".into()) }, &mut store);

        let button = store.get(id(1)).unwrap();
        assert_eq!(button.text, "Drag/Resize 1");
        assert_eq!(button.additional_text, "note");
    }

    #[test]
    fn test_unmatched_events_leave_state() {
        let mut store = EntityStore::new();
        let mut controller = editing();
        assert_eq!(controller.dispatch(save("a", "b"), &mut store), Transition::Ignored);
        assert_eq!(controller.dispatch(UiEvent::Delete, &mut store), Transition::Ignored);

        controller.dispatch(UiEvent::Create, &mut store);
        controller.dispatch(UiEvent::Click { id: id(1) }, &mut store);
        let before = controller.state().clone();
        assert_eq!(controller.dispatch(UiEvent::Create, &mut store), Transition::Ignored);
        assert_eq!(controller.dispatch(UiEvent::Click { id: id(1) }, &mut store), Transition::Ignored);
        assert_eq!(controller.state(), &before);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_deleted_id_not_reused_by_create() {
        let mut store = EntityStore::new();
        let mut controller = editing();
        controller.dispatch(UiEvent::Create, &mut store);
        controller.dispatch(UiEvent::Create, &mut store);
        controller.dispatch(UiEvent::Click { id: id(2) }, &mut store);
        controller.dispatch(UiEvent::Delete, &mut store);

        assert_eq!(controller.dispatch(UiEvent::Create, &mut store), Transition::Created(id(3)));
    }

    #[test]
    fn test_event_wire_format() {
        let event: UiEvent = serde_json::from_str(r#"{"type":"click","id":"4"}"#).unwrap();
        assert_eq!(event, UiEvent::Click { id: id(4) });

        let event: UiEvent =
            serde_json::from_str(r#"{"type":"save","text":"a","additionalText":"b"}"#).unwrap();
        assert_eq!(event, save("a", "b"));

        let event: UiEvent = serde_json::from_str(r#"{"type":"set_edit_mode","enabled":true}"#).unwrap();
        assert_eq!(event, UiEvent::SetEditMode { enabled: true });
    }
}
