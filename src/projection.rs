//! Read-only list view of the store

use serde::Serialize;

use crate::constants::labels;
use crate::store::EntityStore;
use crate::types::Button;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListProjection {
    pub items: Vec<String>,
}

impl ListProjection {
    /// Rebuild the list from the current store contents
    pub fn build(store: &EntityStore) -> Self {
        Self {
            items: store.iter().map(|(_, button)| list_line(button)).collect(),
        }
    }
}

/// `"{text} - {additionalText}"`
pub fn list_line(button: &Button) -> String {
    format!("{}{}{}", button.text, labels::LIST_SEPARATOR, button.additional_text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ButtonId, ButtonPatch};

    #[test]
    fn test_lines_follow_store_order() {
        let mut store = EntityStore::new();
        store.upsert(ButtonId::new(2), &ButtonPatch::text("Paris", "Capital"));
        store.upsert(ButtonId::new(1), &ButtonPatch::text("Lyon", ""));

        assert_eq!(ListProjection::build(&store).items, vec!["Paris - Capital", "Lyon - "]);
    }

    #[test]
    fn test_deleted_button_disappears() {
        let mut store = EntityStore::new();
        store.upsert(ButtonId::new(1), &ButtonPatch::text("Paris", "Capital"));
        store.delete(ButtonId::new(1));

        assert!(ListProjection::build(&store).items.is_empty());
    }
}
