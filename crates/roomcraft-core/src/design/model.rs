//! Selection domain models.

use serde::{Deserialize, Serialize};

/// A catalog entry the user picked, plus where it should be placed.
///
/// `name` is a copy of the catalog label at selection time, so a saved
/// design stays readable even if the catalog wording changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectedItem {
    pub id: String,
    pub name: String,
    /// Free-text placement instruction. May be empty while being edited.
    #[serde(default)]
    pub prompt: String,
}

impl SelectedItem {
    pub fn new(id: impl Into<String>, name: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            prompt: prompt.into(),
        }
    }

    /// An item can be sent to the provider only once it has an instruction.
    pub fn is_submittable(&self) -> bool {
        !self.prompt.trim().is_empty()
    }
}

/// Insertion-ordered set of selected items, unique by `id`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Selection {
    items: Vec<SelectedItem>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a selection from a list, keeping the first occurrence of each id.
    pub fn from_items(items: impl IntoIterator<Item = SelectedItem>) -> Self {
        let mut selection = Self::new();
        for item in items {
            if !selection.contains(&item.id) {
                selection.items.push(item);
            }
        }
        selection
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.items.iter().any(|item| item.id == id)
    }

    pub fn get(&self, id: &str) -> Option<&SelectedItem> {
        self.items.iter().find(|item| item.id == id)
    }

    pub fn items(&self) -> &[SelectedItem] {
        &self.items
    }

    pub fn into_items(self) -> Vec<SelectedItem> {
        self.items
    }

    /// Adds the item with an empty prompt, or removes it if already present.
    ///
    /// Returns `true` when the item is selected after the call.
    pub fn toggle(&mut self, id: &str, name: &str) -> bool {
        if let Some(index) = self.items.iter().position(|item| item.id == id) {
            self.items.remove(index);
            false
        } else {
            self.items.push(SelectedItem::new(id, name, ""));
            true
        }
    }

    /// Replaces the prompt of a selected item. Returns `false` if `id` is not
    /// selected.
    pub fn set_prompt(&mut self, id: &str, prompt: impl Into<String>) -> bool {
        match self.items.iter_mut().find(|item| item.id == id) {
            Some(item) => {
                item.prompt = prompt.into();
                true
            }
            None => false,
        }
    }

    /// Items with a non-blank prompt, in insertion order.
    pub fn submittable(&self) -> Vec<SelectedItem> {
        self.items.iter().filter(|item| item.is_submittable()).cloned().collect()
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }
}
