// SPDX-FileCopyrightText: 2026 Keel Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Widget registration and authorization-aware listing.

use keel_core::{validate_capability_name, KeelError, User, Widget};
use tracing::debug;

use crate::registry::CapabilityRegistry;

/// A widget together with the plugin that contributed it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisteredWidget {
    pub plugin_name: String,
    pub widget: Widget,
    pub(crate) seq: u64,
}

impl CapabilityRegistry {
    /// Register a widget owned by `plugin_name`.
    ///
    /// The id must be `"<plugin_name>:<slug>"` and every required capability
    /// must be a well-formed name. Re-registering an id replaces the widget.
    pub fn register_widget(&mut self, plugin_name: &str, widget: Widget) -> Result<(), KeelError> {
        Self::validate_widget(plugin_name, &widget)?;

        self.unregister_widget(&widget.id);
        for required in &widget.required_capabilities {
            self.widgets_by_capability
                .entry(required.clone())
                .or_default()
                .insert(widget.id.clone());
        }

        let seq = self.next_widget_seq;
        self.next_widget_seq += 1;
        debug!(widget = %widget.id, plugin = %plugin_name, "widget registered");
        self.widgets.insert(
            widget.id.clone(),
            RegisteredWidget {
                plugin_name: plugin_name.to_string(),
                widget,
                seq,
            },
        );
        Ok(())
    }

    /// The checks `register_widget` applies, without touching the table.
    pub fn validate_widget(plugin_name: &str, widget: &Widget) -> Result<(), KeelError> {
        widget.validate_for(plugin_name)?;
        for required in &widget.required_capabilities {
            validate_capability_name(required).map_err(|_| KeelError::InvalidWidget {
                id: widget.id.clone(),
                reason: format!("required capability '{required}' is not a valid name"),
            })?;
        }
        Ok(())
    }

    /// Remove a widget and its reverse-index entries. Returns whether it existed.
    pub fn unregister_widget(&mut self, id: &str) -> bool {
        let Some(entry) = self.widgets.remove(id) else {
            return false;
        };
        for required in &entry.widget.required_capabilities {
            if let Some(ids) = self.widgets_by_capability.get_mut(required) {
                ids.remove(id);
                if ids.is_empty() {
                    self.widgets_by_capability.remove(required);
                }
            }
        }
        true
    }

    pub fn get_widget(&self, id: &str) -> Option<&RegisteredWidget> {
        self.widgets.get(id)
    }

    /// Widgets that declare `capability` as a requirement, sorted by id.
    pub fn get_widgets_for_capability(&self, capability: &str) -> Vec<&RegisteredWidget> {
        self.widgets_by_capability
            .get(capability)
            .map(|ids| ids.iter().filter_map(|id| self.widgets.get(id)).collect())
            .unwrap_or_default()
    }

    /// Widgets visible to `user`, optionally restricted to one slot.
    ///
    /// A widget is visible when the user is authorized for every capability it
    /// requires; a required capability with no provider hides the widget.
    /// Without a user all widgets are returned. Sorted by priority descending,
    /// then registration order.
    pub fn get_all_widgets(
        &self,
        user: Option<&User>,
        slot: Option<&str>,
    ) -> Vec<&RegisteredWidget> {
        let mut widgets: Vec<&RegisteredWidget> = self
            .widgets
            .values()
            .filter(|w| slot.is_none_or(|s| w.widget.slots.iter().any(|ws| ws == s)))
            .filter(|w| {
                user.is_none_or(|u| {
                    w.widget
                        .required_capabilities
                        .iter()
                        .all(|cap| self.is_authorized(u, cap))
                })
            })
            .collect();
        widgets.sort_by(|a, b| b.widget.priority.cmp(&a.widget.priority).then(a.seq.cmp(&b.seq)));
        widgets
    }
}
