//! UI chrome store: bottom navigation visibility and layout mode.

use serde::{Deserialize, Serialize};
use tokio::sync::watch;

/// Device orientation bucket the layout adapts to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayoutMode {
    #[default]
    Portrait,
    Landscape,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UiState {
    pub bottom_menu_visible: bool,
    pub layout: LayoutMode,
}

impl Default for UiState {
    fn default() -> Self {
        Self {
            bottom_menu_visible: true,
            layout: LayoutMode::Portrait,
        }
    }
}

/// Shared UI chrome state. Full-screen flows (login, signup) hide the bottom
/// menu on entry; the payment screen shows it again.
#[derive(Debug)]
pub struct UiStore {
    tx: watch::Sender<UiState>,
}

impl UiStore {
    pub fn new() -> Self {
        Self {
            tx: watch::channel(UiState::default()).0,
        }
    }

    pub fn snapshot(&self) -> UiState {
        self.tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<UiState> {
        self.tx.subscribe()
    }

    pub fn show_bottom_menu(&self) {
        self.tx.send_modify(|s| s.bottom_menu_visible = true);
    }

    pub fn hide_bottom_menu(&self) {
        self.tx.send_modify(|s| s.bottom_menu_visible = false);
    }

    pub fn set_layout(&self, layout: LayoutMode) {
        self.tx.send_modify(|s| s.layout = layout);
    }
}

impl Default for UiStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_menu_visibility_toggles() {
        let store = UiStore::new();
        assert!(store.snapshot().bottom_menu_visible);

        store.hide_bottom_menu();
        assert!(!store.snapshot().bottom_menu_visible);

        store.show_bottom_menu();
        assert!(store.snapshot().bottom_menu_visible);
    }

    #[test]
    fn test_layout_mode() {
        let store = UiStore::new();
        store.set_layout(LayoutMode::Landscape);
        assert_eq!(store.snapshot().layout, LayoutMode::Landscape);
    }
}
