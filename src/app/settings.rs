//! Settings menu model (data only).
//!
//! Keeping these definitions outside the input handler lets both the handler
//! and UI renderers consume the same source of truth without cross-importing.

use super::state::{ActiveView, AppState};
use crate::core::validation::ImageCoverage;

/// A single item in the settings menu.
pub enum SettingsItem {
    /// Opens a submenu.
    Submenu {
        label: &'static str,
        view: ActiveView,
    },
    /// Boolean toggle: reads/writes via accessors on `AppState`.
    Toggle {
        label: &'static str,
        get: fn(&AppState) -> bool,
        set: fn(&mut AppState, bool),
    },
    /// Cycles through a finite set of values.
    Cycle {
        label: &'static str,
        value: fn(&AppState) -> String,
        cycle: fn(&mut AppState),
    },
}

impl SettingsItem {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Submenu { label, .. }
            | Self::Toggle { label, .. }
            | Self::Cycle { label, .. } => label,
        }
    }

    /// Current value as shown next to the label (`None` for submenus).
    pub fn value(&self, state: &AppState) -> Option<String> {
        match self {
            Self::Submenu { .. } => None,
            Self::Toggle { get, .. } => Some(if get(state) { "ON" } else { "OFF" }.into()),
            Self::Cycle { value, .. } => Some(value(state)),
        }
    }

    /// Activate the item: toggle, cycle or open the submenu.
    pub fn activate(&self, state: &mut AppState) {
        match self {
            Self::Submenu { view, .. } => {
                state.active_view = *view;
                state.controls_selected = 0;
            }
            Self::Toggle { get, set, .. } => {
                let current = get(state);
                set(state, !current);
            }
            Self::Cycle { cycle, .. } => cycle(state),
        }
    }
}

/// Page sizes offered by the settings menu.
pub const PAGE_SIZES: &[usize] = &[5, 10, 20, 50];

/// All items shown in the settings popup, in display order.
pub static SETTINGS_ITEMS: &[SettingsItem] = &[
    SettingsItem::Submenu {
        label: "Controls",
        view: ActiveView::ControlsSubmenu,
    },
    SettingsItem::Cycle {
        label: "Rows per Page",
        value: |s| s.table.page_size().to_string(),
        cycle: |s| {
            let idx = PAGE_SIZES
                .iter()
                .position(|&n| n == s.table.page_size())
                .map_or(0, |i| (i + 1) % PAGE_SIZES.len());
            s.config.page_size = PAGE_SIZES[idx];
            s.table.set_page_size(s.config.page_size);
            s.clamp_cursor();
            s.persist_config();
            s.status_message = Some(format!("Rows per page: {}", s.config.page_size));
        },
    },
    SettingsItem::Cycle {
        label: "Image per Color",
        value: |s| s.config.image_coverage.label().to_string(),
        cycle: |s| {
            let idx = ImageCoverage::ALL
                .iter()
                .position(|c| *c == s.config.image_coverage)
                .unwrap_or(0);
            s.config.image_coverage = ImageCoverage::ALL[(idx + 1) % ImageCoverage::ALL.len()];
            s.persist_config();
            s.status_message = Some(format!(
                "Image per color: {}",
                s.config.image_coverage.label()
            ));
        },
    },
    SettingsItem::Toggle {
        label: "Diagnostics Log",
        get: |s| s.config.diagnostics,
        set: |s, v| {
            s.config.diagnostics = v;
            s.persist_config();
            s.status_message = Some("Diagnostics log applies from the next launch".into());
        },
    },
];
