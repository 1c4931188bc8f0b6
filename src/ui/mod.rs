//! UI / rendering layer: everything that touches Ratatui widgets.
//!
//! This layer takes the *core* data structures and turns them into pixels on
//! the terminal.  No filesystem I/O happens here.

pub mod form_widget;
pub mod layout;
pub mod popup;
pub mod table_widget;
pub mod theme;

use ratatui::{widgets::Paragraph, Frame};

use crate::app::state::{ActiveView, AppState};
use form_widget::AddProductForm;
use layout::AppLayout;
use popup::{ControlsPopup, ImagePickerPopup, SettingsPopup};
use table_widget::DataTableWidget;
use theme::Theme;

const FORM_HINT: &str =
    "Tab/Shift+Tab: move | Space: toggle | ←/→: choose | Enter: pick/submit | Ctrl+S: submit | Esc: cancel";

/// Draw one frame.  Records the terminal area for mouse hit-testing.
pub fn render(frame: &mut Frame, state: &mut AppState) {
    state.terminal_area = frame.area();
    let layout = AppLayout::from_area(frame.area());

    let mut table = DataTableWidget::new(&state.table, "Products");
    if state.active_view == ActiveView::Products {
        table = table.cursor(state.cursor);
    }
    frame.render_widget(table, layout.table_area);

    if state.active_view == ActiveView::AddProduct {
        frame.render_widget(
            AddProductForm::new(&state.form, &state.thumbnails, state.config.image_coverage),
            layout.sheet_area,
        );
        if let Some(picker) = &state.form.picker {
            frame.render_widget(
                ImagePickerPopup {
                    picker,
                    root: &state.image_root,
                },
                frame.area(),
            );
        }
    }

    let hint = match state.active_view {
        ActiveView::Products => state.config.status_bar_hint(),
        ActiveView::AddProduct => FORM_HINT.to_string(),
        ActiveView::SettingsMenu | ActiveView::ControlsSubmenu => String::new(),
    };
    let status_text = state.status_message.as_deref().unwrap_or(&hint);
    frame.render_widget(
        Paragraph::new(status_text).style(Theme::status_bar_style()),
        layout.status_area,
    );

    match state.active_view {
        ActiveView::SettingsMenu => {
            frame.render_widget(SettingsPopup { state }, frame.area());
        }
        ActiveView::ControlsSubmenu => {
            frame.render_widget(
                ControlsPopup {
                    config: &state.config,
                    selected: state.controls_selected,
                    awaiting_rebind: state.awaiting_rebind,
                },
                frame.area(),
            );
        }
        ActiveView::Products | ActiveView::AddProduct => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::core::product::{sample_catalog, CatalogDeleter};
    use crate::core::submit::LogSubmitter;
    use ratatui::{backend::TestBackend, Terminal};

    fn state() -> AppState {
        AppState::new(
            sample_catalog(),
            AppConfig::default(),
            CatalogDeleter::new(None),
            Box::new(LogSubmitter),
        )
    }

    fn draw(state: &mut AppState) -> String {
        let mut terminal = Terminal::new(TestBackend::new(120, 30)).unwrap();
        terminal.draw(|f| render(f, state)).unwrap();
        let buf = terminal.backend().buffer();
        (0..buf.area.height)
            .map(|y| {
                (0..buf.area.width)
                    .map(|x| buf[(x, y)].symbol().to_string())
                    .collect::<String>()
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn products_view_shows_table_and_hint() {
        let mut s = state();
        let out = draw(&mut s);
        assert!(out.contains("Products"));
        assert!(out.contains("Adidas CoreFit T-Shirt"));
        assert!(out.contains("s: sort"));
        assert_eq!(s.terminal_area.width, 120);
    }

    #[test]
    fn form_view_overlays_the_sheet() {
        let mut s = state();
        s.open_form();
        let out = draw(&mut s);
        assert!(out.contains("Add Product"));
        assert!(out.contains("Ctrl+S: submit"));
    }

    #[test]
    fn settings_popup_shows_current_values() {
        let mut s = state();
        s.active_view = ActiveView::SettingsMenu;
        let out = draw(&mut s);
        assert!(out.contains("Rows per Page"));
        assert!(out.contains("[10]"));
        assert!(out.contains("[optional]"));
        assert!(out.contains("[OFF]"));
    }
}
