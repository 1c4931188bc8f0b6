//! Popup overlay widgets: settings menu, controls submenu and the image
//! picker for upload slots.

use std::path::Path;

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Clear, Paragraph, Widget},
};

use crate::app::settings::SETTINGS_ITEMS;
use crate::app::state::{AppState, ImagePicker};
use crate::config::{Action, AppConfig};

fn popup_block(title: &str) -> Block<'_> {
    Block::default()
        .title(title)
        .title_style(
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(Color::DarkGray))
}

fn item_style(selected: bool) -> Style {
    if selected {
        Style::default()
            .fg(Color::White)
            .bg(Color::DarkGray)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::White)
    }
}

fn item_prefix(selected: bool) -> &'static str {
    if selected {
        " ▸ "
    } else {
        "   "
    }
}

// ───────────────────────────────────────── settings popup ────

/// Settings menu popup overlay.
pub struct SettingsPopup<'a> {
    pub state: &'a AppState,
}

impl Widget for SettingsPopup<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let height = (SETTINGS_ITEMS.len() as u16) + 6;
        let popup = centered_fixed(44, height, area);
        Clear.render(popup, buf);

        let block = popup_block(" Settings ");
        let inner = block.inner(popup);
        block.render(popup, buf);

        let mut lines = vec![Line::raw("")];
        for (i, item) in SETTINGS_ITEMS.iter().enumerate() {
            let selected = i == self.state.settings_selected;
            let label = format!("{}{:<22}", item_prefix(selected), item.label());
            let mut spans = vec![Span::styled(label, item_style(selected))];
            if let Some(value) = item.value(self.state) {
                let value_style = match value.as_str() {
                    "ON" => Style::default().fg(Color::Green),
                    "OFF" => Style::default().fg(Color::DarkGray),
                    _ => Style::default().fg(Color::Yellow),
                };
                spans.push(Span::styled(format!("  [{value}]"), value_style));
            }
            lines.push(Line::from(spans));
        }
        lines.push(Line::raw(""));
        lines.push(Line::from(Span::styled(
            "  Enter/Space: change  Esc: close",
            Style::default().fg(Color::DarkGray),
        )));

        Paragraph::new(lines).render(inner, buf);
    }
}

// ───────────────────────────────────────── controls popup ────

/// Interactive controls / keybinding popup overlay.
pub struct ControlsPopup<'a> {
    pub config: &'a AppConfig,
    pub selected: usize,
    pub awaiting_rebind: bool,
}

impl Widget for ControlsPopup<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let height = (Action::ALL.len() as u16) + 7;
        let popup = centered_fixed(52, height, area);
        Clear.render(popup, buf);

        let block = popup_block(" Controls ");
        let inner = block.inner(popup);
        block.render(popup, buf);

        let mut lines = vec![Line::raw("")];

        for (i, &action) in Action::ALL.iter().enumerate() {
            let is_selected = i == self.selected;
            let rebinding = is_selected && self.awaiting_rebind;

            let keys_display = if rebinding {
                "Press a key…".to_string()
            } else {
                self.config.display_bindings(action)
            };

            let key_style = match (is_selected, rebinding) {
                (_, true) => Style::default()
                    .fg(Color::Yellow)
                    .bg(Color::DarkGray)
                    .add_modifier(Modifier::BOLD),
                (true, false) => Style::default().fg(Color::Yellow).bg(Color::DarkGray),
                (false, false) => Style::default().fg(Color::Yellow),
            };

            // Label left-aligned, keys right-aligned.
            let label_col = format!("{}{:<22}", item_prefix(is_selected), action.label());
            let keys_width = (inner.width as usize)
                .saturating_sub(label_col.chars().count())
                .max(1);
            let keys_col = format!("{keys_display:>keys_width$}");

            lines.push(Line::from(vec![
                Span::styled(label_col, item_style(is_selected)),
                Span::styled(keys_col, key_style),
            ]));
        }

        let is_reset_selected = self.selected == Action::ALL.len();
        lines.push(Line::raw(""));
        lines.push(Line::from(Span::styled(
            format!("{}⟳ Reset to defaults", item_prefix(is_reset_selected)),
            item_style(is_reset_selected),
        )));

        lines.push(Line::raw(""));
        lines.push(Line::from(Span::styled(
            "  Enter: add key  Del: clear  Esc: back",
            Style::default().fg(Color::DarkGray),
        )));

        Paragraph::new(lines).render(inner, buf);
    }
}

// ───────────────────────────────────────── image picker ──────

/// File chooser for an upload slot.  Lists candidate image files under the
/// image root; the pick is verified by content when confirmed.
pub struct ImagePickerPopup<'a> {
    pub picker: &'a ImagePicker,
    pub root: &'a Path,
}

impl Widget for ImagePickerPopup<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let height = area.height.saturating_sub(4).clamp(8, 24);
        let popup = centered_fixed(64, height, area);
        Clear.render(popup, buf);

        let title = format!(" Image for {} ", self.picker.color);
        let block = popup_block(&title);
        let inner = block.inner(popup);
        block.render(popup, buf);

        let dim = Style::default().fg(Color::DarkGray);
        let mut lines = vec![Line::from(Span::styled(
            format!("  {}", self.root.display()),
            dim,
        ))];
        if let Some(err) = &self.picker.error {
            lines.push(Line::from(Span::styled(
                format!("  {err}"),
                Style::default().fg(Color::Red),
            )));
        }
        lines.push(Line::raw(""));

        // Rows left for the list after the header lines and the hint.
        let list_height = (inner.height as usize).saturating_sub(lines.len() + 2);
        if self.picker.candidates.is_empty() {
            lines.push(Line::from(Span::styled("  No image files found.", dim)));
        } else {
            let offset = (self.picker.selected + 1).saturating_sub(list_height.max(1));
            for (i, path) in self
                .picker
                .candidates
                .iter()
                .enumerate()
                .skip(offset)
                .take(list_height.max(1))
            {
                let selected = i == self.picker.selected;
                let shown = path.strip_prefix(self.root).unwrap_or(path);
                lines.push(Line::from(Span::styled(
                    format!("{}{}", item_prefix(selected), shown.display()),
                    item_style(selected),
                )));
            }
        }

        lines.push(Line::raw(""));
        lines.push(Line::from(Span::styled("  Enter: attach  Esc: cancel", dim)));

        Paragraph::new(lines).render(inner, buf);
    }
}

// ───────────────────────────────────────── helpers ───────────

/// Create a centered rectangle with fixed dimensions, clamped to the available area.
fn centered_fixed(width: u16, height: u16, area: Rect) -> Rect {
    let w = width.min(area.width);
    let h = height.min(area.height);
    let x = area.x + (area.width.saturating_sub(w)) / 2;
    let y = area.y + (area.height.saturating_sub(h)) / 2;
    Rect::new(x, y, w, h)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::catalog;
    use std::path::PathBuf;

    fn text(buf: &Buffer) -> String {
        let area = buf.area;
        (0..area.height)
            .map(|y| {
                (0..area.width)
                    .map(|x| buf[(x, y)].symbol().to_string())
                    .collect::<String>()
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn controls_popup_lists_every_action() {
        let config = AppConfig::default();
        let area = Rect::new(0, 0, 80, 30);
        let mut buf = Buffer::empty(area);
        ControlsPopup {
            config: &config,
            selected: 0,
            awaiting_rebind: true,
        }
        .render(area, &mut buf);
        let out = text(&buf);
        for action in Action::ALL {
            assert!(out.contains(action.label()), "{}", action.label());
        }
        assert!(out.contains("Press a key…"));
        assert!(out.contains("Reset to defaults"));
    }

    #[test]
    fn picker_shows_paths_relative_to_the_root() {
        let picker = ImagePicker {
            color: catalog::Color::Blue,
            candidates: vec![PathBuf::from("/pics/a.png"), PathBuf::from("/pics/sub/b.jpg")],
            selected: 1,
            error: Some("notes.txt is text/plain, not an image".into()),
        };
        let area = Rect::new(0, 0, 80, 24);
        let mut buf = Buffer::empty(area);
        ImagePickerPopup {
            picker: &picker,
            root: Path::new("/pics"),
        }
        .render(area, &mut buf);
        let out = text(&buf);
        assert!(out.contains("Image for blue"));
        assert!(out.contains("   a.png"));
        assert!(out.contains(" ▸ sub/b.jpg"));
        assert!(out.contains("not an image"));
    }

    #[test]
    fn picker_without_candidates_says_so() {
        let picker = ImagePicker {
            color: catalog::Color::Red,
            candidates: Vec::new(),
            selected: 0,
            error: None,
        };
        let area = Rect::new(0, 0, 80, 24);
        let mut buf = Buffer::empty(area);
        ImagePickerPopup {
            picker: &picker,
            root: Path::new("."),
        }
        .render(area, &mut buf);
        assert!(text(&buf).contains("No image files found."));
    }
}
