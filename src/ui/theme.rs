//! Colour palette and text styles used across the UI.

use ratatui::style::{Color, Modifier, Style};

use crate::core::catalog;

/// Central theme: change colours here and they propagate everywhere.
pub struct Theme;

impl Theme {
    // ── table ──────────────────────────────────────────────────
    pub fn header_style() -> Style {
        Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD)
    }

    /// Header cell under the column cursor.
    pub fn header_focus_style() -> Style {
        Self::header_style().add_modifier(Modifier::UNDERLINED)
    }

    pub fn row_style() -> Style {
        Style::default().fg(Color::White)
    }

    /// Row whose checkbox is ticked.
    pub fn row_selected_style() -> Style {
        Style::default().fg(Color::Yellow)
    }

    pub fn cursor_style() -> Style {
        Style::default()
            .bg(Color::DarkGray)
            .add_modifier(Modifier::BOLD)
    }

    pub fn placeholder_style() -> Style {
        Style::default()
            .fg(Color::DarkGray)
            .add_modifier(Modifier::ITALIC)
    }

    pub fn danger_button_style() -> Style {
        Style::default()
            .bg(Color::Red)
            .fg(Color::White)
            .add_modifier(Modifier::BOLD)
    }

    // ── form ───────────────────────────────────────────────────
    pub fn label_style() -> Style {
        Style::default().fg(Color::White).add_modifier(Modifier::BOLD)
    }

    pub fn label_focus_style() -> Style {
        Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
    }

    pub fn help_style() -> Style {
        Style::default().fg(Color::DarkGray)
    }

    pub fn error_style() -> Style {
        Style::default().fg(Color::Red)
    }

    pub fn input_style() -> Style {
        Style::default().fg(Color::Yellow)
    }

    pub fn primary_button_style() -> Style {
        Style::default()
            .bg(Color::Blue)
            .fg(Color::White)
            .add_modifier(Modifier::BOLD)
    }

    /// Swatch colour for a product color token.
    pub fn swatch(color: catalog::Color) -> Color {
        let (r, g, b) = color.rgb();
        Color::Rgb(r, g, b)
    }

    // ── chrome ─────────────────────────────────────────────────
    pub fn border_style() -> Style {
        Style::default().fg(Color::Gray)
    }

    pub fn title_style() -> Style {
        Style::default()
            .fg(Color::Green)
            .add_modifier(Modifier::BOLD)
    }

    pub fn status_bar_style() -> Style {
        Style::default().bg(Color::DarkGray).fg(Color::White)
    }

    pub fn dim_style() -> Style {
        Style::default().fg(Color::DarkGray)
    }
}
