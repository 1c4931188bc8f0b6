//! Layout helpers: split the terminal area into regions.

use ratatui::layout::{Constraint, Direction, Layout, Rect};

/// Narrowest the add-product sheet gets before it takes the full width.
const SHEET_MIN_WIDTH: u16 = 64;

/// Primary screen layout: products table, the add-product sheet that slides
/// over its right side, and a bottom status bar.
pub struct AppLayout {
    pub table_area: Rect,
    pub sheet_area: Rect,
    pub status_area: Rect,
}

impl AppLayout {
    /// Compute the layout from the full terminal area.
    pub fn from_area(area: Rect) -> Self {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Min(3),    // table pane (takes all remaining space)
                Constraint::Length(1), // status bar
            ])
            .split(area);
        let main = chunks[0];

        let sheet_width = if main.width <= SHEET_MIN_WIDTH {
            main.width
        } else {
            (main.width * 3 / 5).max(SHEET_MIN_WIDTH)
        };
        let sheet_area = Rect::new(
            main.x + main.width - sheet_width,
            main.y,
            sheet_width,
            main.height,
        );

        Self {
            table_area: main,
            sheet_area,
            status_area: chunks[1],
        }
    }
}
