//! Ratatui widget that renders a [`DataTable`] with a selection gutter,
//! sortable headers, a bulk-delete bar and a pagination footer.
//!
//! Geometry is computed by [`TableGeometry`] so that mouse hit-testing in
//! the handler and rendering agree on where everything sits.

use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget},
};

use crate::app::state::TableCursor;
use crate::core::table::{DataTable, SortDirection, TableBody, TableRecord};

use super::theme::Theme;

/// Width of the `[x] ` selection gutter.
pub const CHECKBOX_WIDTH: u16 = 4;

pub const DELETE_LABEL: &str = " Delete Product(s) ";
const PREV_LABEL: &str = " ‹ Previous ";
const NEXT_LABEL: &str = " Next › ";

// ───────────────────────────────────────── geometry ──────────

/// Where each part of the table lands inside its bordered pane.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableGeometry {
    /// Bulk-delete button; only present while rows are selected.
    pub delete_button: Option<Rect>,
    pub header: Rect,
    pub body: Rect,
    pub footer: Rect,
    pub prev_button: Rect,
    pub next_button: Rect,
    /// `(x, width)` of each data column, clipped to the pane.
    pub columns: Vec<(u16, u16)>,
}

impl TableGeometry {
    pub fn compute(area: Rect, has_selection: bool, widths: &[u16]) -> Self {
        let inner = Block::default().borders(Borders::ALL).inner(area);
        let mut y = inner.y;
        let bottom = inner.y + inner.height;

        let delete_button = if has_selection && inner.height > 0 {
            let w = (DELETE_LABEL.chars().count() as u16).min(inner.width);
            let rect = Rect::new(inner.x + inner.width - w, y, w, 1);
            y += 1;
            Some(rect)
        } else {
            None
        };

        let header = Rect::new(inner.x, y.min(bottom), inner.width, u16::from(y < bottom));
        y = (y + 1).min(bottom);

        let footer_y = bottom.saturating_sub(1).max(y);
        let footer = Rect::new(inner.x, footer_y, inner.width, u16::from(footer_y < bottom));
        let body = Rect::new(inner.x, y, inner.width, footer_y.saturating_sub(y));

        let next_w = (NEXT_LABEL.chars().count() as u16).min(inner.width);
        let next_button = Rect::new(inner.x + inner.width - next_w, footer_y, next_w, footer.height);
        let prev_w = (PREV_LABEL.chars().count() as u16).min(next_button.x - inner.x);
        let prev_button = Rect::new(next_button.x - prev_w, footer_y, prev_w, footer.height);

        let right = inner.x + inner.width;
        let mut x = inner.x + CHECKBOX_WIDTH.min(inner.width);
        let columns = widths
            .iter()
            .map(|&w| {
                let start = x.min(right);
                let width = w.min(right - start);
                x = x.saturating_add(w).saturating_add(1);
                (start, width)
            })
            .collect();

        Self {
            delete_button,
            header,
            body,
            footer,
            prev_button,
            next_button,
            columns,
        }
    }

    /// First page row shown, keeping the cursor inside the body.
    pub fn row_offset(&self, cursor_row: usize) -> usize {
        let height = self.body.height as usize;
        if height == 0 {
            return 0;
        }
        (cursor_row + 1).saturating_sub(height)
    }

    /// Data column under the pointer on the header line.
    pub fn header_column_at(&self, col: u16, row: u16) -> Option<usize> {
        if !contains(self.header, col, row) {
            return None;
        }
        self.columns
            .iter()
            .position(|&(x, w)| w > 0 && col >= x && col < x + w)
    }

    /// Whether the pointer is on the header's select-page checkbox.
    pub fn on_header_checkbox(&self, col: u16, row: u16) -> bool {
        contains(self.header, col, row) && col < self.header.x + CHECKBOX_WIDTH
    }

    /// Page row (not yet offset) under the pointer.
    pub fn body_line_at(&self, col: u16, row: u16) -> Option<usize> {
        contains(self.body, col, row).then(|| (row - self.body.y) as usize)
    }

    pub fn on_delete_button(&self, col: u16, row: u16) -> bool {
        self.delete_button.is_some_and(|r| contains(r, col, row))
    }

    pub fn on_prev_button(&self, col: u16, row: u16) -> bool {
        contains(self.prev_button, col, row)
    }

    pub fn on_next_button(&self, col: u16, row: u16) -> bool {
        contains(self.next_button, col, row)
    }
}

fn contains(r: Rect, col: u16, row: u16) -> bool {
    col >= r.x && col < r.x + r.width && row >= r.y && row < r.y + r.height
}

// ───────────────────────────────────────── widget ────────────

/// The table widget itself: created fresh each frame.
pub struct DataTableWidget<'a, R: TableRecord> {
    table: &'a DataTable<R>,
    cursor: Option<TableCursor>,
    title: &'a str,
}

impl<'a, R: TableRecord> DataTableWidget<'a, R> {
    pub fn new(table: &'a DataTable<R>, title: &'a str) -> Self {
        Self {
            table,
            cursor: None,
            title,
        }
    }

    /// Highlight the cursor row and column (only while the table has focus).
    pub fn cursor(mut self, cursor: TableCursor) -> Self {
        self.cursor = Some(cursor);
        self
    }

    fn widths(&self) -> Vec<u16> {
        self.table.columns().iter().map(|c| c.width).collect()
    }

    fn header_line(&self, geom: &TableGeometry, buf: &mut Buffer) {
        let area = geom.header;
        if area.height == 0 {
            return;
        }
        let checkbox = match self.table.page_selection() {
            Some(true) => "[x]",
            Some(false) => "[ ]",
            None => "[-]",
        };
        buf.set_stringn(area.x, area.y, checkbox, area.width as usize, Theme::header_style());

        let sort = self.table.sort();
        for (i, (column, &(x, w))) in self.table.columns().iter().zip(&geom.columns).enumerate() {
            if w == 0 {
                continue;
            }
            let indicator = match sort {
                Some(s) if s.column == i => match s.direction {
                    SortDirection::Ascending => " ↑",
                    SortDirection::Descending => " ↓",
                },
                _ if column.sortable => " ↕",
                _ => "",
            };
            let style = if self.cursor.is_some_and(|c| c.column == i) {
                Theme::header_focus_style()
            } else {
                Theme::header_style()
            };
            buf.set_stringn(x, area.y, format!("{}{indicator}", column.header), w as usize, style);
        }
    }

    fn body_lines(&self, geom: &TableGeometry, buf: &mut Buffer) {
        let area = geom.body;
        if area.height == 0 {
            return;
        }
        let rows = match self.table.body() {
            TableBody::Placeholder { .. } => {
                let line = Rect::new(area.x, area.y, area.width, 1);
                Paragraph::new(Line::from(Span::styled("No results.", Theme::placeholder_style())))
                    .alignment(Alignment::Center)
                    .render(line, buf);
                return;
            }
            TableBody::Rows(rows) => rows,
        };

        let cursor_row = self.cursor.map(|c| c.row);
        let offset = geom.row_offset(cursor_row.unwrap_or(0));
        for (line, (page_row, &index)) in rows
            .iter()
            .enumerate()
            .skip(offset)
            .take(area.height as usize)
            .enumerate()
        {
            let Some(record) = self.table.row(index) else {
                continue;
            };
            let y = area.y + line as u16;
            let selected = self.table.is_selected(&record.row_id());
            let mut style = if selected {
                Theme::row_selected_style()
            } else {
                Theme::row_style()
            };
            if cursor_row == Some(page_row) {
                style = style.patch(Theme::cursor_style());
                buf.set_style(Rect::new(area.x, y, area.width, 1), Theme::cursor_style());
            }

            let checkbox = if selected { "[x]" } else { "[ ]" };
            buf.set_stringn(area.x, y, checkbox, area.width as usize, style);
            for (column, &(x, w)) in self.table.columns().iter().zip(&geom.columns) {
                if w == 0 {
                    continue;
                }
                buf.set_stringn(x, y, (column.cell)(record).display(), w as usize, style);
            }
        }
    }

    fn footer_line(&self, geom: &TableGeometry, buf: &mut Buffer) {
        let area = geom.footer;
        if area.height == 0 {
            return;
        }
        let summary = format!(
            "{} of {} row(s) selected.",
            self.table.selection_len(),
            self.table.data().len()
        );
        buf.set_stringn(area.x, area.y, &summary, area.width as usize, Theme::dim_style());

        let page = format!(
            "Page {} of {} ",
            self.table.page_index() + 1,
            self.table.page_count()
        );
        let page_w = page.chars().count() as u16;
        let page_x = geom.prev_button.x.saturating_sub(page_w).max(area.x);
        buf.set_stringn(page_x, area.y, &page, (geom.prev_button.x - page_x) as usize, Theme::row_style());

        let button = |enabled: bool| {
            if enabled {
                Theme::row_style()
            } else {
                Theme::dim_style()
            }
        };
        let prev = geom.prev_button;
        buf.set_stringn(prev.x, prev.y, PREV_LABEL, prev.width as usize, button(self.table.can_previous_page()));
        let next = geom.next_button;
        buf.set_stringn(next.x, next.y, NEXT_LABEL, next.width as usize, button(self.table.can_next_page()));
    }
}

impl<R: TableRecord> Widget for DataTableWidget<'_, R> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = Block::default()
            .title(format!(" {} ", self.title))
            .title_style(Theme::title_style())
            .borders(Borders::ALL)
            .border_style(Theme::border_style());
        block.render(area, buf);

        let geom = TableGeometry::compute(area, self.table.has_selection(), &self.widths());
        if let Some(button) = geom.delete_button {
            let count = format!("{} selected ", self.table.selection_len());
            let w = count.chars().count() as u16;
            let x = button.x.saturating_sub(w).max(area.x + 1);
            buf.set_stringn(x, button.y, &count, (button.x - x) as usize, Theme::row_selected_style());
            buf.set_stringn(button.x, button.y, DELETE_LABEL, button.width as usize, Theme::danger_button_style());
        }
        self.header_line(&geom, buf);
        self.body_lines(&geom, buf);
        self.footer_line(&geom, buf);
    }
}
