//! The add-product sheet: labelled inputs with help text and inline errors,
//! checkbox grids for sizes and colors, one upload slot per selected color,
//! and a half-block preview of the focused slot's image.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Clear, Paragraph, Widget},
};

use crate::app::state::{FormFocus, FormState};
use crate::core::catalog::{self, Size};
use crate::core::validation::{Field, ImageCoverage};

use super::theme::Theme;

const PREVIEW_WIDTH: u16 = 26;
const PREVIEW_HEIGHT: u16 = 10;

/// The add-product form, rendered as a sheet.
pub struct AddProductForm<'a> {
    form: &'a FormState,
    thumbnails: &'a HashMap<PathBuf, Arc<image::RgbaImage>>,
    coverage: ImageCoverage,
}

impl<'a> AddProductForm<'a> {
    pub fn new(
        form: &'a FormState,
        thumbnails: &'a HashMap<PathBuf, Arc<image::RgbaImage>>,
        coverage: ImageCoverage,
    ) -> Self {
        Self {
            form,
            thumbnails,
            coverage,
        }
    }
}

/// Lines of the form plus the line range of the focused element.
struct FormLines<'a> {
    lines: Vec<Line<'a>>,
    focus_start: usize,
    focus_end: usize,
}

impl<'a> FormLines<'a> {
    fn push(&mut self, line: Line<'a>) {
        self.lines.push(line);
    }

    fn mark_focus(&mut self, start: usize) {
        self.focus_start = start;
        self.focus_end = self.lines.len();
    }
}

impl AddProductForm<'_> {
    fn focused(&self, focus: FormFocus) -> bool {
        self.form.focus == focus
    }

    fn label(&self, out: &mut FormLines<'_>, text: &'static str, focus: FormFocus) {
        let style = if self.focused(focus) {
            Theme::label_focus_style()
        } else {
            Theme::label_style()
        };
        let marker = if self.focused(focus) { "▸ " } else { "  " };
        out.push(Line::from(Span::styled(format!("{marker}{text}"), style)));
    }

    fn help_and_error(&self, out: &mut FormLines<'_>, help: &'static str, field: Field) {
        out.push(Line::from(Span::styled(format!("  {help}"), Theme::help_style())));
        if let Some(message) = self.form.error_for(field) {
            out.push(Line::from(Span::styled(format!("  {message}"), Theme::error_style())));
        }
        out.push(Line::raw(""));
    }

    fn text_input(
        &self,
        out: &mut FormLines<'_>,
        label: &'static str,
        help: &'static str,
        focus: FormFocus,
        value: &str,
    ) {
        let start = out.lines.len();
        self.label(out, label, focus);
        let focused = self.focused(focus);
        let mut rows: Vec<&str> = value.split('\n').collect();
        if rows.is_empty() {
            rows.push("");
        }
        let last = rows.len() - 1;
        for (i, row) in rows.into_iter().enumerate() {
            let mut spans = vec![Span::raw("  │ "), Span::styled(row.to_string(), Theme::input_style())];
            if focused && i == last {
                spans.push(Span::styled("▏", Theme::label_focus_style()));
            }
            out.push(Line::from(spans));
        }
        if focused {
            out.mark_focus(start);
        }
        if let Some(field) = focus.field() {
            self.help_and_error(out, help, field);
        }
    }

    fn category(&self, out: &mut FormLines<'_>) {
        let start = out.lines.len();
        self.label(out, "Category", FormFocus::Category);
        let value = match (self.form.category(), self.form.draft.category()) {
            (Some(c), _) => Span::styled(format!("‹ {c} ›"), Theme::input_style()),
            (None, Some(raw)) => Span::styled(format!("‹ {raw} ›"), Theme::error_style()),
            (None, None) => Span::styled("‹ Select a category ›", Theme::help_style()),
        };
        out.push(Line::from(vec![Span::raw("  │ "), value]));
        if self.focused(FormFocus::Category) {
            out.mark_focus(start);
        }
        self.help_and_error(out, "Enter the category of the product.", Field::Category);
    }

    /// Wrap checkbox items into lines no wider than `width`.
    fn checkbox_grid<'s>(items: Vec<Vec<Span<'s>>>, width: u16) -> Vec<Line<'s>> {
        let mut lines = Vec::new();
        let mut current: Vec<Span<'s>> = vec![Span::raw("  ")];
        let mut used = 2usize;
        for item in items {
            let w: usize = item.iter().map(|s| s.width()).sum::<usize>() + 2;
            if used + w > width as usize && current.len() > 1 {
                lines.push(Line::from(std::mem::replace(&mut current, vec![Span::raw("  ")])));
                used = 2;
            }
            current.extend(item);
            current.push(Span::raw("  "));
            used += w;
        }
        if current.len() > 1 {
            lines.push(Line::from(current));
        }
        lines
    }

    fn checkbox_style(&self, focus: FormFocus, is_cursor: bool) -> Style {
        if self.focused(focus) && is_cursor {
            Theme::cursor_style()
        } else {
            Theme::row_style()
        }
    }

    fn sizes(&self, out: &mut FormLines<'_>, width: u16) {
        let start = out.lines.len();
        self.label(out, "Sizes", FormFocus::Sizes);
        let cursor = self.form.cursor_size();
        let items = Size::ALL
            .iter()
            .map(|&size| {
                let mark = if self.form.draft.sizes().contains(&size) { "[x]" } else { "[ ]" };
                let style = self.checkbox_style(FormFocus::Sizes, size == cursor);
                vec![Span::styled(format!("{mark} {size}"), style)]
            })
            .collect();
        for line in Self::checkbox_grid(items, width) {
            out.push(line);
        }
        if self.focused(FormFocus::Sizes) {
            out.mark_focus(start);
        }
        self.help_and_error(out, "Select the available sizes for the product.", Field::Sizes);
    }

    fn colors(&self, out: &mut FormLines<'_>, width: u16) {
        let start = out.lines.len();
        self.label(out, "Colors", FormFocus::Colors);
        let cursor = self.form.cursor_color();
        let items = catalog::Color::ALL
            .iter()
            .map(|&color| {
                let mark = if self.form.draft.colors().contains(&color) { "[x]" } else { "[ ]" };
                let style = self.checkbox_style(FormFocus::Colors, color == cursor);
                vec![
                    Span::styled(format!("{mark} "), style),
                    Span::styled("■", Style::default().fg(Theme::swatch(color))),
                    Span::styled(format!(" {color}"), style),
                ]
            })
            .collect();
        for line in Self::checkbox_grid(items, width) {
            out.push(line);
        }
        if self.focused(FormFocus::Colors) {
            out.mark_focus(start);
        }

        if !self.form.draft.colors().is_empty() {
            let heading = match self.coverage {
                ImageCoverage::Strict => "  Upload images for selected colors (required):",
                ImageCoverage::Optional => "  Upload images for selected colors:",
            };
            out.push(Line::from(Span::styled(heading, Theme::label_style())));
            for (color, image) in self.form.draft.image_slots() {
                let focus = FormFocus::Image(color);
                let slot_start = out.lines.len();
                let marker = if self.focused(focus) { "  ▸ " } else { "    " };
                let (text, style) = match image {
                    Some(img) => (format!("[ {} ]", img.label()), Theme::input_style()),
                    None => ("[ Choose image… ]".to_string(), Theme::help_style()),
                };
                let style = if self.focused(focus) {
                    style.patch(Theme::cursor_style())
                } else {
                    style
                };
                out.push(Line::from(vec![
                    Span::raw(marker),
                    Span::styled("■", Style::default().fg(Theme::swatch(color))),
                    Span::raw(format!(" {:<7}", color.as_str())),
                    Span::styled(text, style),
                ]));
                if self.focused(focus) {
                    out.mark_focus(slot_start);
                }
            }
        }

        out.push(Line::from(Span::styled(
            "  Select the available colors for the product.",
            Theme::help_style(),
        )));
        for field in [Field::Colors, Field::Images] {
            if let Some(message) = self.form.error_for(field) {
                out.push(Line::from(Span::styled(format!("  {message}"), Theme::error_style())));
            }
        }
        out.push(Line::raw(""));
    }

    fn build(&self, width: u16) -> FormLines<'_> {
        let mut out = FormLines {
            lines: Vec::new(),
            focus_start: 0,
            focus_end: 0,
        };
        let draft = &self.form.draft;
        self.text_input(&mut out, "Name", "Enter the name of the product.", FormFocus::Name, draft.name());
        self.text_input(
            &mut out,
            "Short Description",
            "Enter the short description of the product.",
            FormFocus::ShortDescription,
            draft.short_description(),
        );
        self.text_input(
            &mut out,
            "Description",
            "Enter the description of the product.",
            FormFocus::Description,
            draft.description(),
        );
        self.text_input(&mut out, "Price", "Enter the price of the product.", FormFocus::Price, draft.price());
        self.category(&mut out);
        self.sizes(&mut out, width);
        self.colors(&mut out, width);

        let start = out.lines.len();
        let style = if self.focused(FormFocus::Submit) {
            Theme::primary_button_style().patch(Theme::cursor_style())
        } else {
            Theme::primary_button_style()
        };
        out.push(Line::from(vec![Span::raw("  "), Span::styled(" Submit ", style)]));
        if self.focused(FormFocus::Submit) {
            out.mark_focus(start);
        }
        out
    }

    fn focused_thumbnail(&self) -> Option<&image::RgbaImage> {
        let FormFocus::Image(color) = self.form.focus else {
            return None;
        };
        let image = self.form.draft.images().get(&color)?;
        self.thumbnails.get(&image.path).map(|t| t.as_ref())
    }
}

impl Widget for AddProductForm<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        Clear.render(area, buf);
        let block = Block::default()
            .title(" Add Product ")
            .title_style(Theme::title_style())
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Theme::border_style());
        let inner = block.inner(area);
        block.render(area, buf);
        if inner.height == 0 || inner.width == 0 {
            return;
        }

        let out = self.build(inner.width);
        let height = inner.height as usize;
        let offset = if out.focus_end > height {
            out.focus_end - height
        } else {
            0
        }
        .min(out.focus_start);
        Paragraph::new(out.lines)
            .scroll((offset as u16, 0))
            .render(inner, buf);

        if let Some(thumb) = self.focused_thumbnail() {
            if inner.width >= PREVIEW_WIDTH * 2 && inner.height >= PREVIEW_HEIGHT {
                let preview = Rect::new(
                    inner.x + inner.width - PREVIEW_WIDTH,
                    inner.y + inner.height - PREVIEW_HEIGHT,
                    PREVIEW_WIDTH,
                    PREVIEW_HEIGHT,
                );
                Clear.render(preview, buf);
                let frame = Block::default()
                    .title(" Preview ")
                    .borders(Borders::ALL)
                    .border_style(Theme::dim_style());
                let canvas = frame.inner(preview);
                frame.render(preview, buf);
                render_image_halfblocks(thumb, canvas, buf);
            }
        }
    }
}

/// Draw `thumb` with `▀` cells: foreground is the upper pixel, background
/// the lower one, so each cell carries two rows.
fn render_image_halfblocks(thumb: &image::RgbaImage, area: Rect, buf: &mut Buffer) {
    use image::imageops::FilterType;
    use ratatui::layout::Position;

    if area.width == 0 || area.height == 0 || thumb.width() == 0 || thumb.height() == 0 {
        return;
    }

    let max_px_w = area.width as f64;
    let max_px_h = (area.height as f64) * 2.0;
    let src_w = thumb.width() as f64;
    let src_h = thumb.height() as f64;

    let scale = (max_px_w / src_w).min(max_px_h / src_h).min(1.0);
    let fit_w = (src_w * scale).round().max(1.0) as u32;
    let fit_h = (src_h * scale).round().max(1.0) as u32;

    let rgba = image::imageops::resize(thumb, fit_w, fit_h, FilterType::Triangle);
    let (iw, ih) = (rgba.width(), rgba.height());
    let col_offset = (area.width.saturating_sub(iw as u16)) / 2;
    let row_offset = (area.height.saturating_sub(ih.div_ceil(2) as u16)) / 2;

    for row in 0..area.height - row_offset {
        let yt = (row as u32) * 2;
        let yb = yt + 1;
        if yt >= ih {
            break;
        }
        for col in 0..iw.min(area.width as u32) {
            let t = rgba.get_pixel(col, yt);
            let fg = Color::Rgb(t[0], t[1], t[2]);
            let bg = if yb < ih {
                let b = rgba.get_pixel(col, yb);
                Color::Rgb(b[0], b[1], b[2])
            } else {
                Color::Reset
            };
            let pos = Position::new(area.x + col_offset + col as u16, area.y + row_offset + row);
            if let Some(cell) = buf.cell_mut(pos) {
                cell.set_char('▀').set_fg(fg).set_bg(bg);
            }
        }
    }
}
