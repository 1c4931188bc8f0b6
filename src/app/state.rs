//! Central application state.
//!
//! All mutable state lives here so that the rest of the app can be pure
//! functions over `&AppState` (rendering) or `&mut AppState` (event handling).

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use ratatui::layout::Rect;
use tracing::warn;

use crate::config::{AppConfig, PAGE_SIZE_RANGE};
use crate::core::{
    catalog::{Category, Color, Size},
    form::ProductDraft,
    product::{self, CatalogDeleter, Product},
    submit::SubmitHandler,
    table::DataTable,
    validation::{Field, ProductSchema, ValidationErrors},
};

/// Which view / overlay is currently active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ActiveView {
    #[default]
    Products,
    AddProduct,
    SettingsMenu,
    ControlsSubmenu,
}

// ───────────────────────────────────────── table ─────────────

/// Keyboard cursor inside the visible page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TableCursor {
    /// Row offset within the current page.
    pub row: usize,
    /// Column index into the table's column list.
    pub column: usize,
}

// ───────────────────────────────────────── form ──────────────

/// Focusable element of the add-product form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormFocus {
    Name,
    ShortDescription,
    Description,
    Price,
    Category,
    Sizes,
    Colors,
    Image(Color),
    Submit,
}

impl FormFocus {
    /// The schema field whose error is shown next to this element.
    pub fn field(self) -> Option<Field> {
        Some(match self {
            FormFocus::Name => Field::Name,
            FormFocus::ShortDescription => Field::ShortDescription,
            FormFocus::Description => Field::Description,
            FormFocus::Price => Field::Price,
            FormFocus::Category => Field::Category,
            FormFocus::Sizes => Field::Sizes,
            FormFocus::Colors => Field::Colors,
            FormFocus::Image(_) => Field::Images,
            FormFocus::Submit => return None,
        })
    }

    fn for_field(field: Field, draft: &ProductDraft) -> Self {
        match field {
            Field::Name => FormFocus::Name,
            Field::ShortDescription => FormFocus::ShortDescription,
            Field::Description => FormFocus::Description,
            Field::Price => FormFocus::Price,
            Field::Category => FormFocus::Category,
            Field::Sizes => FormFocus::Sizes,
            Field::Colors => FormFocus::Colors,
            Field::Images => draft
                .image_slots()
                .find(|(_, img)| img.is_none())
                .map(|(c, _)| FormFocus::Image(c))
                .unwrap_or(FormFocus::Colors),
        }
    }
}

/// File chooser for one color's upload slot.
#[derive(Debug, Clone, PartialEq)]
pub struct ImagePicker {
    pub color: Color,
    pub candidates: Vec<PathBuf>,
    pub selected: usize,
    /// Why the last pick was refused, if it was.
    pub error: Option<String>,
}

impl ImagePicker {
    pub fn selected_path(&self) -> Option<&PathBuf> {
        self.candidates.get(self.selected)
    }
}

/// Add-product form: the draft plus everything needed to edit it.
#[derive(Debug, Clone)]
pub struct FormState {
    pub draft: ProductDraft,
    pub focus: FormFocus,
    /// Highlighted checkbox in the size grid.
    pub size_cursor: usize,
    /// Highlighted checkbox in the color grid.
    pub color_cursor: usize,
    /// Set by the first submit attempt; re-validated on every edit after.
    pub errors: Option<ValidationErrors>,
    pub picker: Option<ImagePicker>,
}

impl Default for FormState {
    fn default() -> Self {
        Self {
            draft: ProductDraft::new(),
            focus: FormFocus::Name,
            size_cursor: 0,
            color_cursor: 0,
            errors: None,
            picker: None,
        }
    }
}

impl FormState {
    /// Focus order: fixed fields, one slot per selected color, then submit.
    pub fn focus_order(&self) -> Vec<FormFocus> {
        let mut order = vec![
            FormFocus::Name,
            FormFocus::ShortDescription,
            FormFocus::Description,
            FormFocus::Price,
            FormFocus::Category,
            FormFocus::Sizes,
            FormFocus::Colors,
        ];
        order.extend(self.draft.image_slots().map(|(c, _)| FormFocus::Image(c)));
        order.push(FormFocus::Submit);
        order
    }

    pub fn focus_next(&mut self) {
        self.step_focus(1);
    }

    pub fn focus_prev(&mut self) {
        self.step_focus(-1);
    }

    fn step_focus(&mut self, delta: isize) {
        let order = self.focus_order();
        let pos = order.iter().position(|f| *f == self.focus).unwrap_or(0) as isize;
        let len = order.len() as isize;
        self.focus = order[(pos + delta).rem_euclid(len) as usize];
    }

    /// Keep focus valid after an image slot disappeared.
    pub fn ensure_focus_valid(&mut self) {
        if let FormFocus::Image(color) = self.focus {
            if !self.draft.colors().contains(&color) {
                self.focus = FormFocus::Colors;
            }
        }
    }

    /// Move focus to the first invalid field.
    pub fn focus_first_error(&mut self) {
        if let Some(field) = self.errors.as_ref().and_then(|e| e.first_field()) {
            self.focus = FormFocus::for_field(field, &self.draft);
        }
    }

    pub fn error_for(&self, field: Field) -> Option<&str> {
        self.errors
            .as_ref()
            .and_then(|e| e.get(field))
            .map(|e| e.message.as_str())
    }

    /// Category currently shown in the selector, if the token is valid.
    pub fn category(&self) -> Option<Category> {
        self.draft.category().and_then(|t| Category::parse(t).ok())
    }

    pub fn cursor_size(&self) -> Size {
        Size::ALL[self.size_cursor.min(Size::ALL.len() - 1)]
    }

    pub fn cursor_color(&self) -> Color {
        Color::ALL[self.color_cursor.min(Color::ALL.len() - 1)]
    }
}

// ───────────────────────────────────────── app ───────────────

/// Top-level application state.
pub struct AppState {
    /// Product catalog and its sort/page/selection state.
    pub table: DataTable<Product>,
    pub cursor: TableCursor,
    /// Backs the bulk-delete affordance.
    pub deleter: CatalogDeleter,
    pub form: FormState,
    /// Receives validated products.
    pub submitter: Box<dyn SubmitHandler>,
    /// Directory the image picker lists candidates from.
    pub image_root: PathBuf,
    /// Decoded previews keyed by image path.
    pub thumbnails: HashMap<PathBuf, Arc<image::RgbaImage>>,
    /// Previews requested by handlers, drained by the main loop.
    pub pending_thumbnails: Vec<PathBuf>,
    /// Controls the main event loop.
    pub should_quit: bool,
    /// An optional status message shown in the bottom bar.
    pub status_message: Option<String>,
    /// Which view / overlay is currently shown.
    pub active_view: ActiveView,
    /// User-configurable keybindings and settings.
    pub config: AppConfig,
    /// Where settings changes are persisted; `None` keeps them in memory.
    pub config_path: Option<PathBuf>,
    /// Currently highlighted item in the settings menu.
    pub settings_selected: usize,
    /// Currently highlighted item in the controls submenu.
    pub controls_selected: usize,
    /// When `true`, the controls submenu is waiting for the user to press
    /// a key to rebind the action at `controls_selected`.
    pub awaiting_rebind: bool,
    /// Full terminal area from the last draw, for mouse hit-testing.
    pub terminal_area: Rect,
}

impl AppState {
    pub fn new(
        products: Vec<Product>,
        config: AppConfig,
        deleter: CatalogDeleter,
        submitter: Box<dyn SubmitHandler>,
    ) -> Self {
        let mut table = DataTable::new(product::columns(), products);
        table.set_page_size(config.page_size);
        Self {
            table,
            cursor: TableCursor::default(),
            deleter,
            form: FormState::default(),
            submitter,
            image_root: PathBuf::from("."),
            thumbnails: HashMap::new(),
            pending_thumbnails: Vec::new(),
            should_quit: false,
            status_message: None,
            active_view: ActiveView::default(),
            config,
            config_path: None,
            settings_selected: 0,
            controls_selected: 0,
            awaiting_rebind: false,
            terminal_area: Rect::default(),
        }
    }

    pub fn schema(&self) -> ProductSchema {
        ProductSchema::new(self.config.image_coverage)
    }

    /// Number of rows on the visible page.
    pub fn page_len(&self) -> usize {
        self.table.page_indices().len()
    }

    /// Dataset index of the row under the cursor.
    pub fn cursor_row_index(&self) -> Option<usize> {
        self.table.page_indices().get(self.cursor.row).copied()
    }

    /// Pull the cursor back inside the visible page.
    pub fn clamp_cursor(&mut self) {
        let len = self.page_len();
        self.cursor.row = self.cursor.row.min(len.saturating_sub(1));
        let cols = self.table.columns().len();
        self.cursor.column = self.cursor.column.min(cols.saturating_sub(1));
    }

    /// Override rows per page for this run only.  The config keeps its own
    /// value, so later settings changes never persist the override.
    pub fn set_session_page_size(&mut self, page_size: usize) {
        let n = page_size.clamp(*PAGE_SIZE_RANGE.start(), *PAGE_SIZE_RANGE.end());
        self.table.set_page_size(n);
        self.clamp_cursor();
    }

    /// Write the config back if a path is attached.
    pub fn persist_config(&mut self) {
        let Some(path) = self.config_path.as_deref() else {
            return;
        };
        if let Err(err) = self.config.save_to(path) {
            warn!(error = %err, "failed to save config");
            self.status_message = Some(format!("Could not save settings: {err}"));
        }
    }

    /// Open the add-product form on an empty draft.
    pub fn open_form(&mut self) {
        self.form = FormState::default();
        self.active_view = ActiveView::AddProduct;
        self.status_message = None;
    }

    /// Drop previews no longer referenced by the draft.
    pub fn prune_thumbnails(&mut self) {
        let images = self.form.draft.images();
        self.thumbnails
            .retain(|path, _| images.values().any(|img| &img.path == path));
    }
}
