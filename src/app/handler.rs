//! Input handling: translates key / mouse events into state changes.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};
use tracing::{debug, info, warn};

use super::settings::SETTINGS_ITEMS;
use super::state::{ActiveView, AppState, FormFocus, FormState, ImagePicker};
use crate::config::{Action, KeyBind};
use crate::core::{
    catalog::{Category, Color, Size},
    form::FormAction,
    image, product,
    table::{DeleteOutcome, SortDirection},
};
use crate::ui::{
    layout::AppLayout,
    table_widget::{TableGeometry, CHECKBOX_WIDTH},
};

/// How deep the image picker looks below the image root.
const PICKER_DEPTH: usize = 4;
/// Most candidates the picker lists.
const PICKER_LIMIT: usize = 500;

/// Number of items in the controls submenu (actions + reset).
pub fn controls_item_count() -> usize {
    Action::ALL.len() + 1
}

/// Process a key event and mutate state accordingly.
pub fn handle_key(state: &mut AppState, key: KeyEvent) {
    // Ctrl+C always quits, whatever is focused.
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        state.should_quit = true;
        return;
    }

    if state.awaiting_rebind {
        handle_rebind_key(state, key);
        return;
    }

    match state.active_view {
        ActiveView::Products => handle_table_key(state, key),
        ActiveView::AddProduct if state.form.picker.is_some() => handle_picker_key(state, key),
        ActiveView::AddProduct => handle_form_key(state, key),
        ActiveView::SettingsMenu => handle_settings_key(state, key),
        ActiveView::ControlsSubmenu => handle_controls_key(state, key),
    }
}

/// Pasted text goes into the focused text input.
pub fn handle_paste(state: &mut AppState, text: &str) {
    if state.active_view != ActiveView::AddProduct || state.form.picker.is_some() {
        return;
    }
    let Some((mut value, set)) = focused_text(&state.form) else {
        return;
    };
    if state.form.focus == FormFocus::Description {
        value.push_str(text);
    } else {
        value.extend(text.chars().filter(|c| *c != '\n' && *c != '\r'));
    }
    apply_form_action(state, set(value));
}

// ── Products table ──────────────────────────────────────────────

fn handle_table_key(state: &mut AppState, key: KeyEvent) {
    let Some(action) = state.config.match_key(key) else {
        match key.code {
            KeyCode::Home => {
                state.table.first_page();
                state.clamp_cursor();
            }
            KeyCode::End => {
                state.table.last_page();
                state.clamp_cursor();
            }
            KeyCode::Esc if state.table.has_selection() => {
                state.table.clear_selection();
                state.status_message = Some("Selection cleared".into());
            }
            _ => {}
        }
        return;
    };

    state.status_message = None;
    match action {
        Action::MoveUp => state.cursor.row = state.cursor.row.saturating_sub(1),
        Action::MoveDown => {
            if state.cursor.row + 1 < state.page_len() {
                state.cursor.row += 1;
            }
        }
        Action::PrevColumn => state.cursor.column = state.cursor.column.saturating_sub(1),
        Action::NextColumn => {
            if state.cursor.column + 1 < state.table.columns().len() {
                state.cursor.column += 1;
            }
        }
        Action::SortColumn => sort_column(state, state.cursor.column),
        Action::ToggleRow => toggle_cursor_row(state),
        Action::TogglePage => state.table.toggle_page(),
        Action::PrevPage => {
            state.table.previous_page();
            state.clamp_cursor();
        }
        Action::NextPage => {
            state.table.next_page();
            state.clamp_cursor();
        }
        Action::DeleteSelected => delete_selected(state),
        Action::AddProduct => state.open_form(),
        Action::Reload => reload_catalog(state),
        Action::OpenSettings => {
            state.active_view = ActiveView::SettingsMenu;
            state.settings_selected = 0;
        }
        Action::Quit => state.should_quit = true,
    }
}

/// Re-read the catalog file.  Selection resets with the new data.
fn reload_catalog(state: &mut AppState) {
    let Some(path) = state.deleter.path().map(|p| p.to_path_buf()) else {
        state.status_message = Some("No catalog file to reload".into());
        return;
    };
    match product::load_catalog(&path) {
        Ok(products) => {
            let count = products.len();
            state.table.replace_data(products);
            state.clamp_cursor();
            info!(path = %path.display(), rows = count, "catalog reloaded");
            state.status_message = Some(format!("Reloaded {count} product(s)"));
        }
        Err(err) => {
            warn!(error = %err, "catalog reload failed");
            state.status_message = Some(format!("Reload failed: {err}"));
        }
    }
}

fn sort_column(state: &mut AppState, column: usize) {
    let Some(col) = state.table.columns().get(column) else {
        return;
    };
    let header = col.header;
    if !col.sortable {
        state.status_message = Some(format!("{header} cannot be sorted"));
        return;
    }
    state.table.toggle_sort(column);
    state.cursor.row = 0;
    state.status_message = Some(match state.table.sort() {
        Some(sort) => {
            let arrow = match sort.direction {
                SortDirection::Ascending => "↑",
                SortDirection::Descending => "↓",
            };
            format!("Sorted by {header} {arrow}")
        }
        None => "Sort cleared".into(),
    });
}

fn toggle_cursor_row(state: &mut AppState) {
    let Some(index) = state.cursor_row_index() else {
        return;
    };
    if let Some(id) = state.table.row(index).map(|p| p.id) {
        state.table.toggle_row(&id);
    }
}

fn delete_selected(state: &mut AppState) {
    let outcome = state.table.delete_selected(Some(&mut state.deleter));
    state.status_message = Some(match outcome {
        DeleteOutcome::Inert => "Deleting is not available".into(),
        DeleteOutcome::NothingSelected => "Select products to delete first".into(),
        DeleteOutcome::Deleted(ids) => {
            info!(?ids, "deleted products");
            format!("Deleted {} product(s)", ids.len())
        }
        DeleteOutcome::Partial { deleted, failed } => {
            warn!(?deleted, ?failed, "partial delete");
            let failed_ids: Vec<String> = failed.iter().map(|(id, _)| id.to_string()).collect();
            format!(
                "Deleted {} product(s); {} could not be deleted ({})",
                deleted.len(),
                failed.len(),
                failed_ids.join(", ")
            )
        }
        DeleteOutcome::Failed(msg) => {
            warn!(error = %msg, "delete failed");
            format!("Delete failed: {msg}")
        }
    });
    state.clamp_cursor();
}

// ── Add-product form ────────────────────────────────────────────

fn handle_form_key(state: &mut AppState, key: KeyEvent) {
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        if key.code == KeyCode::Char('s') {
            submit_form(state);
        }
        return;
    }

    match key.code {
        KeyCode::Esc => {
            state.form = FormState::default();
            state.thumbnails.clear();
            state.active_view = ActiveView::Products;
            state.status_message = Some("New product discarded".into());
        }
        KeyCode::Tab | KeyCode::Down => state.form.focus_next(),
        KeyCode::BackTab | KeyCode::Up => state.form.focus_prev(),
        _ => edit_focused(state, key),
    }
}

type Setter = fn(String) -> FormAction;

/// Current value and setter of the focused text input.
fn focused_text(form: &FormState) -> Option<(String, Setter)> {
    let draft = &form.draft;
    let (value, set) = match form.focus {
        FormFocus::Name => (draft.name(), FormAction::SetName as Setter),
        FormFocus::ShortDescription => {
            (draft.short_description(), FormAction::SetShortDescription as Setter)
        }
        FormFocus::Description => (draft.description(), FormAction::SetDescription as Setter),
        FormFocus::Price => (draft.price(), FormAction::SetPrice as Setter),
        _ => return None,
    };
    Some((value.to_string(), set))
}

fn edit_focused(state: &mut AppState, key: KeyEvent) {
    if let Some((mut value, set)) = focused_text(&state.form) {
        match key.code {
            KeyCode::Char(c) => {
                if state.form.focus == FormFocus::Price
                    && !(c.is_ascii_digit() || c == '.' || c == '-')
                {
                    return;
                }
                value.push(c);
            }
            KeyCode::Backspace => {
                if value.pop().is_none() {
                    return;
                }
            }
            KeyCode::Enter if state.form.focus == FormFocus::Description => value.push('\n'),
            KeyCode::Enter => {
                state.form.focus_next();
                return;
            }
            _ => return,
        }
        apply_form_action(state, set(value));
        return;
    }

    match (state.form.focus, key.code) {
        (FormFocus::Category, KeyCode::Left) => cycle_category(state, -1),
        (FormFocus::Category, KeyCode::Right | KeyCode::Char(' ')) => cycle_category(state, 1),
        (FormFocus::Category, KeyCode::Enter) => state.form.focus_next(),

        (FormFocus::Sizes, KeyCode::Left) => {
            state.form.size_cursor = step(state.form.size_cursor, -1, Size::ALL.len());
        }
        (FormFocus::Sizes, KeyCode::Right) => {
            state.form.size_cursor = step(state.form.size_cursor, 1, Size::ALL.len());
        }
        (FormFocus::Sizes, KeyCode::Char(' ') | KeyCode::Enter) => {
            let action = state.form.draft.toggle_size(state.form.cursor_size());
            apply_form_action(state, action);
        }

        (FormFocus::Colors, KeyCode::Left) => {
            state.form.color_cursor = step(state.form.color_cursor, -1, Color::ALL.len());
        }
        (FormFocus::Colors, KeyCode::Right) => {
            state.form.color_cursor = step(state.form.color_cursor, 1, Color::ALL.len());
        }
        (FormFocus::Colors, KeyCode::Char(' ') | KeyCode::Enter) => {
            let action = state.form.draft.toggle_color(state.form.cursor_color());
            apply_form_action(state, action);
        }

        (FormFocus::Image(color), KeyCode::Enter | KeyCode::Char(' ')) => open_picker(state, color),
        (FormFocus::Image(color), KeyCode::Delete | KeyCode::Backspace) => {
            apply_form_action(state, FormAction::DetachImage(color));
        }

        (FormFocus::Submit, KeyCode::Enter | KeyCode::Char(' ')) => submit_form(state),
        _ => {}
    }
}

fn step(index: usize, delta: isize, len: usize) -> usize {
    (index as isize + delta).rem_euclid(len as isize) as usize
}

fn cycle_category(state: &mut AppState, delta: isize) {
    let len = Category::ALL.len();
    let next = match state.form.category() {
        Some(current) => step(current.index(), delta, len),
        None if delta < 0 => len - 1,
        None => 0,
    };
    let token = Category::ALL[next].as_str().to_string();
    apply_form_action(state, FormAction::SetCategory(token));
}

/// Apply one draft edit, then keep focus, previews and any shown errors in
/// step with the new draft.  Returns `false` when the edit was refused.
fn apply_form_action(state: &mut AppState, action: FormAction) -> bool {
    if let Err(err) = state.form.draft.apply(action) {
        state.status_message = Some(err.message);
        return false;
    }
    state.form.ensure_focus_valid();
    state.prune_thumbnails();
    if state.form.errors.is_some() {
        state.form.errors = state.schema().validate(&state.form.draft).err();
    }
    true
}

fn submit_form(state: &mut AppState) {
    match state.schema().validate(&state.form.draft) {
        Ok(product) => match state.submitter.submit(&product) {
            Ok(()) => {
                info!(name = %product.name, "product submitted");
                state.status_message = Some(format!("Product \"{}\" submitted", product.name));
                state.form = FormState::default();
                state.thumbnails.clear();
                state.active_view = ActiveView::Products;
            }
            Err(err) => {
                warn!(error = %err, "submit failed");
                state.status_message = Some(format!("Submit failed: {err}"));
            }
        },
        Err(errors) => {
            debug!(%errors, "submit blocked by validation");
            state.status_message = Some(format!("{} field(s) need attention", errors.len()));
            state.form.errors = Some(errors);
            state.form.focus_first_error();
        }
    }
}

// ── Image picker ────────────────────────────────────────────────

fn open_picker(state: &mut AppState, color: Color) {
    let candidates = image::find_candidates(&state.image_root, PICKER_DEPTH, PICKER_LIMIT);
    let current = state.form.draft.images().get(&color).map(|img| img.path.clone());
    let selected = current
        .and_then(|p| candidates.iter().position(|c| *c == p))
        .unwrap_or(0);
    debug!(%color, count = candidates.len(), "image picker opened");
    state.form.picker = Some(ImagePicker {
        color,
        candidates,
        selected,
        error: None,
    });
}

fn handle_picker_key(state: &mut AppState, key: KeyEvent) {
    let Some(picker) = state.form.picker.as_mut() else {
        return;
    };
    match key.code {
        KeyCode::Esc => state.form.picker = None,
        KeyCode::Up | KeyCode::Char('k') => picker.selected = picker.selected.saturating_sub(1),
        KeyCode::Down | KeyCode::Char('j') => {
            if picker.selected + 1 < picker.candidates.len() {
                picker.selected += 1;
            }
        }
        KeyCode::Home => picker.selected = 0,
        KeyCode::End => picker.selected = picker.candidates.len().saturating_sub(1),
        KeyCode::Enter => attach_picked(state),
        _ => {}
    }
}

fn attach_picked(state: &mut AppState) {
    let Some(picker) = &state.form.picker else {
        return;
    };
    let color = picker.color;
    let Some(path) = picker.selected_path().cloned() else {
        return;
    };

    let picked = match image::probe(&path) {
        Ok(picked) => picked,
        Err(err) => {
            warn!(error = %err, "image refused");
            if let Some(picker) = state.form.picker.as_mut() {
                picker.error = Some(err.to_string());
            }
            return;
        }
    };
    let label = picked.label();
    let action = FormAction::AttachImage {
        color,
        image: picked,
    };
    if apply_form_action(state, action) {
        state.form.picker = None;
        state.pending_thumbnails.push(path);
        state.status_message = Some(format!("Attached {label} for {color}"));
    } else if let Some(picker) = state.form.picker.as_mut() {
        picker.error = state.status_message.take();
    }
}

// ── Settings menu ───────────────────────────────────────────────

fn handle_settings_key(state: &mut AppState, key: KeyEvent) {
    match key.code {
        KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('?') => {
            state.active_view = ActiveView::Products;
        }
        KeyCode::Up | KeyCode::Char('k') => {
            state.settings_selected = state.settings_selected.saturating_sub(1);
        }
        KeyCode::Down | KeyCode::Char('j') => {
            if state.settings_selected + 1 < SETTINGS_ITEMS.len() {
                state.settings_selected += 1;
            }
        }
        KeyCode::Enter | KeyCode::Right | KeyCode::Char('l') | KeyCode::Char(' ') => {
            if let Some(item) = SETTINGS_ITEMS.get(state.settings_selected) {
                item.activate(state);
            }
        }
        _ => {}
    }
}

// ── Controls submenu (interactive rebinding) ────────────────────

fn handle_controls_key(state: &mut AppState, key: KeyEvent) {
    let item_count = controls_item_count();

    match key.code {
        KeyCode::Esc | KeyCode::Char('q') => {
            state.active_view = ActiveView::Products;
        }
        KeyCode::Left | KeyCode::Char('h') => {
            state.active_view = ActiveView::SettingsMenu;
        }
        KeyCode::Up | KeyCode::Char('k') => {
            state.controls_selected = state.controls_selected.saturating_sub(1);
        }
        KeyCode::Down | KeyCode::Char('j') => {
            if state.controls_selected + 1 < item_count {
                state.controls_selected += 1;
            }
        }
        KeyCode::Enter => {
            if state.controls_selected < Action::ALL.len() {
                state.awaiting_rebind = true;
            } else {
                state.config.reset_defaults();
                state.persist_config();
            }
        }
        KeyCode::Delete | KeyCode::Backspace => {
            if let Some(&action) = Action::ALL.get(state.controls_selected) {
                state.config.clear_bindings(action);
                state.persist_config();
            }
        }
        _ => {}
    }
}

/// Capture the next key press as a new binding.
fn handle_rebind_key(state: &mut AppState, key: KeyEvent) {
    if key.code == KeyCode::Esc {
        state.awaiting_rebind = false;
        return;
    }

    let Some(&action) = Action::ALL.get(state.controls_selected) else {
        state.awaiting_rebind = false;
        return;
    };
    state.config.add_binding(action, KeyBind::from_key_event(key));
    state.persist_config();
    state.awaiting_rebind = false;
}

// ── Mouse ───────────────────────────────────────────────────────

/// Process a mouse event.
pub fn handle_mouse(state: &mut AppState, mouse: MouseEvent) {
    match state.active_view {
        ActiveView::Products => handle_table_mouse(state, mouse),
        ActiveView::AddProduct => {
            if let Some(picker) = state.form.picker.as_mut() {
                match mouse.kind {
                    MouseEventKind::ScrollUp => picker.selected = picker.selected.saturating_sub(1),
                    MouseEventKind::ScrollDown if picker.selected + 1 < picker.candidates.len() => {
                        picker.selected += 1;
                    }
                    _ => {}
                }
            }
        }
        ActiveView::SettingsMenu | ActiveView::ControlsSubmenu => {}
    }
}

fn table_geometry(state: &AppState) -> TableGeometry {
    let layout = AppLayout::from_area(state.terminal_area);
    let widths: Vec<u16> = state.table.columns().iter().map(|c| c.width).collect();
    TableGeometry::compute(layout.table_area, state.table.has_selection(), &widths)
}

fn handle_table_mouse(state: &mut AppState, mouse: MouseEvent) {
    let (col, row) = (mouse.column, mouse.row);
    match mouse.kind {
        MouseEventKind::Down(MouseButton::Left) => {
            let geom = table_geometry(state);
            if geom.on_delete_button(col, row) {
                delete_selected(state);
            } else if geom.on_header_checkbox(col, row) {
                state.table.toggle_page();
            } else if let Some(column) = geom.header_column_at(col, row) {
                state.cursor.column = column;
                sort_column(state, column);
            } else if let Some(line) = geom.body_line_at(col, row) {
                let page_row = line + geom.row_offset(state.cursor.row);
                if page_row < state.page_len() {
                    state.cursor.row = page_row;
                    if col < geom.body.x + CHECKBOX_WIDTH {
                        toggle_cursor_row(state);
                    }
                }
            } else if geom.on_prev_button(col, row) {
                state.table.previous_page();
                state.clamp_cursor();
            } else if geom.on_next_button(col, row) {
                state.table.next_page();
                state.clamp_cursor();
            }
        }
        MouseEventKind::ScrollUp => state.cursor.row = state.cursor.row.saturating_sub(1),
        MouseEventKind::ScrollDown => {
            if state.cursor.row + 1 < state.page_len() {
                state.cursor.row += 1;
            }
        }
        _ => {}
    }
}
