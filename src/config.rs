//! User configuration: keybindings, table and form settings, persistence.
//!
//! Settings are stored as a simple key-value text file at
//! `$XDG_CONFIG_HOME/product-admin/config.toml`
//! (default `~/.config/product-admin/config.toml`).

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::core::table::DEFAULT_PAGE_SIZE;
use crate::core::validation::ImageCoverage;

// ───────────────────────────────────────── actions ───────────

/// All configurable user actions in the products table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    MoveUp,
    MoveDown,
    PrevColumn,
    NextColumn,
    SortColumn,
    ToggleRow,
    TogglePage,
    PrevPage,
    NextPage,
    DeleteSelected,
    AddProduct,
    Reload,
    OpenSettings,
    Quit,
}

impl Action {
    /// Ordered list of all actions (used for the controls menu).
    pub const ALL: &[Action] = &[
        Action::MoveUp,
        Action::MoveDown,
        Action::PrevColumn,
        Action::NextColumn,
        Action::SortColumn,
        Action::ToggleRow,
        Action::TogglePage,
        Action::PrevPage,
        Action::NextPage,
        Action::DeleteSelected,
        Action::AddProduct,
        Action::Reload,
        Action::OpenSettings,
        Action::Quit,
    ];

    /// Human-readable label for the UI.
    pub fn label(self) -> &'static str {
        match self {
            Action::MoveUp => "Move Up",
            Action::MoveDown => "Move Down",
            Action::PrevColumn => "Previous Column",
            Action::NextColumn => "Next Column",
            Action::SortColumn => "Sort Column",
            Action::ToggleRow => "Select Row",
            Action::TogglePage => "Select Page",
            Action::PrevPage => "Previous Page",
            Action::NextPage => "Next Page",
            Action::DeleteSelected => "Delete Selected",
            Action::AddProduct => "Add Product",
            Action::Reload => "Reload Catalog",
            Action::OpenSettings => "Open Settings",
            Action::Quit => "Quit",
        }
    }

    /// Key used in the config file.
    fn config_key(self) -> &'static str {
        match self {
            Action::MoveUp => "move_up",
            Action::MoveDown => "move_down",
            Action::PrevColumn => "prev_column",
            Action::NextColumn => "next_column",
            Action::SortColumn => "sort_column",
            Action::ToggleRow => "toggle_row",
            Action::TogglePage => "toggle_page",
            Action::PrevPage => "prev_page",
            Action::NextPage => "next_page",
            Action::DeleteSelected => "delete_selected",
            Action::AddProduct => "add_product",
            Action::Reload => "reload",
            Action::OpenSettings => "open_settings",
            Action::Quit => "quit",
        }
    }

    fn from_config_key(s: &str) -> Option<Self> {
        Action::ALL.iter().copied().find(|a| a.config_key() == s)
    }
}

// ───────────────────────────────────────── key bind ──────────

/// A single key binding: key code + modifier combination.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct KeyBind {
    pub code: KeyCode,
    pub modifiers: KeyModifiers,
}

impl KeyBind {
    pub fn new(code: KeyCode, modifiers: KeyModifiers) -> Self {
        Self { code, modifiers }
    }

    /// Does this binding match a key event?  Only CTRL/ALT/SHIFT modifiers
    /// are compared (platform-specific modifiers like SUPER are ignored).
    /// SHIFT is already folded into printable characters (`?`, `A`), so it
    /// is not compared for them.
    pub fn matches(&self, event: KeyEvent) -> bool {
        let mask = match self.code {
            KeyCode::Char(_) => KeyModifiers::CONTROL | KeyModifiers::ALT,
            _ => KeyModifiers::CONTROL | KeyModifiers::ALT | KeyModifiers::SHIFT,
        };
        self.code == event.code && (self.modifiers & mask) == (event.modifiers & mask)
    }

    /// Create a binding from a raw key event (used during rebinding).
    pub fn from_key_event(event: KeyEvent) -> Self {
        let mask = KeyModifiers::CONTROL | KeyModifiers::ALT | KeyModifiers::SHIFT;
        Self {
            code: event.code,
            modifiers: event.modifiers & mask,
        }
    }

    /// User-friendly display string (e.g. `"Alt+↑"`, `"Ctrl+c"`, `"q"`).
    pub fn display(&self) -> String {
        self.render(|&(_, _, label)| label)
    }

    /// Serialise to config-file format (e.g. `"Alt+Up"`, `"Ctrl+c"`, `"q"`).
    fn to_config_string(&self) -> String {
        self.render(|&(_, name, _)| name)
    }

    fn render(&self, pick: impl Fn(&(KeyCode, &'static str, &'static str)) -> &'static str) -> String {
        let mut s = String::new();
        for (flag, prefix) in MODIFIER_PREFIXES {
            if self.modifiers.contains(*flag) {
                s.push_str(prefix);
                s.push('+');
            }
        }
        match NAMED_KEYS.iter().find(|(code, _, _)| *code == self.code) {
            Some(entry) => s.push_str(pick(entry)),
            None => match self.code {
                KeyCode::Char(c) => s.push(c),
                KeyCode::F(n) => s.push_str(&format!("F{n}")),
                other => s.push_str(&format!("{other:?}")),
            },
        }
        s
    }

    /// Parse a key string like `"Ctrl+c"`, `"Alt+Up"`, `"q"`, `"PgDn"`.
    /// Named keys accept their config name, their on-screen label, or a
    /// common alias, in any case.
    fn parse(s: &str) -> Option<Self> {
        let (mods, key) = match s.rsplit_once('+') {
            // A bare "+" or a trailing "Ctrl++" names the plus key itself.
            Some((mods, "")) => (mods.strip_suffix('+').unwrap_or(mods), "+"),
            Some(split) => split,
            None => ("", s),
        };

        let mut modifiers = KeyModifiers::NONE;
        for part in mods.split('+').filter(|p| !p.is_empty()) {
            let (flag, _) = MODIFIER_PREFIXES
                .iter()
                .find(|(_, prefix)| prefix.eq_ignore_ascii_case(part))?;
            modifiers |= *flag;
        }

        let lower = key.to_ascii_lowercase();
        let alias = KEY_ALIASES
            .iter()
            .find(|(a, _)| *a == lower)
            .map(|(_, code)| *code);
        let named = NAMED_KEYS
            .iter()
            .find(|(_, name, label)| name.eq_ignore_ascii_case(key) || label.eq_ignore_ascii_case(key))
            .map(|(code, _, _)| *code);

        let code = match (alias.or(named), key.chars().count()) {
            (Some(code), _) => code,
            (None, 1) => KeyCode::Char(key.chars().next()?),
            (None, _) => {
                let n: u8 = lower.strip_prefix('f')?.parse().ok()?;
                KeyCode::F(n)
            }
        };

        Some(KeyBind { code, modifiers })
    }
}

const MODIFIER_PREFIXES: &[(KeyModifiers, &str)] = &[
    (KeyModifiers::CONTROL, "Ctrl"),
    (KeyModifiers::ALT, "Alt"),
    (KeyModifiers::SHIFT, "Shift"),
];

/// Keys with a name: (code, config-file name, on-screen label).
const NAMED_KEYS: &[(KeyCode, &str, &str)] = &[
    (KeyCode::Char(' '), "Space", "Space"),
    (KeyCode::Up, "Up", "↑"),
    (KeyCode::Down, "Down", "↓"),
    (KeyCode::Left, "Left", "←"),
    (KeyCode::Right, "Right", "→"),
    (KeyCode::Enter, "Enter", "Enter"),
    (KeyCode::Esc, "Esc", "Esc"),
    (KeyCode::Tab, "Tab", "Tab"),
    (KeyCode::Backspace, "Backspace", "Bksp"),
    (KeyCode::Delete, "Delete", "Del"),
    (KeyCode::Home, "Home", "Home"),
    (KeyCode::End, "End", "End"),
    (KeyCode::PageUp, "PageUp", "PgUp"),
    (KeyCode::PageDown, "PageDown", "PgDn"),
];

const KEY_ALIASES: &[(&str, KeyCode)] = &[
    ("return", KeyCode::Enter),
    ("escape", KeyCode::Esc),
];

// ───────────────────────────────────────── config ────────────

pub const PAGE_SIZE_RANGE: std::ops::RangeInclusive<usize> = 1..=100;

/// Application configuration: keybindings plus table/form settings.
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub bindings: HashMap<Action, Vec<KeyBind>>,
    /// Rows per table page.
    pub page_size: usize,
    /// Whether every selected color needs an uploaded image before submit.
    pub image_coverage: ImageCoverage,
    /// Write structured diagnostics to the log file.
    pub diagnostics: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bindings: Self::default_bindings(),
            page_size: DEFAULT_PAGE_SIZE,
            image_coverage: ImageCoverage::default(),
            diagnostics: false,
        }
    }
}

impl AppConfig {
    /// Built-in key bindings.
    pub fn default_bindings() -> HashMap<Action, Vec<KeyBind>> {
        use Action::*;
        use KeyCode::*;
        let n = KeyModifiers::NONE;
        let mut m = HashMap::new();

        m.insert(MoveUp, vec![KeyBind::new(Up, n), KeyBind::new(Char('k'), n)]);
        m.insert(MoveDown, vec![KeyBind::new(Down, n), KeyBind::new(Char('j'), n)]);
        m.insert(PrevColumn, vec![KeyBind::new(Left, n), KeyBind::new(Char('h'), n)]);
        m.insert(NextColumn, vec![KeyBind::new(Right, n), KeyBind::new(Char('l'), n)]);
        m.insert(SortColumn, vec![KeyBind::new(Char('s'), n)]);
        m.insert(ToggleRow, vec![KeyBind::new(Char(' '), n)]);
        m.insert(TogglePage, vec![KeyBind::new(Char('a'), n)]);
        m.insert(PrevPage, vec![KeyBind::new(PageUp, n), KeyBind::new(Char('['), n)]);
        m.insert(NextPage, vec![KeyBind::new(PageDown, n), KeyBind::new(Char(']'), n)]);
        m.insert(DeleteSelected, vec![KeyBind::new(Delete, n), KeyBind::new(Char('d'), n)]);
        m.insert(AddProduct, vec![KeyBind::new(Char('n'), n)]);
        m.insert(Reload, vec![KeyBind::new(Char('r'), n)]);
        m.insert(OpenSettings, vec![KeyBind::new(Char('?'), n)]);
        m.insert(Quit, vec![KeyBind::new(Char('q'), n)]);

        m
    }

    /// Find the action that matches a key event.  When multiple bindings
    /// match (shouldn't happen after conflict resolution), the one with
    /// the most modifiers wins.
    pub fn match_key(&self, event: KeyEvent) -> Option<Action> {
        let mut best: Option<Action> = None;
        let mut best_mod_count = 0;

        for (&action, binds) in &self.bindings {
            for bind in binds {
                if bind.matches(event) {
                    let mc = bind.modifiers.bits().count_ones();
                    if best.is_none() || mc > best_mod_count {
                        best = Some(action);
                        best_mod_count = mc;
                    }
                }
            }
        }
        best
    }

    /// Add a binding for `action`.  Removes this key from any other action
    /// to prevent conflicts, then appends it to `action`'s bindings.
    pub fn add_binding(&mut self, action: Action, bind: KeyBind) {
        for (_, binds) in self.bindings.iter_mut() {
            binds.retain(|b| b != &bind);
        }
        self.bindings.entry(action).or_default().push(bind);
    }

    /// Remove every binding of `action`.
    pub fn clear_bindings(&mut self, action: Action) {
        self.bindings.insert(action, Vec::new());
    }

    /// Restore all bindings to the built-in defaults.
    pub fn reset_defaults(&mut self) {
        self.bindings = Self::default_bindings();
    }

    /// Format the binding list for a given action (e.g. `"↑/k"`).
    pub fn display_bindings(&self, action: Action) -> String {
        match self.bindings.get(&action) {
            Some(binds) if !binds.is_empty() => {
                binds.iter().map(|b| b.display()).collect::<Vec<_>>().join("/")
            }
            _ => "unbound".into(),
        }
    }

    /// Short display of the first binding only (for the status bar).
    fn short_binding(&self, action: Action) -> String {
        match self.bindings.get(&action) {
            Some(binds) if !binds.is_empty() => binds[0].display(),
            _ => "?".into(),
        }
    }

    /// Build the status-bar hint string from current bindings.
    pub fn status_bar_hint(&self) -> String {
        format!(
            "{}: sort | {}: select | {}/{}: page | {}: add | {}: delete | {}: settings",
            self.short_binding(Action::SortColumn),
            self.short_binding(Action::ToggleRow),
            self.short_binding(Action::PrevPage),
            self.short_binding(Action::NextPage),
            self.short_binding(Action::AddProduct),
            self.short_binding(Action::DeleteSelected),
            self.short_binding(Action::OpenSettings),
        )
    }

    // ── persistence ─────────────────────────────────────────────

    /// Load config from `path`, falling back to defaults.
    pub fn load_from(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(contents) => Self::parse_config(&contents),
            Err(_) => Self::default(),
        }
    }

    pub fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, self.serialise())?;
        Ok(())
    }

    fn parse_config(s: &str) -> Self {
        let mut config = Self::default();

        for line in s.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') || line.starts_with('[') {
                continue;
            }
            let Some((key, value)) = line.split_once('=') else {
                continue;
            };
            let key = key.trim();
            let value = value.trim().trim_matches('"');

            match key {
                "page_size" => {
                    if let Ok(v) = value.parse::<usize>() {
                        config.page_size =
                            v.clamp(*PAGE_SIZE_RANGE.start(), *PAGE_SIZE_RANGE.end());
                    }
                    continue;
                }
                "image_coverage" => {
                    if let Some(c) = ImageCoverage::parse(value) {
                        config.image_coverage = c;
                    }
                    continue;
                }
                "diagnostics" => {
                    config.diagnostics = value == "true";
                    continue;
                }
                _ => {}
            }

            let Some(action) = Action::from_config_key(key) else {
                continue;
            };

            let mut parsed = Vec::new();
            for part in value.split(',') {
                let part = part.trim().trim_matches('"');
                if let Some(bind) = KeyBind::parse(part) {
                    parsed.push(bind);
                }
            }
            if !parsed.is_empty() {
                config.bindings.insert(action, parsed);
            }
        }

        config
    }

    fn serialise(&self) -> String {
        let mut lines = vec![
            "# product-admin configuration".to_string(),
            String::new(),
            "# Table & form settings".to_string(),
            format!("page_size = {}", self.page_size),
            "# optional | strict (every selected color needs an image)".to_string(),
            format!("image_coverage = {}", self.image_coverage.label()),
            format!("diagnostics = {}", self.diagnostics),
            String::new(),
            "# Key bindings".to_string(),
            "# Format: action = Key1, Key2, ...".to_string(),
            "# Modifiers: Ctrl+, Alt+, Shift+ (prefix)".to_string(),
            "# Special keys: Up, Down, Left, Right, Enter, Esc, Tab,".to_string(),
            "#   Backspace, Delete, Home, End, PageUp, PageDown, Space, F1-F12".to_string(),
            String::new(),
        ];

        for &action in Action::ALL {
            if let Some(binds) = self.bindings.get(&action) {
                if binds.is_empty() {
                    continue;
                }
                let keys: Vec<String> = binds.iter().map(|b| b.to_config_string()).collect();
                lines.push(format!("{} = {}", action.config_key(), keys.join(", ")));
            }
        }
        lines.push(String::new());
        lines.join("\n")
    }
}

/// Return the config file path (`$XDG_CONFIG_HOME/product-admin/config.toml`).
pub fn config_path() -> PathBuf {
    xdg_dir("XDG_CONFIG_HOME", ".config").join("config.toml")
}

/// Default diagnostics log path (`$XDG_STATE_HOME/product-admin/diagnostics.log`).
pub fn default_log_path() -> PathBuf {
    xdg_dir("XDG_STATE_HOME", ".local/state").join("diagnostics.log")
}

fn xdg_dir(var: &str, home_fallback: &str) -> PathBuf {
    let base = std::env::var(var)
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| ".".into());
            PathBuf::from(home).join(home_fallback)
        });
    base.join(env!("CARGO_PKG_NAME"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn parses_settings_and_bindings() {
        let cfg = AppConfig::parse_config(
            "# comment\n\
             page_size = 25\n\
             image_coverage = strict\n\
             diagnostics = true\n\
             sort_column = Ctrl+s, F2\n\
             bogus_action = x\n",
        );
        assert_eq!(cfg.page_size, 25);
        assert_eq!(cfg.image_coverage, ImageCoverage::Strict);
        assert!(cfg.diagnostics);
        assert_eq!(
            cfg.bindings[&Action::SortColumn],
            vec![
                KeyBind::new(KeyCode::Char('s'), KeyModifiers::CONTROL),
                KeyBind::new(KeyCode::F(2), KeyModifiers::NONE),
            ]
        );
        // Untouched actions keep their defaults.
        assert_eq!(cfg.bindings[&Action::Quit], AppConfig::default_bindings()[&Action::Quit]);
    }

    #[test]
    fn out_of_range_and_garbage_values_fall_back() {
        let cfg = AppConfig::parse_config("page_size = 5000\nimage_coverage = always\n");
        assert_eq!(cfg.page_size, 100);
        assert_eq!(cfg.image_coverage, ImageCoverage::Optional);

        let cfg = AppConfig::parse_config("page_size = 0\n");
        assert_eq!(cfg.page_size, 1);
    }

    #[test]
    fn save_then_load_preserves_everything() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("nested").join("config.toml");

        let mut cfg = AppConfig::default();
        cfg.page_size = 7;
        cfg.image_coverage = ImageCoverage::Strict;
        cfg.add_binding(
            Action::AddProduct,
            KeyBind::new(KeyCode::Char('i'), KeyModifiers::NONE),
        );
        cfg.save_to(&path).expect("save");

        assert_eq!(AppConfig::load_from(&path), cfg);
    }

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        assert_eq!(AppConfig::load_from(&dir.path().join("none.toml")), AppConfig::default());
    }

    #[test]
    fn rebinding_steals_the_key_from_other_actions() {
        let mut cfg = AppConfig::default();
        let q = KeyBind::new(KeyCode::Char('q'), KeyModifiers::NONE);
        cfg.add_binding(Action::AddProduct, q.clone());
        assert!(!cfg.bindings[&Action::Quit].contains(&q));
        let ev = KeyEvent::new(KeyCode::Char('q'), KeyModifiers::NONE);
        assert_eq!(cfg.match_key(ev), Some(Action::AddProduct));
    }

    #[test]
    fn key_strings_parse_modifiers_and_specials() {
        assert_eq!(
            KeyBind::parse("Alt+PgDn"),
            Some(KeyBind::new(KeyCode::PageDown, KeyModifiers::ALT))
        );
        assert_eq!(KeyBind::parse("Space"), Some(KeyBind::new(KeyCode::Char(' '), KeyModifiers::NONE)));
        assert_eq!(KeyBind::parse("Hyper+x"), None);
        assert_eq!(
            KeyBind::new(KeyCode::Delete, KeyModifiers::CONTROL).display(),
            "Ctrl+Del"
        );
    }
}
