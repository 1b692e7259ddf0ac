//! Key bindings for the listing and profile views, read from `keybinds.conf`.
//!
//! Bindings are stored as `(KeyModifiers, KeyCode) -> KeyAction`. The config
//! file lists one `Action = KeySpec` per line; anything it does not mention
//! keeps the default binding.

use std::collections::HashMap;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

/// Semantic actions available in the listing and detail views.
///
/// Dialogs (login, pickers, confirmations) read raw keys instead.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum KeyAction {
    /// Exit the application.
    Quit,
    /// Start typing a search query.
    StartSearch,
    /// Pick a city facet.
    FilterCity,
    /// Pick a company facet.
    FilterCompany,
    /// Pick the field the listing is sorted by.
    SortMenu,
    /// Flip ascending/descending.
    ToggleSortOrder,
    /// Reset search, facets and sorting.
    ClearFilters,
    /// Reveal the next page increment.
    LoadMore,
    /// Reload the collection (or the shown user on the detail view).
    Refresh,
    /// Open the selected user.
    EnterAction,
    /// Leave the detail view.
    Back,
    /// Delete the selected user.
    DeleteSelection,
    /// End the session and return to the login dialog.
    Logout,
    MoveUp,
    MoveDown,
    PageUp,
    PageDown,
    /// Swallow the key.
    Ignore,
}

const ACTIONS: [(KeyAction, &str); 18] = [
    (KeyAction::Quit, "Quit"),
    (KeyAction::StartSearch, "StartSearch"),
    (KeyAction::FilterCity, "FilterCity"),
    (KeyAction::FilterCompany, "FilterCompany"),
    (KeyAction::SortMenu, "SortMenu"),
    (KeyAction::ToggleSortOrder, "ToggleSortOrder"),
    (KeyAction::ClearFilters, "ClearFilters"),
    (KeyAction::LoadMore, "LoadMore"),
    (KeyAction::Refresh, "Refresh"),
    (KeyAction::EnterAction, "EnterAction"),
    (KeyAction::Back, "Back"),
    (KeyAction::DeleteSelection, "DeleteSelection"),
    (KeyAction::Logout, "Logout"),
    (KeyAction::MoveUp, "MoveUp"),
    (KeyAction::MoveDown, "MoveDown"),
    (KeyAction::PageUp, "PageUp"),
    (KeyAction::PageDown, "PageDown"),
    (KeyAction::Ignore, "Ignore"),
];

#[derive(Clone, Debug)]
pub struct Keymap {
    bindings: HashMap<(KeyModifiers, KeyCode), KeyAction>,
}

impl Keymap {
    pub fn new_defaults() -> Self {
        use KeyCode::*;
        use KeyModifiers as M;
        let mut bindings = HashMap::new();
        bindings.insert((M::NONE, Char('q')), KeyAction::Quit);
        bindings.insert((M::CONTROL, Char('c')), KeyAction::Quit);
        bindings.insert((M::NONE, Char('/')), KeyAction::StartSearch);
        bindings.insert((M::NONE, Char('c')), KeyAction::FilterCity);
        bindings.insert((M::NONE, Char('o')), KeyAction::FilterCompany);
        bindings.insert((M::NONE, Char('s')), KeyAction::SortMenu);
        bindings.insert((M::NONE, Char('t')), KeyAction::ToggleSortOrder);
        bindings.insert((M::NONE, Char('x')), KeyAction::ClearFilters);
        bindings.insert((M::NONE, Char('m')), KeyAction::LoadMore);
        bindings.insert((M::NONE, Char('r')), KeyAction::Refresh);
        bindings.insert((M::NONE, F(5)), KeyAction::Refresh);
        bindings.insert((M::NONE, Enter), KeyAction::EnterAction);
        bindings.insert((M::NONE, Esc), KeyAction::Back);
        bindings.insert((M::NONE, Backspace), KeyAction::Back);
        bindings.insert((M::NONE, Delete), KeyAction::DeleteSelection);
        bindings.insert((M::NONE, Char('d')), KeyAction::DeleteSelection);
        bindings.insert((M::CONTROL, Char('l')), KeyAction::Logout);

        bindings.insert((M::NONE, Up), KeyAction::MoveUp);
        bindings.insert((M::NONE, Down), KeyAction::MoveDown);
        bindings.insert((M::NONE, Char('k')), KeyAction::MoveUp);
        bindings.insert((M::NONE, Char('j')), KeyAction::MoveDown);
        bindings.insert((M::NONE, PageUp), KeyAction::PageUp);
        bindings.insert((M::NONE, PageDown), KeyAction::PageDown);
        bindings.insert((M::NONE, Left), KeyAction::PageUp);
        bindings.insert((M::NONE, Right), KeyAction::PageDown);
        bindings.insert((M::NONE, Char('h')), KeyAction::PageUp);
        bindings.insert((M::NONE, Char('l')), KeyAction::PageDown);
        Self { bindings }
    }

    /// Load `path` if it exists, else look in the config locations, else
    /// write the defaults to `path`.
    pub fn load_or_init(path: &str) -> Self {
        if std::path::Path::new(path).exists() {
            return Self::from_file(path).unwrap_or_default();
        }
        if let Some(existing) = crate::config::config_file_read_path("keybinds.conf") {
            return Self::from_file(&existing.to_string_lossy()).unwrap_or_default();
        }
        let km = Self::default();
        let _ = km.write_file(path);
        km
    }

    /// Start from the defaults and apply every `Action = KeySpec` line.
    pub fn from_file(path: &str) -> Option<Self> {
        let contents = std::fs::read_to_string(path).ok()?;
        let mut map = Self::default();
        for raw in contents.lines() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let Some((lhs, rhs)) = line.split_once('=') else {
                continue;
            };
            if let (Some(action), Some(key)) = (parse_action(lhs), parse_key(rhs)) {
                map.bindings.insert(key, action);
            }
        }
        Some(map)
    }

    pub fn write_file(&self, path: &str) -> std::io::Result<()> {
        use std::fmt::Write as _;
        let mut buf = String::new();
        buf.push_str("# user-directory keybindings\n");
        buf.push_str("# Format: <Action> = <KeySpec>\n");
        buf.push_str("# KeySpec examples: q, Ctrl+l, Enter, Esc, Backspace, Up, Down, Left, Right, PageUp, PageDown, Delete, F5, /\n");
        buf.push_str("# Actions: ");
        buf.push_str(&ACTIONS.iter().map(|(_, name)| *name).collect::<Vec<_>>().join(", "));
        buf.push_str("\n\n");

        let mut lines: Vec<String> = self
            .bindings
            .iter()
            .map(|((mods, code), action)| format!("{} = {}", format_action(*action), Self::format_key(*mods, *code)))
            .collect();
        lines.sort();
        for line in lines {
            let _ = writeln!(&mut buf, "{line}");
        }
        std::fs::write(path, buf)
    }

    pub fn resolve(&self, key: &KeyEvent) -> Option<KeyAction> {
        self.bindings.get(&(key.modifiers, key.code)).copied()
    }

    /// Keys bound to `action`, formatted for display and sorted.
    pub fn keys_for(&self, action: KeyAction) -> Vec<String> {
        let mut keys: Vec<String> = self
            .bindings
            .iter()
            .filter(|(_, a)| **a == action)
            .map(|((mods, code), _)| Self::format_key(*mods, *code))
            .collect();
        keys.sort();
        keys
    }

    /// Human-readable spec such as `Ctrl+l`, `PageDown` or `/`.
    pub fn format_key(mods: KeyModifiers, code: KeyCode) -> String {
        use KeyCode::*;
        let base = match code {
            Enter => "Enter".to_string(),
            Delete => "Delete".to_string(),
            Backspace => "Backspace".to_string(),
            Esc => "Esc".to_string(),
            Tab => "Tab".to_string(),
            Up => "Up".to_string(),
            Down => "Down".to_string(),
            Left => "Left".to_string(),
            Right => "Right".to_string(),
            PageUp => "PageUp".to_string(),
            PageDown => "PageDown".to_string(),
            F(n) => format!("F{n}"),
            Char(c) => c.to_string(),
            _ => format!("{code:?}"),
        };
        if mods.contains(KeyModifiers::CONTROL) {
            format!("Ctrl+{base}")
        } else {
            base
        }
    }
}

impl Default for Keymap {
    fn default() -> Self {
        Self::new_defaults()
    }
}

fn parse_key(spec: &str) -> Option<(KeyModifiers, KeyCode)> {
    use KeyCode::*;
    let s = spec.trim();
    let (mods, rest) = match s.strip_prefix("Ctrl+") {
        Some(after) => (KeyModifiers::CONTROL, after),
        None => (KeyModifiers::NONE, s),
    };
    let code = match rest {
        "Enter" => Enter,
        "Delete" => Delete,
        "Backspace" => Backspace,
        "Esc" | "Escape" => Esc,
        "Tab" => Tab,
        "Up" => Up,
        "Down" => Down,
        "Left" => Left,
        "Right" => Right,
        "PageUp" => PageUp,
        "PageDown" => PageDown,
        _ => {
            if let Some(n) = rest.strip_prefix('F').and_then(|n| n.parse::<u8>().ok()) {
                F(n)
            } else {
                let mut chars = rest.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => Char(c),
                    _ => return None,
                }
            }
        }
    };
    Some((mods, code))
}

fn parse_action(s: &str) -> Option<KeyAction> {
    let s = s.trim();
    ACTIONS.iter().find(|(_, name)| *name == s).map(|(a, _)| *a)
}

pub fn format_action(a: KeyAction) -> &'static str {
    ACTIONS
        .iter()
        .find(|(action, _)| *action == a)
        .map(|(_, name)| *name)
        .unwrap_or("Ignore")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_key_specs() {
        assert_eq!(parse_key("Ctrl+l"), Some((KeyModifiers::CONTROL, KeyCode::Char('l'))));
        assert_eq!(parse_key(" F5 "), Some((KeyModifiers::NONE, KeyCode::F(5))));
        assert_eq!(parse_key("F"), Some((KeyModifiers::NONE, KeyCode::Char('F'))));
        assert_eq!(parse_key("/"), Some((KeyModifiers::NONE, KeyCode::Char('/'))));
        assert_eq!(parse_key("nope"), None);
    }

    #[test]
    fn every_action_name_roundtrips() {
        for (action, name) in ACTIONS {
            assert_eq!(format_action(action), name);
            assert_eq!(parse_action(name), Some(action));
        }
    }

    #[test]
    fn defaults_resolve_core_keys() {
        let km = Keymap::default();
        let ev = KeyEvent::new(KeyCode::Char('m'), KeyModifiers::NONE);
        assert_eq!(km.resolve(&ev), Some(KeyAction::LoadMore));
        assert_eq!(km.keys_for(KeyAction::Refresh), vec!["F5".to_string(), "r".to_string()]);
    }
}
