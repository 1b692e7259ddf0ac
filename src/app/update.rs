use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use std::time::Duration;
use tokio::runtime::Runtime;
use tracing::{debug, info, warn};

use crate::app::keymap::KeyAction;
use crate::app::{AppState, InputMode, LoginField, ModalState, Route};
use crate::model::LoginCredentials;
use crate::search::SortField;
use crate::source::UserSource;
use crate::ui;

/// Work a key press asks for that has to wait on the data source or on a
/// simulated latency. Plain state changes happen inside [`handle_key`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    None,
    Quit,
    FetchAll,
    LoadMore,
    OpenDetail(u64),
    RefreshDetail,
    Login(LoginCredentials),
}

impl Command {
    /// Status line shown while the command runs.
    fn progress(&self) -> Option<&'static str> {
        match self {
            Command::FetchAll => Some("Loading users..."),
            Command::LoadMore => Some("Loading more users..."),
            Command::OpenDetail(_) | Command::RefreshDetail => Some("Loading user..."),
            Command::Login(_) => Some("Signing in..."),
            Command::None | Command::Quit => None,
        }
    }
}

pub fn run_app(
    terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>,
    app: &mut AppState,
    rt: &Runtime,
    source: &dyn UserSource,
) -> Result<()> {
    if app.auth.is_authenticated() {
        run_command(terminal, app, rt, source, Command::FetchAll)?;
    }

    loop {
        terminal.draw(|f| ui::render(f, app))?;

        if event::poll(Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                match handle_key(app, key) {
                    Command::Quit => break,
                    Command::None => {}
                    cmd => run_command(terminal, app, rt, source, cmd)?,
                }
            }
        }
    }

    info!("quit");
    Ok(())
}

fn run_command(
    terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>,
    app: &mut AppState,
    rt: &Runtime,
    source: &dyn UserSource,
    cmd: Command,
) -> Result<()> {
    if let Some(label) = cmd.progress() {
        app.status = Some(label.to_string());
        terminal.draw(|f| ui::render(f, app))?;
    }
    rt.block_on(execute(app, source, cmd));
    Ok(())
}

/// Run a command to completion and fold its outcome into the view state.
pub async fn execute(app: &mut AppState, source: &dyn UserSource, cmd: Command) {
    debug!(?cmd, "execute");
    app.status = None;
    match cmd {
        Command::None | Command::Quit => {}
        Command::FetchAll => {
            match app.directory.fetch_all(source).await {
                Ok(()) => app.status = Some(format!("Loaded {} users", app.directory.users().len())),
                Err(e) => app.open_modal(ModalState::Info { message: format!("Could not load users: {e}") }),
            }
            app.selected_index = 0;
        }
        Command::LoadMore => {
            app.directory.load_more().await;
        }
        Command::OpenDetail(id) => {
            app.route = Route::UserProfile(id);
            if let Err(e) = app.detail.fetch_user(source, id).await {
                warn!(id, error = %e, "opening user failed");
                app.status = Some(format!("Could not load user {id}: {e}"));
            }
        }
        Command::RefreshDetail => match app.detail.refresh_user(source).await {
            Ok(()) => app.status = Some(format!("Refreshed {}", app.detail.display_name())),
            Err(e) => {
                warn!(error = %e, "refreshing user failed");
                app.status = Some(format!("Could not refresh user: {e}"));
            }
        },
        Command::Login(credentials) => match app.auth.login(&credentials).await {
            Ok(user) => {
                app.close_modal();
                app.status = Some(format!("Signed in as {}", user.name));
                if app.directory.users().is_empty() && app.directory.fetch_all(source).await.is_ok() {
                    app.status = Some(format!("Loaded {} users", app.directory.users().len()));
                }
            }
            Err(e) => {
                app.open_modal(ModalState::Login {
                    field: LoginField::Password,
                    email: credentials.email,
                    password: String::new(),
                    error: Some(e.to_string()),
                });
            }
        },
    }
}

/// Apply a key press to the view state; returns what still has to run.
pub fn handle_key(app: &mut AppState, key: KeyEvent) -> Command {
    match app.input_mode {
        InputMode::Modal => handle_modal_key(app, key),
        InputMode::Search => handle_search_key(app, key),
        InputMode::Normal => match app.keymap.resolve(&key) {
            Some(action) => match app.route {
                Route::Users => handle_listing_action(app, action),
                Route::UserProfile(_) => handle_detail_action(app, action),
            },
            None => Command::None,
        },
    }
}

fn handle_listing_action(app: &mut AppState, action: KeyAction) -> Command {
    let shown = app.directory.view().users.len();
    match action {
        KeyAction::Quit => return Command::Quit,
        KeyAction::StartSearch => app.input_mode = InputMode::Search,
        KeyAction::FilterCity => app.open_modal(ModalState::CityFilter { selected: 0 }),
        KeyAction::FilterCompany => app.open_modal(ModalState::CompanyFilter { selected: 0 }),
        KeyAction::SortMenu => {
            let current = SortField::ALL.iter().position(|f| *f == app.directory.sorting().field).unwrap_or(0);
            app.open_modal(ModalState::SortMenu { selected: current });
        }
        KeyAction::ToggleSortOrder => {
            app.directory.toggle_sort_order();
            app.selected_index = 0;
        }
        KeyAction::ClearFilters => {
            app.directory.clear_filters();
            app.selected_index = 0;
        }
        KeyAction::LoadMore => return Command::LoadMore,
        KeyAction::Refresh => return Command::FetchAll,
        KeyAction::EnterAction => {
            if let Some(user) = app.selected_user() {
                return Command::OpenDetail(user.id);
            }
        }
        KeyAction::DeleteSelection => {
            if let Some(user) = app.selected_user() {
                let id = user.id;
                app.open_modal(ModalState::DeleteConfirm { selected: 1, id });
            }
        }
        KeyAction::Logout => logout(app),
        KeyAction::MoveUp => app.selected_index = app.selected_index.saturating_sub(1),
        KeyAction::MoveDown => {
            if app.selected_index + 1 < shown {
                app.selected_index += 1;
            } else if app.directory.has_more() {
                // reaching the bottom reveals the next page
                return Command::LoadMore;
            }
        }
        KeyAction::PageUp => app.selected_index = app.selected_index.saturating_sub(app.rows_per_page.max(1)),
        KeyAction::PageDown => {
            let target = app.selected_index.saturating_add(app.rows_per_page.max(1));
            app.selected_index = target.min(shown.saturating_sub(1));
        }
        KeyAction::Back | KeyAction::Ignore => {}
    }
    Command::None
}

fn handle_detail_action(app: &mut AppState, action: KeyAction) -> Command {
    match action {
        KeyAction::Quit => return Command::Quit,
        KeyAction::Back => app.route = Route::Users,
        KeyAction::Refresh => return Command::RefreshDetail,
        KeyAction::Logout => logout(app),
        _ => {}
    }
    Command::None
}

fn logout(app: &mut AppState) {
    app.auth.logout();
    app.route = Route::Users;
    app.detail.clear_user();
    app.open_modal(ModalState::login());
}

fn handle_search_key(app: &mut AppState, key: KeyEvent) -> Command {
    let mut query = app.directory.filters().search_query.clone();
    match key.code {
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => return Command::Quit,
        // other control chords are not text
        KeyCode::Char(_) if key.modifiers.intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) => return Command::None,
        KeyCode::Enter => {
            app.input_mode = InputMode::Normal;
            return Command::None;
        }
        KeyCode::Esc => {
            app.input_mode = InputMode::Normal;
            query.clear();
        }
        KeyCode::Backspace => {
            query.pop();
        }
        KeyCode::Char(c) => query.push(c),
        _ => return Command::None,
    }
    app.directory.set_search_query(query);
    app.selected_index = 0;
    Command::None
}

fn move_in_list(selected: &mut usize, code: KeyCode, len: usize) {
    match code {
        KeyCode::Up | KeyCode::Char('k') => *selected = selected.saturating_sub(1),
        KeyCode::Down | KeyCode::Char('j') => {
            if *selected + 1 < len {
                *selected += 1;
            }
        }
        _ => {}
    }
}

fn handle_modal_key(app: &mut AppState, key: KeyEvent) -> Command {
    let Some(modal) = app.modal.clone() else {
        app.input_mode = InputMode::Normal;
        return Command::None;
    };
    let code = key.code;
    match modal {
        ModalState::Login { mut field, mut email, mut password, error } => {
            match code {
                KeyCode::Esc => return Command::Quit,
                KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => return Command::Quit,
                KeyCode::Tab | KeyCode::BackTab | KeyCode::Up | KeyCode::Down => {
                    field = match field {
                        LoginField::Email => LoginField::Password,
                        LoginField::Password => LoginField::Email,
                    };
                }
                KeyCode::Enter => {
                    if field == LoginField::Email {
                        field = LoginField::Password;
                    } else {
                        return Command::Login(LoginCredentials { email, password });
                    }
                }
                KeyCode::Backspace => {
                    match field {
                        LoginField::Email => email.pop(),
                        LoginField::Password => password.pop(),
                    };
                }
                KeyCode::Char(c) => match field {
                    LoginField::Email => email.push(c),
                    LoginField::Password => password.push(c),
                },
                _ => {}
            }
            app.modal = Some(ModalState::Login { field, email, password, error });
        }
        ModalState::CityFilter { mut selected } | ModalState::CompanyFilter { mut selected } => {
            let is_city = matches!(modal, ModalState::CityFilter { .. });
            let options = if is_city { app.directory.unique_cities() } else { app.directory.unique_companies() };
            // index 0 is "any"
            let len = options.len() + 1;
            match code {
                KeyCode::Esc => app.close_modal(),
                KeyCode::Enter => {
                    let choice = selected.checked_sub(1).and_then(|i| options.get(i).cloned());
                    if is_city {
                        app.directory.set_city(choice);
                    } else {
                        app.directory.set_company(choice);
                    }
                    app.selected_index = 0;
                    app.close_modal();
                }
                _ => {
                    move_in_list(&mut selected, code, len);
                    app.modal =
                        Some(if is_city { ModalState::CityFilter { selected } } else { ModalState::CompanyFilter { selected } });
                }
            }
        }
        ModalState::SortMenu { mut selected } => match code {
            KeyCode::Esc => app.close_modal(),
            KeyCode::Enter => {
                if let Some(field) = SortField::ALL.get(selected) {
                    app.directory.set_sort_field(*field);
                }
                app.selected_index = 0;
                app.close_modal();
            }
            _ => {
                move_in_list(&mut selected, code, SortField::ALL.len());
                app.modal = Some(ModalState::SortMenu { selected });
            }
        },
        ModalState::DeleteConfirm { mut selected, id } => match code {
            KeyCode::Esc => app.close_modal(),
            KeyCode::Left | KeyCode::Right | KeyCode::Tab | KeyCode::Char('h') | KeyCode::Char('l') => {
                selected = 1 - selected.min(1);
                app.modal = Some(ModalState::DeleteConfirm { selected, id });
            }
            KeyCode::Char('y') | KeyCode::Char('n') | KeyCode::Enter => {
                let confirmed = code == KeyCode::Char('y') || (code == KeyCode::Enter && selected == 0);
                if confirmed && app.directory.delete_user(id) {
                    app.clamp_selection();
                    app.status = Some(format!("Deleted user {id}"));
                }
                app.close_modal();
            }
            _ => {}
        },
        ModalState::Info { .. } => {
            if matches!(code, KeyCode::Esc | KeyCode::Enter) {
                app.close_modal();
            }
        }
    }
    Command::None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::{Keymap, Theme};
    use crate::config::Settings;
    use crate::model::{Address, Company, User};
    use crate::store::MemoryStore;
    use std::time::Duration;

    fn mk_user(id: u64, name: &str, city: &str) -> User {
        User {
            id,
            name: name.to_string(),
            username: format!("u{id}"),
            email: format!("u{id}@example.org"),
            address: Address { city: city.to_string(), ..Default::default() },
            phone: String::new(),
            website: String::new(),
            company: Company { name: format!("Company {}", id % 3), ..Default::default() },
        }
    }

    fn mk_app(n: u64) -> AppState {
        let settings = Settings { page_size: 6, load_more_delay: Duration::ZERO, ..Settings::default() };
        let mut app = AppState::new(settings, Box::new(MemoryStore::new()), Theme::dark(), Keymap::default());
        app.close_modal();
        for i in 1..=n {
            app.directory.add_user(mk_user(i, &format!("Person {i:02}"), if i <= 3 { "Alpha" } else { "Beta" }));
        }
        app
    }

    fn press(app: &mut AppState, code: KeyCode) -> Command {
        handle_key(app, KeyEvent::new(code, KeyModifiers::NONE))
    }

    #[test]
    fn starts_with_login_dialog_without_session() {
        let app = AppState::new(Settings::default(), Box::new(MemoryStore::new()), Theme::dark(), Keymap::default());
        assert_eq!(app.modal, Some(ModalState::login()));
        assert_eq!(app.input_mode, InputMode::Modal);
    }

    #[test]
    fn login_dialog_collects_credentials() {
        let mut app = mk_app(0);
        app.open_modal(ModalState::login());
        for c in "user@example.com".chars() {
            press(&mut app, KeyCode::Char(c));
        }
        assert_eq!(press(&mut app, KeyCode::Enter), Command::None);
        for c in "user123".chars() {
            press(&mut app, KeyCode::Char(c));
        }
        let cmd = press(&mut app, KeyCode::Enter);
        assert_eq!(
            cmd,
            Command::Login(LoginCredentials { email: "user@example.com".into(), password: "user123".into() })
        );
    }

    #[test]
    fn moving_past_the_last_row_asks_for_more() {
        let mut app = mk_app(10);
        for _ in 0..5 {
            assert_eq!(press(&mut app, KeyCode::Down), Command::None);
        }
        assert_eq!(app.selected_index, 5);
        assert_eq!(press(&mut app, KeyCode::Down), Command::LoadMore);
    }

    #[test]
    fn search_mode_filters_live_and_escape_clears() {
        let mut app = mk_app(10);
        press(&mut app, KeyCode::Char('/'));
        assert_eq!(app.input_mode, InputMode::Search);
        for c in "10".chars() {
            press(&mut app, KeyCode::Char(c));
        }
        assert_eq!(app.directory.view().users.len(), 1);
        press(&mut app, KeyCode::Esc);
        assert_eq!(app.input_mode, InputMode::Normal);
        assert_eq!(app.directory.filters().search_query, "");
        assert_eq!(app.directory.view().users.len(), 6);
    }

    #[test]
    fn ctrl_c_quits_from_search_mode() {
        let mut app = mk_app(3);
        press(&mut app, KeyCode::Char('/'));
        press(&mut app, KeyCode::Char('a'));
        let cmd = handle_key(&mut app, KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL));
        assert_eq!(cmd, Command::Quit);
        assert_eq!(app.directory.filters().search_query, "a");
    }

    #[test]
    fn city_picker_applies_facet() {
        let mut app = mk_app(10);
        press(&mut app, KeyCode::Char('c'));
        press(&mut app, KeyCode::Down);
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.directory.filters().selected_city.as_deref(), Some("Alpha"));
        assert_eq!(app.directory.view().users.len(), 3);
        assert!(app.modal.is_none());

        press(&mut app, KeyCode::Char('x'));
        assert!(app.directory.filters().is_empty());
    }

    #[test]
    fn delete_requires_confirmation() {
        let mut app = mk_app(3);
        press(&mut app, KeyCode::Char('d'));
        // "No" is preselected
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.directory.users().len(), 3);

        press(&mut app, KeyCode::Char('d'));
        press(&mut app, KeyCode::Left);
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.directory.users().len(), 2);
        assert!(app.directory.find(1).is_none());
    }

    #[test]
    fn enter_opens_detail_and_back_returns() {
        let mut app = mk_app(3);
        assert_eq!(press(&mut app, KeyCode::Enter), Command::OpenDetail(1));
        app.route = Route::UserProfile(1);
        press(&mut app, KeyCode::Esc);
        assert_eq!(app.route, Route::Users);
    }

    #[tokio::test]
    async fn load_more_command_extends_view() {
        struct Empty;
        #[async_trait::async_trait]
        impl UserSource for Empty {
            async fn fetch_users(&self) -> Result<Vec<User>, crate::error::FetchError> {
                Ok(vec![])
            }
            async fn fetch_user(&self, _id: u64) -> Result<User, crate::error::FetchError> {
                Err(crate::error::FetchError::NotFound)
            }
        }
        let mut app = mk_app(10);
        execute(&mut app, &Empty, Command::LoadMore).await;
        assert_eq!(app.directory.view().users.len(), 10);

        execute(&mut app, &Empty, Command::OpenDetail(4)).await;
        assert_eq!(app.route, Route::UserProfile(4));
        assert_eq!(app.detail.error.as_deref(), Some("User not found"));
        assert_eq!(app.status.as_deref(), Some("Could not load user 4: User not found"));
    }

    #[tokio::test]
    async fn failed_refresh_keeps_rows_and_shows_dialog() {
        struct Down;
        #[async_trait::async_trait]
        impl UserSource for Down {
            async fn fetch_users(&self) -> Result<Vec<User>, crate::error::FetchError> {
                Err(crate::error::FetchError::Status(503))
            }
            async fn fetch_user(&self, _id: u64) -> Result<User, crate::error::FetchError> {
                Err(crate::error::FetchError::Status(503))
            }
        }
        let mut app = mk_app(4);
        execute(&mut app, &Down, Command::FetchAll).await;
        assert_eq!(app.directory.users().len(), 4);
        assert_eq!(
            app.modal,
            Some(ModalState::Info { message: "Could not load users: HTTP error! status: 503".into() })
        );
        press(&mut app, KeyCode::Enter);
        assert!(app.modal.is_none());
    }
}
