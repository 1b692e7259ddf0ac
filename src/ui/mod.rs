pub mod components;
pub mod detail;
pub mod users;

use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::style::Style;
use ratatui::widgets::{Block, Borders, Paragraph};

use crate::app::{AppState, InputMode, ModalState, Route};

pub fn render(f: &mut Frame, app: &mut AppState) {
    let root = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(5), Constraint::Length(1)].as_ref())
        .split(f.area());

    let who = if app.auth.is_authenticated() {
        let role = if app.auth.is_admin() { " (admin)" } else { "" };
        format!("{}{role}", app.auth.user_name())
    } else {
        "signed out".to_string()
    };
    let prompt = match app.input_mode {
        InputMode::Search => format!("  Search: {}_", app.directory.filters().search_query),
        InputMode::Normal | InputMode::Modal => String::new(),
    };
    let header = Paragraph::new(format!(
        "user-directory [{who}]  {}{prompt}  users:{}",
        app.route.path(),
        app.directory.users().len()
    ))
    .block(
        Block::default()
            .title("user-directory")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(app.theme.border)),
    )
    .style(Style::default().fg(app.theme.header_fg).bg(app.theme.header_bg));
    f.render_widget(header, root[0]);

    match app.route {
        Route::Users => {
            let body = Layout::default()
                .direction(Direction::Horizontal)
                .constraints([Constraint::Percentage(65), Constraint::Percentage(35)].as_ref())
                .split(root[1]);
            users::render_users_table(f, body[0], app);
            users::render_selected_summary(f, body[1], app);
        }
        Route::UserProfile(id) => detail::render_user_profile(f, root[1], app, id),
    }

    components::render_status_bar(f, root[2], app);

    if let Some(modal) = app.modal.clone() {
        match modal {
            ModalState::Login { .. } => components::render_login_modal(f, f.area(), app, &modal),
            ModalState::CityFilter { .. } | ModalState::CompanyFilter { .. } | ModalState::SortMenu { .. } => {
                components::render_picker_modal(f, f.area(), app, &modal)
            }
            ModalState::DeleteConfirm { .. } => users::render_delete_modal(f, f.area(), app, &modal),
            ModalState::Info { .. } => components::render_info_modal(f, f.area(), app, &modal),
        }
    }
}
