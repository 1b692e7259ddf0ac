//! Shared UI components (status bar, dialogs).
//!
//! Small building blocks reused by the listing and profile views.
//!
use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};

use crate::app::keymap::KeyAction;
use crate::app::{AppState, InputMode, LoginField, ModalState};
use crate::search::SortField;

/// Render the bottom status bar with mode, activity and key hints.
pub fn render_status_bar(f: &mut Frame, area: Rect, app: &AppState) {
    let mode = match app.input_mode {
        InputMode::Normal => "NORMAL",
        InputMode::Search => "SEARCH",
        InputMode::Modal => "MODAL",
    };
    let activity = if app.directory.loading || app.detail.loading {
        "  loading..."
    } else if app.directory.loading_more {
        "  loading more..."
    } else {
        ""
    };
    let status = match (&app.directory.error, &app.status) {
        (Some(err), _) => format!("  error: {err}"),
        (None, Some(msg)) => format!("  {msg}"),
        (None, None) => String::new(),
    };
    let hint = |action: KeyAction, label: &str| {
        let keys = app.keymap.keys_for(action);
        keys.first().map(|k| format!("{k}:{label}")).unwrap_or_default()
    };
    let hints = [
        hint(KeyAction::StartSearch, "search"),
        hint(KeyAction::FilterCity, "city"),
        hint(KeyAction::FilterCompany, "company"),
        hint(KeyAction::SortMenu, "sort"),
        hint(KeyAction::Quit, "quit"),
    ]
    .into_iter()
    .filter(|h| !h.is_empty())
    .collect::<Vec<_>>()
    .join(" ");

    let msg = format!("mode: {mode}{activity}{status}  [{hints}]");
    let style = if app.directory.error.is_some() {
        Style::default().fg(app.theme.error).bg(app.theme.status_bg)
    } else {
        Style::default().fg(app.theme.status_fg).bg(app.theme.status_bg)
    };
    f.render_widget(Paragraph::new(msg).style(style), area);
}

/// Compute a rectangle centered within `area` with a maximum size.
pub fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let x = area.x + area.width.saturating_sub(width) / 2;
    let y = area.y + area.height.saturating_sub(height) / 2;
    Rect {
        x,
        y,
        width: width.min(area.width),
        height: height.min(area.height),
    }
}

/// Sign-in dialog. The password is masked and demo accounts are listed.
pub fn render_login_modal(f: &mut Frame, area: Rect, app: &AppState, state: &ModalState) {
    let ModalState::Login { field, email, password, error } = state else {
        return;
    };
    let width = 56u16.min(area.width.saturating_sub(4)).max(40);
    let height = if error.is_some() { 12 } else { 10 };
    let rect = centered_rect(width, height, area);

    let active = Style::default().fg(app.theme.highlight_fg).bg(app.theme.highlight_bg);
    let idle = Style::default().fg(app.theme.text);
    let (email_style, password_style) = match field {
        LoginField::Email => (active, idle),
        LoginField::Password => (idle, active),
    };
    let cursor = |which: LoginField| if *field == which { "_" } else { "" };

    let mut lines = vec![
        Line::from(vec![
            Span::raw("Email:    "),
            Span::styled(format!("{email}{}", cursor(LoginField::Email)), email_style),
        ]),
        Line::from(vec![
            Span::raw("Password: "),
            Span::styled(
                format!("{}{}", "*".repeat(password.chars().count()), cursor(LoginField::Password)),
                password_style,
            ),
        ]),
        Line::raw(""),
    ];
    if app.auth.is_loading {
        lines.push(Line::styled("Signing in...", Style::default().fg(app.theme.muted)));
    }
    if let Some(err) = error {
        lines.push(Line::styled(err.clone(), Style::default().fg(app.theme.error)));
        lines.push(Line::raw(""));
    }
    lines.push(Line::styled(
        "Demo: admin@example.com / admin123",
        Style::default().fg(app.theme.muted),
    ));
    lines.push(Line::styled(
        "      user@example.com / user123",
        Style::default().fg(app.theme.muted),
    ));
    lines.push(Line::styled(
        "Tab switch field, Enter sign in, Esc quit",
        Style::default().fg(app.theme.muted).add_modifier(Modifier::ITALIC),
    ));

    let p = Paragraph::new(lines).wrap(Wrap { trim: false }).block(
        Block::default()
            .title("Sign in")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(app.theme.border)),
    );
    f.render_widget(Clear, rect);
    f.render_widget(p, rect);
}

/// City, company and sort pickers share one list layout.
pub fn render_picker_modal(f: &mut Frame, area: Rect, app: &AppState, state: &ModalState) {
    let (title, options, selected, current) = match state {
        ModalState::CityFilter { selected } => {
            let mut opts = vec!["(any)".to_string()];
            opts.extend(app.directory.unique_cities());
            ("Filter by city", opts, *selected, app.directory.filters().selected_city.clone())
        }
        ModalState::CompanyFilter { selected } => {
            let mut opts = vec!["(any)".to_string()];
            opts.extend(app.directory.unique_companies());
            ("Filter by company", opts, *selected, app.directory.filters().selected_company.clone())
        }
        ModalState::SortMenu { selected } => {
            let opts = SortField::ALL.iter().map(|f| f.label().to_string()).collect();
            let current = Some(app.directory.sorting().field.label().to_string());
            ("Sort by", opts, *selected, current)
        }
        _ => return,
    };

    let width = 48u16.min(area.width.saturating_sub(4)).max(30);
    let height = (options.len() as u16 + 2).min(area.height.saturating_sub(4)).max(5);
    let rect = centered_rect(width, height, area);
    let visible = height.saturating_sub(2) as usize;
    let offset = selected.saturating_sub(visible.saturating_sub(1));

    let lines: Vec<Line> = options
        .iter()
        .enumerate()
        .skip(offset)
        .take(visible)
        .map(|(idx, label)| {
            let marker = if idx == selected { "▶" } else { " " };
            let active = current.as_deref() == Some(label.as_str()) || (idx == 0 && current.is_none());
            let check = if active { "[x]" } else { "[ ]" };
            let style = if idx == selected {
                Style::default().fg(app.theme.highlight_fg).bg(app.theme.highlight_bg)
            } else {
                Style::default().fg(app.theme.text)
            };
            Line::styled(format!("{marker} {check} {label}"), style)
        })
        .collect();

    let p = Paragraph::new(lines).block(
        Block::default()
            .title(title)
            .borders(Borders::ALL)
            .border_style(Style::default().fg(app.theme.border)),
    );
    f.render_widget(Clear, rect);
    f.render_widget(p, rect);
}

/// Render a generic informational dialog.
pub fn render_info_modal(f: &mut Frame, area: Rect, app: &AppState, state: &ModalState) {
    if let ModalState::Info { message } = state {
        // wrap long text
        let max_w = area.width.saturating_sub(6).max(30);
        let min_w = 40u16.min(max_w);
        let approx_lines = (message.len() as u16 / (min_w.saturating_sub(4).max(10))).max(1);
        let max_h = area.height.saturating_sub(6).max(5);
        let height = (approx_lines + 4).min(max_h).max(5);
        let rect = centered_rect(min_w, height, area);
        let p = Paragraph::new(message.clone()).wrap(Wrap { trim: false }).block(
            Block::default()
                .title("Info")
                .borders(Borders::ALL)
                .border_style(Style::default().fg(app.theme.border)),
        );
        f.render_widget(Clear, rect);
        f.render_widget(p, rect);
    }
}
