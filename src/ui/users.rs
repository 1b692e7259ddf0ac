use ratatui::Frame;
use ratatui::layout::{Constraint, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, Wrap};

use crate::app::{AppState, ModalState};
use crate::search::SortOrder;

pub fn render_users_table(f: &mut Frame, area: Rect, app: &mut AppState) {
    // two border rows, the header and the footer line
    let body_height = area.height.saturating_sub(4) as usize;
    if body_height > 0 {
        app.rows_per_page = body_height;
    }
    app.clamp_selection();

    let view = app.directory.view();
    let start = (app.selected_index / app.rows_per_page) * app.rows_per_page;
    let end = (start + app.rows_per_page).min(view.users.len());
    let slice = view.users.get(start..end).unwrap_or_default();

    let mut rows: Vec<Row> = slice
        .iter()
        .enumerate()
        .map(|(i, u)| {
            let style = if start + i == app.selected_index {
                Style::default()
                    .fg(app.theme.highlight_fg)
                    .bg(app.theme.highlight_bg)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(app.theme.text)
            };
            Row::new(vec![
                Cell::from(u.name.clone()),
                Cell::from(u.email.clone()),
                Cell::from(u.company.name.clone()),
                Cell::from(u.address.city.clone()),
            ])
            .style(style)
        })
        .collect();

    let footer = if app.directory.loading_more {
        "Loading more users...".to_string()
    } else if view.has_more {
        format!("{} of {} shown, m or Down for more", view.users.len(), view.total_matches)
    } else if view.users.is_empty() && !app.directory.loading {
        "No users match the current filters".to_string()
    } else {
        format!("{} of {} shown", view.users.len(), view.total_matches)
    };
    if end == view.users.len() {
        rows.push(Row::new(vec![Cell::from(footer)]).style(Style::default().fg(app.theme.muted)));
    }

    let sorting = app.directory.sorting();
    let arrow = match sorting.order {
        SortOrder::Asc => "↑",
        SortOrder::Desc => "↓",
    };
    let title = format!("Users (sorted by {} {arrow})", sorting.field.label());

    let widths = [
        Constraint::Percentage(28),
        Constraint::Percentage(30),
        Constraint::Percentage(24),
        Constraint::Percentage(18),
    ];
    let header = Row::new(vec!["NAME", "EMAIL", "COMPANY", "CITY"])
        .style(Style::default().fg(app.theme.title).add_modifier(Modifier::BOLD));

    let table = Table::new(rows, widths)
        .header(header)
        .block(
            Block::default()
                .title(title)
                .borders(Borders::ALL)
                .border_style(Style::default().fg(app.theme.border)),
        )
        .column_spacing(1);
    f.render_widget(table, area);
}

/// Right-hand pane: active filters and a short card for the selected user.
pub fn render_selected_summary(f: &mut Frame, area: Rect, app: &AppState) {
    let filters = app.directory.filters();
    let mut text = String::new();
    text.push_str(&format!(
        "Search:  {}\nCity:    {}\nCompany: {}\n\n",
        if filters.search_query.is_empty() { "-" } else { filters.search_query.as_str() },
        filters.selected_city.as_deref().unwrap_or("any"),
        filters.selected_company.as_deref().unwrap_or("any"),
    ));

    if let Some(error) = &app.directory.error {
        text.push_str(&format!("Error: {error}\n\n"));
    }

    match app.selected_user() {
        Some(u) => text.push_str(&format!(
            "{}\n@{}\n{}\n{}\n{}, {}",
            u.name, u.username, u.email, u.phone, u.company.name, u.address.city
        )),
        None if app.directory.loading => text.push_str("Loading users..."),
        None => {}
    }

    let style = if app.directory.error.is_some() {
        Style::default().fg(app.theme.error)
    } else {
        Style::default().fg(app.theme.text)
    };
    let p = Paragraph::new(text).style(style).wrap(Wrap { trim: false }).block(
        Block::default()
            .title("Details")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(app.theme.border)),
    );
    f.render_widget(p, area);
}

pub fn render_delete_modal(f: &mut Frame, area: Rect, app: &AppState, state: &ModalState) {
    let ModalState::DeleteConfirm { selected, id } = state else {
        return;
    };
    let rect = crate::ui::components::centered_rect(50, 7, area);
    let name = app.directory.find(*id).map(|u| u.name.clone()).unwrap_or_default();
    let yes = if *selected == 0 { "[Yes]" } else { " Yes " };
    let no = if *selected == 1 { "[No]" } else { " No " };
    let body = format!("Delete user '{name}' (id {id})?\n\n  {yes}    {no}");
    let p = Paragraph::new(body).block(
        Block::default()
            .title("Confirm delete")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(app.theme.border)),
    );
    f.render_widget(Clear, rect);
    f.render_widget(p, rect);
}
