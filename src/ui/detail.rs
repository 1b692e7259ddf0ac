use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};

use crate::app::AppState;
use crate::app::keymap::KeyAction;

/// Profile page for `/user/:id`: identity card on the left, contact and
/// company details on the right.
pub fn render_user_profile(f: &mut Frame, area: Rect, app: &AppState, id: u64) {
    let block = |title: String| {
        Block::default()
            .title(title)
            .borders(Borders::ALL)
            .border_style(Style::default().fg(app.theme.border))
    };
    let muted = Style::default().fg(app.theme.muted);
    let back = app.keymap.keys_for(KeyAction::Back).join("/");
    let refresh = app.keymap.keys_for(KeyAction::Refresh).join("/");

    let user = match app.detail.current() {
        Some(u) if u.id == id && !app.detail.loading => u,
        _ => {
            let (text, style) = if app.detail.loading {
                ("Loading user...".to_string(), Style::default().fg(app.theme.text))
            } else if let Some(err) = &app.detail.error {
                (format!("Error: {err}\n\n{back}: back to users  {refresh}: retry"), Style::default().fg(app.theme.error))
            } else {
                (format!("User not found\n\n{back}: back to users"), Style::default().fg(app.theme.text))
            };
            let p = Paragraph::new(text).style(style).block(block(format!("User {id}")));
            f.render_widget(p, area);
            return;
        }
    };

    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(40), Constraint::Percentage(60)].as_ref())
        .split(area);

    let label = |s: &'static str| Span::styled(s, muted);
    let bold = Style::default().fg(app.theme.title).add_modifier(Modifier::BOLD);

    let card = vec![
        Line::from(Span::styled(format!("[ {} ]", app.detail.initials()), bold)),
        Line::raw(""),
        Line::from(Span::styled(user.name.clone(), bold)),
        Line::from(format!("@{}", user.username)),
        Line::raw(""),
        Line::from(vec![label("Company  "), Span::raw(user.company.name.clone())]),
        Line::from(vec![label("City     "), Span::raw(user.address.city.clone())]),
        Line::raw(""),
        Line::styled(format!("{back}: back  {refresh}: refresh"), muted),
    ];
    let left = Paragraph::new(card)
        .style(Style::default().fg(app.theme.text))
        .wrap(Wrap { trim: false })
        .block(block(format!("{} (#{id})", app.detail.display_name())));
    f.render_widget(left, cols[0]);

    let link = |v: Option<String>| v.unwrap_or_default();
    let a = &user.address;
    let details = vec![
        Line::styled("Contact", bold),
        Line::from(vec![label("Email    "), Span::raw(user.email.clone())]),
        Line::from(vec![label("         "), Span::styled(link(app.detail.email_link(Some(user))), muted)]),
        Line::from(vec![label("Phone    "), Span::raw(user.phone.clone())]),
        Line::from(vec![label("         "), Span::styled(link(app.detail.phone_link(Some(user))), muted)]),
        Line::from(vec![label("Website  "), Span::raw(user.website.clone())]),
        Line::from(vec![label("         "), Span::styled(link(app.detail.website_link(Some(user))), muted)]),
        Line::raw(""),
        Line::styled("Address", bold),
        Line::from(format!("{}, {}", a.street, a.suite)),
        Line::from(format!("{} {}", a.city, a.zipcode)),
        Line::from(vec![label("Geo      "), Span::raw(format!("{}, {}", a.geo.lat, a.geo.lng))]),
        Line::raw(""),
        Line::styled("Company", bold),
        Line::from(user.company.name.clone()),
        Line::from(Span::styled(
            format!("\"{}\"", user.company.catch_phrase),
            Style::default().add_modifier(Modifier::ITALIC),
        )),
        Line::from(user.company.bs.clone()),
    ];
    let right = Paragraph::new(details)
        .style(Style::default().fg(app.theme.text))
        .wrap(Wrap { trim: false })
        .block(block("Details".to_string()));
    f.render_widget(right, cols[1]);
}
