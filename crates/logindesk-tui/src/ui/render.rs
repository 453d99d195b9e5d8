use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

use crate::app::{App, AppState, LoginFocus};

use super::styles;

/// Width of the login dialog, borders included
const LOGIN_WIDTH: u16 = 50;

/// Visible width of the text inputs
const FIELD_WIDTH: usize = 24;

pub fn render(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Title bar
            Constraint::Min(6),    // Main content
            Constraint::Length(2), // Status bar
        ])
        .split(frame.area());

    render_title_bar(frame, app, chunks[0]);
    render_main_content(frame, app, chunks[1]);
    render_status_bar(frame, app, chunks[2]);

    // Render overlays
    if matches!(app.state, AppState::LoggingIn | AppState::ShowingModal)
        || (app.state == AppState::ShowingAlert && app.navigated_to.is_none())
    {
        render_login_overlay(frame, app);
    }

    if let (AppState::ShowingModal, Some(message)) = (app.state, app.modal_message.as_deref()) {
        render_message_overlay(frame, message, false);
    }

    if let (AppState::ShowingAlert, Some(message)) = (app.state, app.alert.as_deref()) {
        render_message_overlay(frame, message, true);
    }

    if matches!(app.state, AppState::ConfirmingQuit) {
        render_quit_overlay(frame);
    }
}

fn render_title_bar(frame: &mut Frame, app: &App, area: Rect) {
    let title = "  logindesk";
    let target = format!("{} ", app.config.api_url);

    let title_line = Line::from(vec![
        Span::styled(title, styles::title_style()),
        Span::raw(" ".repeat(
            (area.width as usize)
                .saturating_sub(title.len() + target.chars().count()),
        )),
        Span::styled(target, styles::muted_style()),
    ]);

    let block = Block::default()
        .borders(Borders::BOTTOM)
        .border_style(styles::muted_style());

    let paragraph = Paragraph::new(title_line).block(block);
    frame.render_widget(paragraph, area);
}

fn render_main_content(frame: &mut Frame, app: &App, area: Rect) {
    let mut lines = vec![Line::from("")];

    match (&app.navigated_to, &app.session) {
        (Some(target), session) => {
            lines.push(Line::from(Span::styled("  Signed in", styles::success_style())));
            lines.push(Line::from(""));
            if let Some(session) = session {
                lines.push(Line::from(vec![
                    Span::styled("  User:   ", styles::muted_style()),
                    Span::styled(session.userid.clone(), styles::list_item_style()),
                ]));
                lines.push(Line::from(vec![
                    Span::styled("  Token:  ", styles::muted_style()),
                    Span::styled(mask_token(&session.token), styles::list_item_style()),
                ]));
            }
            lines.push(Line::from(vec![
                Span::styled("  Open:   ", styles::muted_style()),
                Span::styled(target.clone(), styles::highlight_style()),
            ]));
        }
        (None, _) => {
            if let Some((session, age)) = app.previous_session() {
                lines.push(Line::from(Span::styled(
                    format!("  Last session: {} (saved {})", session.userid, age),
                    styles::muted_style(),
                )));
            }
        }
    }

    let paragraph = Paragraph::new(lines);
    frame.render_widget(paragraph, area);
}

fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let shortcuts = match app.state {
        AppState::Main | AppState::ConfirmingQuit => "[q]uit",
        _ => "[Tab] next | [Enter] select | [Esc] quit",
    };

    let left_text = match app.status_message {
        Some(ref msg) => format!(" {} ", msg),
        None => format!(" client {} ", app.controller.client_id()),
    };
    let right_text = format!(" {} ", shortcuts);

    let width = area.width as usize;
    let padding_len = width
        .saturating_sub(left_text.chars().count())
        .saturating_sub(right_text.len());
    let status_line = Line::from(vec![
        Span::styled(left_text, styles::muted_style()),
        Span::raw(" ".repeat(padding_len)),
        Span::styled(right_text, styles::muted_style()),
    ]);
    let paragraph = Paragraph::new(status_line).style(styles::status_bar_style());
    frame.render_widget(paragraph, area);
}

fn render_login_overlay(frame: &mut Frame, app: &App) {
    let area = centered_rect_fixed(LOGIN_WIDTH, 11, frame.area());

    // Clear the area
    frame.render_widget(Clear, area);

    let form = &app.controller.form;
    let mut lines = vec![
        Line::from(Span::styled("  Sign in", styles::title_style())),
        Line::from(""),
    ];

    let email_focused = app.login_focus == LoginFocus::Email;
    lines.push(field_line("Email:    ", tail(&form.email, FIELD_WIDTH), email_focused));

    let password_focused = app.login_focus == LoginFocus::Password;
    let masked = "*".repeat(form.password.chars().count().min(FIELD_WIDTH));
    lines.push(field_line("Password: ", masked, password_focused));

    lines.push(Line::from(""));
    let login_label = if app.is_submitting() { "  ...  " } else { " Login " };
    lines.push(Line::from(vec![
        Span::raw("       "),
        button(login_label, app.login_focus == LoginFocus::Login),
        Span::raw("    "),
        button(" Reset ", app.login_focus == LoginFocus::Reset),
    ]));

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border_style(true))
        .style(Style::default());

    let paragraph = Paragraph::new(lines).block(block);
    frame.render_widget(paragraph, area);
}

fn field_line(label: &'static str, value: String, focused: bool) -> Line<'static> {
    let style = if focused {
        styles::selected_style()
    } else {
        styles::list_item_style()
    };
    let cursor = if focused { "▌" } else { " " };
    let padded = format!("{:<width$}", value, width = FIELD_WIDTH);
    Line::from(vec![
        Span::raw("  "),
        Span::styled(label, styles::muted_style()),
        Span::styled("[", styles::muted_style()),
        Span::styled(format!("{}{}", padded, cursor), style),
        Span::styled("]", styles::muted_style()),
    ])
}

fn button(label: &'static str, focused: bool) -> Span<'static> {
    if focused {
        Span::styled(format!("[▶{}◀]", label), styles::selected_style())
    } else {
        Span::styled(format!("[ {} ]", label), styles::list_item_style())
    }
}

/// Modal (invalid credentials) or blocking alert
fn render_message_overlay(frame: &mut Frame, message: &str, alert: bool) {
    let area = centered_rect_fixed(LOGIN_WIDTH - 4, 7, frame.area());
    frame.render_widget(Clear, area);

    let (title, border) = if alert {
        (" ! ", styles::alert_border_style())
    } else {
        ("", styles::border_style(true))
    };

    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(format!(" {}", message), styles::error_style())),
        Line::from(""),
        Line::from(vec![
            Span::styled(" Press ", styles::muted_style()),
            Span::styled("[Enter]", styles::help_key_style()),
            Span::styled(" to close", styles::muted_style()),
        ]),
    ];

    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(border);

    let paragraph = Paragraph::new(lines).block(block).wrap(Wrap { trim: false });
    frame.render_widget(paragraph, area);
}

/// Create a centered rectangle with fixed dimensions
fn centered_rect_fixed(width: u16, height: u16, r: Rect) -> Rect {
    let x = r.x + (r.width.saturating_sub(width)) / 2;
    let y = r.y + (r.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width.min(r.width), height.min(r.height))
}

fn render_quit_overlay(frame: &mut Frame) {
    let area = centered_rect_fixed(LOGIN_WIDTH - 4, 6, frame.area());

    // Clear the area
    frame.render_widget(Clear, area);

    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            "   Are you sure you want to quit?",
            styles::highlight_style(),
        )),
        Line::from(""),
        Line::from(vec![
            Span::styled("   Press ", styles::muted_style()),
            Span::styled("[Y]", styles::help_key_style()),
            Span::styled(" to quit, ", styles::muted_style()),
            Span::styled("[N]", styles::help_key_style()),
            Span::styled(" to cancel", styles::muted_style()),
        ]),
    ];

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border_style(true))
        .style(Style::default());

    let paragraph = Paragraph::new(lines).block(block);

    frame.render_widget(paragraph, area);
}

/// Last `max` characters, so the cursor end of a long input stays visible
fn tail(s: &str, max: usize) -> String {
    let count = s.chars().count();
    s.chars().skip(count.saturating_sub(max)).collect()
}

/// Show only the start of a token
fn mask_token(token: &str) -> String {
    let prefix: String = token.chars().take(6).collect();
    if token.chars().count() > 6 {
        format!("{}…", prefix)
    } else {
        prefix
    }
}
