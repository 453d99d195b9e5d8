//! Keyboard input handling for the TUI.
//!
//! This module handles all keyboard events and translates them into
//! application state changes.

use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent};

use crate::app::{App, AppState, LoginFocus};

/// Handle keyboard input. Returns true if the app should quit.
pub async fn handle_input(app: &mut App, key: KeyEvent) -> Result<bool> {
    match app.state {
        AppState::LoggingIn => handle_login_input(app, key).await,
        AppState::ShowingAlert => {
            if matches!(key.code, KeyCode::Enter | KeyCode::Esc | KeyCode::Char(' ')) {
                app.dismiss_alert();
            }
            Ok(false)
        }
        AppState::ShowingModal => {
            if matches!(key.code, KeyCode::Enter | KeyCode::Esc | KeyCode::Char(' ')) {
                app.dismiss_modal();
            }
            Ok(false)
        }
        AppState::Main => {
            if matches!(key.code, KeyCode::Char('q') | KeyCode::Esc) {
                app.state = AppState::ConfirmingQuit;
            }
            Ok(false)
        }
        AppState::ConfirmingQuit => {
            match key.code {
                KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => {
                    app.state = AppState::Quitting;
                    return Ok(true);
                }
                KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                    app.state = AppState::Main;
                }
                _ => {}
            }
            Ok(false)
        }
        AppState::Quitting => Ok(true),
    }
}

async fn handle_login_input(app: &mut App, key: KeyEvent) -> Result<bool> {
    match key.code {
        KeyCode::Esc => {
            // Quit if on login screen
            app.state = AppState::Quitting;
            return Ok(true);
        }
        KeyCode::Down | KeyCode::Tab => {
            app.login_focus = app.login_focus.next();
        }
        KeyCode::Up | KeyCode::BackTab => {
            app.login_focus = app.login_focus.previous();
        }
        KeyCode::Enter => match app.login_focus {
            LoginFocus::Email => {
                app.login_focus = LoginFocus::Password;
            }
            // Enter in the password field submits, same as the button
            LoginFocus::Password | LoginFocus::Login => {
                app.submit();
            }
            LoginFocus::Reset => {
                app.reset();
            }
        },
        KeyCode::Backspace => {
            if let Some(field) = app.login_focus.field() {
                app.controller.form.pop_char(field);
            }
        }
        KeyCode::Char(c) => match app.login_focus.field() {
            Some(field) => {
                app.controller.form.push_char(field, c);
            }
            None => {
                // Space activates the focused button
                if c == ' ' {
                    match app.login_focus {
                        LoginFocus::Login => app.submit(),
                        LoginFocus::Reset => app.reset(),
                        LoginFocus::Email | LoginFocus::Password => {}
                    }
                }
            }
        },
        _ => {}
    }
    Ok(false)
}
