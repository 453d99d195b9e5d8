//! logindesk - a terminal login form.
//!
//! Signs in to a login API with an application client id/secret pair and
//! keeps the returned session token in local storage.

mod app;
mod ui;

use std::io::{self, Write};
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use logindesk_core::{
    browser, Config, FileStore, LoginClient, LoginController, LoginForm, Outcome, SecretStore,
    SubmitRejected,
};

use app::{App, AppState};
use ui::input::handle_input;
use ui::render::render;

// ============================================================================
// Constants
// ============================================================================

/// Timeout for polling terminal events (in milliseconds)
const EVENT_POLL_TIMEOUT_MS: u64 = 100;

/// Log file name in the data directory
const LOG_FILE: &str = "logindesk.log";

/// Initialize the tracing subscriber for logging.
///
/// Logs go to a file so they never draw over the terminal UI. Use the
/// RUST_LOG env var to control log level (e.g., RUST_LOG=debug).
fn init_tracing() -> WorkerGuard {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    let log_dir = dirs::data_dir()
        .map(|d| d.join("logindesk"))
        .unwrap_or_else(|| PathBuf::from("."));
    let _ = std::fs::create_dir_all(&log_dir);
    let (writer, guard) = tracing_appender::non_blocking(tracing_appender::rolling::never(log_dir, LOG_FILE));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(writer).with_ansi(false))
        .with(filter)
        .init();

    guard
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let _guard = init_tracing();

    // Check for CLI commands
    let args: Vec<String> = std::env::args().collect();
    match args.get(1).map(String::as_str) {
        Some("--login") => return login_cli(args.get(2).cloned()).await,
        Some("--check-client") => return check_client(),
        Some("--set-secret") => return set_secret(),
        Some("--forget-secret") => return forget_secret(),
        _ => {}
    }

    info!("logindesk starting");

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = match App::new() {
        Ok(mut app) => {
            app.startup_checks();
            run_app(&mut terminal, &mut app).await
        }
        Err(e) => Err(e),
    };

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(e) = result {
        eprintln!("Error: {}", e);
    }

    info!("logindesk shutting down");
    Ok(())
}

/// Non-interactive login: prompt for the password, submit, report.
async fn login_cli(email: Option<String>) -> Result<()> {
    let mut config = Config::load()?;
    let mut controller = LoginController::new(&config);

    let email = match email {
        Some(email) => email,
        None => {
            let initial = controller.form.email.clone();
            prompt_email(&initial)?
        }
    };
    let password = rpassword::prompt_password("Password: ")?;
    controller.form = LoginForm::new(email.clone(), password);

    let credentials = config.resolve_credentials()?;
    let client = LoginClient::new(config.api_url.clone(), credentials, config.request_timeout())?;
    let mut store = FileStore::open_default()?;

    eprintln!("{}", controller.messages().signing_in);
    let outcome = match controller.submit(&client, &mut store).await {
        Ok(outcome) => outcome,
        Err(SubmitRejected::LegacyBrowser(alert)) => anyhow::bail!("{}", alert),
        Err(rejected) => anyhow::bail!("Submit rejected: {:?}", rejected),
    };

    match outcome {
        Outcome::Navigate(target) => {
            config
                .record_last_email(&Config::config_path()?, &email)
                .context("Failed to save config")?;
            println!("{}", target);
            Ok(())
        }
        Outcome::InvalidCredentials(message)
        | Outcome::StorageFailed(message)
        | Outcome::TransportError(Some(message)) => anyhow::bail!("{}", message),
        Outcome::TransportError(None) => anyhow::bail!("Login failed"),
    }
}

fn prompt_email(initial: &str) -> Result<String> {
    if initial.is_empty() {
        print!("Email: ");
    } else {
        print!("Email [{}]: ", initial);
    }
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    let input = input.trim();
    Ok(if input.is_empty() {
        initial.to_string()
    } else {
        input.to_string()
    })
}

/// Report whether the configured client identity is a legacy browser
fn check_client() -> Result<()> {
    let config = Config::load()?;
    let identity = &config.identity;
    match browser::detect_legacy(identity) {
        Some(legacy) => anyhow::bail!(
            "{} / {}: legacy ({})",
            identity.app_name,
            identity.app_version,
            legacy.token()
        ),
        None => {
            println!("{} / {}: supported", identity.app_name, identity.app_version);
            Ok(())
        }
    }
}

/// Store the client secret for the configured client id in the OS keychain
fn set_secret() -> Result<()> {
    let config = Config::load()?;
    let secret = rpassword::prompt_password(format!("Client secret for '{}': ", config.client_id))?;
    if secret.is_empty() {
        anyhow::bail!("Client secret must not be empty");
    }
    SecretStore::store(&config.client_id, &secret)?;
    println!("Client secret stored for '{}'", config.client_id);
    Ok(())
}

/// Remove the keychain entry written by `--set-secret`
fn forget_secret() -> Result<()> {
    let config = Config::load()?;
    SecretStore::delete(&config.client_id)?;
    println!("Client secret removed for '{}'", config.client_id);
    Ok(())
}

async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
) -> Result<()> {
    loop {
        // Draw UI
        terminal.draw(|f| render(f, app))?;

        // Poll for events with timeout to allow background updates
        if event::poll(Duration::from_millis(EVENT_POLL_TIMEOUT_MS))? {
            if let Event::Key(key) = event::read()? {
                // Ctrl+C to quit
                if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
                    return Ok(());
                }

                // Handle input
                if handle_input(app, key).await? {
                    return Ok(());
                }
            }
        }

        // Check for a completed login
        app.check_background_tasks();

        // Check if we should quit
        if matches!(app.state, AppState::Quitting) {
            return Ok(());
        }
    }
}
