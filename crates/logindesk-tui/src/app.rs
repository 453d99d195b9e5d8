//! Application state management for logindesk.
//!
//! This module contains the `App` struct that owns the login controller, the
//! session store and the UI state, and coordinates the background login task.

use std::path::PathBuf;

use anyhow::Result;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use logindesk_core::{
    ApiError, Config, FileStore, KeyValueStore, LoginClient, LoginController, LoginField,
    LoginResponse, Outcome, StoredSession, SubmitRejected, SubmitRequest,
};

// ============================================================================
// Constants
// ============================================================================

/// Buffer size for the login result channel.
/// Only one login is in flight at a time, so a small buffer is plenty.
const CHANNEL_BUFFER_SIZE: usize = 4;

// ============================================================================
// UI State Types
// ============================================================================

/// Overall application state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    LoggingIn,
    /// Blocking alert; any dismissal returns to the previous screen
    ShowingAlert,
    /// Invalid-credentials dialog over the login form
    ShowingModal,
    /// Logged in, showing the navigation target
    Main,
    ConfirmingQuit,
    Quitting,
}

/// Login form focus state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginFocus {
    Email,
    Password,
    Login,
    Reset,
}

impl LoginFocus {
    pub fn next(self) -> Self {
        match self {
            LoginFocus::Email => LoginFocus::Password,
            LoginFocus::Password => LoginFocus::Login,
            LoginFocus::Login => LoginFocus::Reset,
            LoginFocus::Reset => LoginFocus::Email,
        }
    }

    pub fn previous(self) -> Self {
        match self {
            LoginFocus::Email => LoginFocus::Reset,
            LoginFocus::Password => LoginFocus::Email,
            LoginFocus::Login => LoginFocus::Password,
            LoginFocus::Reset => LoginFocus::Login,
        }
    }

    /// The text input under focus, if any
    pub fn field(self) -> Option<LoginField> {
        match self {
            LoginFocus::Email => Some(LoginField::Email),
            LoginFocus::Password => Some(LoginField::Password),
            LoginFocus::Login | LoginFocus::Reset => None,
        }
    }
}

// ============================================================================
// Main Application Struct
// ============================================================================

pub struct App {
    pub config: Config,
    /// Where `last_email` is recorded after a successful login
    config_path: PathBuf,
    pub controller: LoginController,
    /// `None` when no client secret could be resolved
    client: Option<LoginClient>,
    client_error: Option<String>,
    store: Box<dyn KeyValueStore + Send>,

    // UI State
    pub state: AppState,
    pub login_focus: LoginFocus,
    pub alert: Option<String>,
    alert_return: AppState,
    pub modal_message: Option<String>,
    pub status_message: Option<String>,

    // Set once logged in
    pub session: Option<StoredSession>,
    pub navigated_to: Option<String>,

    // Background login task
    pending: Option<SubmitRequest>,
    login_rx: mpsc::Receiver<Result<LoginResponse, ApiError>>,
    login_tx: mpsc::Sender<Result<LoginResponse, ApiError>>,
}

impl App {
    /// Create the application from the on-disk config and storage
    pub fn new() -> Result<Self> {
        let config_path = Config::config_path()?;
        let config = match Config::load() {
            Ok(c) => c,
            Err(e) => {
                warn!(error = %e, "Failed to load config, using defaults");
                Config::default()
            }
        };
        debug!(api_url = %config.api_url, client_id = %config.client_id, "Config loaded");

        let store = FileStore::open_default()?;
        debug!(path = %store.path().display(), "Storage opened");

        let client = match config.resolve_credentials() {
            Ok(credentials) => {
                LoginClient::new(config.api_url.clone(), credentials, config.request_timeout())
                    .map_err(|e| e.to_string())
            }
            Err(e) => Err(e.to_string()),
        };

        Ok(Self::with_parts(config, config_path, Box::new(store), client))
    }

    /// Assemble an app from already-built parts
    pub fn with_parts(
        config: Config,
        config_path: PathBuf,
        store: Box<dyn KeyValueStore + Send>,
        client: std::result::Result<LoginClient, String>,
    ) -> Self {
        let controller = LoginController::new(&config);
        let (client, client_error) = match client {
            Ok(c) => (Some(c), None),
            Err(e) => {
                warn!(error = %e, "Login client unavailable");
                (None, Some(e))
            }
        };
        let login_focus = if controller.form.email.is_empty() {
            LoginFocus::Email
        } else {
            LoginFocus::Password
        };
        let (tx, rx) = mpsc::channel(CHANNEL_BUFFER_SIZE);

        Self {
            config,
            config_path,
            controller,
            client,
            client_error,
            store,
            state: AppState::LoggingIn,
            login_focus,
            alert: None,
            alert_return: AppState::LoggingIn,
            modal_message: None,
            status_message: None,
            session: None,
            navigated_to: None,
            pending: None,
            login_rx: rx,
            login_tx: tx,
        }
    }

    /// Run the legacy client check shown when the form first appears
    pub fn startup_checks(&mut self) {
        if let Some(alert) = self.controller.compatibility_alert() {
            self.show_alert(alert.to_string());
        }
    }

    pub fn is_submitting(&self) -> bool {
        self.controller.is_submitting()
    }

    /// Session saved by an earlier run, for the login screen hint
    pub fn previous_session(&self) -> Option<(StoredSession, String)> {
        let client_id = self.controller.client_id();
        let session = StoredSession::load(self.store.as_ref(), client_id)?;
        let age = self
            .store
            .get_item(&StoredSession::token_key(client_id))
            .map(|item| item.age_display())
            .unwrap_or_default();
        Some((session, age))
    }

    // =========================================================================
    // Form actions
    // =========================================================================

    /// Submit the login form. Button activation and Enter in the password
    /// field both end up here.
    pub fn submit(&mut self) {
        let request = match self.controller.begin_submit() {
            Ok(request) => request,
            Err(SubmitRejected::LegacyBrowser(alert)) => {
                self.show_alert(alert.to_string());
                return;
            }
            Err(SubmitRejected::Pending) => {
                self.status_message = Some(self.controller.messages().already_signing_in.to_string());
                return;
            }
            Err(SubmitRejected::Finished) => return,
        };

        let client = match self.client.clone() {
            Some(client) => client,
            None => {
                let reason = self
                    .client_error
                    .clone()
                    .unwrap_or_else(|| "login client unavailable".to_string());
                self.controller.complete(
                    &request,
                    Err(ApiError::InvalidRequest(reason.clone())),
                    self.store.as_mut(),
                );
                // Shown even when transport errors are suppressed
                let message = self.controller.messages().login_error;
                self.status_message = Some(reason);
                self.show_alert(message.to_string());
                return;
            }
        };

        let tx = self.login_tx.clone();
        let fields = request.fields.clone();
        tokio::spawn(async move {
            let result = client.login(&fields).await;
            if tx.send(result).await.is_err() {
                warn!("Login result dropped, receiver closed");
            }
        });

        self.pending = Some(request);
        self.status_message = Some(self.controller.messages().signing_in.to_string());
    }

    /// Clear email and password
    pub fn reset(&mut self) {
        self.controller.reset();
        self.login_focus = LoginFocus::Email;
    }

    pub fn dismiss_alert(&mut self) {
        self.alert = None;
        self.state = self.alert_return;
    }

    pub fn dismiss_modal(&mut self) {
        self.modal_message = None;
        self.state = AppState::LoggingIn;
    }

    // =========================================================================
    // Background task handling
    // =========================================================================

    /// Apply a finished login, if one has arrived
    pub fn check_background_tasks(&mut self) {
        while let Ok(result) = self.login_rx.try_recv() {
            match self.pending.take() {
                Some(request) => {
                    let outcome = self.controller.complete(&request, result, self.store.as_mut());
                    self.apply_outcome(&request, outcome);
                }
                None => warn!("Login result without a pending request"),
            }
        }
    }

    fn apply_outcome(&mut self, request: &SubmitRequest, outcome: Outcome) {
        self.status_message = None;
        match outcome {
            Outcome::Navigate(target) => {
                self.session = StoredSession::load(self.store.as_ref(), self.controller.client_id());
                if let Err(e) = self.config.record_last_email(&self.config_path, &request.email) {
                    warn!(error = %e, "Failed to save config");
                }
                info!(target = %target, "Navigating");
                self.navigated_to = Some(target);
                self.state = AppState::Main;
            }
            Outcome::InvalidCredentials(message) => {
                self.modal_message = Some(message.to_string());
                self.state = AppState::ShowingModal;
            }
            Outcome::TransportError(Some(message)) | Outcome::StorageFailed(message) => {
                self.show_alert(message.to_string());
            }
            Outcome::TransportError(None) => {}
        }
    }

    fn show_alert(&mut self, message: String) {
        if self.state != AppState::ShowingAlert {
            self.alert_return = self.state;
        }
        self.alert = Some(message);
        self.state = AppState::ShowingAlert;
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::time::Duration;

    use logindesk_core::{ClientCredentials, ClientIdentity, LoginForm, MemoryStore, SubmitState};

    pub(crate) fn test_config() -> Config {
        Config {
            client_id: "web".to_string(),
            // Nothing listens on port 9 locally; requests fail fast
            api_url: "http://127.0.0.1:9".to_string(),
            context_path: "https://example.com/app".to_string(),
            last_email: None,
            ..Config::default()
        }
    }

    pub(crate) fn test_app(config: Config) -> App {
        let path = std::env::temp_dir().join("logindesk-tests").join("config.json");
        test_app_at(config, path)
    }

    fn test_app_at(config: Config, config_path: PathBuf) -> App {
        let client = LoginClient::new(
            config.api_url.clone(),
            ClientCredentials::new("web", "secret"),
            Duration::from_secs(1),
        )
        .map_err(|e| e.to_string());
        let mut app = App::with_parts(config, config_path, Box::new(MemoryStore::new()), client);
        app.controller.form = LoginForm::new("a@b.com", "pw");
        app
    }

    fn unused_path() -> PathBuf {
        std::env::temp_dir().join("logindesk-tests").join("unused.json")
    }

    fn request(app: &App) -> SubmitRequest {
        SubmitRequest {
            fields: app.controller.form.to_fields(&[]),
            email: app.controller.form.email.clone(),
        }
    }

    #[test]
    fn test_login_focus_cycle() {
        let mut focus = LoginFocus::Email;
        for _ in 0..4 {
            focus = focus.next();
        }
        assert_eq!(focus, LoginFocus::Email);
        assert_eq!(LoginFocus::Email.previous(), LoginFocus::Reset);
        assert_eq!(LoginFocus::Password.field(), Some(LoginField::Password));
        assert_eq!(LoginFocus::Login.field(), None);
    }

    #[test]
    fn test_missing_client_reports_login_error() {
        let mut app = App::with_parts(
            test_config(),
            unused_path(),
            Box::new(MemoryStore::new()),
            Err("no secret".to_string()),
        );
        app.submit();

        assert_eq!(app.state, AppState::ShowingAlert);
        assert_eq!(app.alert.as_deref(), Some(app.controller.messages().login_error));
        assert!(!app.is_submitting());

        app.dismiss_alert();
        assert_eq!(app.state, AppState::LoggingIn);
    }

    #[test]
    fn test_missing_client_is_shown_even_when_errors_are_quiet() {
        let config = Config {
            show_transport_error: false,
            ..test_config()
        };
        let mut app = App::with_parts(
            config,
            unused_path(),
            Box::new(MemoryStore::new()),
            Err("no secret".to_string()),
        );
        app.submit();

        assert_eq!(app.state, AppState::ShowingAlert);
        assert_eq!(app.alert.as_deref(), Some(app.controller.messages().login_error));
        assert_eq!(app.status_message.as_deref(), Some("no secret"));
        assert_eq!(app.controller.state(), SubmitState::Idle);
    }

    #[test]
    fn test_successful_login_navigates_and_records_email() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        let config = Config {
            // As if set by LOGINDESK_API_URL; must not reach the file
            api_url: "https://staging.invalid".to_string(),
            ..test_config()
        };
        let mut app = test_app_at(config, path.clone());

        let request = app.controller.begin_submit().unwrap();
        app.pending = Some(request);
        let response = LoginResponse {
            status: true,
            token: Some("TOKEN123456".to_string()),
            ..LoginResponse::default()
        };
        app.login_tx.try_send(Ok(response)).unwrap();
        app.check_background_tasks();

        assert_eq!(app.state, AppState::Main);
        assert_eq!(
            app.navigated_to.as_deref(),
            Some("https://example.com/app/main.html")
        );
        assert_eq!(app.session, Some(StoredSession::new("TOKEN123456", "a@b.com")));
        assert_eq!(app.config.last_email.as_deref(), Some("a@b.com"));
        assert!(app.status_message.is_none());

        let saved = Config::load_from(&path).unwrap();
        assert_eq!(saved.last_email.as_deref(), Some("a@b.com"));
        assert_ne!(saved.api_url, "https://staging.invalid");

        // Further submits are ignored once logged in
        app.submit();
        assert_eq!(app.state, AppState::Main);
        assert!(!app.is_submitting());
        assert!(app.pending.is_none());
    }

    #[test]
    fn test_startup_alert_for_legacy_client() {
        let config = Config {
            identity: ClientIdentity::new(
                "Microsoft Internet Explorer",
                "4.0 (compatible; MSIE 7.0; Windows NT 6.0)",
            ),
            ..test_config()
        };
        let mut app = App::with_parts(
            config,
            unused_path(),
            Box::new(MemoryStore::new()),
            Err("unused".to_string()),
        );
        app.startup_checks();

        assert_eq!(app.state, AppState::ShowingAlert);
        assert_eq!(app.alert.as_deref(), Some(app.controller.messages().navigator_warning));

        app.dismiss_alert();
        app.submit();
        assert_eq!(app.state, AppState::ShowingAlert);
    }

    #[test]
    fn test_invalid_credentials_outcome_opens_modal() {
        let mut app = test_app(test_config());
        let req = request(&app);
        app.apply_outcome(&req, Outcome::InvalidCredentials("用户名和密码不正确"));

        assert_eq!(app.state, AppState::ShowingModal);
        assert_eq!(app.modal_message.as_deref(), Some("用户名和密码不正确"));
        assert!(app.session.is_none());

        app.dismiss_modal();
        assert_eq!(app.state, AppState::LoggingIn);
        assert!(app.modal_message.is_none());
    }

    #[test]
    fn test_suppressed_transport_error_stays_on_form() {
        let mut app = test_app(test_config());
        let req = request(&app);
        app.status_message = Some("x".to_string());
        app.apply_outcome(&req, Outcome::TransportError(None));

        assert_eq!(app.state, AppState::LoggingIn);
        assert!(app.status_message.is_none());
        assert!(app.alert.is_none());
    }

    #[tokio::test]
    async fn test_submit_marks_pending_and_blocks_resubmit() {
        let mut app = test_app(test_config());
        app.submit();

        assert!(app.is_submitting());
        assert_eq!(
            app.status_message.as_deref(),
            Some(app.controller.messages().signing_in)
        );

        app.submit();
        assert_eq!(
            app.status_message.as_deref(),
            Some(app.controller.messages().already_signing_in)
        );
    }

    #[test]
    fn test_reset_clears_fields_and_focuses_email() {
        let mut app = test_app(test_config());
        app.login_focus = LoginFocus::Reset;
        app.reset();

        assert_eq!(app.controller.form, LoginForm::default());
        assert_eq!(app.login_focus, LoginFocus::Email);
    }
}
