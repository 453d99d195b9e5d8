//! The login form flow.
//!
//! `LoginController` owns the form and the submission state and turns a
//! login response into an `Outcome` for the front end to display:
//!
//! ```text
//! Idle -> begin_submit -> [Rejected | Submitting] -> complete -> [Navigated | Idle]
//! ```
//!
//! The network call itself happens between `begin_submit` and `complete`,
//! so a front end can run it on a background task. While a submission is
//! pending every further submit is rejected.

use tracing::{error, info, warn};

use crate::api::{ApiError, LoginClient, LoginResponse};
use crate::auth::StoredSession;
use crate::browser::{detect_legacy, ClientIdentity};
use crate::config::Config;
use crate::form::{FormFields, LoginForm};
use crate::messages::Messages;
use crate::storage::KeyValueStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitState {
    Idle,
    Submitting,
    /// Logged in; the form is done
    Navigated,
}

/// Why a submit did not start
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitRejected {
    /// A previous submission has not completed yet
    Pending,
    /// Already logged in
    Finished,
    /// Legacy client; carries the alert text
    LegacyBrowser(&'static str),
}

/// Everything the background task needs to perform the request
#[derive(Debug, Clone)]
pub struct SubmitRequest {
    pub fields: FormFields,
    pub email: String,
}

/// Result of a completed submission, as the user should see it
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Session stored; go to the given target
    Navigate(String),
    /// Server said no; modal text
    InvalidCredentials(&'static str),
    /// Request failed; the generic message, or `None` when suppressed
    TransportError(Option<&'static str>),
    /// Session could not be written
    StorageFailed(&'static str),
}

pub struct LoginController {
    pub form: LoginForm,
    identity: ClientIdentity,
    client_id: String,
    navigation_target: String,
    extra_fields: Vec<(String, String)>,
    show_transport_error: bool,
    messages: &'static Messages,
    state: SubmitState,
}

impl LoginController {
    pub fn new(config: &Config) -> Self {
        Self {
            form: LoginForm::new(config.initial_email(), ""),
            identity: config.identity.clone(),
            client_id: config.client_id.clone(),
            navigation_target: config.navigation_target(),
            extra_fields: config.extra_fields.clone(),
            show_transport_error: config.show_transport_error,
            messages: Messages::for_locale(config.locale),
            state: SubmitState::Idle,
        }
    }

    pub fn state(&self) -> SubmitState {
        self.state
    }

    pub fn is_submitting(&self) -> bool {
        self.state == SubmitState::Submitting
    }

    pub fn messages(&self) -> &'static Messages {
        self.messages
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    /// Alert text if the client is a legacy browser. Shown once at startup
    /// and checked again on every submit.
    pub fn compatibility_alert(&self) -> Option<&'static str> {
        detect_legacy(&self.identity).map(|browser| {
            warn!(browser = browser.token(), "Legacy client detected");
            self.messages.navigator_warning
        })
    }

    /// Start a submission: check the client, then serialize the form.
    pub fn begin_submit(&mut self) -> Result<SubmitRequest, SubmitRejected> {
        match self.state {
            SubmitState::Submitting => return Err(SubmitRejected::Pending),
            SubmitState::Navigated => return Err(SubmitRejected::Finished),
            SubmitState::Idle => {}
        }

        if let Some(alert) = self.compatibility_alert() {
            return Err(SubmitRejected::LegacyBrowser(alert));
        }

        self.state = SubmitState::Submitting;
        info!(email = %self.form.email, "Submitting login");

        Ok(SubmitRequest {
            fields: self.form.to_fields(&self.extra_fields),
            email: self.form.email.clone(),
        })
    }

    /// Finish a submission started by `begin_submit`.
    ///
    /// The session is written only for a truthy status with a token, and the
    /// user id is the email that was submitted.
    pub fn complete<S: KeyValueStore + ?Sized>(
        &mut self,
        request: &SubmitRequest,
        result: Result<LoginResponse, ApiError>,
        store: &mut S,
    ) -> Outcome {
        self.state = SubmitState::Idle;

        let response = match result {
            Ok(response) => response,
            Err(e) => {
                error!(error = %e, "Login request failed");
                return self.transport_error();
            }
        };

        if !response.status {
            info!(code = ?response.code, msg = ?response.msg, "Login rejected");
            return Outcome::InvalidCredentials(self.messages.invalid_credentials);
        }

        let token = match response.token {
            Some(token) => token,
            None => {
                error!("Login succeeded without a token");
                return self.transport_error();
            }
        };

        let session = StoredSession::new(token, request.email.clone());
        if let Err(e) = session.save(store, &self.client_id) {
            error!(error = %e, "Failed to save session");
            return Outcome::StorageFailed(self.messages.storage_error);
        }

        self.form.password.clear();
        self.state = SubmitState::Navigated;
        info!(userid = %request.email, target = %self.navigation_target, "Login successful");
        Outcome::Navigate(self.navigation_target.clone())
    }

    /// Submit and wait for the response in one call
    pub async fn submit<S: KeyValueStore + ?Sized>(
        &mut self,
        client: &LoginClient,
        store: &mut S,
    ) -> Result<Outcome, SubmitRejected> {
        let request = self.begin_submit()?;
        let result = client.login(&request.fields).await;
        Ok(self.complete(&request, result, store))
    }

    /// Clear both inputs
    pub fn reset(&mut self) {
        self.form.reset();
    }

    fn transport_error(&self) -> Outcome {
        if self.show_transport_error {
            Outcome::TransportError(Some(self.messages.login_error))
        } else {
            Outcome::TransportError(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messages::Locale;
    use crate::storage::{MemoryStore, StorageError, StoredValue};

    const IE8: &str = "4.0 (compatible; MSIE 8.0; Windows NT 6.1; Trident/4.0)";

    fn config() -> Config {
        Config {
            client_id: "web".to_string(),
            context_path: "https://example.com/app".to_string(),
            last_email: None,
            ..Config::default()
        }
    }

    fn controller() -> LoginController {
        let mut controller = LoginController::new(&config());
        controller.form = LoginForm::new("a@b.com", "pw");
        controller
    }

    /// Store whose writes always fail, wrapping a readable seeded store
    struct ReadOnlyStore(MemoryStore);

    impl KeyValueStore for ReadOnlyStore {
        fn get_item(&self, key: &str) -> Option<&StoredValue> {
            self.0.get_item(key)
        }

        fn save_items(&mut self, _items: &[(&str, &str)]) -> Result<(), StorageError> {
            Err(StorageError::Io(std::io::Error::new(
                std::io::ErrorKind::PermissionDenied,
                "read-only",
            )))
        }
    }

    fn ok(status: bool, token: Option<&str>) -> Result<LoginResponse, ApiError> {
        Ok(LoginResponse {
            status,
            token: token.map(str::to_string),
            ..LoginResponse::default()
        })
    }

    #[test]
    fn test_success_stores_session_and_navigates() {
        let mut controller = controller();
        let mut store = MemoryStore::new();

        let request = controller.begin_submit().unwrap();
        let outcome = controller.complete(&request, ok(true, Some("T")), &mut store);

        assert_eq!(outcome, Outcome::Navigate("https://example.com/app/main.html".to_string()));
        assert_eq!(store.get_value("web.token"), Some("T"));
        assert_eq!(store.get_value("web.userid"), Some("a@b.com"));
        assert_eq!(controller.state(), SubmitState::Navigated);
        assert!(controller.form.password.is_empty());
    }

    #[test]
    fn test_false_status_shows_modal_and_leaves_store() {
        let mut controller = controller();
        let mut store = MemoryStore::new();
        store.save_items(&[("web.token", "OLD")]).unwrap();

        let request = controller.begin_submit().unwrap();
        let outcome = controller.complete(&request, ok(false, Some("T")), &mut store);

        assert_eq!(outcome, Outcome::InvalidCredentials("用户名和密码不正确"));
        assert_eq!(store.get_value("web.token"), Some("OLD"));
        assert!(store.get_value("web.userid").is_none());
        assert_eq!(controller.state(), SubmitState::Idle);
        assert_eq!(controller.form.password, "pw");
    }

    #[test]
    fn test_transport_error_message_and_suppression() {
        let mut controller = controller();
        let mut store = MemoryStore::new();

        let request = controller.begin_submit().unwrap();
        let outcome = controller.complete(&request, Err(ApiError::RateLimited), &mut store);
        assert_eq!(outcome, Outcome::TransportError(Some(Messages::for_locale(Locale::ZhCn).login_error)));

        let mut quiet = LoginController::new(&Config {
            show_transport_error: false,
            ..config()
        });
        let request = quiet.begin_submit().unwrap();
        let outcome = quiet.complete(&request, Err(ApiError::Unauthorized), &mut store);
        assert_eq!(outcome, Outcome::TransportError(None));
        assert!(store.is_empty());
    }

    #[test]
    fn test_success_without_token_is_not_stored() {
        let mut controller = controller();
        let mut store = MemoryStore::new();

        let request = controller.begin_submit().unwrap();
        let outcome = controller.complete(&request, ok(true, None), &mut store);

        assert!(matches!(outcome, Outcome::TransportError(_)));
        assert!(store.is_empty());
        assert_eq!(controller.state(), SubmitState::Idle);
    }

    #[test]
    fn test_double_submit_is_rejected_while_pending() {
        let mut controller = controller();
        let mut store = MemoryStore::new();

        let request = controller.begin_submit().unwrap();
        assert_eq!(controller.begin_submit().unwrap_err(), SubmitRejected::Pending);

        controller.complete(&request, ok(false, None), &mut store);
        assert!(controller.begin_submit().is_ok());
    }

    #[test]
    fn test_no_submit_after_navigation() {
        let mut controller = controller();
        let mut store = MemoryStore::new();

        let request = controller.begin_submit().unwrap();
        controller.complete(&request, ok(true, Some("T")), &mut store);
        assert_eq!(controller.begin_submit().unwrap_err(), SubmitRejected::Finished);
    }

    #[test]
    fn test_legacy_browser_blocks_submit() {
        let mut controller = LoginController::new(&Config {
            identity: ClientIdentity::new("Microsoft Internet Explorer", IE8),
            ..config()
        });
        let warning = Messages::for_locale(Locale::ZhCn).navigator_warning;

        assert_eq!(controller.compatibility_alert(), Some(warning));
        assert_eq!(
            controller.begin_submit().unwrap_err(),
            SubmitRejected::LegacyBrowser(warning)
        );
        assert_eq!(controller.state(), SubmitState::Idle);
    }

    #[test]
    fn test_modern_client_has_no_alert() {
        assert_eq!(controller().compatibility_alert(), None);
    }

    #[test]
    fn test_userid_is_the_submitted_email() {
        let mut controller = controller();
        let mut store = MemoryStore::new();

        let request = controller.begin_submit().unwrap();
        controller.form.email = "edited@b.com".to_string();
        controller.complete(&request, ok(true, Some("T")), &mut store);

        assert_eq!(store.get_value("web.userid"), Some("a@b.com"));
    }

    #[test]
    fn test_request_carries_extra_fields() {
        let mut controller = LoginController::new(&Config {
            extra_fields: vec![("grant_type".to_string(), "password".to_string())],
            ..config()
        });
        controller.form = LoginForm::new("a@b.com", "pw");

        let request = controller.begin_submit().unwrap();
        assert_eq!(
            request.fields.names().collect::<Vec<_>>(),
            vec!["email", "password", "grant_type"]
        );
        assert_eq!(request.email, "a@b.com");
    }

    #[test]
    fn test_reset_clears_form() {
        let mut controller = controller();
        controller.reset();
        assert_eq!(controller.form, LoginForm::default());
    }

    #[test]
    fn test_storage_failure_keeps_previous_session() {
        let mut seeded = MemoryStore::new();
        StoredSession::new("OLD", "old@b.com").save(&mut seeded, "web").unwrap();
        let mut store = ReadOnlyStore(seeded);
        let mut controller = controller();

        let request = controller.begin_submit().unwrap();
        let outcome = controller.complete(&request, ok(true, Some("NEW")), &mut store);

        assert_eq!(outcome, Outcome::StorageFailed("无法保存登录信息"));
        assert_eq!(
            StoredSession::load(&store, "web"),
            Some(StoredSession::new("OLD", "old@b.com"))
        );
        assert_eq!(controller.state(), SubmitState::Idle);
        assert_eq!(controller.form.password, "pw");
    }

    #[test]
    fn test_english_locale_messages() {
        let mut controller = LoginController::new(&Config {
            locale: Locale::En,
            ..config()
        });
        controller.form = LoginForm::new("a@b.com", "pw");
        let mut store = MemoryStore::new();

        let request = controller.begin_submit().unwrap();
        let outcome = controller.complete(&request, ok(false, None), &mut store);
        assert_eq!(outcome, Outcome::InvalidCredentials("Incorrect username or password"));
    }
}
