//! Recording test doubles shared by the flow tests.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Duration, TimeZone, Utc};
use parking_lot::Mutex;
use tether_domain::{AuthorizeOptions, ResponseError, TokenSet, UserDetails};

use crate::auth::{AuthOrchestrator, AuthServices};
use crate::ports::{
    Analytics, ApiCredentials, Clock, CustomerIdentity, CustomerProfile, IdentityError,
    IdentityProvider, OrderManagement, StorageError, TokenStore,
};
use crate::store::AppStore;

pub const DEVICE_ID: &str = "device-1";

pub fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
}

/// Builds an unsigned JWT whose `exp` is `seconds` after [`now`].
pub fn jwt_expiring_in(seconds: i64) -> String {
    let exp = (now() + Duration::seconds(seconds)).timestamp();
    let header = URL_SAFE_NO_PAD.encode(r#"{"alg":"none"}"#);
    let payload = URL_SAFE_NO_PAD.encode(format!(r#"{{"exp":{exp}}}"#));
    format!("{header}.{payload}.sig")
}

pub fn user(customer_id: &str) -> UserDetails {
    UserDetails {
        customer_id: customer_id.to_string(),
        email: format!("{customer_id}@example.com"),
        ..UserDetails::default()
    }
}

/// Ordered log of every collaborator call.
#[derive(Debug, Clone, Default)]
pub struct Journal(Arc<Mutex<Vec<String>>>);

impl Journal {
    pub fn record(&self, entry: impl Into<String>) {
        self.0.lock().push(entry.into());
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.lock().clone()
    }

    pub fn count(&self, entry: &str) -> usize {
        self.0.lock().iter().filter(|e| e.as_str() == entry).count()
    }

    pub fn clear(&self) {
        self.0.lock().clear();
    }
}

pub struct RecordingIdentity {
    journal: Journal,
    authorized: Mutex<Option<TokenSet>>,
    refreshed: Mutex<Option<TokenSet>>,
}

impl RecordingIdentity {
    pub fn authorize_with(&self, tokens: TokenSet) {
        *self.authorized.lock() = Some(tokens);
    }

    pub fn refresh_with(&self, tokens: TokenSet) {
        *self.refreshed.lock() = Some(tokens);
    }
}

#[async_trait]
impl IdentityProvider for RecordingIdentity {
    async fn authorize(&self, options: &AuthorizeOptions) -> Result<TokenSet, IdentityError> {
        let session = if options.ephemeral_session {
            "ephemeral"
        } else {
            "shared"
        };
        self.journal.record(format!(
            "authorize({}, {}, {session})",
            options.scope, options.connection
        ));
        self.authorized
            .lock()
            .clone()
            .ok_or(IdentityError::UserCancelled)
    }

    async fn refresh_token(
        &self,
        refresh_token: &str,
        scope: &str,
    ) -> Result<TokenSet, IdentityError> {
        self.journal
            .record(format!("refresh_token({refresh_token}, {scope})"));
        self.refreshed
            .lock()
            .clone()
            .ok_or_else(|| IdentityError::Rejected {
                message: "invalid_grant".to_string(),
            })
    }
}

pub struct RecordingTokenStore {
    journal: Journal,
    tokens: Mutex<Option<TokenSet>>,
    fail_get: AtomicBool,
    fail_remove: AtomicBool,
}

impl RecordingTokenStore {
    pub fn fail_get(&self) {
        self.fail_get.store(true, Ordering::SeqCst);
    }

    pub fn fail_remove(&self) {
        self.fail_remove.store(true, Ordering::SeqCst);
    }

    pub async fn snapshot(&self) -> Option<TokenSet> {
        self.tokens.lock().clone()
    }
}

#[async_trait]
impl TokenStore for RecordingTokenStore {
    async fn save(&self, tokens: &TokenSet) -> Result<(), StorageError> {
        self.journal.record(format!("save_tokens({})", tokens.id_token));
        *self.tokens.lock() = Some(tokens.clone());
        Ok(())
    }

    async fn get(&self) -> Result<Option<TokenSet>, StorageError> {
        self.journal.record("get_tokens");
        if self.fail_get.load(Ordering::SeqCst) {
            return Err(StorageError::Serialization("corrupt tokens".to_string()));
        }
        Ok(self.tokens.lock().clone())
    }

    async fn remove(&self) -> Result<(), StorageError> {
        self.journal.record("remove_tokens");
        if self.fail_remove.load(Ordering::SeqCst) {
            return Err(StorageError::Io(std::io::Error::other("disk full")));
        }
        self.tokens.lock().take();
        Ok(())
    }
}

pub struct RecordingApi {
    journal: Journal,
    token: Mutex<Option<String>>,
}

impl ApiCredentials for RecordingApi {
    fn set_access_token(&self, token: &str) {
        self.journal.record(format!("set_access_token({token})"));
        *self.token.lock() = Some(token.to_string());
    }

    fn remove_access_token(&self) {
        self.journal.record("remove_access_token");
        self.token.lock().take();
    }

    fn access_token(&self) -> Option<String> {
        self.token.lock().clone()
    }
}

pub struct RecordingProfile {
    journal: Journal,
    user: Mutex<Option<UserDetails>>,
}

impl RecordingProfile {
    pub fn respond_with(&self, user: UserDetails) {
        *self.user.lock() = Some(user);
    }
}

#[async_trait]
impl CustomerProfile for RecordingProfile {
    async fn get_customer_info(&self) -> Result<UserDetails, ResponseError> {
        self.journal.record("get_customer_info");
        self.user
            .lock()
            .clone()
            .ok_or_else(|| ResponseError::from_response(401, Some("unauthorized".to_string())))
    }
}

pub struct RecordingObservers {
    journal: Journal,
}

impl Analytics for RecordingObservers {
    fn log_login_success(&self, customer_id: &str) {
        self.journal
            .record(format!("log_login_success({customer_id})"));
    }

    fn log_login_failure(&self) {
        self.journal.record("log_login_failure");
    }

    fn log_logout_success(&self, customer_id: &str) {
        self.journal
            .record(format!("log_logout_success({customer_id})"));
    }
}

impl CustomerIdentity for RecordingObservers {
    fn notify_identified_customer(&self, id: &str) {
        self.journal.record(format!("crm({id})"));
    }
}

impl OrderManagement for RecordingObservers {
    fn clear_fulfilled_orders(&self) {
        self.journal.record("clear_fulfilled_orders");
    }
}

pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Fully wired set of recording collaborators around a fresh store.
pub struct Harness {
    pub journal: Journal,
    pub identity: Arc<RecordingIdentity>,
    pub tokens: Arc<RecordingTokenStore>,
    pub api: Arc<RecordingApi>,
    pub profile: Arc<RecordingProfile>,
    pub observers: Arc<RecordingObservers>,
    pub store: Arc<AppStore>,
}

impl Harness {
    pub fn new() -> Self {
        let journal = Journal::default();
        Self {
            identity: Arc::new(RecordingIdentity {
                journal: journal.clone(),
                authorized: Mutex::new(None),
                refreshed: Mutex::new(None),
            }),
            tokens: Arc::new(RecordingTokenStore {
                journal: journal.clone(),
                tokens: Mutex::new(None),
                fail_get: AtomicBool::new(false),
                fail_remove: AtomicBool::new(false),
            }),
            api: Arc::new(RecordingApi {
                journal: journal.clone(),
                token: Mutex::new(None),
            }),
            profile: Arc::new(RecordingProfile {
                journal: journal.clone(),
                user: Mutex::new(None),
            }),
            observers: Arc::new(RecordingObservers {
                journal: journal.clone(),
            }),
            store: Arc::new(AppStore::new()),
            journal,
        }
    }

    pub fn services(&self) -> AuthServices {
        AuthServices {
            identity: self.identity.clone(),
            tokens: self.tokens.clone(),
            api: self.api.clone(),
            profile: self.profile.clone(),
            analytics: self.observers.clone(),
            crm: self.observers.clone(),
            orders: self.observers.clone(),
            clock: Arc::new(FixedClock(now())),
        }
    }

    pub fn orchestrator(&self) -> AuthOrchestrator {
        AuthOrchestrator::new(self.services(), Arc::clone(&self.store), DEVICE_ID)
    }

    /// Stores tokens without recording the call.
    pub async fn seed_tokens(&self, tokens: TokenSet) {
        *self.tokens.tokens.lock() = Some(tokens);
    }
}
