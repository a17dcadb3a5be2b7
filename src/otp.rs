//! Phone-verification relay over an external SMS gateway.
//!
//! The gateway issues a session token per OTP send; verification must
//! quote it back. Tokens are held in an explicit TTL store keyed by
//! phone number rather than an unbounded process-wide map, so stale
//! sessions age out even if the gateway's own timeout never fires.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::{debug, info, instrument, warn};

use crate::error::OtpError;

/// External SMS/OTP provider. `send_otp` returns the provider's
/// session token; `verify_otp` checks a code against it.
#[async_trait]
pub trait SmsGateway: Send + Sync {
    async fn send_otp(&self, phone: &str) -> Result<String, OtpError>;
    async fn verify_otp(&self, phone: &str, code: &str, session: &str) -> Result<(), OtpError>;
}

/// The code [`DevGateway`] accepts.
pub const DEV_OTP_CODE: &str = "123456";

/// Development gateway: no SMS leaves the process. Logs that a code was
/// issued and accepts the one fixed code, like a provider's test phone
/// numbers.
pub struct DevGateway;

#[async_trait]
impl SmsGateway for DevGateway {
    async fn send_otp(&self, phone: &str) -> Result<String, OtpError> {
        info!("development OTP issued, use the fixed test code");
        Ok(format!("dev-session-{phone}"))
    }

    async fn verify_otp(&self, phone: &str, code: &str, session: &str) -> Result<(), OtpError> {
        if session != format!("dev-session-{phone}") {
            return Err(OtpError::Gateway("unknown session".into()));
        }
        if code == DEV_OTP_CODE {
            Ok(())
        } else {
            Err(OtpError::Rejected("Invalid OTP.".into()))
        }
    }
}

struct OtpSession {
    token: String,
    issued_at: Instant,
}

/// Time-bounded session-token store keyed by phone number.
pub struct OtpSessionStore {
    ttl: Duration,
    sessions: RwLock<HashMap<String, OtpSession>>,
}

impl OtpSessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    pub async fn insert(&self, phone: &str, token: String) {
        let mut sessions = self.sessions.write().await;
        sessions.insert(
            phone.to_string(),
            OtpSession {
                token,
                issued_at: Instant::now(),
            },
        );
    }

    /// Returns the live session token for `phone`, if any. An expired
    /// entry reads as absent; it is physically removed by the next
    /// sweep or overwritten by the next send.
    pub async fn peek(&self, phone: &str) -> Option<String> {
        let sessions = self.sessions.read().await;
        sessions
            .get(phone)
            .filter(|s| s.issued_at.elapsed() < self.ttl)
            .map(|s| s.token.clone())
    }

    pub async fn remove(&self, phone: &str) {
        let mut sessions = self.sessions.write().await;
        sessions.remove(phone);
    }

    /// Evicts expired entries, returning how many were dropped.
    pub async fn purge_expired(&self) -> usize {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, s| s.issued_at.elapsed() < self.ttl);
        before - sessions.len()
    }
}

/// Relay fronting the gateway with the session store in between.
pub struct OtpService {
    gateway: Arc<dyn SmsGateway>,
    sessions: OtpSessionStore,
}

impl OtpService {
    pub fn new(gateway: Arc<dyn SmsGateway>, session_ttl: Duration) -> Self {
        Self {
            gateway,
            sessions: OtpSessionStore::new(session_ttl),
        }
    }

    #[instrument(skip(self))]
    pub async fn send(&self, phone: &str) -> Result<(), OtpError> {
        let dropped = self.sessions.purge_expired().await;
        if dropped > 0 {
            debug!(dropped, "evicted stale OTP sessions");
        }
        let token = self.gateway.send_otp(phone).await?;
        self.sessions.insert(phone, token).await;
        info!("OTP sent");
        Ok(())
    }

    /// Verifies a code. The session is consumed only on success, so a
    /// mistyped code can be retried against the same session.
    #[instrument(skip(self, code))]
    pub async fn verify(&self, phone: &str, code: &str) -> Result<(), OtpError> {
        let Some(session) = self.sessions.peek(phone).await else {
            debug!("no live OTP session");
            return Err(OtpError::SessionExpired);
        };
        match self.gateway.verify_otp(phone, code, &session).await {
            Ok(()) => {
                self.sessions.remove(phone).await;
                info!("OTP verified");
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "OTP verification failed");
                Err(e)
            }
        }
    }
}
