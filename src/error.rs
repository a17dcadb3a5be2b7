use crate::domain::OrderStatus;
use crate::store::StoreError;
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum OrderError {
    #[error("Order not found: {0}")]
    NotFound(String),
    #[error("Order validation error: {0}")]
    Validation(String),
    #[error("Invalid status transition: {from} -> {to}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },
    #[error("Order store unavailable: {0}")]
    RemoteUnavailable(String),
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProfileError {
    #[error("Profile not found: {0}")]
    NotFound(String),
    #[error("Profile validation error: {0}")]
    Validation(String),
    #[error("Profile store unavailable: {0}")]
    RemoteUnavailable(String),
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum MenuError {
    #[error("Menu category not found: {0}")]
    NotFound(String),
    #[error("Menu validation error: {0}")]
    Validation(String),
    #[error("Menu store unavailable: {0}")]
    RemoteUnavailable(String),
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum OtpError {
    #[error("OTP session not found or expired")]
    SessionExpired,
    #[error("OTP rejected: {0}")]
    Rejected(String),
    #[error("SMS gateway error: {0}")]
    Gateway(String),
}

impl From<StoreError<OrderError>> for OrderError {
    fn from(err: StoreError<OrderError>) -> Self {
        match err {
            StoreError::NotFound(id) => OrderError::NotFound(id),
            StoreError::Rejected(inner) => inner,
            StoreError::Closed => OrderError::RemoteUnavailable("store channel closed".into()),
        }
    }
}

impl From<StoreError<ProfileError>> for ProfileError {
    fn from(err: StoreError<ProfileError>) -> Self {
        match err {
            StoreError::NotFound(id) => ProfileError::NotFound(id),
            StoreError::Rejected(inner) => inner,
            StoreError::Closed => ProfileError::RemoteUnavailable("store channel closed".into()),
        }
    }
}

impl From<StoreError<MenuError>> for MenuError {
    fn from(err: StoreError<MenuError>) -> Self {
        match err {
            StoreError::NotFound(id) => MenuError::NotFound(id),
            StoreError::Rejected(inner) => inner,
            StoreError::Closed => MenuError::RemoteUnavailable("store channel closed".into()),
        }
    }
}
