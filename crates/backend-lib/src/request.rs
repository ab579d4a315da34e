// ============================
// crates/backend-lib/src/request.rs
// ============================
//! Request model: turns a raw envelope into a typed, validated request.
use std::fmt;

use balance_gateway_common::{RequestEnvelope, CREATE_AGT, GET_BALANCE};
use thiserror::Error;

/// Extra carrying the account login
pub const LOGIN: &str = "login";
/// Extra carrying the account password
pub const PASSWORD: &str = "password";
/// Envelope element naming the operation
pub const REQUEST_TYPE: &str = "request-type";

/// Operations the gateway understands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// Open a new account (`CREATE-AGT`)
    CreateAccount,
    /// Read an account balance (`GET-BALANCE`)
    GetBalance,
}

impl Operation {
    /// Map a wire request type onto an operation
    pub fn from_wire(name: &str) -> Option<Self> {
        match name {
            CREATE_AGT => Some(Self::CreateAccount),
            GET_BALANCE => Some(Self::GetBalance),
            _ => None,
        }
    }

    pub fn as_wire(self) -> &'static str {
        match self {
            Self::CreateAccount => CREATE_AGT,
            Self::GetBalance => GET_BALANCE,
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_wire())
    }
}

/// Ways an inbound envelope can be rejected before dispatch
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RequestError {
    #[error("Expecting xml data: {0}")]
    MalformedEnvelope(String),

    #[error("Missing parameter [{0}]")]
    MissingField(&'static str),

    #[error("Unknown request type [{0}]")]
    UnknownOperation(String),
}

/// A validated request, ready for dispatch
#[derive(Clone, PartialEq, Eq)]
pub struct Request {
    pub operation: Operation,
    pub login: String,
    pub password: String,
}

// Keeps the password out of logs
impl fmt::Debug for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Request")
            .field("operation", &self.operation)
            .field("login", &self.login)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl Request {
    /// Parse and validate a raw request body.
    ///
    /// Bytes that are not UTF-8 or not a well-formed envelope are reported
    /// as [`RequestError::MalformedEnvelope`] before any field is checked.
    pub fn parse(body: &[u8]) -> Result<Self, RequestError> {
        let text = std::str::from_utf8(body)
            .map_err(|e| RequestError::MalformedEnvelope(e.to_string()))?;
        let envelope = RequestEnvelope::from_xml(text)
            .map_err(|e| RequestError::MalformedEnvelope(e.to_string()))?;
        Self::from_envelope(&envelope)
    }

    /// Validate a parsed envelope. The first failing check wins:
    /// login, then password, then request type presence, then request type value.
    pub fn from_envelope(envelope: &RequestEnvelope) -> Result<Self, RequestError> {
        // An empty login can never name an account
        let login = envelope
            .extra(LOGIN)
            .filter(|login| !login.is_empty())
            .ok_or(RequestError::MissingField(LOGIN))?;

        let password = envelope
            .extra(PASSWORD)
            .ok_or(RequestError::MissingField(PASSWORD))?;

        let request_type = envelope
            .request_type
            .as_deref()
            .ok_or(RequestError::MissingField(REQUEST_TYPE))?;

        let operation = Operation::from_wire(request_type)
            .ok_or_else(|| RequestError::UnknownOperation(request_type.to_string()))?;

        Ok(Self {
            operation,
            login: login.to_string(),
            password: password.to_string(),
        })
    }
}
