//! Clients who identify themselves when ordering.

mod service;

pub use service::ClientService;

use chrono::{DateTime, Utc};
use common::ClientId;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while validating client data.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ClientError {
    #[error("CPF must have 11 digits, got {0}")]
    CpfLength(usize),

    #[error("Invalid CPF: {0}")]
    InvalidCpf(String),

    #[error("Client name is required")]
    NameRequired,

    #[error("Invalid email address: {0}")]
    InvalidEmail(String),
}

/// Brazilian individual taxpayer number, stored as 11 digits.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Cpf(String);

impl Cpf {
    /// Parses a CPF, accepting the usual `000.000.000-00` punctuation.
    pub fn parse(raw: &str) -> Result<Self, ClientError> {
        let normalized: String = raw
            .chars()
            .filter(|c| !matches!(c, '.' | '-' | ' '))
            .collect();
        let digits: Vec<u32> = normalized
            .chars()
            .map(|c| c.to_digit(10))
            .collect::<Option<_>>()
            .ok_or_else(|| ClientError::InvalidCpf(raw.to_string()))?;

        if digits.len() != 11 {
            return Err(ClientError::CpfLength(digits.len()));
        }

        // Repeated digits pass the checksum but are never issued.
        if digits.iter().all(|d| *d == digits[0]) {
            return Err(ClientError::InvalidCpf(raw.to_string()));
        }

        if check_digit(&digits[..9]) != digits[9] || check_digit(&digits[..10]) != digits[10] {
            return Err(ClientError::InvalidCpf(raw.to_string()));
        }

        Ok(Self(normalized))
    }

    /// Returns the 11 digits without punctuation.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn check_digit(digits: &[u32]) -> u32 {
    let weight_start = digits.len() as u32 + 1;
    let sum: u32 = digits
        .iter()
        .enumerate()
        .map(|(i, d)| d * (weight_start - i as u32))
        .sum();
    match sum % 11 {
        0 | 1 => 0,
        rest => 11 - rest,
    }
}

impl std::fmt::Display for Cpf {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for Cpf {
    type Error = ClientError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Cpf::parse(&value)
    }
}

impl From<Cpf> for String {
    fn from(cpf: Cpf) -> Self {
        cpf.0
    }
}

/// A registered client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Client {
    pub id: ClientId,
    pub name: String,
    pub email: String,
    pub cpf: Cpf,
    pub created_at: DateTime<Utc>,
}

/// A client that has not been stored yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewClient {
    pub name: String,
    pub email: String,
    pub cpf: Cpf,
}

impl NewClient {
    /// Validates registration data.
    pub fn new(name: &str, email: &str, cpf: &str) -> Result<Self, ClientError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ClientError::NameRequired);
        }

        let email = email.trim();
        match email.split_once('@') {
            Some((user, domain)) if !user.is_empty() && domain.contains('.') => {}
            _ => return Err(ClientError::InvalidEmail(email.to_string())),
        }

        Ok(Self {
            name: name.to_string(),
            email: email.to_lowercase(),
            cpf: Cpf::parse(cpf)?,
        })
    }
}

/// Response view of a client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClientView {
    pub id: ClientId,
    pub name: String,
    pub email: String,
    pub cpf: String,
}

impl From<&Client> for ClientView {
    fn from(client: &Client) -> Self {
        Self {
            id: client.id,
            name: client.name.clone(),
            email: client.email.clone(),
            cpf: client.cpf.to_string(),
        }
    }
}
