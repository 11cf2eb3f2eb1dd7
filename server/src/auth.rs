//! Credential validation for customer-scoped listings.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Outcome of validating one bearer token.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Credential {
    pub valid: bool,
    pub error: Option<String>,
    pub role: Option<String>,
    /// Identity the token was issued to; partitions customer listings.
    pub subject: Option<String>,
}

impl Credential {
    pub fn granted(subject: &str, role: &str) -> Self {
        Self {
            valid: true,
            error: None,
            role: Some(role.into()),
            subject: Some(subject.into()),
        }
    }

    pub fn denied(error: &str) -> Self {
        Self {
            valid: false,
            error: Some(error.into()),
            ..Self::default()
        }
    }
}

/// Validates opaque bearer tokens.
#[async_trait]
pub trait CredentialValidator: Send + Sync {
    async fn validate(&self, token: &str) -> Credential;
}

/// One configured token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaticCredential {
    pub token: String,
    pub subject: String,
    pub role: String,
}

/// Fixed token table from configuration.
#[derive(Debug, Clone, Default)]
pub struct StaticCredentials {
    tokens: HashMap<String, StaticCredential>,
}

impl StaticCredentials {
    pub fn new(credentials: impl IntoIterator<Item = StaticCredential>) -> Self {
        Self {
            tokens: credentials
                .into_iter()
                .map(|c| (c.token.clone(), c))
                .collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

#[async_trait]
impl CredentialValidator for StaticCredentials {
    async fn validate(&self, token: &str) -> Credential {
        match self.tokens.get(token) {
            Some(c) => Credential::granted(&c.subject, &c.role),
            None => Credential::denied("token not recognized"),
        }
    }
}
