use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::UserId;

pub const MIN_PASSWORD_LEN: usize = 6;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum CredentialsError {
    #[error("please enter both email and password")]
    MissingSignInFields,

    #[error("please fill in all fields")]
    MissingSignUpFields,

    #[error("password must be at least {MIN_PASSWORD_LEN} characters")]
    PasswordTooShort,
}

/// Raw credential input, checked before any authentication request is made.
#[derive(Clone, Debug, Default)]
pub struct CredentialsDraft {
    pub email: String,
    pub password: String,
    pub name: Option<String>,
}

/// Credentials that passed validation.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    email: String,
    password: String,
    name: Option<String>,
}

impl CredentialsDraft {
    #[must_use]
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
            name: None,
        }
    }

    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Validate input for signing in.
    ///
    /// # Errors
    ///
    /// Returns `CredentialsError::MissingSignInFields` when email or password is blank.
    pub fn validate_sign_in(self) -> Result<Credentials, CredentialsError> {
        let email = self.email.trim().to_owned();
        if email.is_empty() || self.password.is_empty() {
            return Err(CredentialsError::MissingSignInFields);
        }
        Ok(Credentials {
            email,
            password: self.password,
            name: normalize_optional(self.name),
        })
    }

    /// Validate input for creating an account.
    ///
    /// # Errors
    ///
    /// Returns `CredentialsError::MissingSignUpFields` when any field is blank and
    /// `CredentialsError::PasswordTooShort` for passwords under six characters.
    pub fn validate_sign_up(self) -> Result<Credentials, CredentialsError> {
        let email = self.email.trim().to_owned();
        let name = normalize_optional(self.name);
        if email.is_empty() || self.password.is_empty() || name.is_none() {
            return Err(CredentialsError::MissingSignUpFields);
        }
        if self.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(CredentialsError::PasswordTooShort);
        }
        Ok(Credentials {
            email,
            password: self.password,
            name,
        })
    }
}

impl Credentials {
    #[must_use]
    pub fn email(&self) -> &str {
        &self.email
    }

    #[must_use]
    pub fn password(&self) -> &str {
        &self.password
    }

    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"***")
            .field("name", &self.name)
            .finish()
    }
}

/// The signed-in learner.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserIdentity {
    pub id: UserId,
    pub email: String,
    pub name: String,
}

impl UserIdentity {
    /// Identity used when no remote backend is configured.
    ///
    /// The display name defaults to the local part of the email address.
    #[must_use]
    pub fn local(credentials: &Credentials) -> Self {
        let name = credentials
            .name()
            .map_or_else(|| email_local_part(credentials.email()), str::to_owned);
        Self {
            id: UserId::local(),
            email: credentials.email().to_owned(),
            name,
        }
    }

    #[must_use]
    pub fn is_local(&self) -> bool {
        self.id.as_str() == UserId::LOCAL
    }
}

fn email_local_part(email: &str) -> String {
    email.split('@').next().unwrap_or(email).to_owned()
}

fn normalize_optional(value: Option<String>) -> Option<String> {
    value
        .map(|val| val.trim().to_string())
        .filter(|val| !val.is_empty())
}
