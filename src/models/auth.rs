use serde::{Deserialize, Serialize};

use crate::utils::constants::MFA_REQUIRED_STATUS;

/// Raw login / verify-mfa body. Every field is optional on the wire.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub must_change_password: Option<bool>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
}

/// What a login attempt asks the client to do next
#[derive(Clone, Debug, PartialEq)]
pub enum LoginOutcome {
    Authenticated { token: String },
    MfaRequired { account: String },
    PasswordChangeRequired { account: String },
    Rejected { message: String },
}

impl LoginResponse {
    /// `submitted` is the identifier typed by the user, used when the body
    /// does not echo the account back.
    pub fn classify(self, submitted: &str) -> LoginOutcome {
        let account = self
            .email
            .clone()
            .or_else(|| self.username.clone())
            .filter(|a| !a.is_empty())
            .unwrap_or_else(|| submitted.to_string());

        if self.status.as_deref() == Some(MFA_REQUIRED_STATUS) {
            return LoginOutcome::MfaRequired { account };
        }
        if self.must_change_password.unwrap_or(false) {
            return LoginOutcome::PasswordChangeRequired { account };
        }
        match self.token {
            Some(token) if !token.is_empty() => LoginOutcome::Authenticated { token },
            _ => LoginOutcome::Rejected {
                message: self.message.unwrap_or_else(|| "Login failed".to_string()),
            },
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub surname: String,
    pub email: String,
    pub password: String,
}

/// Password change form. `old_password` is omitted for first-time admins.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ChangePasswordForm {
    pub account: String,
    pub old_password: Option<String>,
    pub new_password: String,
    pub confirm_password: String,
    pub first_time: bool,
}
