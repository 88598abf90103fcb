//! Account input validation: sign-in and sign-up forms, profile edits.

use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;
use validator::{Validate, ValidationErrors};

use crate::error::CoreError;

/// Shown when any sign-up field is blank or the terms are not accepted.
pub const MSG_FILL_ALL_FIELDS: &str = "Please fill in all fields and accept the terms";

/// Shown when the password confirmation differs.
pub const MSG_PASSWORDS_DIFFER: &str = "Passwords do not match";

/// Shown when a sign-in field is blank.
pub const MSG_SIGN_IN_FIELDS: &str = "Please fill in all fields";

static USERNAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_.]{3,30}$").expect("valid regex"));

/// Sign-up form as entered by the user.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SignUpForm {
    #[validate(length(max = 100, message = "First name is too long"))]
    pub first_name: String,
    #[validate(length(max = 100, message = "Last name is too long"))]
    pub last_name: String,
    #[validate(regex(
        path = *USERNAME_RE,
        message = "Username must be 3-30 letters, digits, dots or underscores"
    ))]
    pub username: String,
    #[validate(email(message = "Please enter a valid email address"))]
    pub email: String,
    #[validate(length(min = 6, message = "Password must be at least 6 characters long"))]
    pub password: String,
    pub confirm_password: String,
    pub accept_terms: bool,
}

impl SignUpForm {
    fn has_blank_field(&self) -> bool {
        [
            &self.first_name,
            &self.last_name,
            &self.username,
            &self.email,
            &self.password,
            &self.confirm_password,
        ]
        .iter()
        .any(|field| field.trim().is_empty())
    }

    /// Metadata attached to the auth user at registration.
    pub fn metadata(&self) -> serde_json::Value {
        serde_json::json!({
            "first_name": self.first_name.trim(),
            "last_name": self.last_name.trim(),
            "username": self.username.trim(),
        })
    }
}

/// Validate a sign-up form.
///
/// Blank fields and unaccepted terms are reported first, then a password
/// mismatch, then field format problems.
pub fn validate_sign_up(form: &SignUpForm) -> Result<(), CoreError> {
    if form.has_blank_field() || !form.accept_terms {
        return Err(CoreError::Validation(MSG_FILL_ALL_FIELDS.to_string()));
    }
    if form.password != form.confirm_password {
        return Err(CoreError::Validation(MSG_PASSWORDS_DIFFER.to_string()));
    }
    form.validate()
        .map_err(|errors| CoreError::Validation(first_message(&errors)))
}

/// Validate sign-in credentials before contacting the auth service.
pub fn validate_sign_in(email: &str, password: &str) -> Result<(), CoreError> {
    if email.trim().is_empty() || password.is_empty() {
        return Err(CoreError::Validation(MSG_SIGN_IN_FIELDS.to_string()));
    }
    Ok(())
}

/// Validate a username change on the profile page.
pub fn validate_username(username: &str) -> Result<(), CoreError> {
    if USERNAME_RE.is_match(username.trim()) {
        Ok(())
    } else {
        Err(CoreError::Validation(
            "Username must be 3-30 letters, digits, dots or underscores".to_string(),
        ))
    }
}

/// Pick one message deterministically (fields in name order).
fn first_message(errors: &ValidationErrors) -> String {
    let mut fields: Vec<_> = errors.field_errors().into_iter().collect();
    fields.sort_by(|a, b| a.0.cmp(&b.0));
    fields
        .into_iter()
        .flat_map(|(_, errs)| errs.iter())
        .find_map(|err| err.message.as_ref().map(|m| m.to_string()))
        .unwrap_or_else(|| errors.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form() -> SignUpForm {
        SignUpForm {
            first_name: "Alex".to_string(),
            last_name: "Chen".to_string(),
            username: "alex_chen".to_string(),
            email: "alex@example.com".to_string(),
            password: "hunter22".to_string(),
            confirm_password: "hunter22".to_string(),
            accept_terms: true,
        }
    }

    fn message(result: Result<(), CoreError>) -> String {
        match result {
            Err(CoreError::Validation(msg)) => msg,
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn valid_form_passes() {
        assert!(validate_sign_up(&form()).is_ok());
    }

    #[test]
    fn blank_field_reports_fill_all() {
        let mut f = form();
        f.last_name = "  ".to_string();
        assert_eq!(message(validate_sign_up(&f)), MSG_FILL_ALL_FIELDS);
    }

    #[test]
    fn unaccepted_terms_reports_fill_all() {
        let mut f = form();
        f.accept_terms = false;
        assert_eq!(message(validate_sign_up(&f)), MSG_FILL_ALL_FIELDS);
    }

    #[test]
    fn mismatched_passwords() {
        let mut f = form();
        f.confirm_password = "hunter23".to_string();
        assert_eq!(message(validate_sign_up(&f)), MSG_PASSWORDS_DIFFER);
    }

    #[test]
    fn bad_email_and_username() {
        let mut f = form();
        f.email = "not-an-email".to_string();
        assert!(message(validate_sign_up(&f)).contains("email"));

        let mut f = form();
        f.username = "a b".to_string();
        assert!(message(validate_sign_up(&f)).contains("Username"));
    }

    #[test]
    fn short_password() {
        let mut f = form();
        f.password = "abc".to_string();
        f.confirm_password = "abc".to_string();
        assert!(message(validate_sign_up(&f)).contains("at least 6"));
    }

    #[test]
    fn metadata_is_trimmed() {
        let mut f = form();
        f.first_name = " Alex ".to_string();
        assert_eq!(f.metadata()["first_name"], "Alex");
        assert_eq!(f.metadata()["username"], "alex_chen");
    }

    #[test]
    fn sign_in_requires_both_fields() {
        assert!(validate_sign_in("a@b.co", "pw").is_ok());
        assert!(validate_sign_in("", "pw").is_err());
        assert!(validate_sign_in("a@b.co", "").is_err());
    }
}
