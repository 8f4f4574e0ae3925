//! Request forms and their field rules.
//!
//! Field limits match the account columns: names 4-50 characters, emails
//! 4-50 characters and well-formed, passwords 8-50 characters.

use serde::Deserialize;
use validator::{Validate, ValidationErrors};

/// POST /api/auth/register
#[derive(Debug, Deserialize, Validate, utoipa::ToSchema)]
pub struct RegisterForm {
    #[validate(length(min = 4, max = 50, message = "Name must be between 4 and 50 characters"))]
    pub name: String,
    #[validate(
        email(message = "Invalid email address"),
        length(min = 4, max = 50, message = "Email must be between 4 and 50 characters")
    )]
    pub email: String,
    #[validate(length(min = 8, max = 50, message = "Password must be between 8 and 50 characters"))]
    pub password: String,
}

/// POST /api/auth/login
#[derive(Debug, Deserialize, Validate, utoipa::ToSchema)]
pub struct LoginForm {
    #[validate(
        email(message = "Invalid email address"),
        length(min = 4, max = 50, message = "Email must be between 4 and 50 characters")
    )]
    pub email: String,
    #[validate(length(min = 8, max = 50, message = "Password must be between 8 and 50 characters"))]
    pub password: String,
}

/// Text fields of POST /api/account.
#[derive(Debug, Validate)]
pub struct AccountForm {
    #[validate(length(min = 4, max = 50, message = "Name must be between 4 and 50 characters"))]
    pub name: String,
    #[validate(
        email(message = "Invalid email address"),
        length(min = 4, max = 50, message = "Email must be between 4 and 50 characters")
    )]
    pub email: String,
}

/// PUT /api/auth/password
#[derive(Debug, Deserialize, Validate, utoipa::ToSchema)]
pub struct ChangePasswordForm {
    pub current_password: String,
    #[validate(length(min = 8, max = 50, message = "Password must be between 8 and 50 characters"))]
    pub new_password: String,
}

/// Flatten validation failures into one message, ordered by field name.
pub fn describe(errors: &ValidationErrors) -> String {
    let mut parts: Vec<String> = errors
        .field_errors()
        .into_iter()
        .flat_map(|(field, errs)| {
            let field = field.to_string();
            errs.iter().map(move |e| match &e.message {
                Some(msg) => format!("{field}: {msg}"),
                None => format!("{field}: invalid ({})", e.code),
            })
        })
        .collect();
    parts.sort();
    parts.join("; ")
}
