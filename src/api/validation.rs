//! Field checks for the auth forms, run before any backend call.

use serde::Deserialize;

use super::form::FieldErrors;
use crate::backend::{Credentials, SignUpForm};

const MIN_NAME_LENGTH: usize = 2;
const MIN_PASSWORD_LENGTH: usize = 8;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SignInInput {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SignUpInput {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ForgotPasswordInput {
    pub email: Option<String>,
}

fn push(errors: &mut FieldErrors, field: &'static str, message: &str) {
    errors.entry(field).or_default().push(message.to_string());
}

fn is_email(value: &str) -> bool {
    match value.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
        }
        None => false,
    }
}

fn email(errors: &mut FieldErrors, value: Option<&str>) -> String {
    let value = value.unwrap_or("").trim();
    if !is_email(value) {
        push(errors, "email", "Please enter a valid email.");
    }
    value.to_string()
}

pub fn sign_in(input: &SignInInput) -> Result<Credentials, FieldErrors> {
    let mut errors = FieldErrors::new();
    let email = email(&mut errors, input.email.as_deref());

    let password = input.password.clone().unwrap_or_default();
    if password.is_empty() {
        push(&mut errors, "password", "Password field must not be empty.");
    }

    if errors.is_empty() {
        Ok(Credentials { email, password })
    } else {
        Err(errors)
    }
}

pub fn sign_up(input: &SignUpInput) -> Result<SignUpForm, FieldErrors> {
    let mut errors = FieldErrors::new();

    let name = input.name.as_deref().unwrap_or("").trim().to_string();
    if name.chars().count() < MIN_NAME_LENGTH {
        push(&mut errors, "name", "Name must be at least 2 characters long.");
    }

    let email = email(&mut errors, input.email.as_deref());

    let password = input.password.clone().unwrap_or_default();
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        push(&mut errors, "password", "Password must be at least 8 characters long.");
    }

    if errors.is_empty() {
        Ok(SignUpForm {
            name,
            email,
            password,
        })
    } else {
        Err(errors)
    }
}

pub fn forgot_password(input: &ForgotPasswordInput) -> Result<String, FieldErrors> {
    let mut errors = FieldErrors::new();
    let email = email(&mut errors, input.email.as_deref());
    if errors.is_empty() { Ok(email) } else { Err(errors) }
}
