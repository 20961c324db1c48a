//! Inline form validation for the auth screens and the transcript lookup.
//!
//! Validation failures block submission and are reported per field; they are
//! recoverable by the user correcting the input.

use serde::Serialize;
use thiserror::Error;
use ts_rs::TS;
use utoipa::ToSchema;

use crate::models::{AccountDetails, ForgotRequest, LoginRequest, RegisterRequest};

pub const MIN_PASSWORD_LEN: usize = 6;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, TS, ToSchema)]
#[ts(export)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    fn new(field: &str, message: &str) -> Self {
        Self {
            field: field.to_string(),
            message: message.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, TS, ToSchema)]
#[error("{summary}")]
#[ts(export)]
pub struct ValidationError {
    pub summary: String,
    pub errors: Vec<FieldError>,
}

impl ValidationError {
    fn from_fields(summary: &str, errors: Vec<FieldError>) -> Result<(), Self> {
        if errors.is_empty() {
            Ok(())
        } else {
            Err(Self {
                summary: summary.to_string(),
                errors,
            })
        }
    }
}

/// `local@domain.tld`: no whitespace, exactly one `@`, and a dot inside the domain
/// with something on both sides.
pub fn is_valid_email(email: &str) -> bool {
    let email = email.trim();
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    domain
        .rsplit_once('.')
        .is_some_and(|(host, tld)| !host.is_empty() && !tld.is_empty())
}

/// Optional leading `+`, then 6 to 15 digits. Spaces are ignored.
pub fn is_valid_phone(phone: &str) -> bool {
    let compact: String = phone.chars().filter(|c| !c.is_whitespace()).collect();
    let digits = compact.strip_prefix('+').unwrap_or(&compact);
    (6..=15).contains(&digits.len()) && digits.chars().all(|c| c.is_ascii_digit())
}

fn blank(value: &str) -> bool {
    value.trim().is_empty()
}

fn check_email(email: &str, errors: &mut Vec<FieldError>) {
    if blank(email) {
        errors.push(FieldError::new("email", "Email is required."));
    } else if !is_valid_email(email) {
        errors.push(FieldError::new("email", "Enter a valid email."));
    }
}

fn check_password(password: &str, errors: &mut Vec<FieldError>) {
    if password.chars().count() < MIN_PASSWORD_LEN {
        errors.push(FieldError::new(
            "password",
            "Password must be at least 6 characters.",
        ));
    }
}

fn require(value: &str, field: &str, label: &str, errors: &mut Vec<FieldError>) {
    if blank(value) {
        errors.push(FieldError::new(field, &format!("{label} is required.")));
    }
}

pub fn validate_login(form: &LoginRequest) -> Result<(), ValidationError> {
    let mut errors = Vec::new();
    require(&form.username, "username", "Username", &mut errors);
    check_password(&form.password, &mut errors);
    ValidationError::from_fields("Enter a username and a 6+ character password.", errors)
}

pub fn validate_register(form: &RegisterRequest) -> Result<(), ValidationError> {
    let mut errors = Vec::new();

    match &form.account {
        AccountDetails::Client {
            username,
            first_name,
            last_name,
        } => {
            require(username, "username", "Username", &mut errors);
            require(first_name, "first_name", "First name", &mut errors);
            require(last_name, "last_name", "Last name", &mut errors);
        }
        AccountDetails::Company {
            company_name,
            registration_no,
            contact_person,
        } => {
            require(company_name, "company_name", "Company name", &mut errors);
            require(registration_no, "registration_no", "Registration number", &mut errors);
            require(contact_person, "contact_person", "Contact person", &mut errors);
        }
    }

    check_email(&form.email, &mut errors);
    check_password(&form.password, &mut errors);
    if form.confirm != form.password {
        errors.push(FieldError::new("confirm", "Passwords do not match."));
    }

    ValidationError::from_fields("Please complete all required fields correctly.", errors)
}

pub fn validate_forgot(form: &ForgotRequest) -> Result<(), ValidationError> {
    let mut errors = Vec::new();
    check_email(&form.email, &mut errors);
    ValidationError::from_fields("Enter a valid email.", errors)
}

/// Returns the trimmed phone number ready to send to the backend.
pub fn validate_phone(phone: &str) -> Result<String, ValidationError> {
    let trimmed = phone.trim();
    let message = if trimmed.is_empty() {
        "Phone number is required."
    } else if !is_valid_phone(trimmed) {
        "Enter a valid phone number."
    } else {
        return Ok(trimmed.to_string());
    };
    Err(ValidationError {
        summary: message.to_string(),
        errors: vec![FieldError::new("phone", message)],
    })
}

/// The backend indexes PDFs only; reject anything else before uploading it.
pub fn validate_pdf_name(file_name: &str) -> Result<(), ValidationError> {
    if file_name.to_lowercase().ends_with(".pdf") {
        return Ok(());
    }
    let message = "Only PDF files are supported.";
    Err(ValidationError {
        summary: message.to_string(),
        errors: vec![FieldError::new("file", message)],
    })
}
