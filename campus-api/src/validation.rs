//! Per-entity form validation.
//!
//! Each validator takes the raw form input and returns either the typed
//! request body or the list of field errors. Nothing here touches the
//! network or any rendering code.

use crate::models::{CourseInput, Credentials, Role, SignupRequest, UserInput};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

/// Minimum password length accepted by login and signup forms.
pub const MIN_PASSWORD_LEN: usize = 6;

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email regex is valid")
});

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

/// Errors collected for one form, at most one per field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(Vec<FieldError>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an error unless the field already has one.
    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        if self.get(field).is_none() {
            self.0.push(FieldError {
                field,
                message: message.into(),
            });
        }
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|e| e.field == field)
            .map(|e| e.message.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    fn into_result<T>(self, value: impl FnOnce() -> T) -> Result<T, FieldErrors> {
        if self.is_empty() { Ok(value()) } else { Err(self) }
    }
}

fn require(errors: &mut FieldErrors, field: &'static str, label: &str, value: &str) {
    if value.trim().is_empty() {
        errors.add(field, format!("{label} is required"));
    }
}

fn check_email(errors: &mut FieldErrors, value: &str) {
    let value = value.trim();
    if value.is_empty() {
        errors.add("email", "Email is required");
    } else if !EMAIL_RE.is_match(value) {
        errors.add("email", "Enter a valid email");
    }
}

fn check_password(errors: &mut FieldErrors, value: &str) {
    if value.is_empty() {
        errors.add("password", "Password is required");
    } else if value.chars().count() < MIN_PASSWORD_LEN {
        errors.add(
            "password",
            format!("Password should be of minimum {MIN_PASSWORD_LEN} characters length"),
        );
    }
}

/// Raw course form input.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct CourseDraft {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub price: String,
}

pub fn validate_course(draft: &CourseDraft) -> Result<CourseInput, FieldErrors> {
    let mut errors = FieldErrors::new();
    require(&mut errors, "title", "Title", &draft.title);
    require(&mut errors, "description", "Description", &draft.description);

    let price = draft.price.trim();
    let mut parsed = 0.0;
    if price.is_empty() {
        errors.add("price", "Price is required");
    } else {
        match price.parse::<f64>() {
            Ok(p) if !p.is_finite() => errors.add("price", "Price must be a number"),
            Ok(p) if p < 0.0 => errors.add("price", "Price must be a positive number"),
            Ok(p) => parsed = p,
            Err(_) => errors.add("price", "Price must be a number"),
        }
    }

    errors.into_result(|| CourseInput {
        title: draft.title.trim().to_string(),
        description: draft.description.trim().to_string(),
        price: parsed,
    })
}

/// Raw student form input. Enrollment is handled by the dialog, not here.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct StudentDraft {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
}

/// Validate a student form; the result always carries the `student` role.
pub fn validate_student(draft: &StudentDraft, courses: Vec<String>) -> Result<UserInput, FieldErrors> {
    let mut errors = FieldErrors::new();
    require(&mut errors, "name", "Name", &draft.name);
    check_email(&mut errors, &draft.email);

    errors.into_result(|| UserInput {
        name: Some(draft.name.trim().to_string()),
        email: Some(draft.email.trim().to_string()),
        role: Some(Role::Student),
        courses,
    })
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct LoginDraft {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

pub fn validate_login(draft: &LoginDraft) -> Result<Credentials, FieldErrors> {
    let mut errors = FieldErrors::new();
    check_email(&mut errors, &draft.email);
    check_password(&mut errors, &draft.password);

    errors.into_result(|| Credentials {
        email: draft.email.trim().to_string(),
        password: draft.password.clone(),
    })
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct SignupDraft {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

pub fn validate_signup(draft: &SignupDraft) -> Result<SignupRequest, FieldErrors> {
    let mut errors = FieldErrors::new();
    require(&mut errors, "name", "Name", &draft.name);
    check_email(&mut errors, &draft.email);
    check_password(&mut errors, &draft.password);

    errors.into_result(|| SignupRequest {
        name: draft.name.trim().to_string(),
        email: draft.email.trim().to_string(),
        password: draft.password.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn course(title: &str, description: &str, price: &str) -> CourseDraft {
        CourseDraft {
            title: title.into(),
            description: description.into(),
            price: price.into(),
        }
    }

    #[test]
    fn test_valid_course() {
        let input = validate_course(&course(" Rust 101 ", "Ownership", "1500")).unwrap();
        assert_eq!(input.title, "Rust 101");
        assert_eq!(input.price, 1500.0);

        let free = validate_course(&course("Intro", "Free course", "0")).unwrap();
        assert_eq!(free.price, 0.0);
    }

    #[test]
    fn test_course_blocked_on_negative_price() {
        let errors = validate_course(&course("Rust", "Ownership", "-1")).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors.get("price"), Some("Price must be a positive number"));
    }

    #[test]
    fn test_course_blocked_on_empty_fields() {
        let errors = validate_course(&course("", "   ", "")).unwrap_err();
        assert_eq!(errors.get("title"), Some("Title is required"));
        assert_eq!(errors.get("description"), Some("Description is required"));
        assert_eq!(errors.get("price"), Some("Price is required"));
    }

    #[test]
    fn test_course_price_must_be_numeric() {
        for bad in ["abc", "12abc", "NaN", "inf"] {
            let errors = validate_course(&course("Rust", "Ownership", bad)).unwrap_err();
            assert_eq!(errors.get("price"), Some("Price must be a number"), "input {bad:?}");
        }
    }

    #[test]
    fn test_student_validation() {
        let draft = StudentDraft {
            name: "Ann".into(),
            email: "not-an-email".into(),
        };
        let errors = validate_student(&draft, vec![]).unwrap_err();
        assert_eq!(errors.get("email"), Some("Enter a valid email"));
        assert_eq!(errors.get("name"), None);

        let draft = StudentDraft {
            name: "Ann".into(),
            email: "ann@example.com".into(),
        };
        let input = validate_student(&draft, vec!["c1".into()]).unwrap();
        assert_eq!(input.role, Some(Role::Student));
        assert_eq!(input.courses, vec!["c1"]);
    }

    #[test]
    fn test_login_password_policy() {
        let draft = LoginDraft {
            email: "a@x.com".into(),
            password: "12345".into(),
        };
        let errors = validate_login(&draft).unwrap_err();
        assert!(errors.get("password").unwrap().contains("minimum 6"));

        let draft = LoginDraft {
            email: "a@x.com".into(),
            password: "secret".into(),
        };
        let creds = validate_login(&draft).unwrap();
        assert_eq!(creds.email, "a@x.com");
    }

    #[test]
    fn test_signup_requires_name() {
        let draft = SignupDraft {
            name: "".into(),
            email: "a@x.com".into(),
            password: "secret".into(),
        };
        let errors = validate_signup(&draft).unwrap_err();
        assert_eq!(errors.get("name"), Some("Name is required"));
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn test_field_errors_serialize_as_list() {
        let mut errors = FieldErrors::new();
        errors.add("email", "Email is required");
        errors.add("email", "ignored duplicate");
        let json = serde_json::to_value(&errors).unwrap();
        assert_eq!(
            json,
            serde_json::json!([{"field": "email", "message": "Email is required"}])
        );
    }
}
