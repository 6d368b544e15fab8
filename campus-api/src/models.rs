//! Wire types exchanged with the backend.

use serde::de::IgnoredAny;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

/// Account role. Closed set; every access decision matches on it exhaustively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Student,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Student => "student",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Role::Admin),
            "student" => Ok(Role::Student),
            other => Err(UnknownRole(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown role: {0}")]
pub struct UnknownRole(pub String);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Course {
    #[serde(rename = "_id")]
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub price: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: Role,
    /// Enrolled course ids. The backend sometimes populates these as full
    /// course documents; only the ids are kept and entries with neither
    /// shape are skipped.
    #[serde(default, deserialize_with = "course_ids")]
    pub courses: Vec<String>,
}

impl User {
    /// Whether `course_id` is already in this user's enrollment list.
    pub fn is_enrolled(&self, course_id: &str) -> bool {
        self.courses.iter().any(|id| id == course_id)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum CourseRef {
    Id(String),
    Populated {
        #[serde(rename = "_id")]
        id: String,
    },
    Unrecognized(IgnoredAny),
}

fn course_ids<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let refs: Option<Vec<CourseRef>> = Option::deserialize(deserializer)?;
    Ok(refs
        .unwrap_or_default()
        .into_iter()
        .filter_map(|r| match r {
            CourseRef::Id(id) | CourseRef::Populated { id } => Some(id),
            CourseRef::Unrecognized(_) => None,
        })
        .collect())
}

/// Body for `POST users/login`.
#[derive(Debug, Clone, Serialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

/// Body for `POST users/signup`.
#[derive(Debug, Clone, Serialize)]
pub struct SignupRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

/// Response from login and signup.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthResponse {
    pub status: String,
    pub token: String,
    pub role: Role,
}

/// Body for course create/update.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CourseInput {
    pub title: String,
    pub description: String,
    pub price: f64,
}

/// Body for user create/update.
///
/// Enrollment-only updates leave the profile fields unset so the backend
/// keeps its current values.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct UserInput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
    pub courses: Vec<String>,
}

impl UserInput {
    /// Update that appends `course_id` to the user's current enrollment.
    pub fn enroll(user: &User, course_id: &str) -> Self {
        let mut courses = user.courses.clone();
        courses.push(course_id.to_string());
        Self {
            courses,
            ..Self::default()
        }
    }
}

/// Envelope shared by every backend response: `{status, data?}`.
#[derive(Debug, Deserialize)]
pub(crate) struct Envelope<T> {
    pub status: String,
    pub data: Option<T>,
}

/// Error body: `{message}`.
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    pub message: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_courses_accepts_ids_and_documents() {
        let json = r#"{
            "_id": "u1",
            "name": "Ann",
            "email": "ann@example.com",
            "role": "student",
            "courses": ["c1", {"_id": "c2", "title": "Rust", "price": 10}]
        }"#;
        let user: User = serde_json::from_str(json).unwrap();
        assert_eq!(user.courses, vec!["c1", "c2"]);
        assert!(user.is_enrolled("c2"));
        assert!(!user.is_enrolled("c3"));
    }

    #[test]
    fn test_user_courses_missing_or_null() {
        let json = r#"{"_id": "u1", "name": "Ann", "email": "a@x.com", "role": "admin"}"#;
        let user: User = serde_json::from_str(json).unwrap();
        assert!(user.courses.is_empty());

        let json = r#"{"_id": "u1", "name": "Ann", "email": "a@x.com", "role": "admin", "courses": null}"#;
        let user: User = serde_json::from_str(json).unwrap();
        assert!(user.courses.is_empty());
    }

    #[test]
    fn test_enroll_appends_to_prior_list() {
        let user = User {
            id: "u1".into(),
            name: "Ann".into(),
            email: "a@x.com".into(),
            role: Role::Student,
            courses: vec!["c1".into()],
        };
        let update = UserInput::enroll(&user, "c9");
        assert_eq!(update.courses, vec!["c1", "c9"]);

        let body = serde_json::to_value(&update).unwrap();
        assert_eq!(body, serde_json::json!({"courses": ["c1", "c9"]}));
    }

    #[test]
    fn test_role_parsing() {
        assert_eq!("admin".parse::<Role>().unwrap(), Role::Admin);
        assert_eq!("student".parse::<Role>().unwrap(), Role::Student);
        let err = "both".parse::<Role>().unwrap_err();
        assert_eq!(err, UnknownRole("both".into()));
        assert_eq!(err.to_string(), "unknown role: both");
        assert_eq!(Role::Student.to_string(), "student");
    }

    #[test]
    fn test_user_courses_skips_unrecognized_entries() {
        let json = r#"{
            "_id": "u1",
            "name": "Ann",
            "email": "a@x.com",
            "role": "student",
            "courses": [null, "c1", 7, {"title": "no id"}, {"_id": "c2"}]
        }"#;
        let user: User = serde_json::from_str(json).unwrap();
        assert_eq!(user.courses, vec!["c1", "c2"]);
    }

    #[test]
    fn test_course_list_tolerates_missing_price() {
        let json = r#"[
            {"_id": "c1", "title": "Rust", "price": 10},
            {"_id": "c2", "title": "Go"}
        ]"#;
        let courses: Vec<Course> = serde_json::from_str(json).unwrap();
        assert_eq!(courses.len(), 2);
        assert_eq!(courses[1].price, 0.0);
        assert_eq!(courses[1].description, "");
    }
}
