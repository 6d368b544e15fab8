//! Data loading for the list views.
//!
//! Each view fetches its collection and one auxiliary resource concurrently.
//! The two fetches fail independently: a failure is logged and the view
//! renders with what it has.

use campus_api::{AuthedClient, Course, User};
use tracing::{debug, warn};

/// Everything the Courses view needs.
#[derive(Debug, Default)]
pub struct CourseListing {
    pub courses: Vec<Course>,
    /// Current user, used for the enrolled indicator
    pub me: Option<User>,
}

impl CourseListing {
    pub async fn fetch(client: &AuthedClient) -> Self {
        let (courses, me) = tokio::join!(client.list_courses(), client.get_me());

        let courses = courses.unwrap_or_else(|e| {
            warn!("Failed to load courses: {}", e);
            Vec::new()
        });
        let me = me
            .inspect_err(|e| warn!("Failed to load current user: {}", e))
            .ok();
        debug!(courses = courses.len(), has_me = me.is_some(), "Loaded course listing");

        Self { courses, me }
    }

    pub fn find(&self, id: &str) -> Option<&Course> {
        self.courses.iter().find(|c| c.id == id)
    }
}

/// Everything the Students view needs.
#[derive(Debug, Default)]
pub struct StudentListing {
    pub students: Vec<User>,
    /// Course catalog for the enrollment selector
    pub catalog: Vec<Course>,
}

impl StudentListing {
    pub async fn fetch(client: &AuthedClient) -> Self {
        let (students, catalog) = tokio::join!(client.list_users(), client.list_courses());

        let students = students.unwrap_or_else(|e| {
            warn!("Failed to load students: {}", e);
            Vec::new()
        });
        let catalog = catalog.unwrap_or_else(|e| {
            warn!("Failed to load course catalog: {}", e);
            Vec::new()
        });
        debug!(students = students.len(), catalog = catalog.len(), "Loaded student listing");

        Self { students, catalog }
    }

    pub fn find(&self, id: &str) -> Option<&User> {
        self.students.iter().find(|s| s.id == id)
    }

    /// Display title for a course id, falling back to the id itself.
    pub fn course_title(&self, id: &str) -> String {
        self.catalog
            .iter()
            .find(|c| c.id == id)
            .map(|c| c.title.clone())
            .unwrap_or_else(|| id.to_string())
    }
}

/// One row of the Courses table.
#[derive(Debug, Clone, PartialEq)]
pub struct CourseRow {
    pub id: String,
    pub title: String,
    pub description: String,
    pub price_label: String,
}

impl CourseRow {
    pub fn new(course: &Course, currency: &str) -> Self {
        Self {
            id: course.id.clone(),
            title: course.title.clone(),
            description: course.description.clone(),
            price_label: price_label(course.price, currency),
        }
    }
}

/// One row of the Students table.
#[derive(Debug, Clone, PartialEq)]
pub struct StudentRow {
    pub id: String,
    pub name: String,
    pub email: String,
}

impl From<&User> for StudentRow {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            name: user.name.clone(),
            email: user.email.clone(),
        }
    }
}

/// `LKR 2500`, `LKR 99.5`.
pub fn price_label(price: f64, currency: &str) -> String {
    format!("{currency} {}", price_text(price))
}

/// Price as typed into the form; whole prices have no fraction.
pub fn price_text(price: f64) -> String {
    if price.fract() == 0.0 && price.abs() < 1e15 {
        format!("{}", price as i64)
    } else {
        price.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use campus_api::Role;

    #[test]
    fn test_price_label() {
        assert_eq!(price_label(2500.0, "LKR"), "LKR 2500");
        assert_eq!(price_label(99.5, "LKR"), "LKR 99.5");
        assert_eq!(price_label(0.0, "USD"), "USD 0");
        assert_eq!(price_text(12.25), "12.25");
    }

    #[test]
    fn test_course_title_falls_back_to_id() {
        let listing = StudentListing {
            students: vec![User {
                id: "u1".into(),
                name: "Ann".into(),
                email: "ann@x.com".into(),
                role: Role::Student,
                courses: vec![],
            }],
            catalog: vec![Course {
                id: "c1".into(),
                title: "Rust".into(),
                description: String::new(),
                price: 10.0,
            }],
        };
        assert_eq!(listing.course_title("c1"), "Rust");
        assert_eq!(listing.course_title("gone"), "gone");
        assert_eq!(listing.find("u1").map(|u| u.name.as_str()), Some("Ann"));
    }
}
