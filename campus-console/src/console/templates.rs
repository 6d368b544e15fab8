//! Askama templates for the console.

use crate::console::guard::Destination;
use crate::console::notice::Notice;
use crate::console::views::{CourseRow, StudentRow};
use askama::Template;
use campus_api::Role;
use campus_api::validation::{CourseDraft, FieldErrors, StudentDraft};

/// Navbar entry
pub struct NavItem {
    pub label: &'static str,
    pub href: &'static str,
    pub active: bool,
}

/// Base data available to all templates
pub struct BaseContext {
    pub nav: Vec<NavItem>,
    pub notice: Option<Notice>,
    pub notice_autohide_ms: u64,
}

impl BaseContext {
    /// Navbar for `current`. Students needs the admin role, Courses any
    /// session; Login and Signup are always listed.
    pub fn new(current: Destination, role: Option<Role>, notice: Option<Notice>, notice_autohide_ms: u64) -> Self {
        let mut entries = Vec::new();
        if role == Some(Role::Admin) {
            entries.push(("Students", Destination::Students));
        }
        if role.is_some() {
            entries.push(("Courses", Destination::Courses));
        }
        entries.push(("Login", Destination::Login));
        entries.push(("Signup", Destination::Signup));

        let nav = entries
            .into_iter()
            .map(|(label, dest)| NavItem {
                label,
                href: dest.path(),
                active: dest == current,
            })
            .collect();

        Self {
            nav,
            notice,
            notice_autohide_ms,
        }
    }

    pub fn notice_class(&self) -> &'static str {
        self.notice.as_ref().map(|n| n.severity.as_str()).unwrap_or("")
    }
}

#[derive(Template)]
#[template(path = "home.html")]
pub struct HomeTemplate {
    pub base: BaseContext,
}

#[derive(Template)]
#[template(path = "loading.html")]
pub struct LoadingTemplate {
    pub base: BaseContext,
}

#[derive(Template)]
#[template(path = "not_found.html")]
pub struct NotFoundTemplate {
    pub base: BaseContext,
}

#[derive(Template)]
#[template(path = "login.html")]
pub struct LoginTemplate {
    pub base: BaseContext,
    pub email: String,
    pub errors: FieldErrors,
}

#[derive(Template)]
#[template(path = "signup.html")]
pub struct SignupTemplate {
    pub base: BaseContext,
    pub name: String,
    pub email: String,
    pub errors: FieldErrors,
}

/// Enrollment indicator in the course view dialog
pub struct EnrollView {
    pub enrolled: bool,
    /// Enroll action shown
    pub can_enroll: bool,
}

/// Course dialog contents
pub struct CourseDialog {
    pub title: &'static str,
    pub mode: &'static str,
    /// Form target
    pub action: String,
    pub draft: CourseDraft,
    pub errors: FieldErrors,
    pub read_only: bool,
    /// Confirmation text; set only for delete
    pub prompt: Option<String>,
    /// Set only for view
    pub enroll: Option<EnrollView>,
}

#[derive(Template)]
#[template(path = "courses.html")]
pub struct CoursesTemplate {
    pub base: BaseContext,
    pub rows: Vec<CourseRow>,
    pub is_admin: bool,
    pub is_student: bool,
    pub dialog: Option<CourseDialog>,
}

/// Pending enrollment tag
pub struct CourseTag {
    pub id: String,
    pub title: String,
}

/// Entry in the enrollment selector
pub struct CourseOption {
    pub id: String,
    pub title: String,
    pub selectable: bool,
}

/// Student dialog contents
pub struct StudentDialog {
    pub title: &'static str,
    pub mode: &'static str,
    pub action: String,
    pub draft: StudentDraft,
    pub errors: FieldErrors,
    pub prompt: Option<String>,
    pub tags: Vec<CourseTag>,
    pub options: Vec<CourseOption>,
}

#[derive(Template)]
#[template(path = "students.html")]
pub struct StudentsTemplate {
    pub base: BaseContext,
    pub rows: Vec<StudentRow>,
    pub dialog: Option<StudentDialog>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(base: &BaseContext) -> Vec<&'static str> {
        base.nav.iter().map(|n| n.label).collect()
    }

    #[test]
    fn test_nav_items_follow_role() {
        let admin = BaseContext::new(Destination::Courses, Some(Role::Admin), None, 3000);
        assert_eq!(labels(&admin), ["Students", "Courses", "Login", "Signup"]);

        let student = BaseContext::new(Destination::Courses, Some(Role::Student), None, 3000);
        assert_eq!(labels(&student), ["Courses", "Login", "Signup"]);

        let anonymous = BaseContext::new(Destination::Login, None, None, 3000);
        assert_eq!(labels(&anonymous), ["Login", "Signup"]);
    }

    #[test]
    fn test_current_nav_item_is_active() {
        let base = BaseContext::new(Destination::Courses, Some(Role::Admin), None, 3000);
        let active: Vec<_> = base.nav.iter().filter(|n| n.active).map(|n| n.href).collect();
        assert_eq!(active, ["/courses"]);
    }

    #[test]
    fn test_login_page_keeps_email_and_shows_notice() {
        let page = LoginTemplate {
            base: BaseContext::new(
                Destination::Login,
                None,
                Some(Notice::error("Invalid credentials")),
                3000,
            ),
            email: "a@x.com".into(),
            errors: FieldErrors::new(),
        };
        let html = page.render().unwrap();
        assert!(html.contains("value=\"a@x.com\""));
        assert!(html.contains("Invalid credentials"));
    }

    #[test]
    fn test_course_view_dialog_shows_enrolled() {
        let page = CoursesTemplate {
            base: BaseContext::new(Destination::Courses, Some(Role::Student), None, 3000),
            rows: vec![],
            is_admin: false,
            is_student: true,
            dialog: Some(CourseDialog {
                title: "View Course",
                mode: "view",
                action: "/courses/c1/enroll".into(),
                draft: CourseDraft {
                    title: "Rust".into(),
                    description: "Systems".into(),
                    price: "10".into(),
                },
                errors: FieldErrors::new(),
                read_only: true,
                prompt: None,
                enroll: Some(EnrollView {
                    enrolled: true,
                    can_enroll: false,
                }),
            }),
        };
        let html = page.render().unwrap();
        assert!(html.contains("View Course"));
        assert!(html.contains("Enrolled"));
        assert!(!html.contains(">Enroll</button>"));
    }
}
