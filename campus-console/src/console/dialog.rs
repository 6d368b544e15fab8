//! Edit dialog logic for courses and students.
//!
//! Everything here is independent of rendering: dialog modes and who may open
//! them, the enrollment state of a course for the viewing student, and the
//! pending enrollment set edited in the student dialog.

use crate::console::guard::RoleSet;
use campus_api::{Course, Role, User};
use std::fmt::Display;
use std::future::Future;
use tokio::sync::oneshot;
use tracing::{debug, error};

pub const COURSE_CREATED: &str = "New course is registered successfully";
pub const COURSE_UPDATED: &str = "Course is updated successfully";
pub const COURSE_DELETED: &str = "Course is deleted successfully";
pub const COURSE_ENROLLED: &str = "Course is enrolled successfully";
pub const STUDENT_CREATED: &str = "New student is registered successfully";
pub const STUDENT_UPDATED: &str = "Student is updated successfully";
pub const STUDENT_DELETED: &str = "Student is deleted successfully";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogMode {
    Add,
    Edit,
    View,
    Delete,
}

impl DialogMode {
    /// Parse the `dialog` query parameter. Unknown values open nothing.
    pub fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "add" => Some(DialogMode::Add),
            "edit" => Some(DialogMode::Edit),
            "view" => Some(DialogMode::View),
            "delete" => Some(DialogMode::Delete),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DialogMode::Add => "add",
            DialogMode::Edit => "edit",
            DialogMode::View => "view",
            DialogMode::Delete => "delete",
        }
    }

    /// Whether this mode needs an existing record.
    pub fn needs_target(self) -> bool {
        !matches!(self, DialogMode::Add)
    }
}

/// Which list a dialog belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    Course,
    Student,
}

impl Resource {
    /// Roles allowed to open `mode` on this resource. Empty if the mode does
    /// not exist for the resource.
    pub fn allowed_roles(self, mode: DialogMode) -> RoleSet {
        match (self, mode) {
            (_, DialogMode::Add | DialogMode::Edit | DialogMode::Delete) => RoleSet::ADMIN,
            (Resource::Course, DialogMode::View) => RoleSet::STUDENT,
            (Resource::Student, DialogMode::View) => RoleSet::NONE,
        }
    }

    pub fn permits(self, mode: DialogMode, role: Role) -> bool {
        self.allowed_roles(mode).contains(role)
    }

    pub fn title(self, mode: DialogMode) -> &'static str {
        match (self, mode) {
            (Resource::Course, DialogMode::Add) => "Add New Course",
            (Resource::Course, DialogMode::Edit) => "Update Course",
            (Resource::Course, DialogMode::View) => "View Course",
            (Resource::Course, DialogMode::Delete) => "Delete Course",
            (Resource::Student, DialogMode::Add) => "Add New Student",
            (Resource::Student, DialogMode::Edit) => "Update Student",
            (Resource::Student, DialogMode::View) => "View Student",
            (Resource::Student, DialogMode::Delete) => "Delete Student",
        }
    }
}

pub fn course_delete_prompt(title: &str) -> String {
    format!("Are you sure you want to delete this {title} course?")
}

pub fn student_delete_prompt(name: &str) -> String {
    format!("Are you sure you want to delete student {name}?")
}

/// What the view dialog offers the current student for one course.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnrollState {
    /// Course id is already in the student's list
    Enrolled,
    /// Enroll action available
    Available,
    /// The student's own record could not be loaded
    Unavailable,
}

pub fn enroll_state(me: Option<&User>, course_id: &str) -> EnrollState {
    match me {
        Some(user) if user.is_enrolled(course_id) => EnrollState::Enrolled,
        Some(_) => EnrollState::Available,
        None => EnrollState::Unavailable,
    }
}

/// Course ids selected in the student dialog. Never holds a duplicate.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PendingEnrollment {
    ids: Vec<String>,
}

impl PendingEnrollment {
    pub fn new<I, S>(initial: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut pending = Self::default();
        for id in initial {
            pending.add(id);
        }
        pending
    }

    /// Append a course; returns false if it was already pending.
    pub fn add(&mut self, id: impl Into<String>) -> bool {
        let id = id.into();
        if id.is_empty() || self.contains(&id) {
            return false;
        }
        self.ids.push(id);
        true
    }

    /// Remove a tag; returns false if it was not pending.
    pub fn remove(&mut self, id: &str) -> bool {
        let before = self.ids.len();
        self.ids.retain(|existing| existing != id);
        self.ids.len() != before
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.iter().any(|existing| existing == id)
    }

    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    /// Catalog entries with whether each can still be selected.
    pub fn options<'a>(&self, catalog: &'a [Course]) -> Vec<(&'a Course, bool)> {
        catalog
            .iter()
            .map(|course| (course, !self.contains(&course.id)))
            .collect()
    }
}

/// Run a backend mutation to completion even if the requester goes away.
///
/// The work is spawned so dropping the caller (browser disconnect) does not
/// cancel a request already sent. A result nobody waits for is logged and
/// dropped. Returns `None` only if the task itself died.
pub async fn run_detached<F, T, E>(label: &'static str, work: F) -> Option<Result<T, E>>
where
    F: Future<Output = Result<T, E>> + Send + 'static,
    T: Send + 'static,
    E: Display + Send + 'static,
{
    let (tx, rx) = oneshot::channel();
    tokio::spawn(async move {
        let result = work.await;
        if let Err(unclaimed) = tx.send(result) {
            discard(label, &unclaimed);
        }
    });

    match rx.await {
        Ok(result) => Some(result),
        Err(_) => {
            error!("{label} task ended without a result");
            None
        }
    }
}

/// Log and drop a result that arrived for a dialog nobody is showing.
fn discard<T, E: Display>(label: &str, result: &Result<T, E>) {
    match result {
        Ok(_) => debug!("{label} finished after the dialog closed"),
        Err(e) => debug!("{label} failed after the dialog closed: {}", e),
    }
}
