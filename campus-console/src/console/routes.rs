//! Console route handlers.
//!
//! Every handler loads the session from the request cookies, runs the route
//! guard for its destination and returns the updated cookie jar with the
//! response.

use crate::console::dialog::{
    self, COURSE_CREATED, COURSE_DELETED, COURSE_ENROLLED, COURSE_UPDATED, DialogMode,
    EnrollState, PendingEnrollment, Resource, STUDENT_CREATED, STUDENT_DELETED, STUDENT_UPDATED,
};
use crate::console::guard::{self, Destination, GuardDecision};
use crate::console::middleware::{ConsoleState, CookieStorage};
use crate::console::notice::{self, Notice};
use crate::console::templates::{
    BaseContext, CourseDialog, CourseOption, CourseTag, CoursesTemplate, EnrollView,
    HomeTemplate, LoadingTemplate, LoginTemplate, NotFoundTemplate, SignupTemplate,
    StudentDialog, StudentsTemplate,
};
use crate::console::views::{CourseListing, CourseRow, StudentListing, StudentRow, price_text};
use askama::Template;
use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::{StatusCode, Uri},
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
};
use axum_extra::extract::{CookieJar, Form};
use campus_api::validation::{
    CourseDraft, FieldErrors, LoginDraft, SignupDraft, StudentDraft, validate_course,
    validate_login, validate_signup, validate_student,
};
use campus_api::{
    AuthedClient, Course, NETWORK_FAILURE_MESSAGE, Role, Session, SessionContext, User, UserInput,
};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, info, warn};

pub const LOGGED_IN: &str = "User is logged in successfully";
pub const SIGNED_UP: &str = "User is registered successfully";

/// Build the console router.
pub fn console_router(state: Arc<ConsoleState>) -> Router {
    Router::new()
        .route("/", get(home))
        .route("/courses", get(courses_page).post(course_create))
        .route("/courses/{id}/edit", post(course_update))
        .route("/courses/{id}/delete", post(course_delete))
        .route("/courses/{id}/enroll", post(course_enroll))
        .route("/students", get(students_page).post(student_create))
        .route("/students/{id}/edit", post(student_update))
        .route("/students/{id}/delete", post(student_delete))
        .route("/login", get(login_page).post(login_submit))
        .route("/signup", get(signup_page).post(signup_submit))
        .route("/logout", post(logout))
        .route("/validate/{form}", post(validate))
        .fallback(not_found)
        .with_state(state)
}

fn render(template: impl Template) -> Html<String> {
    Html(
        template
            .render()
            .unwrap_or_else(|e| format!("Template error: {e}")),
    )
}

/// One browser request: its session and the cookie jar backing it.
struct Visit {
    session: SessionContext,
    storage: CookieStorage,
}

impl Visit {
    fn open(state: &ConsoleState, jar: CookieJar) -> Self {
        let (session, storage) = state.session(jar);
        Self { session, storage }
    }

    /// Open the visit and run the guard for `destination`.
    ///
    /// `Err` carries the response to send instead: a loading page, or a
    /// redirect to the login page.
    fn enter(
        state: &ConsoleState,
        jar: CookieJar,
        destination: Destination,
    ) -> Result<(Self, Session), Response> {
        let visit = Self::open(state, jar);
        let decision = guard::evaluate(&visit.session.state(), destination);
        match (decision, visit.session.get_session()) {
            (GuardDecision::Allowed, Some(session)) => Ok((visit, session)),
            (GuardDecision::Loading, _) => {
                let base = visit.base(state, destination, None);
                Err(visit.page(LoadingTemplate { base }))
            }
            _ => {
                debug!(path = destination.path(), "Guard denied, redirecting to login");
                Err(visit.redirect(Destination::Login.path()))
            }
        }
    }

    fn role(&self) -> Option<Role> {
        self.session.role()
    }

    fn client(&self, state: &ConsoleState) -> AuthedClient {
        state.clients.authed(&self.session)
    }

    /// Page chrome. Without an explicit notice the flashed one is shown.
    fn base(&self, state: &ConsoleState, current: Destination, notice: Option<Notice>) -> BaseContext {
        let notice = notice.or_else(|| notice::take(&self.storage));
        BaseContext::new(current, self.role(), notice, state.notice_autohide_ms)
    }

    fn page(&self, template: impl Template) -> Response {
        (self.storage.jar(), render(template)).into_response()
    }

    fn redirect(&self, to: &str) -> Response {
        (self.storage.jar(), Redirect::to(to)).into_response()
    }

    fn flash_redirect(&self, notice: Notice, to: &str) -> Response {
        notice::flash(&self.storage, &notice);
        self.redirect(to)
    }
}

/// Run a mutating backend call detached from the request.
async fn mutate<F>(label: &'static str, work: F) -> Result<(), Notice>
where
    F: Future<Output = campus_api::Result<()>> + Send + 'static,
{
    match dialog::run_detached(label, work).await {
        Some(Ok(())) => Ok(()),
        Some(Err(e)) => {
            warn!("{label} failed: {}", e);
            Err(Notice::error(e.user_message()))
        }
        None => Err(Notice::error(NETWORK_FAILURE_MESSAGE)),
    }
}

fn encode_id(id: &str) -> String {
    urlencoding::encode(id).into_owned()
}

/// `?dialog=<mode>&id=<id>` on the list views.
#[derive(Debug, Default, Deserialize)]
pub struct DialogQuery {
    dialog: Option<String>,
    id: Option<String>,
}

impl DialogQuery {
    fn mode(&self) -> Option<DialogMode> {
        self.dialog.as_deref().and_then(DialogMode::parse)
    }

    /// The requested mode, if `role` may open it and it has the target it needs.
    fn request(&self, resource: Resource, role: Role) -> Option<(DialogMode, Option<&str>)> {
        let mode = self.mode()?;
        if !resource.permits(mode, role) {
            warn!(mode = mode.as_str(), %role, "Dialog not permitted for role");
            return None;
        }
        let id = self.id.as_deref().filter(|id| !id.is_empty());
        if mode.needs_target() && id.is_none() {
            debug!(mode = mode.as_str(), "Dialog requested without a target");
            return None;
        }
        Some((mode, id))
    }
}

// ---------------------------------------------------------------------------
// Home and not-found
// ---------------------------------------------------------------------------

async fn home(State(state): State<Arc<ConsoleState>>, jar: CookieJar) -> Response {
    let (visit, _) = match Visit::enter(&state, jar, Destination::Home) {
        Ok(entered) => entered,
        Err(response) => return response,
    };
    let base = visit.base(&state, Destination::Home, None);
    visit.page(HomeTemplate { base })
}

/// Unknown paths. Case or trailing-slash variants of a page redirect to it.
async fn not_found(State(state): State<Arc<ConsoleState>>, jar: CookieJar, uri: Uri) -> Response {
    let visit = Visit::open(&state, jar);
    let destination = Destination::from_path(uri.path());
    if destination != Destination::NotFound {
        return visit.redirect(destination.path());
    }
    let base = visit.base(&state, Destination::NotFound, None);
    (StatusCode::NOT_FOUND, visit.page(NotFoundTemplate { base })).into_response()
}

// ---------------------------------------------------------------------------
// Courses
// ---------------------------------------------------------------------------

fn course_draft(course: &Course) -> CourseDraft {
    CourseDraft {
        title: course.title.clone(),
        description: course.description.clone(),
        price: price_text(course.price),
    }
}

fn course_action(mode: DialogMode, id: Option<&str>) -> String {
    match (mode, id) {
        (DialogMode::Add, _) | (_, None) => "/courses".to_string(),
        (DialogMode::Edit, Some(id)) => format!("/courses/{}/edit", encode_id(id)),
        (DialogMode::View, Some(id)) => format!("/courses/{}/enroll", encode_id(id)),
        (DialogMode::Delete, Some(id)) => format!("/courses/{}/delete", encode_id(id)),
    }
}

fn course_dialog(
    mode: DialogMode,
    id: Option<&str>,
    draft: CourseDraft,
    errors: FieldErrors,
    me: Option<&User>,
) -> CourseDialog {
    let prompt = (mode == DialogMode::Delete).then(|| dialog::course_delete_prompt(&draft.title));
    let enroll = match (mode, id) {
        (DialogMode::View, Some(id)) => {
            let state = dialog::enroll_state(me, id);
            Some(EnrollView {
                enrolled: state == EnrollState::Enrolled,
                can_enroll: state == EnrollState::Available,
            })
        }
        _ => None,
    };

    CourseDialog {
        title: Resource::Course.title(mode),
        mode: mode.as_str(),
        action: course_action(mode, id),
        draft,
        errors,
        read_only: mode == DialogMode::View,
        prompt,
        enroll,
    }
}

/// Dialog for an existing course, if it is still in the listing.
fn existing_course_dialog(listing: &CourseListing, mode: DialogMode, id: &str) -> Option<CourseDialog> {
    let Some(course) = listing.find(id) else {
        debug!(course_id = %id, "Dialog target not in course listing");
        return None;
    };
    Some(course_dialog(
        mode,
        Some(id),
        course_draft(course),
        FieldErrors::new(),
        listing.me.as_ref(),
    ))
}

fn courses_view(
    state: &ConsoleState,
    visit: &Visit,
    listing: &CourseListing,
    dialog: Option<CourseDialog>,
    notice: Option<Notice>,
) -> Response {
    let rows = listing
        .courses
        .iter()
        .map(|c| CourseRow::new(c, &state.currency))
        .collect();
    let base = visit.base(state, Destination::Courses, notice);
    let role = visit.role();
    visit.page(CoursesTemplate {
        base,
        rows,
        is_admin: role == Some(Role::Admin),
        is_student: role == Some(Role::Student),
        dialog,
    })
}

/// Courses list, with the dialog named in the query string.
async fn courses_page(
    State(state): State<Arc<ConsoleState>>,
    jar: CookieJar,
    Query(query): Query<DialogQuery>,
) -> Response {
    let (visit, session) = match Visit::enter(&state, jar, Destination::Courses) {
        Ok(entered) => entered,
        Err(response) => return response,
    };
    let listing = CourseListing::fetch(&visit.client(&state)).await;

    let dialog = query
        .request(Resource::Course, session.role)
        .and_then(|(mode, id)| match id {
            None => Some(course_dialog(mode, None, CourseDraft::default(), FieldErrors::new(), None)),
            Some(id) => existing_course_dialog(&listing, mode, id),
        });

    courses_view(&state, &visit, &listing, dialog, None)
}

/// Validate and save a course. Re-renders the open dialog on any failure.
async fn save_course(
    state: &ConsoleState,
    visit: Visit,
    id: Option<String>,
    draft: CourseDraft,
) -> Response {
    let mode = if id.is_some() { DialogMode::Edit } else { DialogMode::Add };
    let client = visit.client(state);

    let (errors, notice) = match validate_course(&draft) {
        Err(errors) => (errors, None),
        Ok(input) => {
            let result = match id.clone() {
                None => {
                    let client = client.clone();
                    mutate("create course", async move { client.create_course(&input).await }).await
                }
                Some(id) => {
                    let client = client.clone();
                    mutate("update course", async move { client.update_course(&id, &input).await }).await
                }
            };
            match result {
                Ok(()) => {
                    info!(course_id = ?id, "Course saved");
                    let message = if id.is_some() { COURSE_UPDATED } else { COURSE_CREATED };
                    return visit.flash_redirect(Notice::success(message), Destination::Courses.path());
                }
                Err(notice) => (FieldErrors::new(), Some(notice)),
            }
        }
    };

    let listing = CourseListing::fetch(&client).await;
    let dialog = course_dialog(mode, id.as_deref(), draft, errors, None);
    courses_view(state, &visit, &listing, Some(dialog), notice)
}

async fn course_create(
    State(state): State<Arc<ConsoleState>>,
    jar: CookieJar,
    Form(draft): Form<CourseDraft>,
) -> Response {
    let (visit, session) = match Visit::enter(&state, jar, Destination::Courses) {
        Ok(entered) => entered,
        Err(response) => return response,
    };
    if !Resource::Course.permits(DialogMode::Add, session.role) {
        return visit.redirect(Destination::Courses.path());
    }
    save_course(&state, visit, None, draft).await
}

async fn course_update(
    State(state): State<Arc<ConsoleState>>,
    jar: CookieJar,
    Path(id): Path<String>,
    Form(draft): Form<CourseDraft>,
) -> Response {
    let (visit, session) = match Visit::enter(&state, jar, Destination::Courses) {
        Ok(entered) => entered,
        Err(response) => return response,
    };
    if !Resource::Course.permits(DialogMode::Edit, session.role) {
        return visit.redirect(Destination::Courses.path());
    }
    save_course(&state, visit, Some(id), draft).await
}

async fn course_delete(
    State(state): State<Arc<ConsoleState>>,
    jar: CookieJar,
    Path(id): Path<String>,
) -> Response {
    let (visit, session) = match Visit::enter(&state, jar, Destination::Courses) {
        Ok(entered) => entered,
        Err(response) => return response,
    };
    if !Resource::Course.permits(DialogMode::Delete, session.role) {
        return visit.redirect(Destination::Courses.path());
    }

    let client = visit.client(&state);
    let result = {
        let client = client.clone();
        let id = id.clone();
        mutate("delete course", async move { client.delete_course(&id).await }).await
    };

    match result {
        Ok(()) => {
            info!(course_id = %id, "Course deleted");
            visit.flash_redirect(Notice::success(COURSE_DELETED), Destination::Courses.path())
        }
        Err(notice) => {
            let listing = CourseListing::fetch(&client).await;
            let dialog = existing_course_dialog(&listing, DialogMode::Delete, &id);
            courses_view(&state, &visit, &listing, dialog, Some(notice))
        }
    }
}

/// Append the course to the current student's enrollment.
async fn course_enroll(
    State(state): State<Arc<ConsoleState>>,
    jar: CookieJar,
    Path(id): Path<String>,
) -> Response {
    let (visit, session) = match Visit::enter(&state, jar, Destination::Courses) {
        Ok(entered) => entered,
        Err(response) => return response,
    };
    if !Resource::Course.permits(DialogMode::View, session.role) {
        return visit.redirect(Destination::Courses.path());
    }

    let client = visit.client(&state);
    let result = match client.get_me().await {
        Ok(me) if me.is_enrolled(&id) => {
            debug!(course_id = %id, "Already enrolled");
            return visit.redirect(Destination::Courses.path());
        }
        Ok(me) => {
            let update = UserInput::enroll(&me, &id);
            let client = client.clone();
            mutate("enroll", async move { client.update_user(&me.id, &update).await }).await
        }
        Err(e) => {
            warn!("Failed to load current user for enrollment: {}", e);
            Err(Notice::error(e.user_message()))
        }
    };

    match result {
        Ok(()) => {
            info!(course_id = %id, "Enrolled in course");
            visit.flash_redirect(Notice::success(COURSE_ENROLLED), Destination::Courses.path())
        }
        Err(notice) => {
            let listing = CourseListing::fetch(&client).await;
            let dialog = existing_course_dialog(&listing, DialogMode::View, &id);
            courses_view(&state, &visit, &listing, dialog, Some(notice))
        }
    }
}

// ---------------------------------------------------------------------------
// Students
// ---------------------------------------------------------------------------

/// Student dialog form.
///
/// The pending enrollment travels as repeated `courses` fields. The button
/// pressed decides what happens: `remove=<id>` drops a tag, `op=add_course`
/// appends the selected `course`, anything else submits.
#[derive(Debug, Default, Deserialize)]
pub struct StudentForm {
    #[serde(default)]
    name: String,
    #[serde(default)]
    email: String,
    #[serde(default)]
    courses: Vec<String>,
    #[serde(default)]
    course: String,
    #[serde(default)]
    op: Option<String>,
    #[serde(default)]
    remove: Option<String>,
}

#[derive(Debug, PartialEq, Eq)]
enum StudentAction {
    AddCourse(String),
    RemoveCourse(String),
    Submit,
}

impl StudentForm {
    fn into_parts(self) -> (StudentDraft, PendingEnrollment, StudentAction) {
        let action = match (self.remove, self.op.as_deref()) {
            (Some(id), _) if !id.is_empty() => StudentAction::RemoveCourse(id),
            (_, Some("add_course")) => StudentAction::AddCourse(self.course),
            _ => StudentAction::Submit,
        };
        let draft = StudentDraft {
            name: self.name,
            email: self.email,
        };
        (draft, PendingEnrollment::new(self.courses), action)
    }
}

fn student_action(mode: DialogMode, id: Option<&str>) -> String {
    match (mode, id) {
        (DialogMode::Edit, Some(id)) => format!("/students/{}/edit", encode_id(id)),
        (DialogMode::Delete, Some(id)) => format!("/students/{}/delete", encode_id(id)),
        _ => "/students".to_string(),
    }
}

fn student_dialog(
    listing: &StudentListing,
    mode: DialogMode,
    id: Option<&str>,
    draft: StudentDraft,
    pending: &PendingEnrollment,
    errors: FieldErrors,
) -> StudentDialog {
    let prompt = (mode == DialogMode::Delete).then(|| dialog::student_delete_prompt(&draft.name));
    let tags = pending
        .ids()
        .iter()
        .map(|id| CourseTag {
            id: id.clone(),
            title: listing.course_title(id),
        })
        .collect();
    let options = pending
        .options(&listing.catalog)
        .into_iter()
        .map(|(course, selectable)| CourseOption {
            id: course.id.clone(),
            title: course.title.clone(),
            selectable,
        })
        .collect();

    StudentDialog {
        title: Resource::Student.title(mode),
        mode: mode.as_str(),
        action: student_action(mode, id),
        draft,
        errors,
        prompt,
        tags,
        options,
    }
}

fn existing_student_dialog(listing: &StudentListing, mode: DialogMode, id: &str) -> Option<StudentDialog> {
    let Some(student) = listing.find(id) else {
        debug!(student_id = %id, "Dialog target not in student listing");
        return None;
    };
    let draft = StudentDraft {
        name: student.name.clone(),
        email: student.email.clone(),
    };
    let pending = PendingEnrollment::new(student.courses.iter().cloned());
    Some(student_dialog(listing, mode, Some(id), draft, &pending, FieldErrors::new()))
}

fn students_view(
    state: &ConsoleState,
    visit: &Visit,
    listing: &StudentListing,
    dialog: Option<StudentDialog>,
    notice: Option<Notice>,
) -> Response {
    let rows = listing.students.iter().map(StudentRow::from).collect();
    let base = visit.base(state, Destination::Students, notice);
    visit.page(StudentsTemplate { base, rows, dialog })
}

async fn students_page(
    State(state): State<Arc<ConsoleState>>,
    jar: CookieJar,
    Query(query): Query<DialogQuery>,
) -> Response {
    let (visit, session) = match Visit::enter(&state, jar, Destination::Students) {
        Ok(entered) => entered,
        Err(response) => return response,
    };
    let listing = StudentListing::fetch(&visit.client(&state)).await;

    let dialog = query
        .request(Resource::Student, session.role)
        .and_then(|(mode, id)| match id {
            None => Some(student_dialog(
                &listing,
                mode,
                None,
                StudentDraft::default(),
                &PendingEnrollment::default(),
                FieldErrors::new(),
            )),
            Some(id) => existing_student_dialog(&listing, mode, id),
        });

    students_view(&state, &visit, &listing, dialog, None)
}

/// Apply a student form: edit the pending enrollment, or validate and save.
async fn save_student(
    state: &ConsoleState,
    visit: Visit,
    id: Option<String>,
    form: StudentForm,
) -> Response {
    let mode = if id.is_some() { DialogMode::Edit } else { DialogMode::Add };
    let client = visit.client(state);
    let (draft, mut pending, action) = form.into_parts();

    let (errors, notice) = match action {
        StudentAction::AddCourse(course_id) => {
            pending.add(course_id);
            (FieldErrors::new(), None)
        }
        StudentAction::RemoveCourse(course_id) => {
            pending.remove(&course_id);
            (FieldErrors::new(), None)
        }
        StudentAction::Submit => match validate_student(&draft, pending.ids().to_vec()) {
            Err(errors) => (errors, None),
            Ok(input) => {
                let result = match id.clone() {
                    None => {
                        let client = client.clone();
                        mutate("create student", async move { client.create_user(&input).await }).await
                    }
                    Some(id) => {
                        let client = client.clone();
                        mutate("update student", async move { client.update_user(&id, &input).await }).await
                    }
                };
                match result {
                    Ok(()) => {
                        info!(student_id = ?id, courses = pending.ids().len(), "Student saved");
                        let message = if id.is_some() { STUDENT_UPDATED } else { STUDENT_CREATED };
                        return visit.flash_redirect(Notice::success(message), Destination::Students.path());
                    }
                    Err(notice) => (FieldErrors::new(), Some(notice)),
                }
            }
        },
    };

    let listing = StudentListing::fetch(&client).await;
    let dialog = student_dialog(&listing, mode, id.as_deref(), draft, &pending, errors);
    students_view(state, &visit, &listing, Some(dialog), notice)
}

async fn student_create(
    State(state): State<Arc<ConsoleState>>,
    jar: CookieJar,
    Form(form): Form<StudentForm>,
) -> Response {
    let (visit, session) = match Visit::enter(&state, jar, Destination::Students) {
        Ok(entered) => entered,
        Err(response) => return response,
    };
    if !Resource::Student.permits(DialogMode::Add, session.role) {
        return visit.redirect(Destination::Students.path());
    }
    save_student(&state, visit, None, form).await
}

async fn student_update(
    State(state): State<Arc<ConsoleState>>,
    jar: CookieJar,
    Path(id): Path<String>,
    Form(form): Form<StudentForm>,
) -> Response {
    let (visit, session) = match Visit::enter(&state, jar, Destination::Students) {
        Ok(entered) => entered,
        Err(response) => return response,
    };
    if !Resource::Student.permits(DialogMode::Edit, session.role) {
        return visit.redirect(Destination::Students.path());
    }
    save_student(&state, visit, Some(id), form).await
}

async fn student_delete(
    State(state): State<Arc<ConsoleState>>,
    jar: CookieJar,
    Path(id): Path<String>,
) -> Response {
    let (visit, session) = match Visit::enter(&state, jar, Destination::Students) {
        Ok(entered) => entered,
        Err(response) => return response,
    };
    if !Resource::Student.permits(DialogMode::Delete, session.role) {
        return visit.redirect(Destination::Students.path());
    }

    let client = visit.client(&state);
    let result = {
        let client = client.clone();
        let id = id.clone();
        mutate("delete student", async move { client.delete_user(&id).await }).await
    };

    match result {
        Ok(()) => {
            info!(student_id = %id, "Student deleted");
            visit.flash_redirect(Notice::success(STUDENT_DELETED), Destination::Students.path())
        }
        Err(notice) => {
            let listing = StudentListing::fetch(&client).await;
            let dialog = existing_student_dialog(&listing, DialogMode::Delete, &id);
            students_view(&state, &visit, &listing, dialog, Some(notice))
        }
    }
}

// ---------------------------------------------------------------------------
// Login, signup, logout
// ---------------------------------------------------------------------------

fn login_view(state: &ConsoleState, visit: &Visit, email: String, errors: FieldErrors, notice: Option<Notice>) -> Response {
    let base = visit.base(state, Destination::Login, notice);
    visit.page(LoginTemplate { base, email, errors })
}

fn signup_view(state: &ConsoleState, visit: &Visit, draft: SignupDraft, errors: FieldErrors, notice: Option<Notice>) -> Response {
    let base = visit.base(state, Destination::Signup, notice);
    visit.page(SignupTemplate {
        base,
        name: draft.name,
        email: draft.email,
        errors,
    })
}

async fn login_page(State(state): State<Arc<ConsoleState>>, jar: CookieJar) -> Response {
    let visit = Visit::open(&state, jar);
    login_view(&state, &visit, String::new(), FieldErrors::new(), None)
}

async fn login_submit(
    State(state): State<Arc<ConsoleState>>,
    jar: CookieJar,
    Form(draft): Form<LoginDraft>,
) -> Response {
    let visit = Visit::open(&state, jar);
    let credentials = match validate_login(&draft) {
        Ok(credentials) => credentials,
        Err(errors) => return login_view(&state, &visit, draft.email, errors, None),
    };

    let client = state.clients.public();
    let result = dialog::run_detached("login", async move { client.login(&credentials).await }).await;

    match result {
        Some(Ok(auth)) => {
            info!(role = %auth.role, "User logged in");
            visit.session.set_session(Some(Session {
                token: auth.token,
                role: auth.role,
            }));
            visit.flash_redirect(Notice::success(LOGGED_IN), Destination::Home.path())
        }
        Some(Err(e)) => {
            warn!("Login failed: {}", e);
            visit.session.set_session(None);
            login_view(&state, &visit, draft.email, FieldErrors::new(), Some(Notice::error(e.user_message())))
        }
        None => {
            visit.session.set_session(None);
            login_view(&state, &visit, draft.email, FieldErrors::new(), Some(Notice::error(NETWORK_FAILURE_MESSAGE)))
        }
    }
}

async fn signup_page(State(state): State<Arc<ConsoleState>>, jar: CookieJar) -> Response {
    let visit = Visit::open(&state, jar);
    signup_view(&state, &visit, SignupDraft::default(), FieldErrors::new(), None)
}

async fn signup_submit(
    State(state): State<Arc<ConsoleState>>,
    jar: CookieJar,
    Form(draft): Form<SignupDraft>,
) -> Response {
    let visit = Visit::open(&state, jar);
    // The password is never echoed back into the form
    let echoed = SignupDraft {
        password: String::new(),
        ..draft.clone()
    };
    let request = match validate_signup(&draft) {
        Ok(request) => request,
        Err(errors) => return signup_view(&state, &visit, echoed, errors, None),
    };

    let client = state.clients.public();
    let result = dialog::run_detached("signup", async move { client.signup(&request).await }).await;

    match result {
        Some(Ok(auth)) => {
            info!(role = %auth.role, "User signed up");
            visit.session.set_session(Some(Session {
                token: auth.token,
                role: auth.role,
            }));
            visit.flash_redirect(Notice::success(SIGNED_UP), &state.signup_landing)
        }
        Some(Err(e)) => {
            warn!("Signup failed: {}", e);
            visit.session.set_session(None);
            signup_view(&state, &visit, echoed, FieldErrors::new(), Some(Notice::error(e.user_message())))
        }
        None => {
            visit.session.set_session(None);
            signup_view(&state, &visit, echoed, FieldErrors::new(), Some(Notice::error(NETWORK_FAILURE_MESSAGE)))
        }
    }
}

async fn logout(State(state): State<Arc<ConsoleState>>, jar: CookieJar) -> Response {
    let visit = Visit::open(&state, jar);
    if let Some(role) = visit.role() {
        info!(%role, "User logged out");
    }
    visit.session.set_session(None);
    visit.redirect(Destination::Login.path())
}

// ---------------------------------------------------------------------------
// Field validation
// ---------------------------------------------------------------------------

fn field_errors<D, T>(
    body: serde_json::Value,
    validate: impl FnOnce(&D) -> Result<T, FieldErrors>,
) -> Result<FieldErrors, serde_json::Error>
where
    D: DeserializeOwned,
{
    let draft: D = serde_json::from_value(body)?;
    Ok(validate(&draft).err().unwrap_or_default())
}

/// Validate a form without submitting it. Responds with the field errors.
async fn validate(Path(form): Path<String>, Json(body): Json<serde_json::Value>) -> Response {
    let errors = match form.as_str() {
        "course" => field_errors(body, validate_course),
        "student" => field_errors(body, |draft: &StudentDraft| validate_student(draft, Vec::new())),
        "login" => field_errors(body, validate_login),
        "signup" => field_errors(body, validate_signup),
        _ => return (StatusCode::NOT_FOUND, "Unknown form").into_response(),
    };

    match errors {
        Ok(errors) => Json(errors).into_response(),
        Err(e) => {
            debug!("Undecodable {form} form: {}", e);
            (StatusCode::BAD_REQUEST, "Invalid form data").into_response()
        }
    }
}
