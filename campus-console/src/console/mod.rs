//! Browser console for courses and students.
//!
//! Provides:
//! - Cookie-backed session storage and the route guard
//! - List views with add/edit/view/delete dialogs
//! - Login, signup and logout
//! - One-shot notifications carried across redirects

pub mod dialog;
pub mod guard;
pub mod middleware;
pub mod notice;
pub mod routes;
pub mod templates;
pub mod views;

pub use middleware::ConsoleState;
pub use routes::console_router;
