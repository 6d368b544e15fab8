//! Route guard: who may see which destination.
//!
//! Every destination declares the set of roles allowed to view it. The
//! decision is recomputed on each navigation from the current session state.

use campus_api::{Role, SessionState};

/// Set of roles, checked by membership.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoleSet(u8);

impl RoleSet {
    pub const NONE: RoleSet = RoleSet(0);
    pub const ADMIN: RoleSet = RoleSet(1);
    pub const STUDENT: RoleSet = RoleSet(1 << 1);
    pub const BOTH: RoleSet = RoleSet(Self::ADMIN.0 | Self::STUDENT.0);

    const fn bit(role: Role) -> u8 {
        match role {
            Role::Admin => Self::ADMIN.0,
            Role::Student => Self::STUDENT.0,
        }
    }

    pub const fn contains(self, role: Role) -> bool {
        self.0 & Self::bit(role) != 0
    }

    pub const fn union(self, other: RoleSet) -> RoleSet {
        RoleSet(self.0 | other.0)
    }
}

/// Who may view a destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// Anyone, logged in or not
    Public,
    /// Only sessions whose role is in the set
    Roles(RoleSet),
}

/// Every navigable page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Destination {
    Home,
    Students,
    Courses,
    Login,
    Signup,
    NotFound,
}

impl Destination {
    pub fn access(self) -> Access {
        match self {
            Destination::Home => Access::Roles(RoleSet::BOTH),
            Destination::Students => Access::Roles(RoleSet::ADMIN),
            Destination::Courses => Access::Roles(RoleSet::BOTH),
            Destination::Login | Destination::Signup | Destination::NotFound => Access::Public,
        }
    }

    pub fn path(self) -> &'static str {
        match self {
            Destination::Home => "/",
            Destination::Students => "/students",
            Destination::Courses => "/courses",
            Destination::Login => "/login",
            Destination::Signup => "/signup",
            Destination::NotFound => "/404",
        }
    }

    /// Resolve a request path; anything unknown is `NotFound`.
    pub fn from_path(path: &str) -> Destination {
        let path = path.split(['?', '#']).next().unwrap_or("/");
        let trimmed = path.trim_end_matches('/');
        match trimmed.to_ascii_lowercase().as_str() {
            "" => Destination::Home,
            "/students" => Destination::Students,
            "/courses" => Destination::Courses,
            "/login" => Destination::Login,
            "/signup" => Destination::Signup,
            _ => Destination::NotFound,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardDecision {
    /// Session not read yet; show a loading indicator, do not redirect
    Loading,
    Allowed,
    /// Redirect to the login page
    Denied,
}

/// Decide whether the current session may view `destination`.
pub fn evaluate(state: &SessionState, destination: Destination) -> GuardDecision {
    match destination.access() {
        Access::Public => GuardDecision::Allowed,
        Access::Roles(allowed) => match state {
            SessionState::Loading => GuardDecision::Loading,
            SessionState::Ready(Some(session)) if allowed.contains(session.role) => {
                GuardDecision::Allowed
            }
            SessionState::Ready(_) => GuardDecision::Denied,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use campus_api::Session;

    fn as_role(role: Role) -> SessionState {
        SessionState::Ready(Some(Session {
            token: "T".into(),
            role,
        }))
    }

    #[test]
    fn test_role_set_membership() {
        assert!(RoleSet::BOTH.contains(Role::Admin));
        assert!(RoleSet::BOTH.contains(Role::Student));
        assert!(RoleSet::ADMIN.contains(Role::Admin));
        assert!(!RoleSet::ADMIN.contains(Role::Student));
        assert!(!RoleSet::NONE.contains(Role::Admin));
        assert_eq!(RoleSet::ADMIN.union(RoleSet::STUDENT), RoleSet::BOTH);
    }

    #[test]
    fn test_students_is_admin_only() {
        assert_eq!(evaluate(&as_role(Role::Student), Destination::Students), GuardDecision::Denied);
        assert_eq!(evaluate(&as_role(Role::Admin), Destination::Students), GuardDecision::Allowed);
    }

    #[test]
    fn test_shared_destinations() {
        for dest in [Destination::Home, Destination::Courses] {
            assert_eq!(evaluate(&as_role(Role::Student), dest), GuardDecision::Allowed);
            assert_eq!(evaluate(&as_role(Role::Admin), dest), GuardDecision::Allowed);
            assert_eq!(evaluate(&SessionState::Ready(None), dest), GuardDecision::Denied);
        }
    }

    #[test]
    fn test_loading_never_redirects() {
        for dest in [Destination::Home, Destination::Students, Destination::Courses] {
            assert_eq!(evaluate(&SessionState::Loading, dest), GuardDecision::Loading);
        }
        assert_eq!(evaluate(&SessionState::Loading, Destination::Login), GuardDecision::Allowed);
    }

    #[test]
    fn test_public_destinations() {
        for dest in [Destination::Login, Destination::Signup, Destination::NotFound] {
            assert_eq!(evaluate(&SessionState::Ready(None), dest), GuardDecision::Allowed);
        }
    }

    #[test]
    fn test_from_path() {
        assert_eq!(Destination::from_path("/"), Destination::Home);
        assert_eq!(Destination::from_path("/students/"), Destination::Students);
        assert_eq!(Destination::from_path("/courses?dialog=add"), Destination::Courses);
        assert_eq!(Destination::from_path("/Signup"), Destination::Signup);
        assert_eq!(Destination::from_path("/studentApp"), Destination::NotFound);
    }
}
