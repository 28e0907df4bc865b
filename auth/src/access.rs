//! Route-level authorization.
//!
//! Every route declares a [`Requirement`] when it is registered. The guard
//! resolves the caller into an [`AccessState`] and [`authorize`] turns the
//! pair into an [`AccessDecision`]. Nothing here knows about HTTP framing,
//! which keeps the policy testable on its own.

/// Capability a route demands from its caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Requirement {
    Public,
    Authenticated,
    RequiresRole(String),
    RequiresAnyRole(Vec<String>),
}

impl Requirement {
    pub fn role(role: impl Into<String>) -> Self {
        Requirement::RequiresRole(role.into())
    }

    pub fn any_role<I, S>(roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Requirement::RequiresAnyRole(roles.into_iter().map(Into::into).collect())
    }

    /// Whether the guard has to resolve a caller at all.
    pub fn needs_identity(&self) -> bool {
        !matches!(self, Requirement::Public)
    }
}

/// Something that can be checked for role membership.
pub trait Principal {
    fn has_role(&self, role: &str) -> bool;
}

/// Per-request authentication state. There is no state across requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessState<P> {
    Unauthenticated,
    Authenticated(P),
}

impl<P> AccessState<P> {
    pub fn principal(&self) -> Option<&P> {
        match self {
            AccessState::Authenticated(principal) => Some(principal),
            AccessState::Unauthenticated => None,
        }
    }
}

/// Outcome of checking a request against a route requirement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessDecision {
    Allow,
    /// No usable identity (HTTP 401)
    Unauthenticated,
    /// Identity known but lacks the required role (HTTP 403)
    Forbidden,
}

impl AccessDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, AccessDecision::Allow)
    }

    pub fn status_code(&self) -> u16 {
        match self {
            AccessDecision::Allow => 200,
            AccessDecision::Unauthenticated => 401,
            AccessDecision::Forbidden => 403,
        }
    }
}

/// Decide whether `state` satisfies `requirement`.
pub fn authorize<P: Principal>(state: &AccessState<P>, requirement: &Requirement) -> AccessDecision {
    let principal = match (requirement, state) {
        (Requirement::Public, _) => return AccessDecision::Allow,
        (_, AccessState::Unauthenticated) => return AccessDecision::Unauthenticated,
        (_, AccessState::Authenticated(principal)) => principal,
    };

    let permitted = match requirement {
        Requirement::Public | Requirement::Authenticated => true,
        Requirement::RequiresRole(role) => principal.has_role(role),
        Requirement::RequiresAnyRole(roles) => roles.iter().any(|role| principal.has_role(role)),
    };

    if permitted {
        AccessDecision::Allow
    } else {
        AccessDecision::Forbidden
    }
}
