//! Client-side route guard contract.
//!
//! The UI keeps `{ user, is_loading }` in its authentication context and asks
//! this function what to show for a protected route.

use super::models::User;

/// Where unauthenticated navigation is sent
pub const LOGIN_PATH: &str = "/auth";

/// Authentication context as the UI sees it
#[derive(Debug, Clone, Default)]
pub struct AuthView {
    pub user: Option<User>,
    pub is_loading: bool,
}

/// What a protected route should do
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    /// Resolution pending; show a neutral placeholder
    Loading,
    /// Show the protected view for this user
    Render(User),
    /// Navigate to the login screen
    Redirect(&'static str),
}

pub fn decide(view: &AuthView) -> GuardDecision {
    if view.is_loading {
        return GuardDecision::Loading;
    }
    match &view.user {
        Some(user) => GuardDecision::Render(user.clone()),
        None => GuardDecision::Redirect(LOGIN_PATH),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user() -> User {
        User {
            id: 1,
            username: "shopping".to_string(),
        }
    }

    #[test]
    fn test_loading_wins() {
        let view = AuthView {
            user: Some(user()),
            is_loading: true,
        };
        assert_eq!(decide(&view), GuardDecision::Loading);
    }

    #[test]
    fn test_render_when_signed_in() {
        let view = AuthView {
            user: Some(user()),
            is_loading: false,
        };
        assert_eq!(decide(&view), GuardDecision::Render(user()));
    }

    #[test]
    fn test_redirect_when_anonymous() {
        assert_eq!(decide(&AuthView::default()), GuardDecision::Redirect("/auth"));
    }
}
