use crate::models::{User, UserId};

/// Who a request runs on behalf of. Anonymous viewers carry no user.
#[derive(Debug, Clone)]
pub struct ViewerContext {
    pub request_id: String,
    pub user: Option<User>,
}

impl ViewerContext {
    pub fn anonymous(request_id: String) -> Self {
        Self {
            request_id,
            user: None,
        }
    }

    pub fn authenticated_user(user: User, request_id: String) -> Self {
        Self {
            request_id,
            user: Some(user),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }

    pub fn user_id(&self) -> Option<UserId> {
        self.user.as_ref().map(|u| u.id)
    }

    pub fn username(&self) -> Option<&str> {
        self.user.as_ref().map(|u| u.username.as_str())
    }
}
