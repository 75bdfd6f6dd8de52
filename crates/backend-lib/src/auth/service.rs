use async_trait::async_trait;

use super::{Session, SessionManager, UserRole};

/// Identity provider seam used by the HTTP control plane
#[async_trait]
pub trait AuthService: Send + Sync {
    async fn new_session(&self, user_id: String, role: UserRole) -> Session;
    async fn get_session(&self, token: &str) -> Option<Session>;
    async fn end_session(&self, token: &str) -> bool;
}

/// Session-manager backed implementation
pub struct DefaultAuth {
    sm: SessionManager,
}

impl DefaultAuth {
    pub fn new(sm: SessionManager) -> Self {
        Self { sm }
    }
}

#[async_trait]
impl AuthService for DefaultAuth {
    async fn new_session(&self, user_id: String, role: UserRole) -> Session {
        self.sm.create_session(user_id, role).await
    }

    async fn get_session(&self, token: &str) -> Option<Session> {
        self.sm.get_session(token).await
    }

    async fn end_session(&self, token: &str) -> bool {
        self.sm.revoke(token).await
    }
}
