use async_trait::async_trait;
use euk_error::AuthError;
use euk_types::User;
use tokio::sync::RwLock;

/// Source of the signed in user, usually backed by the auth API
#[async_trait]
pub trait SessionProvider: Send + Sync {
    async fn current_user(&self) -> Result<Option<User>, AuthError>;
}

/// Session holding a user in memory, swapped on sign in and sign out
#[derive(Debug, Default)]
pub struct StaticSession {
    user: RwLock<Option<User>>,
}

impl StaticSession {
    pub fn new(user: Option<User>) -> Self {
        Self {
            user: RwLock::new(user),
        }
    }

    pub async fn sign_in(&self, user: User) {
        *self.user.write().await = Some(user);
    }

    /// Returns the id of the user that was signed in, so the caller can drop its cached permissions
    pub async fn sign_out(&self) -> Option<i64> {
        self.user.write().await.take().map(|user| user.id)
    }
}

#[async_trait]
impl SessionProvider for StaticSession {
    async fn current_user(&self) -> Result<Option<User>, AuthError> {
        Ok(self.user.read().await.clone())
    }
}
