//! Account service: signup and credential checks.

use crate::error::StoreError;
use crate::password::CredentialHasher;
use crate::repository::AccountRepository;
use std::sync::Arc;
use storefront_core::{Account, AuthConfig, Role};
use tracing::info;

/// Registers and authenticates accounts.
///
/// There is no session model: a successful login only returns the account.
pub struct AccountService<R: ?Sized> {
    repo: Arc<R>,
    hasher: CredentialHasher,
    allow_admin_signup: bool,
}

impl<R: ?Sized> Clone for AccountService<R> {
    fn clone(&self) -> Self {
        Self {
            repo: Arc::clone(&self.repo),
            hasher: self.hasher.clone(),
            allow_admin_signup: self.allow_admin_signup,
        }
    }
}

impl<R: AccountRepository + ?Sized> AccountService<R> {
    pub fn new(repo: Arc<R>, config: &AuthConfig) -> Self {
        Self {
            repo,
            hasher: CredentialHasher::new(),
            allow_admin_signup: config.allow_admin_signup,
        }
    }

    /// Replace the credential hasher.
    pub fn with_hasher(mut self, hasher: CredentialHasher) -> Self {
        self.hasher = hasher;
        self
    }

    /// Create an account. Fails with `AlreadyExists` when the email is taken.
    pub async fn register(
        &self,
        email: &str,
        password: &str,
        role: Option<Role>,
    ) -> Result<Account, StoreError> {
        if email.trim().is_empty() {
            return Err(StoreError::InvalidInput("email must not be blank".to_string()));
        }
        if password.is_empty() {
            return Err(StoreError::InvalidInput("password must not be empty".to_string()));
        }

        let role = role.unwrap_or_default();
        if role == Role::Admin && !self.allow_admin_signup {
            return Err(StoreError::InvalidInput(
                "admin accounts cannot be created through signup".to_string(),
            ));
        }

        let hash = self.hash(password).await?;
        let account = self.repo.insert_account(email, &hash, role).await?;

        info!(account_id = account.id, role = %account.role, "Account registered");
        Ok(account)
    }

    /// Return the account whose email and password both match exactly.
    ///
    /// An unknown email and a wrong password fail the same way.
    pub async fn authenticate(&self, email: &str, password: &str) -> Result<Account, StoreError> {
        let Some(stored) = self.repo.find_account(email).await? else {
            return Err(StoreError::InvalidCredentials);
        };

        let hasher = self.hasher.clone();
        let password = password.to_string();
        let hash = stored.password_hash;
        let verified = tokio::task::spawn_blocking(move || hasher.verify(&password, &hash))
            .await
            .map_err(|e| StoreError::PasswordHash(e.to_string()))?;

        if verified {
            Ok(stored.account)
        } else {
            Err(StoreError::InvalidCredentials)
        }
    }

    /// Create an admin account with this email unless one already exists.
    ///
    /// Returns whether an account was created.
    pub async fn ensure_admin(&self, email: &str, password: &str) -> Result<bool, StoreError> {
        if self.repo.find_account(email).await?.is_some() {
            return Ok(false);
        }

        let hash = self.hash(password).await?;
        match self.repo.insert_account(email, &hash, Role::Admin).await {
            Ok(_) => Ok(true),
            // Lost a race with another writer; the account exists either way.
            Err(StoreError::AlreadyExists(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }

    // Argon2 is deliberately slow; keep it off the async workers.
    async fn hash(&self, password: &str) -> Result<String, StoreError> {
        let hasher = self.hasher.clone();
        let password = password.to_string();
        tokio::task::spawn_blocking(move || hasher.hash(&password))
            .await
            .map_err(|e| StoreError::PasswordHash(e.to_string()))?
    }
}
