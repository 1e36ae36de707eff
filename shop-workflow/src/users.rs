//! Customer workflow.
//!
//! Thin pass-through over the user repository.

use crate::error::{OrderError, OrderResult};
use futures_util::FutureExt;
use shop_domain::{NewUser, User, UserId, UserUpdate};
use shop_store::UnitOfWork;
use std::sync::Arc;
use tracing::info;

/// Creates, reads, updates and deletes users.
pub struct UserService<U: UnitOfWork> {
    uow: Arc<U>,
}

impl<U: UnitOfWork> Clone for UserService<U> {
    fn clone(&self) -> Self {
        Self { uow: self.uow.clone() }
    }
}

fn validate(username: Option<&str>, email: Option<&str>) -> OrderResult<()> {
    if username.is_some_and(|u| u.trim().is_empty()) {
        return Err(OrderError::InvalidInput("Username must not be empty".to_string()));
    }
    if email.is_some_and(|e| !e.contains('@')) {
        return Err(OrderError::InvalidInput("Email must contain '@'".to_string()));
    }
    Ok(())
}

impl<U: UnitOfWork> UserService<U> {
    /// Create a new user service over `uow`.
    pub fn new(uow: Arc<U>) -> Self {
        Self { uow }
    }

    /// Register a user.
    pub async fn create(&self, params: NewUser) -> OrderResult<User> {
        validate(Some(&params.username), Some(&params.email))?;
        let user = User::new(params);

        let user = self
            .uow
            .execute(move |tx| {
                async move { tx.users().create(&user).await.map_err(OrderError::from) }.boxed()
            })
            .await?;

        info!(user_id = %user.id, "User created");
        Ok(user)
    }

    /// Get a user by ID.
    pub async fn get(&self, id: UserId) -> OrderResult<User> {
        self.uow
            .execute(move |tx| {
                async move { tx.users().find_by_id(id).await?.ok_or(OrderError::UserNotFound(id)) }
                    .boxed()
            })
            .await
    }

    /// List live users, oldest first.
    pub async fn list(&self) -> OrderResult<Vec<User>> {
        self.uow
            .execute(|tx| async move { tx.users().list().await.map_err(OrderError::from) }.boxed())
            .await
    }

    /// Apply a partial update to a user.
    pub async fn update(&self, id: UserId, update: UserUpdate) -> OrderResult<User> {
        validate(update.username.as_deref(), update.email.as_deref())?;

        self.uow
            .execute(move |tx| {
                async move {
                    let mut user =
                        tx.users().find_by_id(id).await?.ok_or(OrderError::UserNotFound(id))?;
                    user.apply(update);
                    tx.users()
                        .update(&user)
                        .await
                        .map_err(|e| OrderError::or_not_found(e, OrderError::UserNotFound(id)))
                }
                .boxed()
            })
            .await
    }

    /// Soft-delete a user. Orders placed by the user are kept.
    pub async fn delete(&self, id: UserId) -> OrderResult<()> {
        self.uow
            .execute(move |tx| {
                async move {
                    tx.users()
                        .delete(id)
                        .await
                        .map_err(|e| OrderError::or_not_found(e, OrderError::UserNotFound(id)))
                }
                .boxed()
            })
            .await?;

        info!(user_id = %id, "User deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shop_store::MemoryStore;

    fn service() -> UserService<MemoryStore> {
        UserService::new(Arc::new(MemoryStore::new()))
    }

    fn ada() -> NewUser {
        NewUser {
            username: "ada".to_string(),
            email: "ada@example.com".to_string(),
        }
    }

    #[tokio::test]
    async fn test_create_get_list() {
        let service = service();

        let created = service.create(ada()).await.unwrap();

        assert_eq!(service.get(created.id).await.unwrap(), created);
        assert_eq!(service.list().await.unwrap(), vec![created]);
    }

    #[tokio::test]
    async fn test_create_rejects_bad_email() {
        let service = service();
        let mut params = ada();
        params.email = "nobody".to_string();

        let err = service.create(params).await.unwrap_err();
        assert!(err.is_client_error());
    }

    #[tokio::test]
    async fn test_update_email() {
        let service = service();
        let created = service.create(ada()).await.unwrap();

        let updated = service
            .update(
                created.id,
                UserUpdate {
                    email: Some("ada@example.org".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.username, "ada");
        assert_eq!(updated.email, "ada@example.org");
    }

    #[tokio::test]
    async fn test_delete_user() {
        let service = service();
        let created = service.create(ada()).await.unwrap();

        service.delete(created.id).await.unwrap();

        assert!(matches!(service.get(created.id).await, Err(OrderError::UserNotFound(_))));
        assert!(matches!(
            service.update(created.id, UserUpdate::default()).await,
            Err(OrderError::UserNotFound(_))
        ));
    }
}
