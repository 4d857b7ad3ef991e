use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{
    error::RepositoryError,
    types::{Email, Link, LinkId, NewLink, UnsavedUser, User, UserId},
};

#[async_trait]
pub trait UserRepository: Send + Sync + 'static {
    /// Persist the user and return it with its newly assigned identifier.
    async fn create(&self, user: UnsavedUser) -> Result<User, RepositoryError>;

    async fn get_by_id(&self, id: &UserId) -> Result<User, RepositoryError>;

    async fn get_by_email(&self, email: &Email) -> Result<User, RepositoryError>;
}

#[async_trait]
pub trait LinkRepository: Send + Sync + 'static {
    async fn create(&self, link: NewLink) -> Result<Link, RepositoryError>;

    async fn get_by_id(&self, id: &LinkId) -> Result<Link, RepositoryError>;
}

/// Users kept in process memory, keyed by id. Email addresses are unique.
#[derive(Debug, Default)]
pub struct InMemoryUserRepository {
    storage: RwLock<HashMap<UserId, User>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn create(&self, user: UnsavedUser) -> Result<User, RepositoryError> {
        let mut storage = self.storage.write().await;

        if storage.values().any(|u| u.email == user.email) {
            return Err(RepositoryError::DuplicateEmail);
        }

        let id = UserId(Uuid::new_v4().to_string());
        let user = User::from_unsaved(id.clone(), user);
        storage.insert(id, user.clone());

        Ok(user)
    }

    async fn get_by_id(&self, id: &UserId) -> Result<User, RepositoryError> {
        self.storage
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or(RepositoryError::NotFound)
    }

    async fn get_by_email(&self, email: &Email) -> Result<User, RepositoryError> {
        self.storage
            .read()
            .await
            .values()
            .find(|u| &u.email == email)
            .cloned()
            .ok_or(RepositoryError::NotFound)
    }
}

#[derive(Debug, Default)]
pub struct InMemoryLinkRepository {
    storage: RwLock<HashMap<LinkId, Link>>,
}

impl InMemoryLinkRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LinkRepository for InMemoryLinkRepository {
    async fn create(&self, link: NewLink) -> Result<Link, RepositoryError> {
        let id = LinkId(Uuid::new_v4().to_string());
        let link = Link::from_new(id.clone(), link);
        self.storage.write().await.insert(id, link.clone());

        Ok(link)
    }

    async fn get_by_id(&self, id: &LinkId) -> Result<Link, RepositoryError> {
        self.storage
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or(RepositoryError::NotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{HashedPassword, Username};

    fn unsaved(email: &str) -> UnsavedUser {
        UnsavedUser {
            username: Username("alice01".into()),
            email: Email(email.into()),
            password: HashedPassword("$argon2id$stub".into()),
        }
    }

    #[tokio::test]
    async fn users_round_trip_by_id_and_email() {
        let repo = InMemoryUserRepository::new();
        let created = repo.create(unsaved("a@example.com")).await.unwrap();

        assert!(Uuid::parse_str(&created.id.0).is_ok());
        assert_eq!(repo.get_by_id(&created.id).await.unwrap(), created);
        assert_eq!(
            repo.get_by_email(&Email("a@example.com".into()))
                .await
                .unwrap(),
            created
        );
        assert!(matches!(
            repo.get_by_email(&Email("b@example.com".into())).await,
            Err(RepositoryError::NotFound)
        ));
    }

    #[tokio::test]
    async fn duplicate_email_is_refused() {
        let repo = InMemoryUserRepository::new();
        repo.create(unsaved("a@example.com")).await.unwrap();

        assert!(matches!(
            repo.create(unsaved("a@example.com")).await,
            Err(RepositoryError::DuplicateEmail)
        ));
    }

    #[tokio::test]
    async fn links_get_fresh_ids() {
        let repo = InMemoryLinkRepository::new();
        let new_link = NewLink {
            title: "Rust book".into(),
            href: "https://doc.rust-lang.org/book/".into(),
            user: UserId(Uuid::new_v4().to_string()),
        };

        let first = repo.create(new_link.clone()).await.unwrap();
        let second = repo.create(new_link).await.unwrap();

        assert_ne!(first.id, second.id);
        assert_eq!(repo.get_by_id(&first.id).await.unwrap(), first);
        assert!(matches!(
            repo.get_by_id(&LinkId("missing".into())).await,
            Err(RepositoryError::NotFound)
        ));
    }
}
