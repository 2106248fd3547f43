//! Business logic services

pub mod borrowings;
pub mod catalog;
pub mod users;

use sqlx::{Pool, Postgres};

use crate::{config::AuthConfig, repository::Repository};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub users: users::UsersService,
    pub catalog: catalog::CatalogService,
    pub borrowings: borrowings::BorrowingsService,
    repository: Repository,
}

impl Services {
    /// Create all services with the given repository
    pub fn new(repository: Repository, auth_config: AuthConfig) -> Self {
        Self {
            users: users::UsersService::new(repository.clone(), auth_config),
            catalog: catalog::CatalogService::new(repository.clone()),
            borrowings: borrowings::BorrowingsService::new(repository.clone()),
            repository,
        }
    }

    /// Underlying connection pool (readiness checks)
    pub fn pool(&self) -> &Pool<Postgres> {
        &self.repository.pool
    }
}
