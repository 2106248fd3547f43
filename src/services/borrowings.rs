//! Borrowing ledger service

use crate::{
    error::{AppError, AppResult},
    models::{
        borrowing::{Borrowing, BorrowingDetails},
        user::UserClaims,
    },
    repository::Repository,
};

#[derive(Clone)]
pub struct BorrowingsService {
    repository: Repository,
}

impl BorrowingsService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Borrow a book for the acting user
    pub async fn borrow(&self, user_id: i32, book_id: i32) -> AppResult<Borrowing> {
        self.repository.borrowings.borrow(user_id, book_id).await
    }

    /// Return a loan owned by the acting user
    pub async fn return_loan(&self, borrowing_id: i32, user_id: i32) -> AppResult<Borrowing> {
        self.repository
            .borrowings
            .return_loan(borrowing_id, user_id)
            .await
    }

    /// All loans of the acting user, most recent first
    pub async fn list_for_user(&self, user_id: i32) -> AppResult<Vec<BorrowingDetails>> {
        self.repository.borrowings.list_for_user(user_id).await
    }

    /// All loans across users (admin only)
    pub async fn list_all(&self) -> AppResult<Vec<BorrowingDetails>> {
        self.repository.borrowings.list_all().await
    }

    /// One loan with joined metadata; owner or admin only
    pub async fn get_by_id(
        &self,
        borrowing_id: i32,
        claims: &UserClaims,
    ) -> AppResult<BorrowingDetails> {
        let details = self.repository.borrowings.get_by_id(borrowing_id).await?;

        if !claims.is_admin && details.user_id != claims.user_id {
            return Err(AppError::Authorization("Access denied".to_string()));
        }

        Ok(details)
    }
}
