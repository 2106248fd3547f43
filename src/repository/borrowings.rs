//! Borrowings repository: the borrow/return ledger.
//!
//! Borrow and Return each run their read-check-write sequence inside a single
//! transaction, taking a `FOR UPDATE` lock on the book row so concurrent
//! operations on the same book serialize. The book's `available` flag is
//! mutated only here, together with the loan row it reflects.

use chrono::{Duration, Utc};
use sqlx::{Pool, Postgres, Row};

use crate::{
    error::{AppError, AppResult},
    models::{
        book::BookSummary,
        borrowing::{Borrowing, BorrowingDetails, LoanStatus, LOAN_PERIOD_DAYS},
        user::UserSummary,
    },
};

#[derive(Clone)]
pub struct BorrowingsRepository {
    pool: Pool<Postgres>,
}

impl BorrowingsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Borrow a book: create an active loan and flip the book unavailable.
    ///
    /// Exactly one of two concurrent calls for the same book can succeed; the
    /// loser observes `available = false` under the row lock and gets a
    /// conflict.
    pub async fn borrow(&self, user_id: i32, book_id: i32) -> AppResult<Borrowing> {
        let mut tx = self.pool.begin().await?;

        let available: bool =
            sqlx::query_scalar("SELECT available FROM books WHERE id = $1 FOR UPDATE")
                .bind(book_id)
                .fetch_optional(&mut *tx)
                .await?
                .ok_or_else(|| AppError::NotFound(format!("Book with id {} not found", book_id)))?;

        if !available {
            return Err(AppError::Conflict("Book is not available".to_string()));
        }

        let duplicate: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM borrowings WHERE user_id = $1 AND book_id = $2 AND status = $3)",
        )
        .bind(user_id)
        .bind(book_id)
        .bind(LoanStatus::Borrowed)
        .fetch_one(&mut *tx)
        .await?;

        if duplicate {
            return Err(AppError::Conflict(
                "You have already borrowed this book".to_string(),
            ));
        }

        let now = Utc::now();
        let due_date = now + Duration::days(LOAN_PERIOD_DAYS);

        let borrowing = sqlx::query_as::<_, Borrowing>(
            r#"
            INSERT INTO borrowings (user_id, book_id, borrowed_date, due_date, status)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(book_id)
        .bind(now)
        .bind(due_date)
        .bind(LoanStatus::Borrowed)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query("UPDATE books SET available = false, updated_at = $2 WHERE id = $1")
            .bind(book_id)
            .bind(now)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(borrowing)
    }

    /// Return a loan owned by the acting user.
    ///
    /// The terminal status is computed here, once, from the due date: a loan
    /// coming back after its due date finishes as `overdue`, otherwise as
    /// `returned`. Terminal loans reject a second return.
    pub async fn return_loan(&self, borrowing_id: i32, user_id: i32) -> AppResult<Borrowing> {
        let mut tx = self.pool.begin().await?;

        let borrowing = sqlx::query_as::<_, Borrowing>(
            "SELECT * FROM borrowings WHERE id = $1 AND user_id = $2 FOR UPDATE",
        )
        .bind(borrowing_id)
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Borrowing record not found".to_string()))?;

        if borrowing.status.is_terminal() {
            return Err(AppError::Conflict(
                "Book has already been returned".to_string(),
            ));
        }

        let now = Utc::now();
        let status = LoanStatus::classify(borrowing.due_date, now);

        let updated = sqlx::query_as::<_, Borrowing>(
            r#"
            UPDATE borrowings
            SET returned_date = $1, status = $2, updated_at = $1
            WHERE id = $3
            RETURNING *
            "#,
        )
        .bind(now)
        .bind(status)
        .bind(borrowing_id)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query("UPDATE books SET available = true, updated_at = $2 WHERE id = $1")
            .bind(borrowing.book_id)
            .bind(now)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(updated)
    }

    /// All loans for a user joined with book metadata, most recent first
    pub async fn list_for_user(&self, user_id: i32) -> AppResult<Vec<BorrowingDetails>> {
        let rows = sqlx::query(
            r#"
            SELECT b.id, b.user_id, b.borrowed_date, b.due_date, b.returned_date, b.status,
                   bk.id AS book_id, bk.title, bk.author, bk.isbn, bk.genre
            FROM borrowings b
            JOIN books bk ON b.book_id = bk.id
            WHERE b.user_id = $1
            ORDER BY b.borrowed_date DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        let mut result = Vec::with_capacity(rows.len());
        for row in rows {
            result.push(BorrowingDetails {
                id: row.get("id"),
                user_id: row.get("user_id"),
                borrowed_date: row.get("borrowed_date"),
                due_date: row.get("due_date"),
                returned_date: row.get("returned_date"),
                status: row.get("status"),
                book: BookSummary {
                    id: row.get("book_id"),
                    title: row.get("title"),
                    author: row.get("author"),
                    isbn: row.get("isbn"),
                    genre: row.get("genre"),
                },
                user: None,
            });
        }

        Ok(result)
    }

    /// All loans joined with user and book metadata, most recent first
    pub async fn list_all(&self) -> AppResult<Vec<BorrowingDetails>> {
        let rows = sqlx::query(
            r#"
            SELECT b.id, b.user_id, b.borrowed_date, b.due_date, b.returned_date, b.status,
                   bk.id AS book_id, bk.title, bk.author, bk.isbn, bk.genre,
                   u.username, u.first_name, u.last_name, u.student_id
            FROM borrowings b
            JOIN users u ON b.user_id = u.id
            JOIN books bk ON b.book_id = bk.id
            ORDER BY b.borrowed_date DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let mut result = Vec::with_capacity(rows.len());
        for row in rows {
            result.push(BorrowingDetails {
                id: row.get("id"),
                user_id: row.get("user_id"),
                borrowed_date: row.get("borrowed_date"),
                due_date: row.get("due_date"),
                returned_date: row.get("returned_date"),
                status: row.get("status"),
                book: BookSummary {
                    id: row.get("book_id"),
                    title: row.get("title"),
                    author: row.get("author"),
                    isbn: row.get("isbn"),
                    genre: row.get("genre"),
                },
                user: Some(UserSummary {
                    id: row.get("user_id"),
                    username: row.get("username"),
                    first_name: row.get("first_name"),
                    last_name: row.get("last_name"),
                    student_id: row.get("student_id"),
                }),
            });
        }

        Ok(result)
    }

    /// One loan with joined book and user metadata
    pub async fn get_by_id(&self, borrowing_id: i32) -> AppResult<BorrowingDetails> {
        let row = sqlx::query(
            r#"
            SELECT b.id, b.user_id, b.borrowed_date, b.due_date, b.returned_date, b.status,
                   bk.id AS book_id, bk.title, bk.author, bk.isbn, bk.genre,
                   u.username, u.first_name, u.last_name, u.student_id
            FROM borrowings b
            JOIN books bk ON b.book_id = bk.id
            JOIN users u ON b.user_id = u.id
            WHERE b.id = $1
            "#,
        )
        .bind(borrowing_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound("Borrowing record not found".to_string()))?;

        Ok(BorrowingDetails {
            id: row.get("id"),
            user_id: row.get("user_id"),
            borrowed_date: row.get("borrowed_date"),
            due_date: row.get("due_date"),
            returned_date: row.get("returned_date"),
            status: row.get("status"),
            book: BookSummary {
                id: row.get("book_id"),
                title: row.get("title"),
                author: row.get("author"),
                isbn: row.get("isbn"),
                genre: row.get("genre"),
            },
            user: Some(UserSummary {
                id: row.get("user_id"),
                username: row.get("username"),
                first_name: row.get("first_name"),
                last_name: row.get("last_name"),
                student_id: row.get("student_id"),
            }),
        })
    }
}
