//! Books repository for database operations

use chrono::Utc;
use sqlx::{Pool, Postgres, QueryBuilder};

use crate::{
    error::{AppError, AppResult},
    models::book::{Book, BookQuery, CreateBook, UpdateBook},
};

#[derive(Clone)]
pub struct BooksRepository {
    pool: Pool<Postgres>,
}

impl BooksRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Search books with optional filters, newest first
    pub async fn search(&self, query: &BookQuery) -> AppResult<Vec<Book>> {
        let mut builder = QueryBuilder::<Postgres>::new("SELECT * FROM books WHERE 1=1");

        if let Some(ref search) = query.search {
            let pattern = format!("%{}%", search);
            builder
                .push(" AND (title ILIKE ")
                .push_bind(pattern.clone())
                .push(" OR author ILIKE ")
                .push_bind(pattern.clone())
                .push(" OR isbn ILIKE ")
                .push_bind(pattern)
                .push(")");
        }

        if let Some(ref genre) = query.genre {
            builder.push(" AND genre = ").push_bind(genre.clone());
        }

        if let Some(available) = query.available {
            builder.push(" AND available = ").push_bind(available);
        }

        builder.push(" ORDER BY created_at DESC");

        let books = builder
            .build_query_as::<Book>()
            .fetch_all(&self.pool)
            .await?;

        Ok(books)
    }

    /// Get book by ID
    pub async fn get_by_id(&self, id: i32) -> AppResult<Book> {
        sqlx::query_as::<_, Book>("SELECT * FROM books WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Book with id {} not found", id)))
    }

    /// Insert a new book
    pub async fn create(&self, book: &CreateBook) -> AppResult<Book> {
        let created = sqlx::query_as::<_, Book>(
            r#"
            INSERT INTO books (title, author, isbn, genre, publication_year, publisher, description, image_url, available)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING *
            "#,
        )
        .bind(&book.title)
        .bind(&book.author)
        .bind(&book.isbn)
        .bind(&book.genre)
        .bind(book.publication_year)
        .bind(&book.publisher)
        .bind(&book.description)
        .bind(&book.image_url)
        .bind(book.available.unwrap_or(true))
        .fetch_one(&self.pool)
        .await?;

        Ok(created)
    }

    /// Partially update a book; absent fields keep their current value.
    ///
    /// The availability flag is owned by the borrowing ledger: while an
    /// active loan references the book, a direct edit of `available` is
    /// rejected rather than silently breaking the ledger invariant.
    pub async fn update(&self, id: i32, book: &UpdateBook) -> AppResult<Book> {
        // Lock the book row so the guard and the write are atomic with
        // respect to concurrent borrow/return operations on the same book.
        let mut tx = self.pool.begin().await?;

        sqlx::query_scalar::<_, i32>("SELECT id FROM books WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Book with id {} not found", id)))?;

        if book.available.is_some() {
            let has_active_loan: bool = sqlx::query_scalar(
                "SELECT EXISTS(SELECT 1 FROM borrowings WHERE book_id = $1 AND status = 'borrowed')",
            )
            .bind(id)
            .fetch_one(&mut *tx)
            .await?;

            if has_active_loan {
                return Err(AppError::Conflict(
                    "Availability cannot be edited while the book is on loan".to_string(),
                ));
            }
        }

        let updated = sqlx::query_as::<_, Book>(
            r#"
            UPDATE books
            SET title = COALESCE($1, title),
                author = COALESCE($2, author),
                isbn = COALESCE($3, isbn),
                genre = COALESCE($4, genre),
                publication_year = COALESCE($5, publication_year),
                publisher = COALESCE($6, publisher),
                description = COALESCE($7, description),
                image_url = COALESCE($8, image_url),
                available = COALESCE($9, available),
                updated_at = $10
            WHERE id = $11
            RETURNING *
            "#,
        )
        .bind(&book.title)
        .bind(&book.author)
        .bind(&book.isbn)
        .bind(&book.genre)
        .bind(book.publication_year)
        .bind(&book.publisher)
        .bind(&book.description)
        .bind(&book.image_url)
        .bind(book.available)
        .bind(Utc::now())
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(updated)
    }

    /// Delete a book (loans cascade via the foreign key)
    pub async fn delete(&self, id: i32) -> AppResult<Book> {
        sqlx::query_as::<_, Book>("DELETE FROM books WHERE id = $1 RETURNING *")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Book with id {} not found", id)))
    }

    /// List distinct genres present in the catalogue
    pub async fn list_genres(&self) -> AppResult<Vec<String>> {
        let genres: Vec<String> = sqlx::query_scalar(
            "SELECT DISTINCT genre FROM books WHERE genre IS NOT NULL ORDER BY genre",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(genres)
    }
}
