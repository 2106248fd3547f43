//! Book (catalogue entry) model and related types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

/// Full book model from database
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Book {
    pub id: i32,
    pub title: String,
    pub author: String,
    pub isbn: Option<String>,
    pub genre: Option<String>,
    pub publication_year: Option<i32>,
    pub publisher: Option<String>,
    pub description: Option<String>,
    pub image_url: Option<String>,
    /// Derived flag owned by the borrowing ledger: false iff an active loan
    /// references this book.
    pub available: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Short book representation joined into loan listings
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BookSummary {
    pub id: i32,
    pub title: String,
    pub author: String,
    pub isbn: Option<String>,
    pub genre: Option<String>,
}

/// Book search query parameters
#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct BookQuery {
    /// Substring match over title, author and ISBN
    pub search: Option<String>,
    pub genre: Option<String>,
    pub available: Option<bool>,
}

/// Create book request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateBook {
    #[validate(length(min = 1, message = "Title is required"))]
    pub title: String,
    #[validate(length(min = 1, message = "Author is required"))]
    pub author: String,
    pub isbn: Option<String>,
    pub genre: Option<String>,
    pub publication_year: Option<i32>,
    pub publisher: Option<String>,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub available: Option<bool>,
}

/// Update book request (partial; absent fields keep their current value)
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateBook {
    pub title: Option<String>,
    pub author: Option<String>,
    pub isbn: Option<String>,
    pub genre: Option<String>,
    pub publication_year: Option<i32>,
    pub publisher: Option<String>,
    pub description: Option<String>,
    pub image_url: Option<String>,
    /// Rejected while a loan is active; the ledger owns this flag
    pub available: Option<bool>,
}
