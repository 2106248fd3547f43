//! Book catalogue endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    error::AppResult,
    models::book::{Book, BookQuery, CreateBook, UpdateBook},
};

use super::{AppJson, AuthenticatedUser};

/// Delete confirmation with the removed record
#[derive(Serialize, ToSchema)]
pub struct DeleteBookResponse {
    pub message: String,
    pub book: Book,
}

/// List books with optional search filters
#[utoipa::path(
    get,
    path = "/books",
    tag = "books",
    params(BookQuery),
    responses(
        (status = 200, description = "List of books", body = Vec<Book>)
    )
)]
pub async fn list_books(
    State(state): State<crate::AppState>,
    Query(query): Query<BookQuery>,
) -> AppResult<Json<Vec<Book>>> {
    let books = state.services.catalog.search(&query).await?;
    Ok(Json(books))
}

/// Get book details by ID
#[utoipa::path(
    get,
    path = "/books/{id}",
    tag = "books",
    params(
        ("id" = i32, Path, description = "Book ID")
    ),
    responses(
        (status = 200, description = "Book details", body = Book),
        (status = 404, description = "Book not found")
    )
)]
pub async fn get_book(
    State(state): State<crate::AppState>,
    Path(id): Path<i32>,
) -> AppResult<Json<Book>> {
    let book = state.services.catalog.get_by_id(id).await?;
    Ok(Json(book))
}

/// Add a new book to the catalogue (admin only)
#[utoipa::path(
    post,
    path = "/books",
    tag = "books",
    security(("bearer_auth" = [])),
    request_body = CreateBook,
    responses(
        (status = 201, description = "Book created", body = Book),
        (status = 400, description = "Title or author missing"),
        (status = 403, description = "Admin privileges required"),
        (status = 409, description = "ISBN already exists")
    )
)]
pub async fn create_book(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    AppJson(book): AppJson<CreateBook>,
) -> AppResult<(StatusCode, Json<Book>)> {
    claims.require_admin()?;
    book.validate()?;

    let created = state.services.catalog.create(book).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// Update an existing book (admin only)
#[utoipa::path(
    put,
    path = "/books/{id}",
    tag = "books",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Book ID")
    ),
    request_body = UpdateBook,
    responses(
        (status = 200, description = "Book updated", body = Book),
        (status = 403, description = "Admin privileges required"),
        (status = 404, description = "Book not found"),
        (status = 409, description = "ISBN already exists or book is on loan")
    )
)]
pub async fn update_book(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
    AppJson(book): AppJson<UpdateBook>,
) -> AppResult<Json<Book>> {
    claims.require_admin()?;

    let updated = state.services.catalog.update(id, book).await?;
    Ok(Json(updated))
}

/// Delete a book (admin only)
#[utoipa::path(
    delete,
    path = "/books/{id}",
    tag = "books",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Book ID")
    ),
    responses(
        (status = 200, description = "Book deleted", body = DeleteBookResponse),
        (status = 403, description = "Admin privileges required"),
        (status = 404, description = "Book not found")
    )
)]
pub async fn delete_book(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<DeleteBookResponse>> {
    claims.require_admin()?;

    let book = state.services.catalog.delete(id).await?;
    Ok(Json(DeleteBookResponse {
        message: "Book deleted successfully".to_string(),
        book,
    }))
}

/// List distinct genres in the catalogue
#[utoipa::path(
    get,
    path = "/books/meta/genres",
    tag = "books",
    responses(
        (status = 200, description = "List of genres", body = Vec<String>)
    )
)]
pub async fn list_genres(
    State(state): State<crate::AppState>,
) -> AppResult<Json<Vec<String>>> {
    let genres = state.services.catalog.list_genres().await?;
    Ok(Json(genres))
}
