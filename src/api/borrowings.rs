//! Borrowing ledger endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    error::AppResult,
    models::borrowing::{Borrowing, BorrowingDetails},
};

use super::{AppJson, AuthenticatedUser};

/// Borrow request
#[derive(Deserialize, ToSchema)]
pub struct BorrowRequest {
    /// Book ID to borrow
    pub book_id: i32,
}

/// Borrow / return response with the loan record
#[derive(Serialize, ToSchema)]
pub struct BorrowingResponse {
    pub message: String,
    pub borrowing: Borrowing,
}

/// List the acting user's loans, most recent first
#[utoipa::path(
    get,
    path = "/borrowings/my-books",
    tag = "borrowings",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "The user's loans with book metadata", body = Vec<BorrowingDetails>),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn my_books(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<Vec<BorrowingDetails>>> {
    let loans = state
        .services
        .borrowings
        .list_for_user(claims.user_id)
        .await?;
    Ok(Json(loans))
}

/// List all loans across users (admin only)
#[utoipa::path(
    get,
    path = "/borrowings",
    tag = "borrowings",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "All loans with user and book metadata", body = Vec<BorrowingDetails>),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Admin privileges required")
    )
)]
pub async fn list_borrowings(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<Vec<BorrowingDetails>>> {
    claims.require_admin()?;

    let loans = state.services.borrowings.list_all().await?;
    Ok(Json(loans))
}

/// Borrow a book
#[utoipa::path(
    post,
    path = "/borrowings/borrow",
    tag = "borrowings",
    security(("bearer_auth" = [])),
    request_body = BorrowRequest,
    responses(
        (status = 201, description = "Loan created", body = BorrowingResponse),
        (status = 400, description = "Missing book ID"),
        (status = 404, description = "Book not found"),
        (status = 409, description = "Book unavailable or already borrowed by this user")
    )
)]
pub async fn borrow_book(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    AppJson(request): AppJson<BorrowRequest>,
) -> AppResult<(StatusCode, Json<BorrowingResponse>)> {
    let borrowing = state
        .services
        .borrowings
        .borrow(claims.user_id, request.book_id)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(BorrowingResponse {
            message: "Book borrowed successfully".to_string(),
            borrowing,
        }),
    ))
}

/// Return a borrowed book
#[utoipa::path(
    post,
    path = "/borrowings/return/{id}",
    tag = "borrowings",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Borrowing ID")
    ),
    responses(
        (status = 200, description = "Book returned", body = BorrowingResponse),
        (status = 404, description = "Borrowing not found or not owned by the caller"),
        (status = 409, description = "Book has already been returned")
    )
)]
pub async fn return_book(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(borrowing_id): Path<i32>,
) -> AppResult<Json<BorrowingResponse>> {
    let borrowing = state
        .services
        .borrowings
        .return_loan(borrowing_id, claims.user_id)
        .await?;

    Ok(Json(BorrowingResponse {
        message: "Book returned successfully".to_string(),
        borrowing,
    }))
}

/// Get one loan with book and user metadata (owner or admin)
#[utoipa::path(
    get,
    path = "/borrowings/{id}",
    tag = "borrowings",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Borrowing ID")
    ),
    responses(
        (status = 200, description = "Loan details", body = BorrowingDetails),
        (status = 403, description = "Not the owner and not an admin"),
        (status = 404, description = "Borrowing not found")
    )
)]
pub async fn get_borrowing(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(borrowing_id): Path<i32>,
) -> AppResult<Json<BorrowingDetails>> {
    let details = state
        .services
        .borrowings
        .get_by_id(borrowing_id, &claims)
        .await?;
    Ok(Json(details))
}
