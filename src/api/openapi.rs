//! OpenAPI documentation

use axum::Router;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{auth, books, borrowings, health};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Digital Library Catalogue API",
        version = "1.0.0",
        description = "Library catalogue backend: books, accounts and the borrowing ledger",
        license(name = "AGPL-3.0", url = "https://www.gnu.org/licenses/agpl-3.0.html")
    ),
    servers(
        (url = "/api/v1", description = "API v1")
    ),
    paths(
        // Health
        health::health_check,
        health::readiness_check,
        // Auth
        auth::register,
        auth::login,
        auth::verify,
        // Books
        books::list_books,
        books::get_book,
        books::create_book,
        books::update_book,
        books::delete_book,
        books::list_genres,
        // Borrowings
        borrowings::my_books,
        borrowings::list_borrowings,
        borrowings::borrow_book,
        borrowings::return_book,
        borrowings::get_borrowing,
    ),
    components(
        schemas(
            // Auth
            auth::AuthResponse,
            auth::VerifyResponse,
            crate::models::user::User,
            crate::models::user::UserSummary,
            crate::models::user::RegisterUser,
            crate::models::user::LoginUser,
            // Books
            crate::models::book::Book,
            crate::models::book::BookSummary,
            crate::models::book::BookQuery,
            crate::models::book::CreateBook,
            crate::models::book::UpdateBook,
            books::DeleteBookResponse,
            // Borrowings
            borrowings::BorrowRequest,
            borrowings::BorrowingResponse,
            crate::models::borrowing::Borrowing,
            crate::models::borrowing::BorrowingDetails,
            crate::models::borrowing::LoanStatus,
            // Health
            health::HealthResponse,
            // Errors
            crate::error::ErrorResponse,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "auth", description = "Authentication endpoints"),
        (name = "books", description = "Book catalogue management"),
        (name = "borrowings", description = "Borrowing ledger")
    )
)]
pub struct ApiDoc;

/// Create the OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
