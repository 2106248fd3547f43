//! Data models for the catalogue server

pub mod book;
pub mod borrowing;
pub mod user;

// Re-export commonly used types
pub use book::{Book, BookSummary};
pub use borrowing::{Borrowing, BorrowingDetails, LoanStatus};
pub use user::{User, UserSummary};
