//! Borrowing (loan) model and the loan status state machine.
//!
//! A borrowing starts in `borrowed` and finishes in exactly one of the
//! terminal states `returned` or `overdue`; the terminal state is computed
//! once, at return time, by comparing the return instant to the due date.
//! There is no background sweep: an outstanding loan past its due date still
//! reports `borrowed` until it is actually returned.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Decode, Encode, FromRow, Postgres};
use utoipa::ToSchema;

use super::book::BookSummary;
use super::user::UserSummary;

/// Loan period applied to every new borrowing.
pub const LOAN_PERIOD_DAYS: i64 = 14;

/// Lifecycle status of a borrowing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum LoanStatus {
    Borrowed,
    Returned,
    Overdue,
}

impl LoanStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LoanStatus::Borrowed => "borrowed",
            LoanStatus::Returned => "returned",
            LoanStatus::Overdue => "overdue",
        }
    }

    /// Terminal states reject any further transition.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, LoanStatus::Borrowed)
    }

    /// Classify a return: overdue iff the book comes back after its due date.
    pub fn classify(due_date: DateTime<Utc>, returned_date: DateTime<Utc>) -> LoanStatus {
        if returned_date > due_date {
            LoanStatus::Overdue
        } else {
            LoanStatus::Returned
        }
    }
}

impl std::fmt::Display for LoanStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for LoanStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "borrowed" => Ok(LoanStatus::Borrowed),
            "returned" => Ok(LoanStatus::Returned),
            "overdue" => Ok(LoanStatus::Overdue),
            _ => Err(format!("Invalid loan status: {}", s)),
        }
    }
}

// SQLx conversion for LoanStatus (stored as its string form)
impl sqlx::Type<Postgres> for LoanStatus {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<Postgres>>::type_info()
    }
}

impl<'r> Decode<'r, Postgres> for LoanStatus {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s: String = Decode::<Postgres>::decode(value)?;
        s.parse().map_err(|e: String| e.into())
    }
}

impl Encode<'_, Postgres> for LoanStatus {
    fn encode_by_ref(&self, buf: &mut sqlx::postgres::PgArgumentBuffer) -> sqlx::encode::IsNull {
        let s: String = self.as_str().to_string();
        <String as Encode<Postgres>>::encode(s, buf)
    }
}

/// Borrowing record from the database
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Borrowing {
    pub id: i32,
    pub user_id: i32,
    pub book_id: i32,
    pub borrowed_date: DateTime<Utc>,
    /// Fixed at creation: borrowed_date + 14 days
    pub due_date: DateTime<Utc>,
    pub returned_date: Option<DateTime<Utc>>,
    pub status: LoanStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Borrowing joined with book (and, for privileged views, user) metadata
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BorrowingDetails {
    pub id: i32,
    pub user_id: i32,
    pub borrowed_date: DateTime<Utc>,
    pub due_date: DateTime<Utc>,
    pub returned_date: Option<DateTime<Utc>>,
    pub status: LoanStatus,
    pub book: BookSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<UserSummary>,
}
