//! Book catalogue service

use crate::{
    error::AppResult,
    models::book::{Book, BookQuery, CreateBook, UpdateBook},
    repository::Repository,
};

#[derive(Clone)]
pub struct CatalogService {
    repository: Repository,
}

impl CatalogService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Search the catalogue
    pub async fn search(&self, query: &BookQuery) -> AppResult<Vec<Book>> {
        self.repository.books.search(query).await
    }

    /// Get book by ID
    pub async fn get_by_id(&self, id: i32) -> AppResult<Book> {
        self.repository.books.get_by_id(id).await
    }

    /// Add a book to the catalogue
    pub async fn create(&self, book: CreateBook) -> AppResult<Book> {
        self.repository.books.create(&book).await
    }

    /// Update a book
    pub async fn update(&self, id: i32, book: UpdateBook) -> AppResult<Book> {
        self.repository.books.update(id, &book).await
    }

    /// Remove a book from the catalogue
    pub async fn delete(&self, id: i32) -> AppResult<Book> {
        self.repository.books.delete(id).await
    }

    /// List distinct genres
    pub async fn list_genres(&self) -> AppResult<Vec<String>> {
        self.repository.books.list_genres().await
    }
}
