//! Persistence for books.
//!
//! Handlers only see [`BookStore`]; the PostgreSQL store is used in production
//! and the in-memory store stands in for it in tests.

use std::sync::Mutex;

use async_trait::async_trait;
use sqlx::PgPool;
use thiserror::Error;

use super::models::{Book, NewBook};

/// Errors raised by a [`BookStore`].
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("null value in column \"{column}\" of relation \"books\" violates not-null constraint")]
    Constraint { column: &'static str },

    #[error("invalid input syntax for type integer: \"{value}\"")]
    InvalidInteger { value: String },

    #[error("book store state is poisoned")]
    Poisoned,
}

/// Access to the `books` table. Each call is a single independent statement.
#[async_trait]
pub trait BookStore: Send + Sync {
    /// Insert a row and return it as persisted, including the assigned id.
    async fn insert(&self, book: NewBook) -> Result<Book, StoreError>;

    /// Every row, ordered by ascending id.
    async fn list(&self) -> Result<Vec<Book>, StoreError>;
}

/// PostgreSQL-backed store sharing one connection pool across requests.
#[derive(Clone)]
pub struct PgBookStore {
    pool: PgPool,
}

impl PgBookStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BookStore for PgBookStore {
    async fn insert(&self, book: NewBook) -> Result<Book, StoreError> {
        let row = sqlx::query_as::<_, Book>(
            r#"
            INSERT INTO books (title, author, published_year)
            VALUES ($1, $2, $3::text::int)
            RETURNING id, title, author, published_year
            "#,
        )
        .bind(book.title)
        .bind(book.author)
        .bind(book.published_year)
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }

    async fn list(&self) -> Result<Vec<Book>, StoreError> {
        let rows = sqlx::query_as::<_, Book>(
            "SELECT id, title, author, published_year FROM books ORDER BY id ASC",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }
}

#[derive(Debug, Default)]
struct MemoryState {
    last_id: i32,
    rows: Vec<Book>,
}

/// In-process store with the same constraints as the `books` table.
///
/// Like a `SERIAL` sequence, a rejected insert still consumes an id.
#[derive(Debug, Default)]
pub struct MemoryBookStore {
    state: Mutex<MemoryState>,
}

impl MemoryBookStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BookStore for MemoryBookStore {
    async fn insert(&self, book: NewBook) -> Result<Book, StoreError> {
        let mut state = self.state.lock().map_err(|_| StoreError::Poisoned)?;
        state.last_id += 1;
        let id = state.last_id;

        let title = book.title.ok_or(StoreError::Constraint { column: "title" })?;
        let author = book.author.ok_or(StoreError::Constraint { column: "author" })?;

        let published_year = book
            .published_year
            .map(|text| parse_integer(&text))
            .transpose()?;

        let row = Book {
            id,
            title,
            author,
            published_year,
        };
        state.rows.push(row.clone());

        Ok(row)
    }

    async fn list(&self) -> Result<Vec<Book>, StoreError> {
        let state = self.state.lock().map_err(|_| StoreError::Poisoned)?;
        let mut rows = state.rows.clone();
        rows.sort_by_key(|book| book.id);
        Ok(rows)
    }
}

/// Text to `INT` the way PostgreSQL's input function reads it.
fn parse_integer(text: &str) -> Result<i32, StoreError> {
    text.trim()
        .parse::<i32>()
        .map_err(|_| StoreError::InvalidInteger {
            value: text.to_string(),
        })
}
