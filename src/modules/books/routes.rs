//! HTTP handlers for the books module.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use bookshelf_http::error::AppError;

use super::models::{Book, NewBook};
use super::store::BookStore;

pub const CREATE_FAILED: &str = "Invalid request or database error";
pub const LIST_FAILED: &str = "Database error";

/// Routes bound to the given store. Paths are matched exactly.
pub fn router(store: Arc<dyn BookStore>) -> Router {
    Router::new()
        // The body is read to completion without a size cap.
        .route(
            "/add-book",
            post(add_book).layer(DefaultBodyLimit::disable()),
        )
        .route("/books", get(list_books))
        .with_state(store)
}

/// `POST /add-book`
async fn add_book(
    State(store): State<Arc<dyn BookStore>>,
    body: Bytes,
) -> Result<(StatusCode, Json<Book>), AppError> {
    let new_book = NewBook::from_json(&body)
        .map_err(|err| AppError::bad_request(CREATE_FAILED, err))?;

    let book = store
        .insert(new_book)
        .await
        .map_err(|err| AppError::bad_request(CREATE_FAILED, err))?;

    tracing::info!(book_id = book.id, "book created");
    Ok((StatusCode::CREATED, Json(book)))
}

/// `GET /books`
async fn list_books(
    State(store): State<Arc<dyn BookStore>>,
) -> Result<Json<Vec<Book>>, AppError> {
    let books = store
        .list()
        .await
        .map_err(|err| AppError::internal(LIST_FAILED, err))?;

    Ok(Json(books))
}
