//! Route groups behind authentication (users, books, text).

use crate::constants::API_PREFIX;
use crate::handlers;
use crate::state::AppState;
use axum::routing::{get, patch, post, put};
use axum::Router;
use std::sync::Arc;

pub fn user_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            &format!("{}/users", API_PREFIX),
            get(handlers::users::get_current_user).patch(handlers::users::update_current_user),
        )
        .route(
            &format!("{}/users/profile-photo", API_PREFIX),
            put(handlers::users::update_profile_photo),
        )
}

pub fn book_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            &format!("{}/books", API_PREFIX),
            post(handlers::books::create_book).get(handlers::books::list_books),
        )
        .route(
            &format!("{}/books/{{book_id}}", API_PREFIX),
            patch(handlers::books::update_book).delete(handlers::books::delete_book),
        )
}

pub fn text_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            &format!("{}/books/fix-grammar", API_PREFIX),
            post(handlers::text::fix_grammar),
        )
        .route(
            &format!("{}/books/improve-description", API_PREFIX),
            post(handlers::text::improve_description),
        )
}
