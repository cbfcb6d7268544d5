//! OpenAPI documentation served at `/api/openapi.json` and rendered at `/docs`.

use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::error;
use crate::handlers;
use bookshelf_core::models;

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

pub fn get_openapi_spec() -> utoipa::openapi::OpenApi {
    ApiDoc::openapi()
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Bookshelf API",
        version = "0.1.0",
        description = "Book catalog: user accounts, book files and cover images stored in a remote object store, and description polishing."
    ),
    paths(
        // Users
        handlers::users::register,
        handlers::users::login,
        handlers::users::get_current_user,
        handlers::users::update_current_user,
        handlers::users::update_profile_photo,
        // Books
        handlers::books::create_book,
        handlers::books::update_book,
        handlers::books::list_books,
        handlers::books::get_book,
        handlers::books::delete_book,
        // Text
        handlers::text::fix_grammar,
        handlers::text::improve_description,
        handlers::health::health_check,
    ),
    components(
        schemas(
            models::UserResponse,
            models::UserProfileUpdate,
            models::BookResponse,
            models::AuthorSummary,
            models::CreatedBookResponse,
            handlers::users::RegisterRequest,
            handlers::users::LoginRequest,
            handlers::users::AccessTokenResponse,
            handlers::text::FixGrammarRequest,
            handlers::text::FixGrammarResponse,
            handlers::text::ImproveDescriptionRequest,
            handlers::text::ImproveDescriptionResponse,
            handlers::health::HealthResponse,
            error::ErrorResponse,
        )
    ),
    modifiers(&BearerAuth),
    tags(
        (name = "users", description = "Registration, login and profile management"),
        (name = "books", description = "Book records with their cover image and book file"),
        (name = "text", description = "Grammar fixes and description improvements"),
        (name = "health", description = "Liveness")
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_lists_book_routes() {
        let doc = get_openapi_spec();
        assert!(doc.paths.paths.contains_key("/api/books/{book_id}"));
        assert!(doc.paths.paths.contains_key("/api/users/profile-photo"));
        let components = doc.components.unwrap();
        assert!(components.security_schemes.contains_key("bearer_auth"));
    }
}
