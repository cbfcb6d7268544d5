pub const API_PREFIX: &str = "/api";

/// Text parts accepted alongside book uploads
pub const BOOK_TEXT_FIELDS: &[&str] = &["title", "genre", "description"];
