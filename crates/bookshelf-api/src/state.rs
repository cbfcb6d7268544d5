//! Application state shared by every handler

use std::sync::Arc;

use bookshelf_core::Config;
use bookshelf_db::{BookStore, UserStore};
use bookshelf_services::{DescriptionPolisher, StagingArea, UploadCoordinator};

use crate::auth::JwtService;

pub struct AppState {
    pub config: Config,
    pub users: Arc<dyn UserStore>,
    pub books: Arc<dyn BookStore>,
    pub staging: StagingArea,
    pub uploads: UploadCoordinator,
    pub jwt: Arc<JwtService>,
    /// `None` when no text generation API key is configured
    pub polisher: Option<DescriptionPolisher>,
}
