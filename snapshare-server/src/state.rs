use std::sync::Arc;

use crate::auth::{PasswordHasher, TokenService};
use crate::config::Settings;
use crate::db::Database;
use crate::image_host::{CloudinaryImageHost, ImageHost};
use crate::service::{AccountService, PostService};

#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub tokens: TokenService,
    pub passwords: PasswordHasher,
    pub image_host: Arc<dyn ImageHost>,
    pub settings: Arc<Settings>,
}

impl AppState {
    pub fn new(db: Database, settings: Settings) -> Self {
        let image_host = Arc::new(CloudinaryImageHost::new(&settings.upload));
        Self::with_image_host(db, settings, image_host)
    }

    /// Build state around a specific image host (tests use a stub)
    pub fn with_image_host(db: Database, settings: Settings, image_host: Arc<dyn ImageHost>) -> Self {
        let tokens = TokenService::new(&settings.auth.secret, settings.auth.token_ttl_hours);
        let passwords = PasswordHasher::new(settings.auth.bcrypt_cost);
        Self {
            db,
            tokens,
            passwords,
            image_host,
            settings: Arc::new(settings),
        }
    }

    pub fn accounts(&self) -> AccountService {
        AccountService::new(self.db.pool.clone(), self.tokens.clone(), self.passwords.clone())
    }

    pub fn posts(&self) -> PostService {
        PostService::new(self.db.pool.clone())
    }
}
