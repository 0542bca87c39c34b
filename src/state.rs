use std::path::PathBuf;
use std::sync::Arc;

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;

use crate::config::Config;
use crate::db::{EventModel, PhotoModel, PostModel, SessionModel, UserModel, VenueModel};
use crate::social::SocialSource;
use crate::storage::BlobStore;

pub type DbPool = Pool<SqliteConnectionManager>;

#[derive(Clone)]
pub struct AppState {
    pub db: DbPool,
    pub config: Config,
    pub users: UserModel,
    pub sessions: SessionModel,
    pub posts: PostModel,
    pub photos: PhotoModel,
    pub events: EventModel,
    pub venues: VenueModel,
    pub blobs: Arc<dyn BlobStore>,
    pub social: Arc<dyn SocialSource>,
    pub uploads_dir: PathBuf,
}

impl AppState {
    pub fn new(
        db: DbPool,
        config: Config,
        blobs: Arc<dyn BlobStore>,
        social: Arc<dyn SocialSource>,
    ) -> Self {
        let uploads_dir = config.uploads_path();
        Self {
            users: UserModel::with_hash_cost(db.clone(), config.auth.bcrypt_cost),
            sessions: SessionModel::new(db.clone()),
            posts: PostModel::new(db.clone()),
            photos: PhotoModel::new(db.clone()),
            events: EventModel::new(db.clone()),
            venues: VenueModel::new(db.clone()),
            db,
            config,
            blobs,
            social,
            uploads_dir,
        }
    }
}
