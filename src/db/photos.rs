use rusqlite::{params, Connection, OptionalExtension};

use crate::db::error::{constraint_violation, require, Constraint};
use crate::db::models::{CreatePhotoData, Photo, UpdatePhotoData};
use crate::db::{like_pattern, now, Changes, DbError, DbResult};
use crate::state::DbPool;

#[derive(Clone)]
pub struct PhotoModel {
    pool: DbPool,
}

impl PhotoModel {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Persist metadata for a blob that has already been stored.
    pub fn create_photo(&self, data: CreatePhotoData) -> DbResult<Photo> {
        require("blob_url", &data.blob_url)?;

        let conn = self.pool.get()?;
        let now = now();
        conn.execute(
            "INSERT INTO photos (user_id, event_id, blob_url, caption, alt_text, genre,
                                 is_public, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?8)",
            params![
                data.user_id,
                data.event_id,
                data.blob_url,
                data.caption,
                data.alt_text,
                data.genre,
                data.is_public.unwrap_or(true),
                now
            ],
        )
        .map_err(|e| match constraint_violation(&e) {
            Some(Constraint::ForeignKey) => {
                DbError::InvalidReference("referenced user or event does not exist".into())
            }
            _ => e.into(),
        })?;

        let id = conn.last_insert_rowid();
        tracing::debug!(photo_id = id, user_id = data.user_id, "Stored photo");
        fetch(&conn, id)?.ok_or(DbError::Sql(rusqlite::Error::QueryReturnedNoRows))
    }

    pub fn get_photo_by_id(&self, id: i64) -> DbResult<Option<Photo>> {
        let conn = self.pool.get()?;
        Ok(fetch(&conn, id)?)
    }

    pub fn get_all_photos(&self, limit: i64, offset: i64) -> DbResult<Vec<Photo>> {
        self.list(
            "SELECT * FROM photos WHERE is_public = 1
             ORDER BY created_at DESC, id DESC LIMIT ?1 OFFSET ?2",
            params![limit, offset],
        )
    }

    /// All photos of one owner, private ones included.
    pub fn get_photos_by_user(&self, user_id: i64, limit: i64, offset: i64) -> DbResult<Vec<Photo>> {
        self.list(
            "SELECT * FROM photos WHERE user_id = ?1
             ORDER BY created_at DESC, id DESC LIMIT ?2 OFFSET ?3",
            params![user_id, limit, offset],
        )
    }

    pub fn get_photos_by_event(&self, event_id: i64, limit: i64, offset: i64) -> DbResult<Vec<Photo>> {
        self.list(
            "SELECT * FROM photos WHERE event_id = ?1 AND is_public = 1
             ORDER BY created_at DESC, id DESC LIMIT ?2 OFFSET ?3",
            params![event_id, limit, offset],
        )
    }

    pub fn get_photos_by_genre(&self, genre: &str, limit: i64, offset: i64) -> DbResult<Vec<Photo>> {
        self.list(
            "SELECT * FROM photos WHERE genre = ?1 AND is_public = 1
             ORDER BY created_at DESC, id DESC LIMIT ?2 OFFSET ?3",
            params![genre, limit, offset],
        )
    }

    /// Substring match over caption, alt text and genre.
    pub fn search_photos(&self, query: &str, limit: i64, offset: i64) -> DbResult<Vec<Photo>> {
        self.list(
            "SELECT * FROM photos
             WHERE (caption LIKE ?1 ESCAPE '\\'
                    OR alt_text LIKE ?1 ESCAPE '\\'
                    OR genre LIKE ?1 ESCAPE '\\')
               AND is_public = 1
             ORDER BY created_at DESC, id DESC LIMIT ?2 OFFSET ?3",
            params![like_pattern(query), limit, offset],
        )
    }

    /// Number of public photos.
    pub fn get_photo_count(&self) -> DbResult<i64> {
        let conn = self.pool.get()?;
        Ok(conn.query_row("SELECT COUNT(*) FROM photos WHERE is_public = 1", [], |row| {
            row.get(0)
        })?)
    }

    pub fn update_photo(&self, id: i64, data: UpdatePhotoData) -> DbResult<Option<Photo>> {
        let mut changes = Changes::default();
        changes
            .set("caption", data.caption)
            .set("alt_text", data.alt_text)
            .set("genre", data.genre)
            .set("is_public", data.is_public);

        let conn = self.pool.get()?;
        if changes.is_empty() {
            return Ok(fetch(&conn, id)?);
        }
        if changes.apply(&conn, "photos", id)? == 0 {
            return Ok(None);
        }
        Ok(fetch(&conn, id)?)
    }

    pub fn delete_photo(&self, id: i64) -> DbResult<bool> {
        let conn = self.pool.get()?;
        let rows = conn.execute("DELETE FROM photos WHERE id = ?1", params![id])?;
        Ok(rows > 0)
    }

    fn list(&self, sql: &str, params: impl rusqlite::Params) -> DbResult<Vec<Photo>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(sql)?;
        let photos = stmt
            .query_map(params, Photo::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(photos)
    }
}

fn fetch(conn: &Connection, id: i64) -> rusqlite::Result<Option<Photo>> {
    conn.query_row("SELECT * FROM photos WHERE id = ?1", params![id], Photo::from_row)
        .optional()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::{CreateEventData, CreateUserData, CreateVenueData};
    use crate::db::{test_support, EventModel, UserModel, VenueModel};

    fn user(pool: &DbPool, name: &str) -> i64 {
        UserModel::with_hash_cost(pool.clone(), test_support::TEST_HASH_COST)
            .create_user(CreateUserData {
                username: name.into(),
                email: format!("{}@example.com", name),
                password: "pw".into(),
                ..Default::default()
            })
            .unwrap()
            .id
    }

    fn event(pool: &DbPool) -> i64 {
        let venue = VenueModel::new(pool.clone())
            .create_venue(CreateVenueData {
                name: "The Blue Note".into(),
                ..Default::default()
            })
            .unwrap();
        EventModel::new(pool.clone())
            .create_event(CreateEventData {
                venue_id: venue.id,
                title: "Late Set".into(),
                date: "2025-03-01".into(),
                image_url: None,
            })
            .unwrap()
            .id
    }

    fn photo(photos: &PhotoModel, user_id: i64, caption: &str, genre: &str) -> Photo {
        photos
            .create_photo(CreatePhotoData {
                user_id,
                blob_url: format!("/uploads/{}.jpg", caption.replace(' ', "-")),
                caption: Some(caption.into()),
                genre: Some(genre.into()),
                ..Default::default()
            })
            .unwrap()
    }

    #[test]
    fn create_photo_defaults_to_public() {
        let (_tmp, pool) = test_support::pool();
        let photos = PhotoModel::new(pool.clone());
        let uid = user(&pool, "alice");

        let created = photo(&photos, uid, "drum solo", "jazz");
        assert!(created.is_public);
        assert_eq!(created.user_id, uid);
        assert_eq!(created.event_id, None);
        assert_eq!(photos.get_photo_by_id(created.id).unwrap().unwrap().blob_url, created.blob_url);
    }

    #[test]
    fn blob_url_is_mandatory() {
        let (_tmp, pool) = test_support::pool();
        let photos = PhotoModel::new(pool.clone());
        let uid = user(&pool, "alice");

        let result = photos.create_photo(CreatePhotoData {
            user_id: uid,
            blob_url: "".into(),
            ..Default::default()
        });
        assert!(matches!(result, Err(DbError::Validation(_))));
        assert_eq!(photos.get_photo_count().unwrap(), 0);
    }

    #[test]
    fn unknown_event_is_an_invalid_reference() {
        let (_tmp, pool) = test_support::pool();
        let photos = PhotoModel::new(pool.clone());
        let uid = user(&pool, "alice");

        let result = photos.create_photo(CreatePhotoData {
            user_id: uid,
            event_id: Some(31337),
            blob_url: "/uploads/x.jpg".into(),
            ..Default::default()
        });
        assert!(matches!(result, Err(DbError::InvalidReference(_))));
    }

    #[test]
    fn listings_respect_visibility() {
        let (_tmp, pool) = test_support::pool();
        let photos = PhotoModel::new(pool.clone());
        let uid = user(&pool, "alice");
        let eid = event(&pool);

        photos
            .create_photo(CreatePhotoData {
                user_id: uid,
                event_id: Some(eid),
                blob_url: "/uploads/private.jpg".into(),
                genre: Some("jazz".into()),
                is_public: Some(false),
                ..Default::default()
            })
            .unwrap();
        photos
            .create_photo(CreatePhotoData {
                user_id: uid,
                event_id: Some(eid),
                blob_url: "/uploads/public.jpg".into(),
                genre: Some("jazz".into()),
                ..Default::default()
            })
            .unwrap();

        assert_eq!(photos.get_all_photos(50, 0).unwrap().len(), 1);
        assert_eq!(photos.get_photos_by_event(eid, 50, 0).unwrap().len(), 1);
        assert_eq!(photos.get_photos_by_genre("jazz", 50, 0).unwrap().len(), 1);
        assert_eq!(photos.get_photos_by_user(uid, 50, 0).unwrap().len(), 2);
        assert_eq!(photos.get_photo_count().unwrap(), 1);
    }

    #[test]
    fn search_matches_caption_alt_text_and_genre() {
        let (_tmp, pool) = test_support::pool();
        let photos = PhotoModel::new(pool.clone());
        let uid = user(&pool, "alice");

        photo(&photos, uid, "Saxophone closeup", "jazz");
        photo(&photos, uid, "crowd surfing", "Punk");
        photos
            .create_photo(CreatePhotoData {
                user_id: uid,
                blob_url: "/uploads/alt.jpg".into(),
                alt_text: Some("A saxophone on a stand".into()),
                ..Default::default()
            })
            .unwrap();

        assert_eq!(photos.search_photos("saxophone", 50, 0).unwrap().len(), 2);
        assert_eq!(photos.search_photos("punk", 50, 0).unwrap().len(), 1);
        assert!(photos.search_photos("polka", 50, 0).unwrap().is_empty());
    }

    #[test]
    fn update_touches_only_metadata() {
        let (_tmp, pool) = test_support::pool();
        let photos = PhotoModel::new(pool.clone());
        let uid = user(&pool, "alice");
        let created = photo(&photos, uid, "stage", "rock");

        let updated = photos
            .update_photo(
                created.id,
                UpdatePhotoData {
                    caption: Some("main stage".into()),
                    is_public: Some(false),
                    ..Default::default()
                },
            )
            .unwrap()
            .unwrap();
        assert_eq!(updated.caption.as_deref(), Some("main stage"));
        assert_eq!(updated.genre.as_deref(), Some("rock"));
        assert!(!updated.is_public);
        assert_eq!(updated.user_id, uid);
        assert_eq!(updated.blob_url, created.blob_url);

        assert!(photos
            .update_photo(4040, UpdatePhotoData {
                genre: Some("x".into()),
                ..Default::default()
            })
            .unwrap()
            .is_none());
    }

    #[test]
    fn delete_photo_reports_removal() {
        let (_tmp, pool) = test_support::pool();
        let photos = PhotoModel::new(pool.clone());
        let uid = user(&pool, "alice");
        let created = photo(&photos, uid, "bye", "rock");

        assert!(photos.delete_photo(created.id).unwrap());
        assert!(!photos.delete_photo(created.id).unwrap());
    }
}
