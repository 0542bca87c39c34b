use std::fmt;
use std::str::FromStr;

use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, Type, ValueRef};
use rusqlite::Row;
use serde::{Deserialize, Serialize};

pub const DEFAULT_PAGE_SIZE: i64 = 50;
pub const DEFAULT_FEATURED_LIMIT: i64 = 10;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub profile_image_url: Option<String>,
    pub bio: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl User {
    pub(crate) fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            username: row.get("username")?,
            email: row.get("email")?,
            password_hash: row.get("password_hash")?,
            first_name: row.get("first_name")?,
            last_name: row.get("last_name")?,
            profile_image_url: row.get("profile_image_url")?,
            bio: row.get("bio")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }
}

/// A user as it may be shown outside the data layer: everything but the hash.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PublicUser {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub profile_image_url: Option<String>,
    pub bio: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<User> for PublicUser {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            first_name: user.first_name,
            last_name: user.last_name,
            profile_image_url: user.profile_image_url,
            bio: user.bio,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CreateUserData {
    pub username: String,
    pub email: String,
    pub password: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub profile_image_url: Option<String>,
    pub bio: Option<String>,
}

/// Profile fields that may change after registration. The password is not one of them.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateUserData {
    pub username: Option<String>,
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub profile_image_url: Option<String>,
    pub bio: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub id: i64,
    pub user_id: i64,
    pub session_token: String,
    pub expires_at: String,
    pub created_at: String,
}

impl Session {
    pub(crate) fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            user_id: row.get("user_id")?,
            session_token: row.get("session_token")?,
            expires_at: row.get("expires_at")?,
            created_at: row.get("created_at")?,
        })
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Facebook,
    Instagram,
    Twitter,
    #[default]
    Native,
}

impl Platform {
    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Facebook => "facebook",
            Platform::Instagram => "instagram",
            Platform::Twitter => "twitter",
            Platform::Native => "native",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown platform: {0}")]
pub struct UnknownPlatform(pub String);

impl FromStr for Platform {
    type Err = UnknownPlatform;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "facebook" => Ok(Platform::Facebook),
            "instagram" => Ok(Platform::Instagram),
            "twitter" => Ok(Platform::Twitter),
            "native" => Ok(Platform::Native),
            other => Err(UnknownPlatform(other.to_string())),
        }
    }
}

impl ToSql for Platform {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for Platform {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|e| FromSqlError::Other(Box::new(e)))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub id: i64,
    pub user_id: Option<i64>,
    pub title: Option<String>,
    pub content: String,
    pub image_url: Option<String>,
    pub platform: Platform,
    pub external_post_url: Option<String>,
    pub tags: Option<Vec<String>>,
    pub likes_count: i64,
    pub comments_count: i64,
    pub is_featured: bool,
    pub is_public: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl Post {
    pub(crate) fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        let tags_idx = row.as_ref().column_index("tags")?;
        let tags = row
            .get::<_, Option<String>>(tags_idx)?
            .map(|json| serde_json::from_str::<Vec<String>>(&json))
            .transpose()
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(tags_idx, Type::Text, Box::new(e)))?;

        Ok(Self {
            id: row.get("id")?,
            user_id: row.get("user_id")?,
            title: row.get("title")?,
            content: row.get("content")?,
            image_url: row.get("image_url")?,
            platform: row.get("platform")?,
            external_post_url: row.get("external_post_url")?,
            tags,
            likes_count: row.get("likes_count")?,
            comments_count: row.get("comments_count")?,
            is_featured: row.get("is_featured")?,
            is_public: row.get("is_public")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CreatePostData {
    pub user_id: Option<i64>,
    pub title: Option<String>,
    pub content: String,
    pub image_url: Option<String>,
    pub platform: Option<Platform>,
    pub external_post_url: Option<String>,
    pub tags: Option<Vec<String>>,
    pub is_featured: Option<bool>,
    pub is_public: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdatePostData {
    pub title: Option<String>,
    pub content: Option<String>,
    pub image_url: Option<String>,
    pub platform: Option<Platform>,
    pub external_post_url: Option<String>,
    pub tags: Option<Vec<String>>,
    pub is_featured: Option<bool>,
    pub is_public: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostLike {
    pub id: i64,
    pub post_id: i64,
    pub user_id: i64,
    pub created_at: String,
}

impl PostLike {
    pub(crate) fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            post_id: row.get("post_id")?,
            user_id: row.get("user_id")?,
            created_at: row.get("created_at")?,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostComment {
    pub id: i64,
    pub post_id: i64,
    pub user_id: i64,
    pub content: String,
    pub created_at: String,
    pub updated_at: String,
}

impl PostComment {
    pub(crate) fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            post_id: row.get("post_id")?,
            user_id: row.get("user_id")?,
            content: row.get("content")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateCommentData {
    pub post_id: i64,
    pub user_id: i64,
    pub content: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Photo {
    pub id: i64,
    pub user_id: i64,
    pub event_id: Option<i64>,
    pub blob_url: String,
    pub caption: Option<String>,
    pub alt_text: Option<String>,
    pub genre: Option<String>,
    pub is_public: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl Photo {
    pub(crate) fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            user_id: row.get("user_id")?,
            event_id: row.get("event_id")?,
            blob_url: row.get("blob_url")?,
            caption: row.get("caption")?,
            alt_text: row.get("alt_text")?,
            genre: row.get("genre")?,
            is_public: row.get("is_public")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CreatePhotoData {
    pub user_id: i64,
    pub event_id: Option<i64>,
    pub blob_url: String,
    pub caption: Option<String>,
    pub alt_text: Option<String>,
    pub genre: Option<String>,
    pub is_public: Option<bool>,
}

/// Owner and blob are fixed once a photo exists; only the metadata moves.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdatePhotoData {
    pub caption: Option<String>,
    pub alt_text: Option<String>,
    pub genre: Option<String>,
    pub is_public: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Venue {
    pub id: i64,
    pub name: String,
    pub location: Option<String>,
    pub website: Option<String>,
    pub created_at: String,
}

impl Venue {
    pub(crate) fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            name: row.get("name")?,
            location: row.get("location")?,
            website: row.get("website")?,
            created_at: row.get("created_at")?,
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CreateVenueData {
    pub name: String,
    pub location: Option<String>,
    pub website: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub id: i64,
    pub venue_id: i64,
    pub title: String,
    pub date: String,
    pub image_url: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl Event {
    pub(crate) fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            venue_id: row.get("venue_id")?,
            title: row.get("title")?,
            date: row.get("date")?,
            image_url: row.get("image_url")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CreateEventData {
    pub venue_id: i64,
    pub title: String,
    pub date: String,
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateEventData {
    pub venue_id: Option<i64>,
    pub title: Option<String>,
    pub date: Option<String>,
    pub image_url: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn platform_parses_known_names() {
        assert_eq!("instagram".parse::<Platform>().unwrap(), Platform::Instagram);
        assert_eq!("native".parse::<Platform>().unwrap(), Platform::Native);
        assert!("myspace".parse::<Platform>().is_err());
    }

    #[test]
    fn platform_serializes_lowercase() {
        let json = serde_json::to_string(&Platform::Twitter).unwrap();
        assert_eq!(json, "\"twitter\"");
        assert_eq!(Platform::default(), Platform::Native);
    }

    #[test]
    fn public_user_drops_password_hash() {
        let user = User {
            id: 1,
            username: "alice".into(),
            email: "alice@example.com".into(),
            password_hash: "$2b$04$hash".into(),
            first_name: None,
            last_name: None,
            profile_image_url: None,
            bio: None,
            created_at: "2025-01-01T00:00:00.000Z".into(),
            updated_at: "2025-01-01T00:00:00.000Z".into(),
        };
        let json = serde_json::to_value(PublicUser::from(user)).unwrap();
        assert!(json.get("password_hash").is_none());
        assert_eq!(json["username"], "alice");
    }
}
