use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};

use crate::db::error::{constraint_violation, require, Constraint};
use crate::db::models::{
    CreateCommentData, CreatePostData, Platform, Post, PostComment, PostLike, UpdatePostData,
};
use crate::db::{like_pattern, now, Changes, DbError, DbResult};
use crate::state::DbPool;

/// Feed posts with their likes and comments.
///
/// `likes_count` and `comments_count` are denormalized. Every mutation of
/// `post_likes` or `post_comments` is followed, in the same transaction, by a
/// fresh `COUNT(*)` written back to the post. Counters are never adjusted
/// incrementally.
#[derive(Clone)]
pub struct PostModel {
    pool: DbPool,
}

impl PostModel {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn create_post(&self, data: CreatePostData) -> DbResult<Post> {
        require("content", &data.content)?;

        let tags = data.tags.as_ref().map(serde_json::to_string).transpose()?;
        let conn = self.pool.get()?;
        let now = now();

        conn.execute(
            "INSERT INTO posts (user_id, title, content, image_url, platform, external_post_url,
                                tags, is_featured, is_public, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?10)",
            params![
                data.user_id,
                data.title,
                data.content,
                data.image_url,
                data.platform.unwrap_or_default(),
                data.external_post_url,
                tags,
                data.is_featured.unwrap_or(false),
                data.is_public.unwrap_or(true),
                now
            ],
        )
        .map_err(|e| reference_error(e, "user"))?;

        let id = conn.last_insert_rowid();
        tracing::debug!(post_id = id, "Created post");
        fetch_post(&conn, id)?.ok_or(DbError::Sql(rusqlite::Error::QueryReturnedNoRows))
    }

    /// Lookup by id, including non-public posts.
    pub fn get_post_by_id(&self, id: i64) -> DbResult<Option<Post>> {
        let conn = self.pool.get()?;
        Ok(fetch_post(&conn, id)?)
    }

    pub fn get_all_posts(&self, limit: i64, offset: i64) -> DbResult<Vec<Post>> {
        self.list(
            "SELECT * FROM posts WHERE is_public = 1
             ORDER BY created_at DESC, id DESC LIMIT ?1 OFFSET ?2",
            params![limit, offset],
        )
    }

    /// Everything a user posted, private posts included.
    pub fn get_posts_by_user(&self, user_id: i64, limit: i64, offset: i64) -> DbResult<Vec<Post>> {
        self.list(
            "SELECT * FROM posts WHERE user_id = ?1
             ORDER BY created_at DESC, id DESC LIMIT ?2 OFFSET ?3",
            params![user_id, limit, offset],
        )
    }

    pub fn get_posts_by_platform(
        &self,
        platform: Platform,
        limit: i64,
        offset: i64,
    ) -> DbResult<Vec<Post>> {
        self.list(
            "SELECT * FROM posts WHERE platform = ?1 AND is_public = 1
             ORDER BY created_at DESC, id DESC LIMIT ?2 OFFSET ?3",
            params![platform, limit, offset],
        )
    }

    pub fn get_featured_posts(&self, limit: i64) -> DbResult<Vec<Post>> {
        self.list(
            "SELECT * FROM posts WHERE is_featured = 1 AND is_public = 1
             ORDER BY created_at DESC, id DESC LIMIT ?1",
            params![limit],
        )
    }

    /// Case-insensitive substring match on title or content, public posts only.
    pub fn search_posts(&self, query: &str, limit: i64, offset: i64) -> DbResult<Vec<Post>> {
        self.list(
            "SELECT * FROM posts
             WHERE (title LIKE ?1 ESCAPE '\\' OR content LIKE ?1 ESCAPE '\\') AND is_public = 1
             ORDER BY created_at DESC, id DESC LIMIT ?2 OFFSET ?3",
            params![like_pattern(query), limit, offset],
        )
    }

    /// Number of public posts.
    pub fn get_post_count(&self) -> DbResult<i64> {
        let conn = self.pool.get()?;
        Ok(conn.query_row("SELECT COUNT(*) FROM posts WHERE is_public = 1", [], |row| {
            row.get(0)
        })?)
    }

    /// Update the supplied fields. Counters are not writable here.
    pub fn update_post(&self, id: i64, data: UpdatePostData) -> DbResult<Option<Post>> {
        if let Some(content) = &data.content {
            require("content", content)?;
        }
        let tags = data.tags.as_ref().map(serde_json::to_string).transpose()?;

        let mut changes = Changes::default();
        changes
            .set("title", data.title)
            .set("content", data.content)
            .set("image_url", data.image_url)
            .set("platform", data.platform.map(|p| p.as_str().to_string()))
            .set("external_post_url", data.external_post_url)
            .set("tags", tags)
            .set("is_featured", data.is_featured)
            .set("is_public", data.is_public);

        let conn = self.pool.get()?;
        if changes.is_empty() {
            return Ok(fetch_post(&conn, id)?);
        }
        if changes.apply(&conn, "posts", id)? == 0 {
            return Ok(None);
        }
        Ok(fetch_post(&conn, id)?)
    }

    /// Delete a post together with its likes and comments.
    pub fn delete_post(&self, id: i64) -> DbResult<bool> {
        let conn = self.pool.get()?;
        let rows = conn.execute("DELETE FROM posts WHERE id = ?1", params![id])?;
        Ok(rows > 0)
    }

    /// Record a like. Returns `false` if the user already likes the post.
    pub fn like_post(&self, post_id: i64, user_id: i64) -> DbResult<bool> {
        let mut conn = self.pool.get()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let inserted = tx.execute(
            "INSERT INTO post_likes (post_id, user_id, created_at) VALUES (?1, ?2, ?3)",
            params![post_id, user_id, now()],
        );
        match inserted {
            Ok(_) => {}
            Err(e) if constraint_violation(&e) == Some(Constraint::Unique) => {
                tracing::debug!(post_id, user_id, "Duplicate like ignored");
                return Ok(false);
            }
            Err(e) => return Err(reference_error(e, "post or user")),
        }

        refresh_likes_count(&tx, post_id)?;
        tx.commit()?;
        Ok(true)
    }

    /// Remove a like. Returns `false` if there was none.
    pub fn unlike_post(&self, post_id: i64, user_id: i64) -> DbResult<bool> {
        let mut conn = self.pool.get()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let removed = tx.execute(
            "DELETE FROM post_likes WHERE post_id = ?1 AND user_id = ?2",
            params![post_id, user_id],
        )?;
        if removed == 0 {
            return Ok(false);
        }

        refresh_likes_count(&tx, post_id)?;
        tx.commit()?;
        Ok(true)
    }

    pub fn has_liked(&self, post_id: i64, user_id: i64) -> DbResult<bool> {
        let conn = self.pool.get()?;
        Ok(conn.query_row(
            "SELECT COUNT(*) > 0 FROM post_likes WHERE post_id = ?1 AND user_id = ?2",
            params![post_id, user_id],
            |row| row.get(0),
        )?)
    }

    pub fn get_post_likes(&self, post_id: i64) -> DbResult<Vec<PostLike>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(
            "SELECT * FROM post_likes WHERE post_id = ?1 ORDER BY created_at ASC, id ASC",
        )?;
        let likes = stmt
            .query_map(params![post_id], PostLike::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(likes)
    }

    pub fn add_comment(&self, data: CreateCommentData) -> DbResult<PostComment> {
        require("content", &data.content)?;

        let mut conn = self.pool.get()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let now = now();

        tx.execute(
            "INSERT INTO post_comments (post_id, user_id, content, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?4)",
            params![data.post_id, data.user_id, data.content, now],
        )
        .map_err(|e| reference_error(e, "post or user"))?;
        let id = tx.last_insert_rowid();

        refresh_comments_count(&tx, data.post_id)?;
        let comment =
            fetch_comment(&tx, id)?.ok_or(DbError::Sql(rusqlite::Error::QueryReturnedNoRows))?;
        tx.commit()?;
        Ok(comment)
    }

    pub fn get_comment_by_id(&self, id: i64) -> DbResult<Option<PostComment>> {
        let conn = self.pool.get()?;
        Ok(fetch_comment(&conn, id)?)
    }

    /// Comments on a post, oldest first.
    pub fn get_post_comments(
        &self,
        post_id: i64,
        limit: i64,
        offset: i64,
    ) -> DbResult<Vec<PostComment>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(
            "SELECT * FROM post_comments WHERE post_id = ?1
             ORDER BY created_at ASC, id ASC LIMIT ?2 OFFSET ?3",
        )?;
        let comments = stmt
            .query_map(params![post_id, limit, offset], PostComment::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(comments)
    }

    pub fn update_comment(&self, id: i64, content: &str) -> DbResult<Option<PostComment>> {
        require("content", content)?;

        let conn = self.pool.get()?;
        let mut changes = Changes::default();
        changes.set("content", Some(content.to_string()));
        if changes.apply(&conn, "post_comments", id)? == 0 {
            return Ok(None);
        }
        Ok(fetch_comment(&conn, id)?)
    }

    /// Delete a comment and recount its post. Returns `false` if it did not exist.
    pub fn delete_comment(&self, id: i64) -> DbResult<bool> {
        let mut conn = self.pool.get()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let post_id: Option<i64> = tx
            .query_row(
                "SELECT post_id FROM post_comments WHERE id = ?1",
                params![id],
                |row| row.get(0),
            )
            .optional()?;
        let Some(post_id) = post_id else {
            return Ok(false);
        };

        tx.execute("DELETE FROM post_comments WHERE id = ?1", params![id])?;
        refresh_comments_count(&tx, post_id)?;
        tx.commit()?;
        Ok(true)
    }

    fn list(&self, sql: &str, params: impl rusqlite::Params) -> DbResult<Vec<Post>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(sql)?;
        let posts = stmt
            .query_map(params, Post::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(posts)
    }
}

/// Recount likes of `post_id` and store the result. Run inside the mutating transaction.
pub(crate) fn refresh_likes_count(conn: &Connection, post_id: i64) -> rusqlite::Result<i64> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM post_likes WHERE post_id = ?1",
        params![post_id],
        |row| row.get(0),
    )?;
    conn.execute(
        "UPDATE posts SET likes_count = ?1 WHERE id = ?2",
        params![count, post_id],
    )?;
    Ok(count)
}

/// Recount comments of `post_id` and store the result. Run inside the mutating transaction.
pub(crate) fn refresh_comments_count(conn: &Connection, post_id: i64) -> rusqlite::Result<i64> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM post_comments WHERE post_id = ?1",
        params![post_id],
        |row| row.get(0),
    )?;
    conn.execute(
        "UPDATE posts SET comments_count = ?1 WHERE id = ?2",
        params![count, post_id],
    )?;
    Ok(count)
}

fn fetch_post(conn: &Connection, id: i64) -> rusqlite::Result<Option<Post>> {
    conn.query_row("SELECT * FROM posts WHERE id = ?1", params![id], Post::from_row)
        .optional()
}

fn fetch_comment(conn: &Connection, id: i64) -> rusqlite::Result<Option<PostComment>> {
    conn.query_row(
        "SELECT * FROM post_comments WHERE id = ?1",
        params![id],
        PostComment::from_row,
    )
    .optional()
}

fn reference_error(err: rusqlite::Error, what: &str) -> DbError {
    match constraint_violation(&err) {
        Some(Constraint::ForeignKey) => {
            DbError::InvalidReference(format!("referenced {} does not exist", what))
        }
        _ => err.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::CreateUserData;
    use crate::db::{test_support, UserModel};

    struct Fixture {
        _tmp: tempfile::TempDir,
        pool: DbPool,
        posts: PostModel,
    }

    fn fixture() -> Fixture {
        let (tmp, pool) = test_support::pool();
        Fixture {
            _tmp: tmp,
            posts: PostModel::new(pool.clone()),
            pool,
        }
    }

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

    fn post(posts: &PostModel, content: &str) -> Post {
        posts
            .create_post(CreatePostData {
                content: content.into(),
                ..Default::default()
            })
            .unwrap()
    }

    fn stored_likes(pool: &DbPool, post_id: i64) -> i64 {
        pool.get()
            .unwrap()
            .query_row(
                "SELECT COUNT(*) FROM post_likes WHERE post_id = ?1",
                params![post_id],
                |row| row.get(0),
            )
            .unwrap()
    }

    #[test]
    fn create_post_applies_defaults() {
        let f = fixture();
        let created = f
            .posts
            .create_post(CreatePostData {
                title: Some("Night one".into()),
                content: "Great show!".into(),
                tags: Some(vec!["live".into(), "jazz".into()]),
                ..Default::default()
            })
            .unwrap();

        assert_eq!(created.platform, Platform::Native);
        assert_eq!(created.likes_count, 0);
        assert_eq!(created.comments_count, 0);
        assert!(created.is_public);
        assert!(!created.is_featured);
        assert_eq!(created.user_id, None);
        assert_eq!(created.tags, Some(vec!["live".to_string(), "jazz".to_string()]));
    }

    #[test]
    fn create_post_requires_content() {
        let f = fixture();
        let result = f.posts.create_post(CreatePostData {
            title: Some("no body".into()),
            content: "  ".into(),
            ..Default::default()
        });
        assert!(matches!(result, Err(DbError::Validation(_))));
        assert_eq!(f.posts.get_post_count().unwrap(), 0);
    }

    #[test]
    fn listings_hide_private_posts_except_for_owner() {
        let f = fixture();
        let uid = user(&f.pool, "alice");
        f.posts
            .create_post(CreatePostData {
                user_id: Some(uid),
                content: "secret".into(),
                is_public: Some(false),
                ..Default::default()
            })
            .unwrap();
        let public = f
            .posts
            .create_post(CreatePostData {
                user_id: Some(uid),
                content: "open".into(),
                ..Default::default()
            })
            .unwrap();

        let all = f.posts.get_all_posts(50, 0).unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].id, public.id);
        assert_eq!(f.posts.get_posts_by_user(uid, 50, 0).unwrap().len(), 2);
        assert_eq!(f.posts.get_post_count().unwrap(), 1);
    }

    #[test]
    fn platform_and_featured_filters() {
        let f = fixture();
        f.posts
            .create_post(CreatePostData {
                content: "from insta".into(),
                platform: Some(Platform::Instagram),
                is_featured: Some(true),
                ..Default::default()
            })
            .unwrap();
        post(&f.posts, "native one");

        let insta = f.posts.get_posts_by_platform(Platform::Instagram, 50, 0).unwrap();
        assert_eq!(insta.len(), 1);
        assert_eq!(insta[0].content, "from insta");
        assert_eq!(f.posts.get_posts_by_platform(Platform::Twitter, 50, 0).unwrap().len(), 0);

        let featured = f.posts.get_featured_posts(10).unwrap();
        assert_eq!(featured.len(), 1);
        assert!(featured[0].is_featured);
    }

    #[test]
    fn like_twice_counts_once() {
        let f = fixture();
        let uid = user(&f.pool, "bob");
        let p = post(&f.posts, "Great show!");

        assert!(f.posts.like_post(p.id, uid).unwrap());
        assert_eq!(f.posts.get_post_by_id(p.id).unwrap().unwrap().likes_count, 1);

        assert!(!f.posts.like_post(p.id, uid).unwrap());
        assert_eq!(f.posts.get_post_by_id(p.id).unwrap().unwrap().likes_count, 1);
        assert!(f.posts.has_liked(p.id, uid).unwrap());
        assert_eq!(f.posts.get_post_likes(p.id).unwrap().len(), 1);
    }

    #[test]
    fn like_counter_tracks_like_rows() {
        let f = fixture();
        let p = post(&f.posts, "encore");
        let users: Vec<i64> = ["a", "b", "c", "d"].iter().map(|n| user(&f.pool, n)).collect();

        for uid in &users {
            assert!(f.posts.like_post(p.id, *uid).unwrap());
        }
        assert!(f.posts.unlike_post(p.id, users[1]).unwrap());
        assert!(!f.posts.unlike_post(p.id, users[1]).unwrap());
        assert!(f.posts.like_post(p.id, users[1]).unwrap());
        assert!(f.posts.unlike_post(p.id, users[3]).unwrap());

        let stored = f.posts.get_post_by_id(p.id).unwrap().unwrap();
        assert_eq!(stored.likes_count, 3);
        assert_eq!(stored.likes_count, stored_likes(&f.pool, p.id));
    }

    #[test]
    fn liking_missing_post_is_an_invalid_reference() {
        let f = fixture();
        let uid = user(&f.pool, "bob");
        assert!(matches!(
            f.posts.like_post(12345, uid),
            Err(DbError::InvalidReference(_))
        ));
    }

    #[test]
    fn comments_keep_counter_in_sync() {
        let f = fixture();
        let uid = user(&f.pool, "carol");
        let p = post(&f.posts, "set list?");

        let first = f
            .posts
            .add_comment(CreateCommentData {
                post_id: p.id,
                user_id: uid,
                content: "Opened with Blue Monk".into(),
            })
            .unwrap();
        let second = f
            .posts
            .add_comment(CreateCommentData {
                post_id: p.id,
                user_id: uid,
                content: "Closed with Round Midnight".into(),
            })
            .unwrap();
        assert_eq!(f.posts.get_post_by_id(p.id).unwrap().unwrap().comments_count, 2);

        let listed: Vec<i64> = f
            .posts
            .get_post_comments(p.id, 50, 0)
            .unwrap()
            .into_iter()
            .map(|c| c.id)
            .collect();
        assert_eq!(listed, vec![first.id, second.id]);

        assert!(f.posts.delete_comment(first.id).unwrap());
        assert!(!f.posts.delete_comment(first.id).unwrap());
        assert_eq!(f.posts.get_post_by_id(p.id).unwrap().unwrap().comments_count, 1);
    }

    #[test]
    fn empty_comment_is_rejected() {
        let f = fixture();
        let uid = user(&f.pool, "carol");
        let p = post(&f.posts, "hello");
        let result = f.posts.add_comment(CreateCommentData {
            post_id: p.id,
            user_id: uid,
            content: "".into(),
        });
        assert!(matches!(result, Err(DbError::Validation(_))));
        assert_eq!(f.posts.get_post_by_id(p.id).unwrap().unwrap().comments_count, 0);
    }

    #[test]
    fn update_comment_changes_content() {
        let f = fixture();
        let uid = user(&f.pool, "carol");
        let p = post(&f.posts, "hello");
        let c = f
            .posts
            .add_comment(CreateCommentData {
                post_id: p.id,
                user_id: uid,
                content: "tpyo".into(),
            })
            .unwrap();

        let edited = f.posts.update_comment(c.id, "typo").unwrap().unwrap();
        assert_eq!(edited.content, "typo");
        assert!(f.posts.update_comment(9999, "nope").unwrap().is_none());
    }

    #[test]
    fn search_is_case_insensitive_and_public_only() {
        let f = fixture();
        f.posts
            .create_post(CreatePostData {
                title: Some("AMAZING night".into()),
                content: "loud".into(),
                ..Default::default()
            })
            .unwrap();
        post(&f.posts, "An amazing encore");
        post(&f.posts, "meh");
        f.posts
            .create_post(CreatePostData {
                content: "amazing but hidden".into(),
                is_public: Some(false),
                ..Default::default()
            })
            .unwrap();

        let hits = f.posts.search_posts("amazing", 50, 0).unwrap();
        assert_eq!(hits.len(), 2);
        assert!(hits.iter().all(|p| p.is_public));
        assert!(f.posts.search_posts("100%", 50, 0).unwrap().is_empty());
    }

    #[test]
    fn update_post_leaves_counters_alone() {
        let f = fixture();
        let uid = user(&f.pool, "dave");
        let p = post(&f.posts, "draft");
        f.posts.like_post(p.id, uid).unwrap();

        let updated = f
            .posts
            .update_post(
                p.id,
                UpdatePostData {
                    content: Some("final".into()),
                    tags: Some(vec!["rock".into()]),
                    is_featured: Some(true),
                    ..Default::default()
                },
            )
            .unwrap()
            .unwrap();
        assert_eq!(updated.content, "final");
        assert_eq!(updated.tags, Some(vec!["rock".to_string()]));
        assert!(updated.is_featured);
        assert_eq!(updated.likes_count, 1);

        assert!(f
            .posts
            .update_post(777, UpdatePostData {
                title: Some("x".into()),
                ..Default::default()
            })
            .unwrap()
            .is_none());
    }

    #[test]
    fn delete_post_cascades() {
        let f = fixture();
        let uid = user(&f.pool, "erin");
        let p = post(&f.posts, "bye");
        f.posts.like_post(p.id, uid).unwrap();
        let c = f
            .posts
            .add_comment(CreateCommentData {
                post_id: p.id,
                user_id: uid,
                content: "see ya".into(),
            })
            .unwrap();

        assert!(f.posts.delete_post(p.id).unwrap());
        assert!(!f.posts.delete_post(p.id).unwrap());
        assert!(f.posts.get_comment_by_id(c.id).unwrap().is_none());
        assert_eq!(stored_likes(&f.pool, p.id), 0);
    }

    #[test]
    fn concurrent_comment_deletes_all_succeed() {
        let f = fixture();
        let uid = user(&f.pool, "mia");
        let p = post(&f.posts, "busy thread");
        let ids: Vec<i64> = (0..200)
            .map(|i| {
                f.posts
                    .add_comment(CreateCommentData {
                        post_id: p.id,
                        user_id: uid,
                        content: format!("comment {}", i),
                    })
                    .unwrap()
                    .id
            })
            .collect();

        let handles: Vec<_> = ids
            .chunks(25)
            .map(|chunk| {
                let posts = f.posts.clone();
                let chunk = chunk.to_vec();
                std::thread::spawn(move || {
                    chunk
                        .into_iter()
                        .map(|id| posts.delete_comment(id))
                        .filter(|r| !matches!(r, Ok(true)))
                        .count()
                })
            })
            .collect();
        let failures: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();

        assert_eq!(failures, 0);
        assert_eq!(f.posts.get_post_by_id(p.id).unwrap().unwrap().comments_count, 0);
        assert!(f.posts.get_post_comments(p.id, 500, 0).unwrap().is_empty());
    }

    #[test]
    fn concurrent_likes_and_unlikes_keep_count_exact() {
        let f = fixture();
        let p = post(&f.posts, "crowd favorite");
        let users: Vec<i64> = (0..8).map(|i| user(&f.pool, &format!("fan{}", i))).collect();

        let handles: Vec<_> = users
            .iter()
            .enumerate()
            .map(|(i, &uid)| {
                let posts = f.posts.clone();
                let post_id = p.id;
                std::thread::spawn(move || {
                    for _ in 0..5 {
                        posts.like_post(post_id, uid).unwrap();
                        posts.unlike_post(post_id, uid).unwrap();
                    }
                    // Even-numbered fans end up liking the post.
                    if i % 2 == 0 {
                        posts.like_post(post_id, uid).unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let stored = f.posts.get_post_by_id(p.id).unwrap().unwrap();
        assert_eq!(stored.likes_count, 4);
        assert_eq!(stored_likes(&f.pool, p.id), 4);
    }
}
