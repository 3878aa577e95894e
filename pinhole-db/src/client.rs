use crate::{
    record::{
        AuthenticationRecord, CommentRecord, MessageRecord, NotificationRecord, PostRecord,
        StoryRecord, UserRecord, count_from_db,
    },
    store::{
        CommentStore, FollowCounts, GraphStore, InteractionStore, MessageStore, NotificationStore,
        PostOrder, PostQuery, PostStore, StoryStore, UserStore,
    },
};
use async_trait::async_trait;
use parking_lot::Mutex;
use pinhole_common::{
    model::{
        Id, ModelValidationError, PinholeSnowflakeGenerator,
        auth::{AuthTokenHash, Authentication},
        comment::{Comment, CommentId, CreateComment},
        ids_to_db,
        interaction::{EngagementKind, InteractionKind},
        message::{CreateMessage, Message, MessageId},
        notification::{CreateNotification, Notification, NotificationId},
        post::{CreatePost, Post, PostId, UpdatePost, normalize_tags},
        story::{CreateStory, Story, StoryId},
        user::{CreateUser, UpdateUser, User, UserId},
    },
    pagination::Window,
    snowflake::{ProcessId, WorkerId},
};
use sqlx::{PgPool, Postgres, QueryBuilder, query, query_as, query_scalar, types::Json};
use std::collections::{HashMap, HashSet};
use thiserror::Error;
use time::OffsetDateTime;
use tracing::{debug, instrument};

pub type Result<T, E = DbError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("An object in the database was invalid: {0}")]
    Data(#[from] ModelValidationError),
    #[error("Unique constraint {0} was violated")]
    UniqueViolation(String),
    #[error("Referenced row for {0} does not exist")]
    ForeignKeyViolation(String),
    #[error("Migrating the database failed: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),
    #[error(transparent)]
    Sqlx(sqlx::Error),
}

impl From<sqlx::Error> for DbError {
    fn from(value: sqlx::Error) -> Self {
        if let sqlx::Error::Database(database_error) = &value {
            let constraint = database_error.constraint().unwrap_or_default().to_owned();
            if database_error.is_unique_violation() {
                return DbError::UniqueViolation(constraint);
            }
            if database_error.is_foreign_key_violation() {
                return DbError::ForeignKeyViolation(constraint);
            }
        }
        DbError::Sqlx(value)
    }
}

const USER_COLUMNS: &str = "
    users.user_snowflake,
    users.handle,
    users.name,
    users.bio,
    users.profile_pic,
    users.is_private,
    users.created_at";

const POST_COLUMNS: &str = "
    posts.post_snowflake,
    posts.user_snowflake,
    posts.media,
    posts.caption,
    posts.tags,
    posts.is_archived,
    posts.comment_count,
    posts.created_at";

const COMMENT_COLUMNS: &str = "
    comments.comment_snowflake,
    comments.post_snowflake,
    comments.user_snowflake,
    comments.text,
    comments.parent_comment_snowflake,
    comments.created_at";

const STORY_COLUMNS: &str = "
    stories.story_snowflake,
    stories.user_snowflake,
    stories.media,
    stories.caption,
    stories.music,
    ARRAY(
        SELECT viewers.user_snowflake
        FROM stories.viewers
        WHERE viewers.story_snowflake = stories.story_snowflake
        ORDER BY viewers.viewed_at
    ) AS viewers,
    stories.created_at";

const NOTIFICATION_COLUMNS: &str = "
    notifications.notification_snowflake,
    notifications.recipient_snowflake,
    notifications.kind,
    notifications.actor_snowflake,
    notifications.post_snowflake,
    notifications.comment_snowflake,
    notifications.story_snowflake,
    notifications.is_read,
    notifications.message,
    notifications.created_at";

const MESSAGE_COLUMNS: &str = "
    messages.message_snowflake,
    messages.sender_snowflake,
    messages.receiver_snowflake,
    messages.text,
    messages.file_url,
    messages.chat_id,
    messages.created_at";

fn window_to_db(window: Window) -> (i64, i64) {
    (
        i64::try_from(window.offset).unwrap_or(i64::MAX),
        i64::try_from(window.limit).unwrap_or(i64::MAX),
    )
}

fn engagement_table(kind: EngagementKind) -> &'static str {
    match kind {
        EngagementKind::Like => "posts.likes",
        EngagementKind::Save => "posts.saves",
    }
}

fn interaction_table(kind: InteractionKind) -> &'static str {
    match kind {
        InteractionKind::Like => "posts.likes",
        InteractionKind::Comment => "posts.comments",
        InteractionKind::Save => "posts.saves",
    }
}

/// Appends the `FROM` and `WHERE` clauses for a post listing.
fn push_post_source(builder: &mut QueryBuilder<'_, Postgres>, query: &PostQuery) {
    builder.push(" FROM posts.posts");
    if let PostOrder::FollowedFirst { viewer } = query.order {
        builder
            .push(
                " LEFT JOIN users.follows ON follows.followee_snowflake = posts.user_snowflake \
                AND follows.follower_snowflake = ",
            )
            .push_bind(viewer.to_db());
    }

    let filter = query.filter;
    builder.push(" WHERE TRUE");
    if !filter.include_archived {
        builder.push(" AND NOT posts.is_archived");
    }
    if filter.videos_only {
        builder.push(r#" AND posts.media @> '[{"kind": "video"}]'::jsonb"#);
    }
    if let Some(creator) = filter.created_by {
        builder
            .push(" AND posts.user_snowflake = ")
            .push_bind(creator.to_db());
    }
    if let Some(saver) = filter.saved_by {
        builder
            .push(
                " AND EXISTS (SELECT 1 FROM posts.saves \
                WHERE saves.post_snowflake = posts.post_snowflake AND saves.user_snowflake = ",
            )
            .push_bind(saver.to_db())
            .push(")");
    }
}

pub struct DbClient {
    pool: PgPool,
    snowflake_generator: Mutex<PinholeSnowflakeGenerator>,
}

impl DbClient {
    #[must_use]
    pub fn new(pool: PgPool, worker_id: WorkerId, process_id: ProcessId) -> Self {
        let snowflake_generator =
            Mutex::new(PinholeSnowflakeGenerator::new(worker_id, process_id));

        Self {
            pool,
            snowflake_generator,
        }
    }

    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    fn next_id<Marker>(&self) -> (Id<Marker>, OffsetDateTime) {
        let now = OffsetDateTime::now_utc();
        let snowflake = self.snowflake_generator.lock().generate_at(now);
        (snowflake.into(), now)
    }
}

#[async_trait]
impl UserStore for DbClient {
    #[instrument(skip(self, user), fields(handle = user.handle.get()))]
    async fn create_user(&self, user: &CreateUser) -> Result<User> {
        let (user_id, created_at): (UserId, _) = self.next_id();

        let record = query_as::<_, UserRecord>(&format!(
            "
            INSERT INTO users.users (user_snowflake, handle, name, is_private, created_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {USER_COLUMNS}
            "
        ))
        .bind(user_id.to_db())
        .bind(user.handle.get())
        .bind(&user.name)
        .bind(user.is_private)
        .bind(created_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(User::try_from(record)?)
    }

    async fn fetch_user(&self, user_id: UserId) -> Result<Option<User>> {
        let record = query_as::<_, UserRecord>(&format!(
            "
            SELECT {USER_COLUMNS}
            FROM users.users
            WHERE users.user_snowflake = $1
            "
        ))
        .bind(user_id.to_db())
        .fetch_optional(&self.pool)
        .await?;

        let user = record.map(User::try_from).transpose()?;
        Ok(user)
    }

    async fn fetch_users(&self, user_ids: &[UserId]) -> Result<Vec<User>> {
        if user_ids.is_empty() {
            return Ok(Vec::new());
        }

        let records = query_as::<_, UserRecord>(&format!(
            "
            SELECT {USER_COLUMNS}
            FROM users.users
            WHERE users.user_snowflake = ANY($1)
            ORDER BY users.user_snowflake
            "
        ))
        .bind(ids_to_db(user_ids))
        .fetch_all(&self.pool)
        .await?;

        let users = records
            .into_iter()
            .map(User::try_from)
            .collect::<Result<_, _>>()?;
        Ok(users)
    }

    async fn update_user(&self, user_id: UserId, update: &UpdateUser) -> Result<Option<User>> {
        let record = query_as::<_, UserRecord>(&format!(
            "
            UPDATE users.users SET
                name = COALESCE($2, users.name),
                bio = COALESCE($3, users.bio),
                is_private = COALESCE($4, users.is_private),
                profile_pic = COALESCE($5, users.profile_pic)
            WHERE users.user_snowflake = $1
            RETURNING {USER_COLUMNS}
            "
        ))
        .bind(user_id.to_db())
        .bind(update.name.as_deref())
        .bind(update.bio.as_deref())
        .bind(update.is_private)
        .bind(update.profile_pic.as_deref())
        .fetch_optional(&self.pool)
        .await?;

        let user = record.map(User::try_from).transpose()?;
        Ok(user)
    }

    async fn delete_user(&self, user_id: UserId) -> Result<bool> {
        let mut transaction = self.pool.begin().await?;

        query(
            "
            UPDATE posts.posts SET comment_count = GREATEST(posts.comment_count - removed.count, 0)
            FROM (
                SELECT comments.post_snowflake, COUNT(*) AS count
                FROM posts.comments
                WHERE comments.user_snowflake = $1
                GROUP BY comments.post_snowflake
            ) AS removed
            WHERE posts.post_snowflake = removed.post_snowflake
            ",
        )
        .bind(user_id.to_db())
        .execute(&mut *transaction)
        .await?;

        let result = query("DELETE FROM users.users WHERE users.user_snowflake = $1")
            .bind(user_id.to_db())
            .execute(&mut *transaction)
            .await?;

        transaction.commit().await?;
        Ok(result.rows_affected() > 0)
    }

    async fn fetch_auth(&self, token_hash: &AuthTokenHash) -> Result<Option<Authentication>> {
        let record = query_as::<_, AuthenticationRecord>(
            "
            SELECT
                authentications.user_snowflake,
                authentications.token_hash,
                authentications.created_at,
                authentications.expires_after_seconds
            FROM
                users.authentications
            WHERE
                authentications.token_hash = $1
            ",
        )
        .bind(&token_hash.0[..])
        .fetch_optional(&self.pool)
        .await?;

        let authentication = record.map(Authentication::try_from).transpose()?;
        Ok(authentication)
    }
}

#[async_trait]
impl GraphStore for DbClient {
    async fn is_following(&self, follower: UserId, followee: UserId) -> Result<bool> {
        let following = query_scalar::<_, bool>(
            "
            SELECT EXISTS (
                SELECT 1 FROM users.follows
                WHERE follows.follower_snowflake = $1 AND follows.followee_snowflake = $2
            )
            ",
        )
        .bind(follower.to_db())
        .bind(followee.to_db())
        .fetch_one(&self.pool)
        .await?;

        Ok(following)
    }

    async fn follow(&self, follower: UserId, followee: UserId) -> Result<bool> {
        let result = query(
            "
            INSERT INTO users.follows (follower_snowflake, followee_snowflake, created_at)
            VALUES ($1, $2, $3)
            ON CONFLICT DO NOTHING
            ",
        )
        .bind(follower.to_db())
        .bind(followee.to_db())
        .bind(OffsetDateTime::now_utc())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn unfollow(&self, follower: UserId, followee: UserId) -> Result<bool> {
        let result = query(
            "
            DELETE FROM users.follows
            WHERE follows.follower_snowflake = $1 AND follows.followee_snowflake = $2
            ",
        )
        .bind(follower.to_db())
        .bind(followee.to_db())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn following_ids(&self, user: UserId) -> Result<Vec<UserId>> {
        let ids = query_scalar::<_, i64>(
            "
            SELECT follows.followee_snowflake
            FROM users.follows
            WHERE follows.follower_snowflake = $1
            ORDER BY follows.created_at DESC
            ",
        )
        .bind(user.to_db())
        .fetch_all(&self.pool)
        .await?;

        Ok(ids.into_iter().map(Id::from_db).collect())
    }

    async fn follower_ids(&self, user: UserId) -> Result<Vec<UserId>> {
        let ids = query_scalar::<_, i64>(
            "
            SELECT follows.follower_snowflake
            FROM users.follows
            WHERE follows.followee_snowflake = $1
            ORDER BY follows.created_at DESC
            ",
        )
        .bind(user.to_db())
        .fetch_all(&self.pool)
        .await?;

        Ok(ids.into_iter().map(Id::from_db).collect())
    }

    async fn following_of_many(&self, users: &[UserId]) -> Result<Vec<UserId>> {
        if users.is_empty() {
            return Ok(Vec::new());
        }

        let ids = query_scalar::<_, i64>(
            "
            SELECT DISTINCT follows.followee_snowflake
            FROM users.follows
            WHERE follows.follower_snowflake = ANY($1)
            ORDER BY follows.followee_snowflake
            ",
        )
        .bind(ids_to_db(users))
        .fetch_all(&self.pool)
        .await?;

        Ok(ids.into_iter().map(Id::from_db).collect())
    }

    async fn followed_among(
        &self,
        follower: UserId,
        candidates: &[UserId],
    ) -> Result<HashSet<UserId>> {
        if candidates.is_empty() {
            return Ok(HashSet::new());
        }

        let ids = query_scalar::<_, i64>(
            "
            SELECT follows.followee_snowflake
            FROM users.follows
            WHERE follows.follower_snowflake = $1 AND follows.followee_snowflake = ANY($2)
            ",
        )
        .bind(follower.to_db())
        .bind(ids_to_db(candidates))
        .fetch_all(&self.pool)
        .await?;

        Ok(ids.into_iter().map(Id::from_db).collect())
    }

    async fn count_follows(&self, user: UserId) -> Result<FollowCounts> {
        let (followers, following) = query_as::<_, (i64, i64)>(
            "
            SELECT
                (SELECT COUNT(*) FROM users.follows WHERE follows.followee_snowflake = $1),
                (SELECT COUNT(*) FROM users.follows WHERE follows.follower_snowflake = $1)
            ",
        )
        .bind(user.to_db())
        .fetch_one(&self.pool)
        .await?;

        Ok(FollowCounts {
            followers: count_from_db(followers),
            following: count_from_db(following),
        })
    }
}

#[async_trait]
impl PostStore for DbClient {
    #[instrument(skip(self, post))]
    async fn create_post(&self, creator: UserId, post: &CreatePost) -> Result<Post> {
        let (post_id, created_at): (PostId, _) = self.next_id();

        let record = query_as::<_, PostRecord>(&format!(
            "
            INSERT INTO posts.posts (post_snowflake, user_snowflake, media, caption, tags, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {POST_COLUMNS}
            "
        ))
        .bind(post_id.to_db())
        .bind(creator.to_db())
        .bind(Json(post.media()))
        .bind(post.caption())
        .bind(post.tags())
        .bind(created_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(record.into())
    }

    async fn fetch_post(&self, post_id: PostId) -> Result<Option<Post>> {
        let record = query_as::<_, PostRecord>(&format!(
            "
            SELECT {POST_COLUMNS}
            FROM posts.posts
            WHERE posts.post_snowflake = $1
            "
        ))
        .bind(post_id.to_db())
        .fetch_optional(&self.pool)
        .await?;

        Ok(record.map(Post::from))
    }

    async fn update_post(&self, post_id: PostId, update: &UpdatePost) -> Result<Option<Post>> {
        let tags = update.tags.clone().map(normalize_tags);

        let record = query_as::<_, PostRecord>(&format!(
            "
            UPDATE posts.posts SET
                caption = COALESCE($2, posts.caption),
                tags = COALESCE($3, posts.tags),
                is_archived = COALESCE($4, posts.is_archived)
            WHERE posts.post_snowflake = $1
            RETURNING {POST_COLUMNS}
            "
        ))
        .bind(post_id.to_db())
        .bind(update.caption.as_deref())
        .bind(tags)
        .bind(update.is_archived)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record.map(Post::from))
    }

    async fn delete_post(&self, post_id: PostId) -> Result<bool> {
        let result = query("DELETE FROM posts.posts WHERE posts.post_snowflake = $1")
            .bind(post_id.to_db())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn count_posts(&self, post_query: &PostQuery) -> Result<u64> {
        let mut builder = QueryBuilder::<Postgres>::new("SELECT COUNT(*)");
        push_post_source(&mut builder, post_query);

        let count: i64 = builder
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await?;
        Ok(count_from_db(count))
    }

    async fn fetch_posts(&self, post_query: &PostQuery, window: Window) -> Result<Vec<Post>> {
        let (offset, limit) = window_to_db(window);

        let mut builder = QueryBuilder::<Postgres>::new("SELECT ");
        builder.push(POST_COLUMNS);
        push_post_source(&mut builder, post_query);
        builder.push(" ORDER BY ");
        if let PostOrder::FollowedFirst { .. } = post_query.order {
            builder.push("(follows.follower_snowflake IS NOT NULL) DESC, ");
        }
        builder
            .push("posts.created_at DESC, posts.post_snowflake DESC")
            .push(" LIMIT ")
            .push_bind(limit)
            .push(" OFFSET ")
            .push_bind(offset);

        let records: Vec<PostRecord> = builder.build_query_as().fetch_all(&self.pool).await?;
        debug!(count = records.len(), ?post_query, "Fetched posts");

        Ok(records.into_iter().map(Post::from).collect())
    }
}

#[async_trait]
impl InteractionStore for DbClient {
    async fn add_engagement(
        &self,
        kind: EngagementKind,
        user: UserId,
        post: PostId,
    ) -> Result<()> {
        let table = engagement_table(kind);
        query(&format!(
            "
            INSERT INTO {table} (user_snowflake, post_snowflake, created_at)
            VALUES ($1, $2, $3)
            "
        ))
        .bind(user.to_db())
        .bind(post.to_db())
        .bind(OffsetDateTime::now_utc())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn remove_engagement(
        &self,
        kind: EngagementKind,
        user: UserId,
        post: PostId,
    ) -> Result<bool> {
        let table = engagement_table(kind);
        let result = query(&format!(
            "DELETE FROM {table} WHERE user_snowflake = $1 AND post_snowflake = $2"
        ))
        .bind(user.to_db())
        .bind(post.to_db())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn count_interactions(
        &self,
        kind: InteractionKind,
        posts: &[PostId],
    ) -> Result<HashMap<PostId, u64>> {
        if posts.is_empty() {
            return Ok(HashMap::new());
        }

        let table = interaction_table(kind);
        let rows = query_as::<_, (i64, i64)>(&format!(
            "
            SELECT post_snowflake, COUNT(*)
            FROM {table}
            WHERE post_snowflake = ANY($1)
            GROUP BY post_snowflake
            "
        ))
        .bind(ids_to_db(posts))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(post, count)| (Id::from_db(post), count_from_db(count)))
            .collect())
    }

    async fn interacted_posts(
        &self,
        kind: InteractionKind,
        user: UserId,
        posts: &[PostId],
    ) -> Result<HashSet<PostId>> {
        if posts.is_empty() {
            return Ok(HashSet::new());
        }

        let table = interaction_table(kind);
        let ids = query_scalar::<_, i64>(&format!(
            "
            SELECT DISTINCT post_snowflake
            FROM {table}
            WHERE user_snowflake = $1 AND post_snowflake = ANY($2)
            "
        ))
        .bind(user.to_db())
        .bind(ids_to_db(posts))
        .fetch_all(&self.pool)
        .await?;

        Ok(ids.into_iter().map(Id::from_db).collect())
    }
}

#[async_trait]
impl CommentStore for DbClient {
    async fn create_comment(&self, comment: &CreateComment) -> Result<Comment> {
        let (comment_id, created_at): (CommentId, _) = self.next_id();
        let mut transaction = self.pool.begin().await?;

        let record = query_as::<_, CommentRecord>(&format!(
            "
            INSERT INTO posts.comments
                (comment_snowflake, post_snowflake, user_snowflake, text, parent_comment_snowflake, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {COMMENT_COLUMNS}
            "
        ))
        .bind(comment_id.to_db())
        .bind(comment.post.to_db())
        .bind(comment.created_by.to_db())
        .bind(&comment.text)
        .bind(comment.parent_comment.map(Id::to_db))
        .bind(created_at)
        .fetch_one(&mut *transaction)
        .await?;

        query(
            "
            UPDATE posts.posts SET comment_count = posts.comment_count + 1
            WHERE posts.post_snowflake = $1
            ",
        )
        .bind(comment.post.to_db())
        .execute(&mut *transaction)
        .await?;

        transaction.commit().await?;
        Ok(record.into())
    }

    async fn fetch_comment(&self, comment_id: CommentId) -> Result<Option<Comment>> {
        let record = query_as::<_, CommentRecord>(&format!(
            "
            SELECT {COMMENT_COLUMNS}
            FROM posts.comments
            WHERE comments.comment_snowflake = $1
            "
        ))
        .bind(comment_id.to_db())
        .fetch_optional(&self.pool)
        .await?;

        Ok(record.map(Comment::from))
    }

    async fn update_comment(
        &self,
        comment_id: CommentId,
        text: &str,
    ) -> Result<Option<Comment>> {
        let record = query_as::<_, CommentRecord>(&format!(
            "
            UPDATE posts.comments SET text = $2
            WHERE comments.comment_snowflake = $1
            RETURNING {COMMENT_COLUMNS}
            "
        ))
        .bind(comment_id.to_db())
        .bind(text)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record.map(Comment::from))
    }

    async fn delete_comment(&self, comment_id: CommentId) -> Result<bool> {
        let mut transaction = self.pool.begin().await?;

        let post = query_scalar::<_, i64>(
            "
            DELETE FROM posts.comments
            WHERE comments.comment_snowflake = $1
            RETURNING comments.post_snowflake
            ",
        )
        .bind(comment_id.to_db())
        .fetch_optional(&mut *transaction)
        .await?;

        let Some(post) = post else {
            return Ok(false);
        };

        query(
            "
            UPDATE posts.posts SET comment_count = GREATEST(posts.comment_count - 1, 0)
            WHERE posts.post_snowflake = $1
            ",
        )
        .bind(post)
        .execute(&mut *transaction)
        .await?;

        transaction.commit().await?;
        Ok(true)
    }

    async fn count_comments(&self, post_id: PostId) -> Result<u64> {
        let count = query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM posts.comments WHERE comments.post_snowflake = $1",
        )
        .bind(post_id.to_db())
        .fetch_one(&self.pool)
        .await?;

        Ok(count_from_db(count))
    }

    async fn fetch_comments(&self, post_id: PostId, window: Window) -> Result<Vec<Comment>> {
        let (offset, limit) = window_to_db(window);

        let records = query_as::<_, CommentRecord>(&format!(
            "
            SELECT {COMMENT_COLUMNS}
            FROM posts.comments
            WHERE comments.post_snowflake = $1
            ORDER BY comments.created_at DESC, comments.comment_snowflake DESC
            LIMIT $2 OFFSET $3
            "
        ))
        .bind(post_id.to_db())
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(records.into_iter().map(Comment::from).collect())
    }
}

#[async_trait]
impl StoryStore for DbClient {
    async fn create_story(&self, creator: UserId, story: &CreateStory) -> Result<Story> {
        let (story_id, created_at): (StoryId, _) = self.next_id();

        let record = query_as::<_, StoryRecord>(&format!(
            "
            WITH stories AS (
                INSERT INTO stories.stories (story_snowflake, user_snowflake, media, caption, music, created_at)
                VALUES ($1, $2, $3, $4, $5, $6)
                RETURNING *
            )
            SELECT {STORY_COLUMNS}
            FROM stories
            "
        ))
        .bind(story_id.to_db())
        .bind(creator.to_db())
        .bind(Json(&story.media))
        .bind(&story.caption)
        .bind(story.music.as_deref())
        .bind(created_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(record.into())
    }

    async fn fetch_story(&self, story_id: StoryId) -> Result<Option<Story>> {
        let record = query_as::<_, StoryRecord>(&format!(
            "
            SELECT {STORY_COLUMNS}
            FROM stories.stories
            WHERE stories.story_snowflake = $1
            "
        ))
        .bind(story_id.to_db())
        .fetch_optional(&self.pool)
        .await?;

        Ok(record.map(Story::from))
    }

    async fn add_story_viewer(&self, story_id: StoryId, viewer: UserId) -> Result<bool> {
        let result = query(
            "
            INSERT INTO stories.viewers (story_snowflake, user_snowflake, viewed_at)
            VALUES ($1, $2, $3)
            ON CONFLICT DO NOTHING
            ",
        )
        .bind(story_id.to_db())
        .bind(viewer.to_db())
        .bind(OffsetDateTime::now_utc())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_story(&self, story_id: StoryId) -> Result<bool> {
        let result = query("DELETE FROM stories.stories WHERE stories.story_snowflake = $1")
            .bind(story_id.to_db())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn purge_stories(&self, cutoff: OffsetDateTime) -> Result<u64> {
        let result = query("DELETE FROM stories.stories WHERE stories.created_at <= $1")
            .bind(cutoff)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    async fn fetch_stories(&self, cutoff: OffsetDateTime) -> Result<Vec<Story>> {
        let records = query_as::<_, StoryRecord>(&format!(
            "
            SELECT {STORY_COLUMNS}
            FROM stories.stories
            WHERE stories.created_at > $1
            ORDER BY stories.created_at DESC, stories.story_snowflake DESC
            "
        ))
        .bind(cutoff)
        .fetch_all(&self.pool)
        .await?;

        Ok(records.into_iter().map(Story::from).collect())
    }
}

#[async_trait]
impl NotificationStore for DbClient {
    #[instrument(skip_all, fields(count = notifications.len()))]
    async fn insert_notifications(&self, notifications: &[CreateNotification]) -> Result<u64> {
        if notifications.is_empty() {
            return Ok(0);
        }

        let rows: Vec<(NotificationId, OffsetDateTime, &CreateNotification)> = notifications
            .iter()
            .map(|notification| {
                let (id, created_at) = self.next_id();
                (id, created_at, notification)
            })
            .collect();

        let mut builder = QueryBuilder::<Postgres>::new(
            "INSERT INTO notifications.notifications (
                notification_snowflake, recipient_snowflake, kind, actor_snowflake,
                post_snowflake, comment_snowflake, story_snowflake, message, created_at
            ) ",
        );
        builder.push_values(rows, |mut values, (id, created_at, notification)| {
            values
                .push_bind(id.to_db())
                .push_bind(notification.recipient.to_db())
                .push_bind(notification.kind.as_str())
                .push_bind(notification.actor.to_db())
                .push_bind(notification.post.map(Id::to_db))
                .push_bind(notification.comment.map(Id::to_db))
                .push_bind(notification.story.map(Id::to_db))
                .push_bind(notification.message.clone())
                .push_bind(created_at);
        });

        let result = builder.build().execute(&self.pool).await?;
        Ok(result.rows_affected())
    }

    async fn fetch_notification(
        &self,
        notification_id: NotificationId,
    ) -> Result<Option<Notification>> {
        let record = query_as::<_, NotificationRecord>(&format!(
            "
            SELECT {NOTIFICATION_COLUMNS}
            FROM notifications.notifications
            WHERE notifications.notification_snowflake = $1
            "
        ))
        .bind(notification_id.to_db())
        .fetch_optional(&self.pool)
        .await?;

        let notification = record.map(Notification::try_from).transpose()?;
        Ok(notification)
    }

    async fn count_notifications(&self, recipient: UserId) -> Result<u64> {
        let count = query_scalar::<_, i64>(
            "
            SELECT COUNT(*) FROM notifications.notifications
            WHERE notifications.recipient_snowflake = $1
            ",
        )
        .bind(recipient.to_db())
        .fetch_one(&self.pool)
        .await?;

        Ok(count_from_db(count))
    }

    async fn fetch_notifications(
        &self,
        recipient: UserId,
        window: Window,
    ) -> Result<Vec<Notification>> {
        let (offset, limit) = window_to_db(window);

        let records = query_as::<_, NotificationRecord>(&format!(
            "
            SELECT {NOTIFICATION_COLUMNS}
            FROM notifications.notifications
            WHERE notifications.recipient_snowflake = $1
            ORDER BY notifications.created_at DESC, notifications.notification_snowflake DESC
            LIMIT $2 OFFSET $3
            "
        ))
        .bind(recipient.to_db())
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        let notifications = records
            .into_iter()
            .map(Notification::try_from)
            .collect::<Result<_, _>>()?;
        Ok(notifications)
    }

    async fn mark_notification_read(&self, notification_id: NotificationId) -> Result<bool> {
        let result = query(
            "
            UPDATE notifications.notifications SET is_read = TRUE
            WHERE notifications.notification_snowflake = $1
            ",
        )
        .bind(notification_id.to_db())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn mark_all_notifications_read(&self, recipient: UserId) -> Result<u64> {
        let result = query(
            "
            UPDATE notifications.notifications SET is_read = TRUE
            WHERE notifications.recipient_snowflake = $1 AND NOT notifications.is_read
            ",
        )
        .bind(recipient.to_db())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    async fn delete_notification(&self, notification_id: NotificationId) -> Result<bool> {
        let result = query(
            "
            DELETE FROM notifications.notifications
            WHERE notifications.notification_snowflake = $1
            ",
        )
        .bind(notification_id.to_db())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl MessageStore for DbClient {
    async fn create_message(&self, message: &CreateMessage) -> Result<Message> {
        let (message_id, created_at): (MessageId, _) = self.next_id();

        let record = query_as::<_, MessageRecord>(&format!(
            "
            INSERT INTO messages.messages
                (message_snowflake, sender_snowflake, receiver_snowflake, text, file_url, chat_id, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {MESSAGE_COLUMNS}
            "
        ))
        .bind(message_id.to_db())
        .bind(message.sender.to_db())
        .bind(message.receiver.to_db())
        .bind(&message.text)
        .bind(&message.file_url)
        .bind(message.chat_id())
        .bind(created_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(record.into())
    }

    async fn count_messages(&self, chat_id: &str) -> Result<u64> {
        let count = query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM messages.messages WHERE messages.chat_id = $1",
        )
        .bind(chat_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count_from_db(count))
    }

    async fn fetch_messages(&self, chat_id: &str, window: Window) -> Result<Vec<Message>> {
        let (offset, limit) = window_to_db(window);

        let records = query_as::<_, MessageRecord>(&format!(
            "
            SELECT {MESSAGE_COLUMNS}
            FROM messages.messages
            WHERE messages.chat_id = $1
            ORDER BY messages.created_at DESC, messages.message_snowflake DESC
            LIMIT $2 OFFSET $3
            "
        ))
        .bind(chat_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(records.into_iter().map(Message::from).collect())
    }
}
