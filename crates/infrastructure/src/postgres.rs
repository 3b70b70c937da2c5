use async_trait::async_trait;
use domain::{
    Message, MessageKind, MessageLimit, MessageRepository, MessageText, Participant,
    ParticipantName, ParticipantRepository, RepositoryError, RepositoryResult, Timestamp,
    BROADCAST_TARGET,
};
use sqlx::{postgres::PgPoolOptions, FromRow, PgPool};

pub(crate) fn map_sqlx_err(err: sqlx::Error) -> RepositoryError {
    RepositoryError::storage(err.to_string())
}

fn invalid_data(message: impl Into<String>) -> RepositoryError {
    RepositoryError::storage(message)
}

#[derive(Debug, FromRow)]
struct ParticipantRecord {
    name: String,
    last_seen: i64,
}

impl TryFrom<ParticipantRecord> for Participant {
    type Error = RepositoryError;

    fn try_from(value: ParticipantRecord) -> Result<Self, Self::Error> {
        let name =
            ParticipantName::parse(value.name).map_err(|err| invalid_data(err.to_string()))?;
        Ok(Participant {
            name,
            last_seen: value.last_seen,
        })
    }
}

#[derive(Debug, FromRow)]
struct MessageRecord {
    from_name: String,
    to_name: String,
    text: String,
    kind: String,
    time: String,
    created_at: i64,
}

impl TryFrom<MessageRecord> for Message {
    type Error = RepositoryError;

    fn try_from(value: MessageRecord) -> Result<Self, Self::Error> {
        let text = MessageText::parse(value.text).map_err(|err| invalid_data(err.to_string()))?;
        let kind = value
            .kind
            .parse::<MessageKind>()
            .map_err(|err| invalid_data(err.to_string()))?;

        Ok(Message {
            from: value.from_name,
            to: value.to_name,
            text,
            kind,
            time: value.time,
            created_at: value.created_at,
        })
    }
}

#[derive(Clone)]
pub struct PgParticipantRepository {
    pool: PgPool,
}

impl PgParticipantRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ParticipantRepository for PgParticipantRepository {
    async fn insert(&self, participant: Participant) -> RepositoryResult<Participant> {
        // ON CONFLICT 让唯一性检查与插入在同一条语句内完成
        let record = sqlx::query_as::<_, ParticipantRecord>(
            r#"
            INSERT INTO participants (name, last_seen)
            VALUES ($1, $2)
            ON CONFLICT (name) DO NOTHING
            RETURNING name, last_seen
            "#,
        )
        .bind(participant.name.as_str())
        .bind(participant.last_seen)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_err)?
        .ok_or(RepositoryError::Conflict)?;

        Participant::try_from(record)
    }

    async fn find(&self, name: &str) -> RepositoryResult<Option<Participant>> {
        let record = sqlx::query_as::<_, ParticipantRecord>(
            "SELECT name, last_seen FROM participants WHERE name = $1",
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        record.map(Participant::try_from).transpose()
    }

    async fn list(&self) -> RepositoryResult<Vec<Participant>> {
        let records = sqlx::query_as::<_, ParticipantRecord>(
            "SELECT name, last_seen FROM participants ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        records.into_iter().map(Participant::try_from).collect()
    }

    async fn touch(&self, name: &str, at: Timestamp) -> RepositoryResult<()> {
        let result = sqlx::query("UPDATE participants SET last_seen = $2 WHERE name = $1")
            .bind(name)
            .bind(at)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_err)?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    async fn delete_stale(&self, threshold: Timestamp) -> RepositoryResult<Option<Participant>> {
        // SKIP LOCKED 保证并发的清理不会选中同一行
        let record = sqlx::query_as::<_, ParticipantRecord>(
            r#"
            DELETE FROM participants
            WHERE name = (
                SELECT name FROM participants
                WHERE last_seen < $1
                ORDER BY last_seen, name
                LIMIT 1
                FOR UPDATE SKIP LOCKED
            )
            RETURNING name, last_seen
            "#,
        )
        .bind(threshold)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        record.map(Participant::try_from).transpose()
    }
}

#[derive(Clone)]
pub struct PgMessageRepository {
    pool: PgPool,
}

impl PgMessageRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MessageRepository for PgMessageRepository {
    async fn insert(&self, message: Message) -> RepositoryResult<()> {
        sqlx::query(
            r#"
            INSERT INTO messages (from_name, to_name, text, kind, time, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(&message.from)
        .bind(&message.to)
        .bind(message.text.as_str())
        .bind(message.kind.as_str())
        .bind(&message.time)
        .bind(message.created_at)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        Ok(())
    }

    async fn query_visible(
        &self,
        viewer: &str,
        limit: MessageLimit,
    ) -> RepositoryResult<Vec<Message>> {
        let records = sqlx::query_as::<_, MessageRecord>(
            r#"
            SELECT from_name, to_name, text, kind, time, created_at
            FROM messages
            WHERE to_name = $1 OR from_name = $1 OR to_name = $2 OR kind = $3
            ORDER BY id DESC
            LIMIT $4
            "#,
        )
        .bind(viewer)
        .bind(BROADCAST_TARGET)
        .bind(MessageKind::Message.as_str())
        .bind(i64::from(limit.get()))
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        records.into_iter().map(Message::try_from).collect()
    }
}

pub async fn create_pg_pool(
    database_url: &str,
    max_connections: u32,
) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await
}
