//! Postgres 后端（sqlx）
//!
//! - `PgOutboxWork`：包装调用者事务内的连接，在同一事务中插入
//!   Outbox 行与事件溯源行；
//! - `PgEventStorage`：面向发布循环与回放读取的存储实现，
//!   “已投递”编码为行删除。
//!
//! 表结构见 `MIGRATIONS`；本模块只使用运行期绑定查询，不依赖离线
//! 编译校验。
//!
use crate::record::{EventSourcingRecord, OutboxRecord};
use crate::store::{EventSourcingStore, OutboxStore};
use crate::work::OutboxWork;
use async_trait::async_trait;
use eventbox_core::error::{EventError, EventResult};
use eventbox_core::telemetry::TraceContext;
use serde_json::Value;
use sqlx::postgres::{PgConnection, PgPool};
use sqlx::Row;
use uuid::Uuid;

/// 建表语句（由上层的迁移机制执行）
pub const MIGRATIONS: &str = r#"
CREATE TABLE IF NOT EXISTS outbox_events (
    id         uuid PRIMARY KEY,
    event_type text        NOT NULL,
    event      jsonb       NOT NULL,
    trace      jsonb       NULL,
    created_at timestamptz NOT NULL
);
CREATE INDEX IF NOT EXISTS outbox_events_created_at_idx ON outbox_events (created_at);

CREATE TABLE IF NOT EXISTS event_sourcing (
    id         uuid PRIMARY KEY,
    root_id    text        NOT NULL,
    event_type text        NOT NULL,
    event      jsonb       NOT NULL,
    created_at timestamptz NOT NULL
);
CREATE INDEX IF NOT EXISTS event_sourcing_root_idx ON event_sourcing (root_id, created_at);
"#;

/// 业务事务内的写入面：持有调用者事务的连接
pub struct PgOutboxWork<'t> {
    conn: &'t mut PgConnection,
}

impl<'t> PgOutboxWork<'t> {
    pub fn new(conn: &'t mut PgConnection) -> Self {
        Self { conn }
    }
}

#[async_trait]
impl OutboxWork for PgOutboxWork<'_> {
    async fn insert_outbox(&mut self, records: &[OutboxRecord]) -> EventResult<()> {
        for record in records {
            let trace: Option<Value> = if record.trace().is_empty() {
                None
            } else {
                Some(serde_json::to_value(record.trace())?)
            };
            sqlx::query(
                "INSERT INTO outbox_events (id, event_type, event, trace, created_at) \
                 VALUES ($1, $2, $3, $4, $5)",
            )
            .bind(record.id())
            .bind(record.event_type())
            .bind(record.body())
            .bind(trace)
            .bind(record.created_at())
            .execute(&mut *self.conn)
            .await?;
        }
        Ok(())
    }

    async fn insert_event_sourcing(&mut self, records: &[EventSourcingRecord]) -> EventResult<()> {
        for record in records {
            sqlx::query(
                "INSERT INTO event_sourcing (id, root_id, event_type, event, created_at) \
                 VALUES ($1, $2, $3, $4, $5)",
            )
            .bind(record.id())
            .bind(record.root_id())
            .bind(record.event_type())
            .bind(record.body())
            .bind(record.created_at())
            .execute(&mut *self.conn)
            .await?;
        }
        Ok(())
    }
}

/// 面向连接池的存储实现
#[derive(Clone)]
pub struct PgEventStorage {
    pool: PgPool,
}

impl PgEventStorage {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl OutboxStore for PgEventStorage {
    async fn load_undelivered(&self, limit: usize) -> EventResult<Vec<OutboxRecord>> {
        let rows = sqlx::query(
            "SELECT id, event_type, event, trace, created_at FROM outbox_events \
             ORDER BY created_at ASC LIMIT $1",
        )
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| {
                let trace = match row.try_get::<Option<Value>, _>("trace")? {
                    Some(value) => serde_json::from_value::<TraceContext>(value)
                        .map_err(EventError::from)?,
                    None => TraceContext::empty(),
                };
                Ok(OutboxRecord::builder()
                    .id(row.try_get::<Uuid, _>("id")?)
                    .event_type(row.try_get::<String, _>("event_type")?)
                    .body(row.try_get::<Value, _>("event")?)
                    .created_at(row.try_get("created_at")?)
                    .trace(trace)
                    .build())
            })
            .collect()
    }

    async fn mark_delivered(&self, id: Uuid) -> EventResult<()> {
        sqlx::query("DELETE FROM outbox_events WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl EventSourcingStore for PgEventStorage {
    async fn read(&self, root_id: &str) -> EventResult<Vec<EventSourcingRecord>> {
        let rows = sqlx::query(
            "SELECT id, root_id, event_type, event, created_at FROM event_sourcing \
             WHERE root_id = $1 ORDER BY created_at ASC",
        )
        .bind(root_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| {
                Ok(EventSourcingRecord::builder()
                    .id(row.try_get::<Uuid, _>("id")?)
                    .root_id(row.try_get::<String, _>("root_id")?)
                    .event_type(row.try_get::<String, _>("event_type")?)
                    .body(row.try_get::<Value, _>("event")?)
                    .created_at(row.try_get("created_at")?)
                    .build())
            })
            .collect()
    }
}
