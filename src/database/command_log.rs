use chrono::{DateTime, Utc};
use sqlx::{Row, SqlitePool};

use crate::error::Result;
use crate::models::{CommandLog, CommandLogStatus};

/// Create a `running` command log row, returning its id
pub async fn create_command_log(
    pool: &SqlitePool,
    command: &str,
    cmd_options: Option<&str>,
    started: DateTime<Utc>,
) -> Result<i64> {
    let id = sqlx::query_scalar::<_, i64>(
        r#"
        INSERT INTO command_log (command, cmd_options, status, started)
        VALUES (?, ?, ?, ?)
        RETURNING id
        "#,
    )
    .bind(command)
    .bind(cmd_options)
    .bind(CommandLogStatus::Running.as_str())
    .bind(started)
    .fetch_one(pool)
    .await?;
    Ok(id)
}

/// Store the final status and captured log of a run
pub async fn finish_command_log(
    pool: &SqlitePool,
    id: i64,
    status: CommandLogStatus,
    log: Option<&str>,
    completed: DateTime<Utc>,
) -> Result<()> {
    sqlx::query(
        r#"
        UPDATE command_log
        SET status = ?, log = COALESCE(?, log), completed = ?
        WHERE id = ?
        "#,
    )
    .bind(status.as_str())
    .bind(log)
    .bind(completed)
    .bind(id)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn get_command_log(pool: &SqlitePool, id: i64) -> Result<Option<CommandLog>> {
    let row = sqlx::query(
        r#"
        SELECT id, command, cmd_options, status, log, started, completed
        FROM command_log
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(|r| {
        let status: String = r.get("status");
        CommandLog {
            id: r.get("id"),
            command: r.get("command"),
            cmd_options: r.get("cmd_options"),
            status: CommandLogStatus::parse(&status).unwrap_or(CommandLogStatus::Failed),
            log: r.get("log"),
            started: r.get("started"),
            completed: r.get("completed"),
        }
    }))
}

/// The most recent run first
pub async fn recent_command_logs(pool: &SqlitePool, limit: i64) -> Result<Vec<CommandLog>> {
    let ids = sqlx::query_scalar::<_, i64>("SELECT id FROM command_log ORDER BY id DESC LIMIT ?")
        .bind(limit)
        .fetch_all(pool)
        .await?;

    let mut logs = Vec::with_capacity(ids.len());
    for id in ids {
        if let Some(log) = get_command_log(pool, id).await? {
            logs.push(log);
        }
    }
    Ok(logs)
}
