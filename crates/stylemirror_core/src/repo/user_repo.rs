//! User and training-sample persistence.
//!
//! # Invariants
//! - Training samples are returned in insertion order.
//! - `add_training_responses` writes all samples or none.
//! - `replace_training_responses` swaps a user's samples and style analysis
//!   in one transaction.

use crate::model::user::{NewUser, TrainingResponse, TrainingSample, User, UserId};
use crate::repo::{bool_to_int, int_to_bool, RepoError, RepoResult};
use rusqlite::{params, Connection, OptionalExtension, Row};

const USER_SELECT_SQL: &str = "SELECT
    id,
    name,
    profession,
    style_analysis,
    autopilot_enabled,
    created_at
FROM users";

/// Repository interface for users and their training samples.
pub trait UserRepository {
    fn create_user(&self, user: &NewUser) -> RepoResult<UserId>;
    fn get_user(&self, id: UserId) -> RepoResult<Option<User>>;
    fn list_users(&self) -> RepoResult<Vec<User>>;
    fn update_style_analysis(&self, id: UserId, analysis: &str) -> RepoResult<()>;
    fn set_autopilot(&self, id: UserId, enabled: bool) -> RepoResult<()>;
    fn add_training_responses(
        &self,
        user_id: UserId,
        samples: &[TrainingSample],
    ) -> RepoResult<Vec<i64>>;
    /// Drops earlier samples, stores `samples` and sets `analysis`.
    fn replace_training_responses(
        &self,
        user_id: UserId,
        samples: &[TrainingSample],
        analysis: &str,
    ) -> RepoResult<Vec<i64>>;
    fn list_training_responses(&self, user_id: UserId) -> RepoResult<Vec<TrainingResponse>>;
}

/// SQLite-backed user repository.
pub struct SqliteUserRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteUserRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl UserRepository for SqliteUserRepository<'_> {
    fn create_user(&self, user: &NewUser) -> RepoResult<UserId> {
        user.validate()?;

        self.conn.execute(
            "INSERT INTO users (name, profession) VALUES (?1, ?2);",
            params![user.name.trim(), user.profession.trim()],
        )?;

        Ok(self.conn.last_insert_rowid())
    }

    fn get_user(&self, id: UserId) -> RepoResult<Option<User>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{USER_SELECT_SQL} WHERE id = ?1;"))?;
        let row = stmt.query_row([id], |row| Ok(parse_user_row(row))).optional()?;
        row.transpose()
    }

    fn list_users(&self) -> RepoResult<Vec<User>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{USER_SELECT_SQL} ORDER BY id ASC;"))?;
        let mut rows = stmt.query([])?;
        let mut users = Vec::new();
        while let Some(row) = rows.next()? {
            users.push(parse_user_row(row)?);
        }
        Ok(users)
    }

    fn update_style_analysis(&self, id: UserId, analysis: &str) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE users SET style_analysis = ?1 WHERE id = ?2;",
            params![analysis, id],
        )?;
        ensure_changed(changed, id)
    }

    fn set_autopilot(&self, id: UserId, enabled: bool) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE users SET autopilot_enabled = ?1 WHERE id = ?2;",
            params![bool_to_int(enabled), id],
        )?;
        ensure_changed(changed, id)
    }

    fn add_training_responses(
        &self,
        user_id: UserId,
        samples: &[TrainingSample],
    ) -> RepoResult<Vec<i64>> {
        for sample in samples {
            sample.validate()?;
        }

        // `Connection` is only borrowed here, so the transaction is unchecked.
        let tx = self.conn.unchecked_transaction()?;
        let ids = insert_samples(&tx, user_id, samples)?;
        tx.commit()?;

        Ok(ids)
    }

    fn replace_training_responses(
        &self,
        user_id: UserId,
        samples: &[TrainingSample],
        analysis: &str,
    ) -> RepoResult<Vec<i64>> {
        for sample in samples {
            sample.validate()?;
        }

        let tx = self.conn.unchecked_transaction()?;
        let changed = tx.execute(
            "UPDATE users SET style_analysis = ?1 WHERE id = ?2;",
            params![analysis, user_id],
        )?;
        // Dropping `tx` on the early return rolls back.
        ensure_changed(changed, user_id)?;
        tx.execute(
            "DELETE FROM training_responses WHERE user_id = ?1;",
            [user_id],
        )?;
        let ids = insert_samples(&tx, user_id, samples)?;
        tx.commit()?;

        Ok(ids)
    }

    fn list_training_responses(&self, user_id: UserId) -> RepoResult<Vec<TrainingResponse>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, user_id, question, response, created_at
             FROM training_responses
             WHERE user_id = ?1
             ORDER BY id ASC;",
        )?;
        let mut rows = stmt.query([user_id])?;
        let mut responses = Vec::new();
        while let Some(row) = rows.next()? {
            responses.push(TrainingResponse {
                id: row.get("id")?,
                user_id: row.get("user_id")?,
                question: row.get("question")?,
                response: row.get("response")?,
                created_at: row.get("created_at")?,
            });
        }
        Ok(responses)
    }
}

fn insert_samples(
    conn: &Connection,
    user_id: UserId,
    samples: &[TrainingSample],
) -> RepoResult<Vec<i64>> {
    let mut ids = Vec::with_capacity(samples.len());
    for sample in samples {
        conn.execute(
            "INSERT INTO training_responses (user_id, question, response)
             VALUES (?1, ?2, ?3);",
            params![user_id, sample.question.as_str(), sample.response.as_str()],
        )?;
        ids.push(conn.last_insert_rowid());
    }
    Ok(ids)
}

fn ensure_changed(changed: usize, id: UserId) -> RepoResult<()> {
    if changed == 0 {
        return Err(RepoError::NotFound { entity: "user", id });
    }
    Ok(())
}

fn parse_user_row(row: &Row<'_>) -> RepoResult<User> {
    Ok(User {
        id: row.get("id")?,
        name: row.get("name")?,
        profession: row.get("profession")?,
        style_analysis: row.get("style_analysis")?,
        autopilot_enabled: int_to_bool(
            "users.autopilot_enabled",
            row.get("autopilot_enabled")?,
        )?,
        created_at: row.get("created_at")?,
    })
}
