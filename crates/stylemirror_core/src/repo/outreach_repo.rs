//! Message and communication-opportunity persistence.
//!
//! # Invariants
//! - Opportunities are listed by importance (highest first), then id.
//! - Messages are listed newest first.
//! - Status updates touching no row return `RepoError::NotFound`.
//! - `record_opportunities` never duplicates a pending trigger per customer.

use crate::model::customer::CustomerId;
use crate::model::outreach::{
    validate_importance, CommunicationOpportunity, Message, MessageId, MessageKind,
    MessageStatus, NewMessage, NewOpportunity, OpportunityId, OpportunityStatus, Timing,
};
use crate::repo::{parse_column, RepoError, RepoResult};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};

const OPPORTUNITY_SELECT_SQL: &str = "SELECT
    id,
    customer_id,
    \"trigger\",
    timing,
    medium,
    reference,
    importance,
    status,
    created_at
FROM communication_opportunities";

/// Query options for listing opportunities.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OpportunityListQuery {
    /// Restricts results to one customer when set.
    pub customer_id: Option<CustomerId>,
    pub status: Option<OpportunityStatus>,
    pub limit: Option<u32>,
}

/// Repository interface for drafted messages and opportunities.
pub trait OutreachRepository {
    fn create_message(&self, message: &NewMessage) -> RepoResult<MessageId>;
    fn get_message(&self, id: MessageId) -> RepoResult<Option<Message>>;
    fn list_messages(&self, customer_id: CustomerId) -> RepoResult<Vec<Message>>;
    fn update_message_status(&self, id: MessageId, status: MessageStatus) -> RepoResult<()>;
    fn create_opportunity(&self, opportunity: &NewOpportunity) -> RepoResult<OpportunityId>;
    /// Stores a batch in one transaction and returns one id per entry.
    ///
    /// A pending entry whose trigger matches an existing pending opportunity of
    /// the same customer (case-insensitive) reuses that row instead.
    fn record_opportunities(
        &self,
        opportunities: &[NewOpportunity],
    ) -> RepoResult<Vec<OpportunityId>>;
    fn get_opportunity(&self, id: OpportunityId) -> RepoResult<Option<CommunicationOpportunity>>;
    fn list_opportunities(
        &self,
        query: &OpportunityListQuery,
    ) -> RepoResult<Vec<CommunicationOpportunity>>;
    fn update_opportunity_status(
        &self,
        id: OpportunityId,
        status: OpportunityStatus,
    ) -> RepoResult<()>;
}

/// SQLite-backed outreach repository.
pub struct SqliteOutreachRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteOutreachRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl OutreachRepository for SqliteOutreachRepository<'_> {
    fn create_message(&self, message: &NewMessage) -> RepoResult<MessageId> {
        message.validate()?;

        self.conn.execute(
            "INSERT INTO messages (customer_id, content, type, status) VALUES (?1, ?2, ?3, ?4);",
            params![
                message.customer_id,
                message.content.as_str(),
                message.kind.as_str(),
                message.status.as_str(),
            ],
        )?;

        Ok(self.conn.last_insert_rowid())
    }

    fn get_message(&self, id: MessageId) -> RepoResult<Option<Message>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, customer_id, content, type, status, created_at
             FROM messages
             WHERE id = ?1;",
        )?;
        let mut rows = stmt.query([id])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_message_row(row)?));
        }
        Ok(None)
    }

    fn list_messages(&self, customer_id: CustomerId) -> RepoResult<Vec<Message>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, customer_id, content, type, status, created_at
             FROM messages
             WHERE customer_id = ?1
             ORDER BY created_at DESC, id DESC;",
        )?;
        let mut rows = stmt.query([customer_id])?;
        let mut messages = Vec::new();
        while let Some(row) = rows.next()? {
            messages.push(parse_message_row(row)?);
        }
        Ok(messages)
    }

    fn update_message_status(&self, id: MessageId, status: MessageStatus) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE messages SET status = ?1 WHERE id = ?2;",
            params![status.as_str(), id],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: "message",
                id,
            });
        }
        Ok(())
    }

    fn create_opportunity(&self, opportunity: &NewOpportunity) -> RepoResult<OpportunityId> {
        opportunity.validate()?;
        insert_opportunity(self.conn, opportunity)
    }

    fn record_opportunities(
        &self,
        opportunities: &[NewOpportunity],
    ) -> RepoResult<Vec<OpportunityId>> {
        for opportunity in opportunities {
            opportunity.validate()?;
        }

        let tx = self.conn.unchecked_transaction()?;
        let mut ids = Vec::with_capacity(opportunities.len());
        for opportunity in opportunities {
            let existing = if opportunity.status == OpportunityStatus::Pending {
                tx.query_row(
                    "SELECT id FROM communication_opportunities
                     WHERE customer_id = ?1
                       AND status = ?2
                       AND \"trigger\" = ?3 COLLATE NOCASE
                     ORDER BY id ASC
                     LIMIT 1;",
                    params![
                        opportunity.customer_id,
                        OpportunityStatus::Pending.as_str(),
                        opportunity.trigger.trim(),
                    ],
                    |row| row.get::<_, OpportunityId>(0),
                )
                .optional()?
            } else {
                None
            };

            let id = match existing {
                Some(id) => id,
                None => insert_opportunity(&tx, opportunity)?,
            };
            if !ids.contains(&id) {
                ids.push(id);
            }
        }
        tx.commit()?;

        Ok(ids)
    }

    fn get_opportunity(&self, id: OpportunityId) -> RepoResult<Option<CommunicationOpportunity>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{OPPORTUNITY_SELECT_SQL} WHERE id = ?1;"))?;
        let row = stmt
            .query_row([id], |row| Ok(parse_opportunity_row(row)))
            .optional()?;
        row.transpose()
    }

    fn list_opportunities(
        &self,
        query: &OpportunityListQuery,
    ) -> RepoResult<Vec<CommunicationOpportunity>> {
        let mut sql = format!("{OPPORTUNITY_SELECT_SQL} WHERE 1 = 1");
        let mut bind_values: Vec<Value> = Vec::new();

        if let Some(customer_id) = query.customer_id {
            sql.push_str(" AND customer_id = ?");
            bind_values.push(Value::Integer(customer_id));
        }

        if let Some(status) = query.status {
            sql.push_str(" AND status = ?");
            bind_values.push(Value::Text(status.as_str().to_string()));
        }

        sql.push_str(" ORDER BY importance DESC, id ASC");

        if let Some(limit) = query.limit {
            sql.push_str(" LIMIT ?");
            bind_values.push(Value::Integer(i64::from(limit)));
        }

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut opportunities = Vec::new();
        while let Some(row) = rows.next()? {
            opportunities.push(parse_opportunity_row(row)?);
        }
        Ok(opportunities)
    }

    fn update_opportunity_status(
        &self,
        id: OpportunityId,
        status: OpportunityStatus,
    ) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE communication_opportunities SET status = ?1 WHERE id = ?2;",
            params![status.as_str(), id],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: "opportunity",
                id,
            });
        }
        Ok(())
    }
}

fn insert_opportunity(
    conn: &Connection,
    opportunity: &NewOpportunity,
) -> RepoResult<OpportunityId> {
    conn.execute(
        "INSERT INTO communication_opportunities (
            customer_id,
            \"trigger\",
            timing,
            medium,
            reference,
            importance,
            status
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7);",
        params![
            opportunity.customer_id,
            opportunity.trigger.trim(),
            opportunity.timing.as_str(),
            opportunity.medium.as_str(),
            opportunity.reference.as_str(),
            i64::from(opportunity.importance),
            opportunity.status.as_str(),
        ],
    )?;

    Ok(conn.last_insert_rowid())
}

fn parse_message_row(row: &Row<'_>) -> RepoResult<Message> {
    let kind_text: String = row.get("type")?;
    let status_text: String = row.get("status")?;

    Ok(Message {
        id: row.get("id")?,
        customer_id: row.get("customer_id")?,
        content: row.get("content")?,
        kind: parse_column("messages.type", &kind_text, MessageKind::parse)?,
        status: parse_column("messages.status", &status_text, MessageStatus::parse)?,
        created_at: row.get("created_at")?,
    })
}

fn parse_opportunity_row(row: &Row<'_>) -> RepoResult<CommunicationOpportunity> {
    let timing_text: String = row.get("timing")?;
    let medium_text: String = row.get("medium")?;
    let status_text: String = row.get("status")?;
    let importance_value: i64 = row.get("importance")?;
    let importance = validate_importance(importance_value).map_err(|_| {
        RepoError::InvalidData(format!(
            "importance `{importance_value}` out of range in communication_opportunities.importance"
        ))
    })?;

    Ok(CommunicationOpportunity {
        id: row.get("id")?,
        customer_id: row.get("customer_id")?,
        trigger: row.get("trigger")?,
        timing: parse_column(
            "communication_opportunities.timing",
            &timing_text,
            Timing::parse,
        )?,
        medium: parse_column(
            "communication_opportunities.medium",
            &medium_text,
            MessageKind::parse,
        )?,
        reference: row.get("reference")?,
        importance,
        status: parse_column(
            "communication_opportunities.status",
            &status_text,
            OpportunityStatus::parse,
        )?,
        created_at: row.get("created_at")?,
    })
}
