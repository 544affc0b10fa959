//! Customer and customer-note persistence.
//!
//! # Invariants
//! - Customers always belong to an existing user (foreign key).
//! - Notes are listed oldest first so prompts read chronologically.

use crate::model::customer::{Customer, CustomerId, CustomerNote, NewCustomer, NoteId};
use crate::model::require_text;
use crate::model::user::UserId;
use crate::repo::{RepoError, RepoResult};
use rusqlite::{params, Connection, OptionalExtension, Row};

const CUSTOMER_SELECT_SQL: &str = "SELECT
    id,
    user_id,
    name,
    phone,
    email,
    created_at
FROM customers";

/// Repository interface for customers and their notes.
pub trait CustomerRepository {
    fn create_customer(&self, customer: &NewCustomer) -> RepoResult<CustomerId>;
    fn get_customer(&self, id: CustomerId) -> RepoResult<Option<Customer>>;
    fn list_customers(&self, user_id: UserId) -> RepoResult<Vec<Customer>>;
    fn add_note(&self, customer_id: CustomerId, content: &str) -> RepoResult<NoteId>;
    fn list_notes(&self, customer_id: CustomerId) -> RepoResult<Vec<CustomerNote>>;
}

/// SQLite-backed customer repository.
pub struct SqliteCustomerRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteCustomerRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl CustomerRepository for SqliteCustomerRepository<'_> {
    fn create_customer(&self, customer: &NewCustomer) -> RepoResult<CustomerId> {
        customer.validate()?;

        self.conn.execute(
            "INSERT INTO customers (user_id, name, phone, email) VALUES (?1, ?2, ?3, ?4);",
            params![
                customer.user_id,
                customer.name.trim(),
                normalize_contact(customer.phone.as_deref()),
                normalize_contact(customer.email.as_deref()),
            ],
        )?;

        Ok(self.conn.last_insert_rowid())
    }

    fn get_customer(&self, id: CustomerId) -> RepoResult<Option<Customer>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{CUSTOMER_SELECT_SQL} WHERE id = ?1;"))?;
        let customer = stmt.query_row([id], parse_customer_row).optional()?;
        Ok(customer)
    }

    fn list_customers(&self, user_id: UserId) -> RepoResult<Vec<Customer>> {
        let mut stmt = self.conn.prepare(&format!(
            "{CUSTOMER_SELECT_SQL} WHERE user_id = ?1 ORDER BY name COLLATE NOCASE ASC, id ASC;"
        ))?;
        let customers = stmt
            .query_map([user_id], parse_customer_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(customers)
    }

    fn add_note(&self, customer_id: CustomerId, content: &str) -> RepoResult<NoteId> {
        require_text("content", content)?;
        if !customer_exists(self.conn, customer_id)? {
            return Err(RepoError::NotFound {
                entity: "customer",
                id: customer_id,
            });
        }

        self.conn.execute(
            "INSERT INTO customer_notes (customer_id, content) VALUES (?1, ?2);",
            params![customer_id, content.trim()],
        )?;

        Ok(self.conn.last_insert_rowid())
    }

    fn list_notes(&self, customer_id: CustomerId) -> RepoResult<Vec<CustomerNote>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, customer_id, content, created_at
             FROM customer_notes
             WHERE customer_id = ?1
             ORDER BY created_at ASC, id ASC;",
        )?;
        let notes = stmt
            .query_map([customer_id], |row| {
                Ok(CustomerNote {
                    id: row.get("id")?,
                    customer_id: row.get("customer_id")?,
                    content: row.get("content")?,
                    created_at: row.get("created_at")?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(notes)
    }
}

fn parse_customer_row(row: &Row<'_>) -> rusqlite::Result<Customer> {
    Ok(Customer {
        id: row.get("id")?,
        user_id: row.get("user_id")?,
        name: row.get("name")?,
        phone: row.get("phone")?,
        email: row.get("email")?,
        created_at: row.get("created_at")?,
    })
}

fn normalize_contact(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}

fn customer_exists(conn: &Connection, id: CustomerId) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM customers WHERE id = ?1);",
        [id],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}
