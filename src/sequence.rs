//! Business identifier sequences
//!
//! Loan numbers, invoice numbers and inventory item codes come from counters
//! in the `sequences` table. Each reservation is a single upsert that runs
//! inside the transaction creating the record: the row lock serializes
//! concurrent creators, and a rolled-back creation also rolls back its
//! increment, so numbers stay strictly increasing and gap-free.

use sqlx::PgConnection;

/// Prefix of every gold loan number
pub const LOAN_NUMBER_PREFIX: &str = "GL";

/// Number of zero-padded digits after a code prefix
pub const CODE_DIGITS: usize = 6;

/// A named counter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sequence<'a> {
    GoldLoan,
    Invoice,
    /// Item codes are numbered per prefix (`GO`, `SI`, ...)
    InventoryItem(&'a str),
}

impl Sequence<'_> {
    /// Row key in the `sequences` table
    pub fn key(&self) -> String {
        match self {
            Sequence::GoldLoan => "gold_loan".to_string(),
            Sequence::Invoice => "invoice".to_string(),
            Sequence::InventoryItem(prefix) => format!("inventory:{}", prefix),
        }
    }
}

/// Format `prefix` followed by `value` padded to [`CODE_DIGITS`] digits
pub fn format_code(prefix: &str, value: i64) -> String {
    format!("{}{:0width$}", prefix, value, width = CODE_DIGITS)
}

/// Reserve the next value of `sequence`, starting at 1
pub async fn reserve_next(conn: &mut PgConnection, sequence: Sequence<'_>) -> Result<i64, sqlx::Error> {
    let value = sqlx::query_scalar::<_, i64>(
        r#"
        INSERT INTO sequences (name, value)
        VALUES ($1, 1)
        ON CONFLICT (name) DO UPDATE SET value = sequences.value + 1
        RETURNING value
        "#,
    )
    .bind(sequence.key())
    .fetch_one(conn)
    .await?;

    tracing::debug!(sequence = %sequence.key(), value, "Reserved sequence value");

    Ok(value)
}
