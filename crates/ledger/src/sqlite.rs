// In crates/ledger/src/sqlite.rs

use std::str::FromStr;
use std::time::Duration;

use app_config::DatabaseSettings;
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use core_types::{DecisionRecord, DecisionSymbol, LastAction, Ticker};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;

use crate::{stored_last_action, Error, Ledger, Result};

/// A wrapper around the `sqlx` SQLite connection pool.
#[derive(Debug, Clone)]
pub struct SqliteLedger(SqlitePool);

/// Opens the SQLite ledger and runs migrations.
///
/// # Arguments
///
/// * `settings`: The database configuration settings.
///
/// # Returns
///
/// A `Result` containing the `SqliteLedger` on success, or an `Error` on failure.
pub async fn connect(settings: &DatabaseSettings) -> Result<SqliteLedger> {
    let options = SqliteConnectOptions::from_str(&settings.url)
        .map_err(|source| Error::InvalidUrl {
            url: settings.url.clone(),
            source,
        })?
        .create_if_missing(true);

    // Idle connections are kept alive so an in-memory database survives
    // between queries.
    let pool = SqlitePoolOptions::new()
        .max_connections(settings.max_connections)
        .idle_timeout(None::<Duration>)
        .max_lifetime(None::<Duration>)
        .connect_with(options)
        .await?;

    sqlx::migrate!("../../migrations").run(&pool).await.map_err(Error::from)?;

    Ok(SqliteLedger(pool))
}

/// One row of the `decisions` table, as stored.
#[derive(Debug, sqlx::FromRow)]
struct DecisionRow {
    id: i64,
    timestamp: String,
    ticker: String,
    last_action: String,
    close: f64,
    sma: Option<f64>,
    rsi: Option<f64>,
    decision: String,
}

impl DecisionRow {
    fn into_record(self) -> std::result::Result<DecisionRecord, String> {
        let timestamp = DateTime::parse_from_rfc3339(&self.timestamp)
            .map_err(|e| format!("timestamp {:?}: {}", self.timestamp, e))?
            .with_timezone(&Utc);
        let last_action = self.last_action.parse::<LastAction>().map_err(|e| e.to_string())?;
        let decision = self.decision.parse::<DecisionSymbol>().map_err(|e| e.to_string())?;

        Ok(DecisionRecord {
            timestamp,
            ticker: Ticker(self.ticker),
            last_action,
            close: self.close,
            sma: self.sma,
            rsi: self.rsi,
            decision,
        })
    }
}

#[async_trait]
impl Ledger for SqliteLedger {
    fn name(&self) -> &'static str {
        "Sqlite"
    }

    async fn last_action(&self, ticker: &Ticker) -> Result<LastAction> {
        let latest: Option<(String,)> = sqlx::query_as(
            r#"
            SELECT decision FROM decisions
            WHERE ticker = ?
            ORDER BY id DESC
            LIMIT 1
            "#,
        )
        .bind(ticker.as_str())
        .fetch_optional(&self.0)
        .await
        .map_err(Error::OperationFailed)?;

        Ok(match latest {
            Some((raw,)) => stored_last_action(ticker, &raw),
            None => LastAction::None,
        })
    }

    async fn append(&self, record: &DecisionRecord) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO decisions (timestamp, ticker, last_action, close, sma, rsi, decision)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(record.timestamp.to_rfc3339_opts(SecondsFormat::Micros, true))
        .bind(record.ticker.as_str())
        .bind(record.last_action.as_str())
        .bind(record.close)
        .bind(record.sma)
        .bind(record.rsi)
        .bind(record.decision.as_str())
        .execute(&self.0)
        .await
        .map_err(Error::OperationFailed)?;

        tracing::debug!(ticker = %record.ticker, decision = %record.decision, "Appended decision record.");
        Ok(())
    }

    async fn history(&self, ticker: &Ticker, limit: usize) -> Result<Vec<DecisionRecord>> {
        let rows: Vec<DecisionRow> = sqlx::query_as(
            r#"
            SELECT id, timestamp, ticker, last_action, close, sma, rsi, decision
            FROM (
                SELECT * FROM decisions
                WHERE ticker = ?
                ORDER BY id DESC
                LIMIT ?
            )
            ORDER BY id ASC
            "#,
        )
        .bind(ticker.as_str())
        .bind(i64::try_from(limit).unwrap_or(i64::MAX))
        .fetch_all(&self.0)
        .await
        .map_err(Error::OperationFailed)?;

        let mut records = Vec::with_capacity(rows.len());
        for row in rows {
            let id = row.id;
            match row.into_record() {
                Ok(record) => records.push(record),
                Err(reason) => tracing::warn!(%ticker, id, %reason, "Skipping unreadable ledger row."),
            }
        }
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    async fn in_memory() -> SqliteLedger {
        connect(&DatabaseSettings {
            url: "sqlite::memory:".into(),
            max_connections: 1,
        })
        .await
        .unwrap()
    }

    fn record(ticker: &str, last_action: LastAction, decision: DecisionSymbol) -> DecisionRecord {
        DecisionRecord {
            timestamp: Utc.with_ymd_and_hms(2024, 6, 3, 13, 5, 0).unwrap(),
            ticker: Ticker::from(ticker),
            last_action,
            close: 37.91,
            sma: Some(37.8),
            rsi: None,
            decision,
        }
    }

    #[tokio::test]
    async fn malformed_url_is_reported_as_such() {
        let err = connect(&DatabaseSettings {
            url: "sqlite://ledger.db?mode=sometimes".into(),
            max_connections: 1,
        })
        .await
        .unwrap_err();

        assert!(matches!(&err, Error::InvalidUrl { url, .. } if url == "sqlite://ledger.db?mode=sometimes"));
        assert!(err.to_string().starts_with("Invalid ledger database URL"));
    }

    #[tokio::test]
    async fn unseen_ticker_reads_none() {
        let ledger = in_memory().await;
        assert_eq!(ledger.last_action(&Ticker::from("T")).await.unwrap(), LastAction::None);
    }

    #[tokio::test]
    async fn appended_decision_is_read_back() {
        let ledger = in_memory().await;
        let ticker = Ticker::from("T");

        ledger.append(&record("T", LastAction::None, DecisionSymbol::Buy)).await.unwrap();
        assert_eq!(
            ledger.last_action(&ticker).await.unwrap(),
            LastAction::Decided(DecisionSymbol::Buy)
        );

        ledger
            .append(&record("T", LastAction::Decided(DecisionSymbol::Buy), DecisionSymbol::Sell))
            .await
            .unwrap();
        assert_eq!(
            ledger.last_action(&ticker).await.unwrap(),
            LastAction::Decided(DecisionSymbol::Sell)
        );
    }

    #[tokio::test]
    async fn history_round_trips_every_column() {
        let ledger = in_memory().await;
        let first = record("T", LastAction::None, DecisionSymbol::NotBuy);
        let second = record("T", LastAction::Decided(DecisionSymbol::NotBuy), DecisionSymbol::Hold);
        ledger.append(&first).await.unwrap();
        ledger.append(&record("OTHER", LastAction::None, DecisionSymbol::Buy)).await.unwrap();
        ledger.append(&second).await.unwrap();

        let history = ledger.history(&Ticker::from("T"), 10).await.unwrap();
        assert_eq!(history, vec![first, second.clone()]);

        let latest = ledger.history(&Ticker::from("T"), 1).await.unwrap();
        assert_eq!(latest, vec![second]);
    }

    #[tokio::test]
    async fn corrupted_decision_reads_as_none() {
        let ledger = in_memory().await;
        ledger.append(&record("T", LastAction::None, DecisionSymbol::Buy)).await.unwrap();

        sqlx::query(
            "INSERT INTO decisions (timestamp, ticker, last_action, close, decision) \
             VALUES ('2024-06-03T13:10:00Z', 'T', 'BUY', 38.0, 'maybe later')",
        )
        .execute(&ledger.0)
        .await
        .unwrap();

        let ticker = Ticker::from("T");
        assert_eq!(ledger.last_action(&ticker).await.unwrap(), LastAction::None);
        // The unreadable row is skipped, the valid one is still listed.
        assert_eq!(ledger.history(&ticker, 10).await.unwrap().len(), 1);
    }
}
