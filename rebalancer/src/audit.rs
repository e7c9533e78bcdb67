//! JSONL audit trail logging.
//!
//! Each rebalancer run appends events to an audit.jsonl file,
//! one JSON object per line.

use std::fs::{self, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::json;
use wholeshare::{BalanceResult, Plan};
use wholeshare_broker::{Account, OrderId};

use crate::error::Result;

/// An audit event written to the JSONL trail.
#[derive(Debug, Clone, Serialize)]
pub struct AuditEvent {
    pub event: &'static str,
    pub ts: DateTime<Utc>,
    #[serde(flatten)]
    pub data: serde_json::Value,
}

/// Append-only audit logger.
pub struct AuditLog {
    writer: BufWriter<std::fs::File>,
}

impl AuditLog {
    /// Open (or create) the audit log file for appending.
    pub fn open(path: &Path) -> Result<Self> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new().create(true).append(true).open(path)?;

        Ok(Self {
            writer: BufWriter::new(file),
        })
    }

    /// Log an event with arbitrary JSON data.
    pub fn log(&mut self, event: &'static str, data: serde_json::Value) -> Result<()> {
        let entry = AuditEvent {
            event,
            ts: Utc::now(),
            data,
        };
        let json = serde_json::to_string(&entry)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        writeln!(self.writer, "{json}")?;
        self.writer.flush()?;
        Ok(())
    }
}

fn plan_json(plan: &Plan) -> serde_json::Value {
    plan.iter()
        .map(|(t, s)| (t.as_str().to_string(), json!(s)))
        .collect::<serde_json::Map<_, _>>()
        .into()
}

pub fn log_run_started(audit: &mut AuditLog, mode: &str, account: &Account) -> Result<()> {
    audit.log(
        "run_started",
        json!({
            "mode": mode,
            "account": account.masked(),
        }),
    )
}

pub fn log_positions(audit: &mut AuditLog, account: &Account) -> Result<()> {
    let positions: Vec<_> = account
        .positions
        .iter()
        .map(|p| {
            json!({
                "ticker": p.ticker.as_str(),
                "qty": p.quantity,
                "market_value": p.market_value,
            })
        })
        .collect();

    audit.log(
        "positions_fetched",
        json!({
            "positions": positions,
            "cash": account.cash,
            "account_value": account.account_value,
        }),
    )
}

pub fn log_plan(audit: &mut AuditLog, result: &BalanceResult) -> Result<()> {
    audit.log(
        "plan_computed",
        json!({
            "trades": plan_json(&result.plan),
            "cash_after": result.cash,
        }),
    )
}

pub fn log_confirmation(audit: &mut AuditLog, approved: bool) -> Result<()> {
    audit.log("user_confirmed", json!({ "approved": approved }))
}

pub fn log_order_submitted(audit: &mut AuditLog, plan: &Plan, id: &OrderId) -> Result<()> {
    audit.log(
        "order_submitted",
        json!({
            "order_id": id.to_string(),
            "trades": plan_json(plan),
        }),
    )
}

pub fn log_run_completed(audit: &mut AuditLog, outcome: &str) -> Result<()> {
    audit.log("run_completed", json!({ "outcome": outcome }))
}
