use std::collections::HashMap;
use std::io::Write;

use anyhow::{bail, Result};
use chrono::NaiveDate;
use serde::Serialize;

use crate::application::FinanceService;
use crate::domain::{format_cents, Kind, MonthYear, OwnerId};
use crate::storage::TransactionFilter;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Json,
}

impl ExportFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Json => "json",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "csv" => Some(ExportFormat::Csv),
            "json" => Some(ExportFormat::Json),
            _ => None,
        }
    }
}

/// Transaction row as exported, with the category resolved to its name.
#[derive(Debug, Clone, Serialize)]
pub struct TransactionRecord {
    pub id: String,
    pub date: NaiveDate,
    pub kind: Kind,
    pub category: String,
    pub description: String,
    pub amount_cents: i64,
    pub amount: String,
}

/// Writes report data for one user as CSV or JSON.
pub struct Exporter<'a> {
    service: &'a FinanceService,
    owner: OwnerId,
}

impl<'a> Exporter<'a> {
    pub fn new(service: &'a FinanceService, owner: OwnerId) -> Self {
        Self { service, owner }
    }

    /// Export the monthly income/expense trend ending at `end`.
    pub async fn export_trend<W: Write>(
        &self,
        writer: W,
        months: usize,
        end: MonthYear,
        format: ExportFormat,
    ) -> Result<usize> {
        let points = self.service.trend(self.owner, months, end).await?;

        if format == ExportFormat::Json {
            write_json(writer, &points)?;
            return Ok(points.len());
        }

        let mut csv_writer = csv::Writer::from_writer(writer);
        csv_writer.write_record(["month", "income_cents", "expense_cents", "savings_cents"])?;
        for point in &points {
            csv_writer.write_record(&[
                point.period.to_string(),
                point.income_total.to_string(),
                point.expense_total.to_string(),
                point.savings.to_string(),
            ])?;
        }

        csv_writer.flush()?;
        Ok(points.len())
    }

    /// Export per-category totals between `start` and `end`.
    pub async fn export_breakdown<W: Write>(
        &self,
        writer: W,
        kind: Kind,
        start: NaiveDate,
        end: NaiveDate,
        format: ExportFormat,
    ) -> Result<usize> {
        let totals = self
            .service
            .category_breakdown(self.owner, kind, start, end)
            .await?;

        if format == ExportFormat::Json {
            write_json(writer, &totals)?;
            return Ok(totals.len());
        }

        let mut csv_writer = csv::Writer::from_writer(writer);
        csv_writer.write_record(["category", "icon", "color", "total_cents", "total"])?;
        for total in &totals {
            csv_writer.write_record(&[
                total.name.clone(),
                total.icon.clone(),
                total.color.clone(),
                total.total.to_string(),
                format_cents(total.total),
            ])?;
        }

        csv_writer.flush()?;
        Ok(totals.len())
    }

    /// Export transactions matching `filter`, newest first.
    pub async fn export_transactions<W: Write>(
        &self,
        writer: W,
        filter: &TransactionFilter,
        format: ExportFormat,
    ) -> Result<usize> {
        let transactions = self.service.list_transactions(self.owner, filter).await?;
        let names: HashMap<_, _> = self
            .service
            .list_categories(self.owner)
            .await?
            .into_iter()
            .map(|c| (c.id, c.name))
            .collect();

        let mut records = Vec::with_capacity(transactions.len());
        for tx in &transactions {
            let Some(category) = names.get(&tx.category) else {
                bail!(
                    "transaction {} references missing category {}",
                    tx.id,
                    tx.category
                );
            };
            records.push(TransactionRecord {
                id: tx.id.to_string(),
                date: tx.occurred_on,
                kind: tx.kind,
                category: category.clone(),
                description: tx.description.clone(),
                amount_cents: tx.amount_cents,
                amount: format_cents(tx.amount_cents),
            });
        }

        if format == ExportFormat::Json {
            write_json(writer, &records)?;
            return Ok(records.len());
        }

        let mut csv_writer = csv::Writer::from_writer(writer);
        for record in &records {
            csv_writer.serialize(record)?;
        }

        csv_writer.flush()?;
        Ok(records.len())
    }
}

fn write_json<W: Write, T: Serialize + ?Sized>(mut writer: W, value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    writer.write_all(json.as_bytes())?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    Ok(())
}
