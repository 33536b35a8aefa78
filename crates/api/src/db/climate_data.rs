use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use time::Date;
use utoipa::ToSchema;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Failed to query sqlite: {0}")]
    Query(#[from] sqlx::Error),
    #[error("Stored date '{value}' in {table} is not a YYYY-MM-DD date")]
    StoredDate { table: &'static str, value: String },
    #[error("Table {table} is missing required columns: {}", .missing.join(", "))]
    MissingColumns {
        table: &'static str,
        missing: Vec<String>,
    },
}

/// Inclusive date bounds for a measurement query; `end: None` is open ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: Date,
    pub end: Option<Date>,
}

impl DateRange {
    pub fn starting(start: Date) -> Self {
        Self { start, end: None }
    }

    pub fn between(start: Date, end: Date) -> Self {
        Self {
            start,
            end: Some(end),
        }
    }

    pub fn contains(&self, date: Date) -> bool {
        date >= self.start && self.end.is_none_or(|end| date <= end)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Precipitation {
    pub date: Date,
    pub prcp: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TemperatureObservation {
    pub date: Date,
    pub tobs: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, ToSchema)]
pub struct TemperatureSummary {
    pub min: f64,
    pub max: f64,
    pub avg: f64,
}

impl TemperatureSummary {
    /// SQL aggregates come back all NULL when no row matched.
    pub fn from_aggregates(min: Option<f64>, max: Option<f64>, avg: Option<f64>) -> Option<Self> {
        match (min, max, avg) {
            (Some(min), Some(max), Some(avg)) => Some(Self { min, max, avg }),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema, sqlx::FromRow)]
pub struct Station {
    pub station: String,
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub elevation: Option<f64>,
}

/// Read-only access to the station and measurement tables.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ClimateData: Sync + Send {
    /// Most recent measurement date, `None` for an empty table.
    async fn latest_date(&self) -> Result<Option<Date>, Error>;
    /// Rows ordered by date, then station.
    async fn precipitation(&self, range: DateRange) -> Result<Vec<Precipitation>, Error>;
    /// Rows ordered by date, then station.
    async fn temperatures(&self, range: DateRange) -> Result<Vec<TemperatureObservation>, Error>;
    async fn temperature_summary(
        &self,
        range: DateRange,
    ) -> Result<Option<TemperatureSummary>, Error>;
    async fn station_ids(&self) -> Result<Vec<String>, Error>;
    async fn stations(&self) -> Result<Vec<Station>, Error>;
    async fn health_check(&self) -> Result<(), Error>;
}
