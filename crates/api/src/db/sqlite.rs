use async_trait::async_trait;
use log::{info, LevelFilter};
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions},
    ConnectOptions, QueryBuilder, Sqlite,
};
use std::{str::FromStr, time::Duration};
use time::Date;

use super::{
    ClimateData, DateRange, Error, Precipitation, Station, TemperatureObservation,
    TemperatureSummary,
};
use crate::{format_date, parse_date};

pub const STATION_TABLE: &str = "station";
pub const MEASUREMENT_TABLE: &str = "measurement";

const STATION_COLUMNS: &[&str] = &["station", "name", "latitude", "longitude", "elevation"];
const MEASUREMENT_COLUMNS: &[&str] = &["station", "date", "prcp", "tobs"];

pub struct ClimateAccess {
    pool: SqlitePool,
}

impl ClimateAccess {
    /// Opens the observation database read-only. The file must already exist.
    pub async fn new(path: &str, echo_sql: bool) -> Result<Self, Error> {
        let mut options = SqliteConnectOptions::from_str(&format!("sqlite:{}", path))?
            .read_only(true)
            .create_if_missing(false)
            .pragma("busy_timeout", "5000");

        options = if echo_sql {
            options.log_statements(LevelFilter::Info)
        } else {
            options.disable_statement_logging()
        };

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(30))
            .connect_with(options)
            .await?;

        info!("SQLite database opened read-only at: {}", path);
        Ok(Self { pool })
    }

    pub fn from_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Confirms both tables exist with the columns the queries rely on.
    pub async fn verify_schema(&self) -> Result<(), Error> {
        self.verify_table(STATION_TABLE, STATION_COLUMNS).await?;
        self.verify_table(MEASUREMENT_TABLE, MEASUREMENT_COLUMNS)
            .await
    }

    async fn verify_table(&self, table: &'static str, required: &[&str]) -> Result<(), Error> {
        let columns: Vec<String> = sqlx::query_scalar("SELECT name FROM pragma_table_info(?)")
            .bind(table)
            .fetch_all(&self.pool)
            .await?;

        let missing: Vec<String> = required
            .iter()
            .filter(|column| !columns.iter().any(|c| c.eq_ignore_ascii_case(column)))
            .map(|column| column.to_string())
            .collect();

        if !missing.is_empty() {
            return Err(Error::MissingColumns { table, missing });
        }
        Ok(())
    }
}

fn push_range(builder: &mut QueryBuilder<'_, Sqlite>, range: &DateRange) {
    builder.push(" WHERE date >= ").push_bind(format_date(range.start));
    if let Some(end) = range.end {
        builder.push(" AND date <= ").push_bind(format_date(end));
    }
}

fn stored_date(value: &str) -> Result<Date, Error> {
    parse_date(value).map_err(|_| Error::StoredDate {
        table: MEASUREMENT_TABLE,
        value: value.to_owned(),
    })
}

#[async_trait]
impl ClimateData for ClimateAccess {
    async fn latest_date(&self) -> Result<Option<Date>, Error> {
        let latest: Option<String> =
            sqlx::query_scalar(&format!("SELECT MAX(date) FROM {}", MEASUREMENT_TABLE))
                .fetch_one(&self.pool)
                .await?;

        latest.as_deref().map(stored_date).transpose()
    }

    async fn precipitation(&self, range: DateRange) -> Result<Vec<Precipitation>, Error> {
        let mut builder = QueryBuilder::new(format!(
            "SELECT date, CAST(prcp AS REAL) FROM {}",
            MEASUREMENT_TABLE
        ));
        push_range(&mut builder, &range);
        builder.push(" ORDER BY date, station");

        let rows: Vec<(String, Option<f64>)> =
            builder.build_query_as().fetch_all(&self.pool).await?;

        rows.into_iter()
            .map(|(date, prcp)| {
                Ok(Precipitation {
                    date: stored_date(&date)?,
                    prcp,
                })
            })
            .collect()
    }

    async fn temperatures(&self, range: DateRange) -> Result<Vec<TemperatureObservation>, Error> {
        let mut builder = QueryBuilder::new(format!(
            "SELECT date, CAST(tobs AS REAL) FROM {}",
            MEASUREMENT_TABLE
        ));
        push_range(&mut builder, &range);
        builder.push(" AND tobs IS NOT NULL ORDER BY date, station");

        let rows: Vec<(String, f64)> = builder.build_query_as().fetch_all(&self.pool).await?;

        rows.into_iter()
            .map(|(date, tobs)| {
                Ok(TemperatureObservation {
                    date: stored_date(&date)?,
                    tobs,
                })
            })
            .collect()
    }

    async fn temperature_summary(
        &self,
        range: DateRange,
    ) -> Result<Option<TemperatureSummary>, Error> {
        let mut builder = QueryBuilder::new(format!(
            "SELECT MIN(CAST(tobs AS REAL)), MAX(CAST(tobs AS REAL)), AVG(CAST(tobs AS REAL)) FROM {}",
            MEASUREMENT_TABLE
        ));
        push_range(&mut builder, &range);

        let (min, max, avg): (Option<f64>, Option<f64>, Option<f64>) =
            builder.build_query_as().fetch_one(&self.pool).await?;

        Ok(TemperatureSummary::from_aggregates(min, max, avg))
    }

    async fn station_ids(&self) -> Result<Vec<String>, Error> {
        let ids = sqlx::query_scalar(&format!(
            "SELECT DISTINCT station FROM {} ORDER BY station",
            STATION_TABLE
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(ids)
    }

    async fn stations(&self) -> Result<Vec<Station>, Error> {
        let stations = sqlx::query_as::<_, Station>(&format!(
            "SELECT station, name, CAST(latitude AS REAL) AS latitude, \
             CAST(longitude AS REAL) AS longitude, CAST(elevation AS REAL) AS elevation \
             FROM {} ORDER BY station",
            STATION_TABLE
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(stations)
    }

    async fn health_check(&self) -> Result<(), Error> {
        sqlx::query("SELECT 1").fetch_one(&self.pool).await?;
        Ok(())
    }
}
