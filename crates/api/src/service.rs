use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use log::{debug, error};
use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, sync::Arc};
use time::Date;
use utoipa::ToSchema;

use crate::{
    db::{self, ClimateData, DateRange, Station, TemperatureObservation, TemperatureSummary},
    one_year_before, parse_date, DateError,
};

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("{0}")]
    MalformedDate(String),
    #[error("{0}")]
    InvalidDate(String),
    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),
}

impl From<DateError> for Error {
    fn from(e: DateError) -> Self {
        match e {
            DateError::Malformed(_) => Error::MalformedDate(e.to_string()),
            DateError::Invalid(_) => Error::InvalidDate(e.to_string()),
        }
    }
}

impl From<db::Error> for Error {
    fn from(e: db::Error) -> Self {
        match e {
            db::Error::StoredDate { .. } => Error::MalformedDate(e.to_string()),
            db::Error::Query(_) | db::Error::MissingColumns { .. } => {
                Error::StorageUnavailable(e.to_string())
            }
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct ErrorBody {
    pub error: String,
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = match &self {
            Error::MalformedDate(_) => StatusCode::BAD_REQUEST,
            Error::InvalidDate(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Error::StorageUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        };
        if status.is_server_error() {
            error!("request failed: {}", self);
        }
        let body = ErrorBody {
            error: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

/// How the start/end aggregate endpoints bound their query.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum RangeMode {
    /// Filter on the caller supplied start and end dates.
    #[default]
    Requested,
    /// Validate the caller's dates, then substitute the last-year window
    /// ending at the latest observation.
    LastYear,
}

pub struct ClimateService {
    climate_db: Arc<dyn ClimateData>,
    range_mode: RangeMode,
}

impl ClimateService {
    pub fn new(climate_db: Arc<dyn ClimateData>, range_mode: RangeMode) -> Self {
        Self {
            climate_db,
            range_mode,
        }
    }

    pub fn range_mode(&self) -> RangeMode {
        self.range_mode
    }

    pub async fn health_check(&self) -> Result<(), Error> {
        Ok(self.climate_db.health_check().await?)
    }

    /// Window from one year before the latest observation, open ended.
    /// `None` when there are no observations at all.
    pub async fn last_year_start(&self) -> Result<Option<Date>, Error> {
        match self.climate_db.latest_date().await? {
            Some(latest) => Ok(Some(one_year_before(latest)?)),
            None => Ok(None),
        }
    }

    /// Every precipitation value in the last-year window, grouped by date in
    /// date then station order.
    pub async fn precipitation_last_year(
        &self,
    ) -> Result<BTreeMap<Date, Vec<Option<f64>>>, Error> {
        let Some(start) = self.last_year_start().await? else {
            return Ok(BTreeMap::new());
        };

        let window = DateRange::starting(start);
        let rows = self.climate_db.precipitation(window).await?;

        let mut by_date: BTreeMap<Date, Vec<Option<f64>>> = BTreeMap::new();
        for row in rows.into_iter().filter(|row| window.contains(row.date)) {
            by_date.entry(row.date).or_default().push(row.prcp);
        }
        debug!("precipitation: {} dates since {}", by_date.len(), start);
        Ok(by_date)
    }

    pub async fn stations(&self) -> Result<Vec<String>, Error> {
        let stations = self.climate_db.station_ids().await?;
        debug!("stations: {:?}", stations);
        Ok(stations)
    }

    pub async fn station_details(&self) -> Result<Vec<Station>, Error> {
        Ok(self.climate_db.stations().await?)
    }

    pub async fn temperature_observations_last_year(
        &self,
    ) -> Result<Vec<TemperatureObservation>, Error> {
        let Some(start) = self.last_year_start().await? else {
            return Ok(vec![]);
        };

        let window = DateRange::starting(start);
        let mut observations = self.climate_db.temperatures(window).await?;
        observations.retain(|obs| window.contains(obs.date));
        observations.sort_by_key(|obs| obs.date);
        debug!("tobs: {} observations since {}", observations.len(), start);
        Ok(observations)
    }

    pub async fn aggregate_from_start(
        &self,
        start: &str,
    ) -> Result<Option<TemperatureSummary>, Error> {
        let start = parse_date(start)?;

        let range = match self.range_mode {
            RangeMode::Requested => DateRange::starting(start),
            RangeMode::LastYear => match self.last_year_start().await? {
                Some(window_start) => DateRange::starting(window_start),
                None => return Ok(None),
            },
        };

        self.summarize(range).await
    }

    pub async fn aggregate_range(
        &self,
        start: &str,
        end: &str,
    ) -> Result<Option<TemperatureSummary>, Error> {
        let start = parse_date(start)?;
        let end = parse_date(end)?;

        let range = match self.range_mode {
            RangeMode::Requested => DateRange::between(start, end),
            RangeMode::LastYear => match self.climate_db.latest_date().await? {
                Some(latest) => DateRange::between(one_year_before(latest)?, latest),
                None => return Ok(None),
            },
        };

        self.summarize(range).await
    }

    async fn summarize(&self, range: DateRange) -> Result<Option<TemperatureSummary>, Error> {
        let summary = self.climate_db.temperature_summary(range).await?;
        debug!("temperature summary for {:?}: {:?}", range, summary);
        Ok(summary)
    }
}
