use chrono::{DateTime, NaiveDateTime, Utc};
use polars::prelude::*;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Number, Value};
use tracing::info;

use super::ReportRequest;
use crate::error::ScrapeError;
use crate::{PortalClient, Result};

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const CONSUMPTION: &str = "A+";
const GENERATION: &str = "A-";

/// Fetches consumption charts of the portal's configured meter
pub struct ConsumptionReport<'a> {
    portal: &'a PortalClient,
}

impl<'a> ConsumptionReport<'a> {
    pub fn new(portal: &'a PortalClient) -> Self {
        Self { portal }
    }

    /// Hourly data of one day
    pub fn day(
        &self,
        neto: bool,
        year: Option<i32>,
        month: Option<u32>,
        day: Option<u32>,
    ) -> Result<ReportResult> {
        self.fetch(&ReportRequest::day(year, month, day), neto)
    }

    /// Daily data of one month
    pub fn month(&self, neto: bool, year: Option<i32>, month: Option<u32>) -> Result<ReportResult> {
        self.fetch(&ReportRequest::month(year, month), neto)
    }

    /// Monthly data of one year
    pub fn year(&self, neto: bool, year: Option<i32>) -> Result<ReportResult> {
        self.fetch(&ReportRequest::year(year), neto)
    }

    pub fn fetch(&self, request: &ReportRequest, neto: bool) -> Result<ReportResult> {
        let report_url = self.portal.report_url(request)?;
        let data = self.portal.fetch_chart_data(&report_url)?;
        let result = ReportResult::from_chart_data(&data, neto)?;

        info!(
            "fetched {} consumption samples for {:?} report",
            result.consumption().len(),
            request.period
        );
        Ok(result)
    }
}

/// A data point as the portal embeds it
#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct RawSample {
    pub timestamp: EpochMillis,
    /// `null` for intervals the meter has not reported yet
    pub value: Option<Number>,
}

/// The portal sends timestamps both as numbers and as strings
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(untagged)]
pub enum EpochMillis {
    Integer(i64),
    Float(f64),
    Text(String),
}

impl EpochMillis {
    pub fn as_millis(&self) -> Result<i64, ScrapeError> {
        match self {
            EpochMillis::Integer(ms) => Ok(*ms),
            EpochMillis::Float(ms) if ms.is_finite() => Ok(ms.trunc() as i64),
            EpochMillis::Float(ms) => Err(ScrapeError::InvalidTimestamp(ms.to_string())),
            EpochMillis::Text(text) => text
                .trim()
                .parse()
                .map_err(|_| ScrapeError::InvalidTimestamp(text.clone())),
        }
    }
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct ConsumptionRecord {
    #[serde(rename = "data", serialize_with = "serialize_timestamp")]
    pub timestamp: DateTime<Utc>,
    pub value: Option<Number>,
}

fn serialize_timestamp<S: Serializer>(ts: &DateTime<Utc>, s: S) -> Result<S::Ok, S::Error> {
    s.collect_str(&ts.format(TIMESTAMP_FORMAT))
}

impl TryFrom<&RawSample> for ConsumptionRecord {
    type Error = ScrapeError;

    fn try_from(sample: &RawSample) -> Result<Self, Self::Error> {
        let millis = sample.timestamp.as_millis()?;
        // Sub-second precision is dropped, not rounded
        let timestamp = DateTime::from_timestamp(millis / 1000, 0)
            .ok_or(ScrapeError::TimestampOutOfRange(millis))?;

        Ok(Self {
            timestamp,
            value: sample.value.clone(),
        })
    }
}

impl ConsumptionRecord {
    pub fn formatted_timestamp(&self) -> String {
        self.timestamp.format(TIMESTAMP_FORMAT).to_string()
    }

    pub fn value_f64(&self) -> Option<f64> {
        self.value.as_ref().and_then(Number::as_f64)
    }
}

#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(untagged)]
pub enum ReportResult {
    Consumption(Vec<ConsumptionRecord>),
    WithGeneration {
        consumption: Vec<ConsumptionRecord>,
        generation: Vec<ConsumptionRecord>,
    },
}

impl ReportResult {
    /// Reshapes the chart JSON. Both series have to be present even when generation
    /// is not requested.
    pub fn from_chart_data(data: &Value, neto: bool) -> Result<Self, ScrapeError> {
        let consumption = series(data, CONSUMPTION)?;
        let generation = series(data, GENERATION)?;

        if neto {
            Ok(ReportResult::WithGeneration {
                consumption,
                generation,
            })
        } else {
            Ok(ReportResult::Consumption(consumption))
        }
    }

    pub fn consumption(&self) -> &[ConsumptionRecord] {
        match self {
            ReportResult::Consumption(records) => records,
            ReportResult::WithGeneration { consumption, .. } => consumption,
        }
    }

    pub fn generation(&self) -> Option<&[ConsumptionRecord]> {
        match self {
            ReportResult::Consumption(_) => None,
            ReportResult::WithGeneration { generation, .. } => Some(generation),
        }
    }

    pub fn as_polars_df(&self) -> Result<DataFrame, anyhow::Error> {
        let mut timestamps: Vec<NaiveDateTime> = vec![];
        let mut values: Vec<Option<f64>> = vec![];
        let mut series_names: Vec<&str> = vec![];

        let mut push = |name: &'static str, records: &[ConsumptionRecord]| {
            for record in records {
                timestamps.push(record.timestamp.naive_utc());
                values.push(record.value_f64());
                series_names.push(name);
            }
        };

        push("consumption", self.consumption());
        let with_generation = match self.generation() {
            Some(generation) => {
                push("generation", generation);
                true
            }
            None => false,
        };

        let mut columns = vec![
            Series::new("timestamp".into(), timestamps),
            Series::new("value".into(), values),
        ];
        if with_generation {
            columns.insert(0, Series::new("series".into(), series_names));
        }

        Ok(DataFrame::new(columns)?)
    }
}

fn series(data: &Value, key: &'static str) -> Result<Vec<ConsumptionRecord>, ScrapeError> {
    let raw = data
        .pointer(&format!("/values/{}/total/data", key))
        .ok_or(ScrapeError::MissingSeries(key))?;

    let samples = Vec::<RawSample>::deserialize(raw)
        .map_err(|source| ScrapeError::InvalidSample { series: key, source })?;

    samples.iter().map(ConsumptionRecord::try_from).collect()
}
