use std::fmt;

use chrono::{Datelike, NaiveDate};

use crate::{Error, MeterIdentity, Result};

pub mod consumption;
pub mod scrape;
pub mod session;

/// The time window a report covers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Period {
    Day,
    Month,
    Year,
}

impl Period {
    /// Sampling interval used when the request does not name one
    pub fn default_granularity(&self) -> Option<Granularity> {
        match self {
            Period::Day => Some(Granularity::Hour),
            Period::Month => Some(Granularity::Day),
            Period::Year => None,
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let p = match self {
            Period::Day => "D",
            Period::Month => "M",
            Period::Year => "Y",
        };
        write!(f, "{}", p)
    }
}

/// Sampling interval of the returned data points
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Granularity {
    Hour,
    Day,
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let g = match self {
            Granularity::Hour => "H",
            Granularity::Day => "D",
        };
        write!(f, "{}", g)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportRequest {
    pub period: Period,
    pub granularity: Option<Granularity>,
    pub year: Option<i32>,
    pub month: Option<u32>,
    pub day: Option<u32>,
}

impl ReportRequest {
    pub fn day(year: Option<i32>, month: Option<u32>, day: Option<u32>) -> Self {
        Self {
            period: Period::Day,
            granularity: Some(Granularity::Hour),
            year,
            month,
            day,
        }
    }

    pub fn month(year: Option<i32>, month: Option<u32>) -> Self {
        Self {
            period: Period::Month,
            granularity: Some(Granularity::Day),
            year,
            month,
            day: None,
        }
    }

    pub fn year(year: Option<i32>) -> Self {
        Self {
            period: Period::Year,
            granularity: None,
            year,
            month: None,
            day: None,
        }
    }

    /// Query parameters of the report page, in the order the portal's own links use.
    ///
    /// Any date component left unset is taken from `today`.
    pub fn to_query_string(
        &self,
        meter: &MeterIdentity,
        today: NaiveDate,
    ) -> Result<Vec<(String, String)>> {
        let mut qs: Vec<(String, String)> = vec![
            ("objectEic".to_string(), meter.object_eic.clone()),
            ("counterNumber".to_string(), meter.meter_id.clone()),
            ("period".to_string(), self.period.to_string()),
        ];

        let year = self.year.unwrap_or_else(|| today.year());
        let month = self.month.unwrap_or_else(|| today.month());
        if !(1..=12).contains(&month) {
            return Err(Error::Configuration(format!("invalid month: {}", month)));
        }
        let granularity = self.granularity.or(self.period.default_granularity());

        match self.period {
            Period::Year => {
                qs.push(("year".to_string(), year.to_string()));
            }
            Period::Month => {
                qs.push(("year".to_string(), year.to_string()));
                qs.push(("month".to_string(), format!("{:02}", month)));
            }
            Period::Day => {
                let day = self.day.unwrap_or_else(|| today.day());
                let date = NaiveDate::from_ymd_opt(year, month, day).ok_or_else(|| {
                    Error::Configuration(format!("invalid date: {}-{:02}-{:02}", year, month, day))
                })?;
                qs.push(("date".to_string(), date.format("%d.%m.%Y").to_string()));
            }
        }

        if self.period != Period::Year {
            if let Some(granularity) = granularity {
                qs.push(("granularity".to_string(), granularity.to_string()));
            }
        }

        Ok(qs)
    }
}
