use std::path::PathBuf;

use clap::{ArgAction, Parser, ValueEnum};
use est_meter::{Credentials, Error, MeterIdentity, Result};

#[derive(Parser, Debug)]
#[command(author, version, about = "mans.e-st.lv electricity consumption data scraper")]
pub struct Args {
    /// Website username.
    #[clap(long, env = "EST_USERNAME")]
    pub username: Option<String>,

    /// Website password.
    #[clap(long, env = "EST_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Object EIC.
    #[clap(long = "objectid", env = "EST_OBJECT_ID")]
    pub object_id: Option<String>,

    /// Electricity meter ID.
    #[clap(long, env = "EST_METER_ID")]
    pub meter: Option<String>,

    /// Report data time period.
    #[clap(long, value_enum, default_value = "month", env = "EST_PERIOD")]
    pub period: PeriodArg,

    #[clap(long)]
    pub year: Option<i32>,

    #[clap(long, value_parser = clap::value_parser!(u32).range(1..=12))]
    pub month: Option<u32>,

    #[clap(long, value_parser = clap::value_parser!(u32).range(1..=31))]
    pub day: Option<u32>,

    /// Include generation data.
    #[clap(long, default_value_t = true, action = ArgAction::Set, env = "EST_NETO")]
    pub neto: bool,

    /// Save data in the specified file instead of printing it.
    #[clap(long)]
    pub outfile: Option<PathBuf>,

    #[clap(long, value_enum, default_value = "json")]
    pub format: OutputFormat,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum PeriodArg {
    Day,
    Month,
    Year,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Indented JSON.
    Json,
    /// Polars table, for eyeballing.
    Table,
}

impl Args {
    /// Checks the account and meter settings before anything touches the network.
    pub fn identity(&self) -> Result<(Credentials, MeterIdentity)> {
        let (Some(username), Some(password)) = (non_empty(&self.username), non_empty(&self.password))
        else {
            return Err(Error::Configuration(
                "username and/or password must be set".to_string(),
            ));
        };
        let object_id = non_empty(&self.object_id)
            .ok_or_else(|| Error::Configuration("object ID must be set".to_string()))?;
        let meter = non_empty(&self.meter)
            .ok_or_else(|| Error::Configuration("electricity meter ID must be set".to_string()))?;

        Ok((
            Credentials::new(username, password),
            MeterIdentity::new(object_id, meter),
        ))
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}
