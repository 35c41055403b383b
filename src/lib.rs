use std::fmt;

use reqwest::Url;
use serde_json::Value;
use tracing::{debug, warn};

pub mod api;
pub mod clock;
pub mod error;

use api::consumption::ConsumptionReport;
use api::ReportRequest;
use clock::{Clock, SystemClock};
pub use error::{Error, Result, ScrapeError, TransportError};

pub const PRODUCTION_BASE_URL: &str = "https://mans.e-st.lv";
const LOGIN_PATH: &str = "/lv/private/user-authentification/";
const REPORT_PATH: &str = "/lv/private/paterini-un-norekini/paterinu-grafiki/";

/// Portal account used to log in
#[derive(Clone)]
pub struct Credentials {
    pub login: String,
    pub password: String,
}

impl Credentials {
    pub fn new(login: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            login: login.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("login", &self.login)
            .field("password", &"***")
            .finish()
    }
}

/// The metering point and the meter installed on it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MeterIdentity {
    /// EIC of the object
    pub object_eic: String,
    /// Serial number of the meter
    pub meter_id: String,
}

impl MeterIdentity {
    pub fn new(object_eic: impl Into<String>, meter_id: impl Into<String>) -> Self {
        Self {
            object_eic: object_eic.into(),
            meter_id: meter_id.into(),
        }
    }
}

pub trait ApiClient {
    fn http_get(&self, url: &Url) -> Result<String>;

    fn http_post_form(&self, url: &Url, form: &[(String, String)]) -> Result<String>;
}

#[derive(Debug)]
pub struct PortalClient {
    credentials: Credentials,
    meter: MeterIdentity,
    base_url: Url,
    clock: Box<dyn Clock>,

    http_client: reqwest::blocking::Client,
}

impl PortalClient {
    pub fn new(credentials: Credentials, meter: MeterIdentity) -> Result<Self> {
        let http_client = reqwest::blocking::Client::builder()
            .cookie_store(true)
            .build()?;

        Ok(PortalClient {
            credentials,
            meter,
            base_url: Url::parse(PRODUCTION_BASE_URL)
                .map_err(|e| Error::Configuration(e.to_string()))?,
            clock: Box::new(SystemClock),
            http_client,
        })
    }

    pub fn from_env_values() -> Result<Self> {
        let credentials = Credentials::new(env_value("EST_USERNAME")?, env_value("EST_PASSWORD")?);
        let meter = MeterIdentity::new(env_value("EST_OBJECT_ID")?, env_value("EST_METER_ID")?);

        PortalClient::new(credentials, meter)
    }

    pub fn with_base_url(mut self, base_url: &str) -> Result<Self> {
        self.base_url = Url::parse(base_url)
            .map_err(|e| Error::Configuration(format!("invalid base url {:?}: {}", base_url, e)))?;
        Ok(self)
    }

    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    pub fn consumption(&self) -> ConsumptionReport<'_> {
        ConsumptionReport::new(self)
    }

    pub fn login_url(&self) -> Result<Url> {
        self.endpoint(LOGIN_PATH)
    }

    /// Full URL of the report page. Unset date parts are filled in from the clock now.
    pub fn report_url(&self, request: &ReportRequest) -> Result<Url> {
        let qs = request.to_query_string(&self.meter, self.clock.today())?;
        let mut url = self.endpoint(REPORT_PATH)?;
        url.query_pairs_mut().extend_pairs(&qs);
        Ok(url)
    }

    /// Runs the login handshake for `report_url` and returns the embedded chart data.
    pub fn fetch_chart_data(&self, report_url: &Url) -> Result<Value> {
        api::session::authenticated_fetch(self, &self.login_url()?, report_url, &self.credentials)
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path)
            .map_err(|e| Error::Configuration(e.to_string()))
    }
}

fn env_value(name: &str) -> Result<String> {
    match std::env::var(name) {
        Ok(value) if !value.is_empty() => Ok(value),
        _ => Err(Error::Configuration(format!("{} must be set", name))),
    }
}

fn read_body(response: reqwest::blocking::Response) -> Result<String> {
    let status_code = response.status();
    let url = response.url().to_string();

    if !status_code.is_success() {
        warn!("HTTP {} from {}", status_code.as_str(), url);
        return Err(TransportError::Status {
            url,
            status: status_code.as_u16(),
        }
        .into());
    }

    let body = response.text()?;
    debug!("{} bytes from {}", body.len(), url);
    Ok(body)
}

impl ApiClient for PortalClient {
    fn http_get(&self, url: &Url) -> Result<String> {
        debug!("GET {}", url);
        let response = self.http_client.get(url.clone()).send()?;
        read_body(response)
    }

    fn http_post_form(&self, url: &Url, form: &[(String, String)]) -> Result<String> {
        debug!("POST {}", url);
        let response = self.http_client.post(url.clone()).form(form).send()?;
        read_body(response)
    }
}
