use reqwest::Url;
use serde_json::Value;
use tracing::debug;

use super::scrape::{self, LoginForm};
use crate::{ApiClient, Credentials, Result};

/// Logs in through the form served on `report_url` and returns the chart data of the
/// page the portal lands on afterwards.
///
/// The handshake always runs in full, even if `client` already holds a logged-in session.
pub fn authenticated_fetch(
    client: &dyn ApiClient,
    login_url: &Url,
    report_url: &Url,
    credentials: &Credentials,
) -> Result<Value> {
    let login_page = client.http_get(report_url)?;
    let form = LoginForm::from_html(&login_page)?;
    debug!("found login form, return url: {}", form.return_url);

    let report_page = client.http_post_form(login_url, &form.to_form(credentials))?;
    let data = scrape::chart_data(&report_page)?;

    Ok(data)
}
