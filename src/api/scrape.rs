//! Everything that has to look at portal HTML lives here.

use scraper::{ElementRef, Html, Selector};
use serde_json::Value;

use crate::error::ScrapeError;
use crate::Credentials;

/// Hidden fields of the portal's login form
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginForm {
    pub token: String,
    pub return_url: String,
}

impl LoginForm {
    const TOKEN: &'static str = "_token";
    const RETURN_URL: &'static str = "returnUrl";
    const LOGIN: &'static str = "login";
    const PASSWORD: &'static str = "password";

    /// Reads the login form off a page.
    ///
    /// All four inputs must be present. The values of `login` and `password` are
    /// placeholders and get replaced by the real credentials in [`LoginForm::to_form`].
    pub fn from_html(body: &str) -> Result<Self, ScrapeError> {
        let document = Html::parse_document(body);

        let token = input_value(&document, Self::TOKEN)?;
        let return_url = input_value(&document, Self::RETURN_URL)?;
        input_value(&document, Self::LOGIN)?;
        input_value(&document, Self::PASSWORD)?;

        Ok(Self { token, return_url })
    }

    /// Form body for the login POST
    pub fn to_form(&self, credentials: &Credentials) -> Vec<(String, String)> {
        vec![
            (Self::TOKEN.to_string(), self.token.clone()),
            (Self::RETURN_URL.to_string(), self.return_url.clone()),
            (Self::LOGIN.to_string(), credentials.login.clone()),
            (Self::PASSWORD.to_string(), credentials.password.clone()),
        ]
    }
}

fn selector(css: &str) -> Result<Selector, ScrapeError> {
    Selector::parse(css).map_err(|e| ScrapeError::Selector(e.to_string()))
}

fn input_value(document: &Html, name: &'static str) -> Result<String, ScrapeError> {
    let input = selector(&format!(r#"input[name="{}"]"#, name))?;
    let element: ElementRef = document
        .select(&input)
        .next()
        .ok_or(ScrapeError::MissingField(name))?;
    Ok(element.value().attr("value").unwrap_or_default().to_string())
}

/// Parses the JSON the report page embeds in its chart container.
pub fn chart_data(body: &str) -> Result<Value, ScrapeError> {
    let document = Html::parse_document(body);
    let chart = selector("div.chart")?;

    // Only the first chart container counts
    let raw = document
        .select(&chart)
        .next()
        .and_then(|element| element.value().attr("data-values"))
        .ok_or(ScrapeError::ChartNotFound)?;

    serde_json::from_str(raw).map_err(ScrapeError::InvalidChartJson)
}

#[cfg(test)]
mod tests {
    use super::*;

    const LOGIN_PAGE: &str = r#"
        <html><body>
        <form method="post" action="/lv/private/user-authentification/">
            <input type="hidden" name="_token" value="csrf-123">
            <input type="hidden" name="returnUrl" value="/lv/private/paterini-un-norekini/paterinu-grafiki/?period=Y">
            <input type="text" name="login" value="">
            <input type="password" name="password">
        </form>
        </body></html>
    "#;

    #[test]
    fn reads_hidden_fields() {
        let form = LoginForm::from_html(LOGIN_PAGE).unwrap();
        assert_eq!(form.token, "csrf-123");
        assert_eq!(
            form.return_url,
            "/lv/private/paterini-un-norekini/paterinu-grafiki/?period=Y"
        );
    }

    #[test]
    fn credentials_replace_placeholders() {
        let page = LOGIN_PAGE.replace(r#"name="login" value="""#, r#"name="login" value="someone""#);
        let form = LoginForm::from_html(&page).unwrap();
        let fields = form.to_form(&Credentials::new("jane", "hunter2"));

        assert_eq!(
            fields,
            vec![
                ("_token".to_string(), "csrf-123".to_string()),
                (
                    "returnUrl".to_string(),
                    "/lv/private/paterini-un-norekini/paterinu-grafiki/?period=Y".to_string()
                ),
                ("login".to_string(), "jane".to_string()),
                ("password".to_string(), "hunter2".to_string()),
            ]
        );
    }

    #[test]
    fn each_field_is_required() {
        for name in ["_token", "returnUrl", "login", "password"] {
            let page = LOGIN_PAGE.replace(&format!(r#"name="{}""#, name), r#"name="other""#);
            match LoginForm::from_html(&page) {
                Err(ScrapeError::MissingField(missing)) => assert_eq!(missing, name),
                other => panic!("expected missing {}, got {:?}", name, other),
            }
        }
    }

    #[test]
    fn extracts_chart_json() {
        let page = r#"<div class="panel chart" data-values="{&quot;values&quot;:{&quot;A+&quot;:{}}}"></div>"#;
        let data = chart_data(page).unwrap();
        assert!(data["values"]["A+"].is_object());
    }

    #[test]
    fn chart_without_attribute_is_not_found() {
        let page = r#"<div class="chart"></div><div data-values="{}"></div>"#;
        assert!(matches!(chart_data(page), Err(ScrapeError::ChartNotFound)));
    }

    #[test]
    fn only_the_first_chart_is_read() {
        let page = r#"<div class="chart"></div><div class="chart" data-values="{}"></div>"#;
        assert!(matches!(chart_data(page), Err(ScrapeError::ChartNotFound)));

        let page = r#"<span class="chart" data-values="[1]"></span><div class="chart" data-values="[2]"></div>"#;
        assert_eq!(chart_data(page).unwrap(), serde_json::json!([2]));
    }

    #[test]
    fn chart_with_garbage_is_invalid_json() {
        let page = r#"<div class="chart" data-values="{not json"></div>"#;
        assert!(matches!(
            chart_data(page),
            Err(ScrapeError::InvalidChartJson(_))
        ));
    }
}
