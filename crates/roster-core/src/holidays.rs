//! Public holiday lookup used to drop meeting dates that fall on a holiday.
//!
//! Holiday data is best effort: [`fetch_holidays`] turns every lookup failure into an
//! empty set so a roster can always be produced.

use std::collections::BTreeSet;
use std::time::Duration;

use chrono::NaiveDate;
use reqwest::blocking::Client;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::HolidaySettings;

pub const DEFAULT_HOLIDAY_API_URL: &str = "https://date.nager.at/api/v3";
pub const DEFAULT_COUNTRY_CODE: &str = "SG";

#[derive(Debug, Error)]
pub enum HolidayError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("holiday service responded with {0}")]
    Status(reqwest::StatusCode),
    #[error("malformed holiday payload: {0}")]
    Payload(String),
}

/// Anything that can list the public holidays of a year.
pub trait HolidaySource {
    fn holidays(&self, year: i32) -> Result<BTreeSet<NaiveDate>, HolidayError>;
}

/// A source with no holidays, for schedules that ignore them.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoHolidays;

impl HolidaySource for NoHolidays {
    fn holidays(&self, _year: i32) -> Result<BTreeSet<NaiveDate>, HolidayError> {
        Ok(BTreeSet::new())
    }
}

/// Client for the Nager.Date public holiday API.
#[derive(Debug, Clone)]
pub struct NagerHolidays {
    client: Client,
    base_url: String,
    country: String,
}

impl NagerHolidays {
    pub fn new(settings: &HolidaySettings) -> Result<Self, HolidayError> {
        let mut builder =
            Client::builder().user_agent(concat!("roster/", env!("CARGO_PKG_VERSION")));
        if settings.timeout_secs > 0 {
            builder = builder.timeout(Duration::from_secs(settings.timeout_secs));
        }

        Ok(Self {
            client: builder.build()?,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            country: settings.country.clone(),
        })
    }

    pub fn url_for(&self, year: i32) -> String {
        format!("{}/PublicHolidays/{}/{}", self.base_url, year, self.country)
    }
}

impl HolidaySource for NagerHolidays {
    fn holidays(&self, year: i32) -> Result<BTreeSet<NaiveDate>, HolidayError> {
        let url = self.url_for(year);
        debug!(%url, "Requesting public holidays");

        let response = self.client.get(&url).send()?;
        let status = response.status();
        if status != reqwest::StatusCode::OK {
            return Err(HolidayError::Status(status));
        }

        let body = response.text()?;
        parse_holidays(&body)
    }
}

#[derive(Debug, Deserialize)]
struct HolidayPayload {
    date: String,
}

/// Parses a JSON array of holiday objects, each carrying a `YYYY-MM-DD` `date`.
pub fn parse_holidays(body: &str) -> Result<BTreeSet<NaiveDate>, HolidayError> {
    let payload: Vec<HolidayPayload> =
        serde_json::from_str(body).map_err(|err| HolidayError::Payload(err.to_string()))?;

    payload
        .into_iter()
        .map(|holiday| {
            NaiveDate::parse_from_str(holiday.date.trim(), "%Y-%m-%d").map_err(|err| {
                HolidayError::Payload(format!("invalid date '{}': {}", holiday.date, err))
            })
        })
        .collect()
}

/// Looks up the holidays of `year`, returning an empty set if the lookup fails.
pub fn fetch_holidays(source: &dyn HolidaySource, year: i32) -> BTreeSet<NaiveDate> {
    match source.holidays(year) {
        Ok(holidays) => {
            info!(year, count = holidays.len(), "Loaded public holidays");
            holidays
        }
        Err(err) => {
            warn!(year, error = %err, "Holiday lookup failed; continuing without holidays");
            BTreeSet::new()
        }
    }
}

/// Removes holiday dates, keeping the remaining dates in their original order.
pub fn exclude_holidays(dates: &[NaiveDate], holidays: &BTreeSet<NaiveDate>) -> Vec<NaiveDate> {
    dates
        .iter()
        .copied()
        .filter(|date| !holidays.contains(date))
        .collect()
}
