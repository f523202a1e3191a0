//! Flight domain models.
//!
//! Flights are ephemeral: they are generated or adapted from an external
//! provider for a single search and held only for the current result set.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Sort key for a result set. Price is the default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum SortKey {
    Price,
    Duration,
}

/// Result filter requested by the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
pub enum FlightFilter {
    #[serde(rename = "non-stop")]
    #[strum(serialize = "nonstop", to_string = "non-stop")]
    NonStop,
}

/// A fully resolved flight search request.
///
/// Synthesized only once both a resolved source code and destination code
/// differ and a date has been assigned (explicit or defaulted to tomorrow).
/// Consumed once by the data provider; not persisted beyond the session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlightSearchParams {
    /// Departure IATA-style city code (e.g. "DEL").
    pub source: String,
    /// Arrival IATA-style city code (e.g. "BOM").
    pub destination: String,
    /// Travel date.
    pub date: NaiveDate,
    /// Optional result filter (e.g. non-stop only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<FlightFilter>,
    /// Optional airline name filter (lowercase, e.g. "indigo").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub airline: Option<String>,
    /// Optional sort key. Absent means price ascending.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort: Option<SortKey>,
}

impl FlightSearchParams {
    /// Creates a plain search (no filter, no airline, default sort).
    pub fn new(source: impl Into<String>, destination: impl Into<String>, date: NaiveDate) -> Self {
        Self {
            source: source.into(),
            destination: destination.into(),
            date,
            filter: None,
            airline: None,
            sort: None,
        }
    }

    /// The effective sort key (price when unspecified).
    pub fn effective_sort(&self) -> SortKey {
        self.sort.unwrap_or(SortKey::Price)
    }
}

/// A single flight option shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flight {
    /// Opaque unique identifier (UUID format)
    pub id: String,
    /// Airline display name (e.g. "IndiGo").
    pub airline: String,
    /// Flight number (e.g. "AI2014").
    pub flight_number: String,
    /// Departure airport code.
    pub departure_airport: String,
    /// Arrival airport code.
    pub arrival_airport: String,
    /// Scheduled departure time.
    pub departure_time: DateTime<Utc>,
    /// Scheduled arrival time.
    pub arrival_time: DateTime<Utc>,
    /// Fare in whole currency units.
    pub price: u32,
    /// Currency tag (always "INR" for the supported routes).
    pub currency: String,
    /// Whether the flight is non-stop.
    pub non_stop: bool,
}

impl Flight {
    /// Flight duration derived from the scheduled times, in minutes.
    ///
    /// Returns `i64::MAX` when the times are inconsistent so that broken
    /// records sort last rather than first.
    pub fn duration_minutes(&self) -> i64 {
        let minutes = (self.arrival_time - self.departure_time).num_minutes();
        if minutes < 0 { i64::MAX } else { minutes }
    }

    /// Human-readable duration, e.g. "2h 15m" or "45m".
    pub fn duration_display(&self) -> String {
        let minutes = self.duration_minutes();
        if minutes == i64::MAX {
            return "TBD".to_string();
        }
        let hours = minutes / 60;
        let rem = minutes % 60;
        if hours > 0 {
            format!("{}h {}m", hours, rem)
        } else {
            format!("{}m", rem)
        }
    }

    /// Fare formatted with the rupee sign and Indian digit grouping.
    pub fn formatted_price(&self) -> String {
        format_inr(self.price)
    }
}

/// A discounted fare surfaced as a "deal" banner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlightDeal {
    pub id: String,
    pub source: String,
    pub destination: String,
    pub price: u32,
    pub old_price: u32,
    pub currency: String,
    pub date: NaiveDate,
    pub airline: String,
}

/// Formats a whole-rupee amount with Indian digit grouping, e.g. "₹1,23,456".
///
/// Grouping is three digits for the last group and two for every group
/// above it, matching `toLocaleString("en-IN")`.
pub fn format_inr(amount: u32) -> String {
    let digits = amount.to_string();
    if digits.len() <= 3 {
        return format!("₹{digits}");
    }
    let (head, tail) = digits.split_at(digits.len() - 3);
    let mut groups: Vec<String> = Vec::new();
    let head_bytes = head.as_bytes();
    let mut idx = head_bytes.len();
    while idx > 0 {
        let start = idx.saturating_sub(2);
        groups.push(head[start..idx].to_string());
        idx = start;
    }
    groups.reverse();
    format!("₹{},{}", groups.join(","), tail)
}
