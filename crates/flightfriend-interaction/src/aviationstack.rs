//! Aviationstack flight-data client and adapter.
//!
//! Maps the third-party API's nested records into the application's `Flight`
//! shape. Aviationstack does not provide fares, so a synthetic price in the
//! same band as the mock generator is attached to each record.

use crate::provider::FlightProvider;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use flightfriend_core::error::{FlightFriendError, Result};
use flightfriend_core::flight::{Flight, FlightSearchParams};
use rand::Rng;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, warn};
use uuid::Uuid;

const BASE_URL: &str = "https://api.aviationstack.com/v1";
const DEFAULT_LIMIT: u32 = 10;

/// Query parameters for the flights endpoint.
#[derive(Debug, Clone, Default)]
pub struct FlightQuery {
    pub departure_iata: Option<String>,
    pub arrival_iata: Option<String>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

/// Flight provider backed by the Aviationstack REST API.
///
/// Construction requires a key; a keyless deployment simply leaves this
/// provider out of the chain and runs on mock data.
pub struct AviationstackProvider {
    client: Client,
    api_key: String,
}

impl AviationstackProvider {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
        }
    }

    async fn get_flights(&self, query: &FlightQuery) -> Result<FlightsResponse> {
        let mut params: Vec<(&str, String)> = vec![("access_key", self.api_key.clone())];
        if let Some(dep) = &query.departure_iata {
            params.push(("dep_iata", dep.clone()));
        }
        if let Some(arr) = &query.arrival_iata {
            params.push(("arr_iata", arr.clone()));
        }
        params.push(("limit", query.limit.unwrap_or(DEFAULT_LIMIT).to_string()));
        if let Some(offset) = query.offset {
            params.push(("offset", offset.to_string()));
        }

        let url = format!("{BASE_URL}/flights");
        debug!("[AviationstackProvider] GET {url}");
        let response = self
            .client
            .get(&url)
            .query(&params)
            .send()
            .await
            .map_err(|err| {
                FlightFriendError::external("aviationstack", format!("request failed: {err}"))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            warn!("[AviationstackProvider] API error ({status}): {body}");
            return Err(FlightFriendError::external(
                "aviationstack",
                format!("{status}: {body}"),
            ));
        }

        response.json().await.map_err(|err| {
            FlightFriendError::external("aviationstack", format!("malformed response: {err}"))
        })
    }
}

#[async_trait]
impl FlightProvider for AviationstackProvider {
    fn name(&self) -> &'static str {
        "aviationstack"
    }

    async fn search(&self, params: &FlightSearchParams) -> Result<Vec<Flight>> {
        let query = FlightQuery {
            departure_iata: Some(params.source.clone()),
            arrival_iata: Some(params.destination.clone()),
            limit: Some(DEFAULT_LIMIT),
            offset: None,
        };
        let response = self.get_flights(&query).await?;
        let flights = adapt_flights(response, &params.source, &params.destination);
        if flights.is_empty() {
            // Treat an empty or fully unadaptable payload as a provider
            // failure so the chain falls through to the stub.
            return Err(FlightFriendError::external(
                "aviationstack",
                "no adaptable flight records in response",
            ));
        }
        Ok(flights)
    }
}

/// Converts API records into the application's `Flight` shape.
///
/// Records with missing or unparsable scheduled times are skipped rather
/// than failing the whole result set.
fn adapt_flights(response: FlightsResponse, source: &str, destination: &str) -> Vec<Flight> {
    let mut rng = rand::thread_rng();
    response
        .data
        .into_iter()
        .filter_map(|record| {
            let departure_time = parse_scheduled(record.departure.as_ref()?.scheduled.as_deref()?)?;
            let arrival_time = parse_scheduled(record.arrival.as_ref()?.scheduled.as_deref()?)?;
            let airline = record
                .airline
                .and_then(|a| a.name)
                .unwrap_or_else(|| "Unknown Airline".to_string());
            let flight_number = record
                .flight
                .and_then(|f| f.iata.or(f.number))
                .unwrap_or_else(|| "Unknown".to_string());

            // Aviationstack has no fares; synthesize one in the mock band.
            let base_price: i32 = rng.gen_range(3000..6000);
            let price = (base_price + rng.gen_range(-1000..1000)).max(500) as u32;

            Some(Flight {
                id: Uuid::new_v4().to_string(),
                airline,
                flight_number,
                departure_airport: source.to_string(),
                arrival_airport: destination.to_string(),
                departure_time,
                arrival_time,
                price,
                currency: "INR".to_string(),
                non_stop: true,
            })
        })
        .collect()
}

fn parse_scheduled(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
}

#[derive(Debug, Deserialize)]
struct FlightsResponse {
    #[serde(default)]
    data: Vec<FlightRecord>,
}

#[derive(Debug, Deserialize)]
struct FlightRecord {
    flight: Option<FlightIdent>,
    departure: Option<Endpoint>,
    arrival: Option<Endpoint>,
    airline: Option<Airline>,
}

#[derive(Debug, Deserialize)]
struct FlightIdent {
    number: Option<String>,
    iata: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Endpoint {
    scheduled: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Airline {
    name: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_response() -> FlightsResponse {
        serde_json::from_str(
            r#"{
                "data": [
                    {
                        "flight": {"number": "2014", "iata": "AI2014", "icao": "AIC2014"},
                        "departure": {"airport": "DEL", "scheduled": "2026-09-01T09:00:00+00:00"},
                        "arrival": {"airport": "BOM", "scheduled": "2026-09-01T11:15:00+00:00"},
                        "airline": {"name": "Air India", "iata": "AI"},
                        "aircraft": {"iata": "A320"},
                        "status": "scheduled"
                    },
                    {
                        "flight": {"number": "777"},
                        "departure": {"airport": "DEL"},
                        "arrival": {"airport": "BOM", "scheduled": "2026-09-01T12:00:00+00:00"},
                        "airline": {"name": "IndiGo"}
                    }
                ],
                "pagination": {"limit": 10, "offset": 0, "count": 2, "total": 2}
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn test_adapter_maps_fields_and_skips_broken_records() {
        let flights = adapt_flights(sample_response(), "DEL", "BOM");
        // The second record has no departure schedule and is skipped.
        assert_eq!(flights.len(), 1);
        let flight = &flights[0];
        assert_eq!(flight.airline, "Air India");
        assert_eq!(flight.flight_number, "AI2014");
        assert_eq!(flight.departure_airport, "DEL");
        assert_eq!(flight.arrival_airport, "BOM");
        assert_eq!(flight.duration_minutes(), 135);
        assert!(flight.non_stop);
    }

    #[test]
    fn test_adapter_attaches_synthetic_price() {
        let flights = adapt_flights(sample_response(), "DEL", "BOM");
        assert!(flights[0].price >= 500 && flights[0].price < 7000);
        assert_eq!(flights[0].currency, "INR");
    }

    #[test]
    fn test_adapter_defaults_missing_airline_name() {
        let response: FlightsResponse = serde_json::from_str(
            r#"{"data": [{
                "flight": null,
                "departure": {"scheduled": "2026-09-01T09:00:00+00:00"},
                "arrival": {"scheduled": "2026-09-01T10:00:00+00:00"},
                "airline": null
            }]}"#,
        )
        .unwrap();
        let flights = adapt_flights(response, "DEL", "BOM");
        assert_eq!(flights[0].airline, "Unknown Airline");
        assert_eq!(flights[0].flight_number, "Unknown");
    }
}
