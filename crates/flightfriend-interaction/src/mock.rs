//! Mock flight data generation.
//!
//! Used when no real data source is configured and as the deterministic
//! terminal stub of the provider fallback chain. Generated records have the
//! exact shape of adapted external records so callers cannot tell the two
//! apart.

use crate::provider::FlightProvider;
use async_trait::async_trait;
use chrono::NaiveDate;
use flightfriend_core::error::Result;
use flightfriend_core::flight::{Flight, FlightDeal, FlightSearchParams};
use rand::Rng;
use uuid::Uuid;

/// Airline pool with matching flight numbers, index-aligned.
const AIRLINES: [&str; 6] = [
    "Air India",
    "IndiGo",
    "SpiceJet",
    "Vistara",
    "GoAir",
    "AirAsia India",
];
const FLIGHT_NUMBERS: [&str; 6] = ["AI2014", "IG3456", "SG7890", "UK4567", "G82345", "I57891"];

/// Number of flights generated per search.
const MOCK_FLIGHT_COUNT: usize = 8;

/// Generates pseudo-random but plausibly shaped flights for a search.
#[derive(Debug, Default, Clone)]
pub struct MockFlightProvider;

impl MockFlightProvider {
    pub fn new() -> Self {
        Self
    }

    /// Generates `count` flights for the given route and date.
    ///
    /// Departure hours fall in a daytime window (06:00-20:00), durations in
    /// 60-180 minutes, and prices in a randomized per-search base band of
    /// 3000-6000 INR with ±1000 variance. All flights are non-stop.
    pub fn generate(&self, params: &FlightSearchParams, count: usize) -> Vec<Flight> {
        let mut rng = rand::thread_rng();
        let base_price: i32 = rng.gen_range(3000..6000);
        let mut flights = Vec::with_capacity(count);

        for _ in 0..count {
            let airline_index = rng.gen_range(0..AIRLINES.len());
            let departure_hour: u32 = rng.gen_range(6..20);
            let departure_minute: u32 = rng.gen_range(0..60);
            let duration_minutes: i64 = rng.gen_range(60..180);

            // Hour and minute are drawn from valid ranges above.
            let departure_time = params
                .date
                .and_hms_opt(departure_hour, departure_minute, 0)
                .unwrap()
                .and_utc();
            let arrival_time = departure_time + chrono::Duration::minutes(duration_minutes);

            let price = (base_price + rng.gen_range(-1000..1000)).max(500) as u32;

            flights.push(Flight {
                id: Uuid::new_v4().to_string(),
                airline: AIRLINES[airline_index].to_string(),
                flight_number: FLIGHT_NUMBERS[airline_index].to_string(),
                departure_airport: params.source.clone(),
                arrival_airport: params.destination.clone(),
                departure_time,
                arrival_time,
                price,
                currency: "INR".to_string(),
                non_stop: true,
            });
        }
        flights
    }

    /// Generates a discounted "deal" fare for the route: 10-40% off a
    /// randomized base price.
    pub fn generate_deal(&self, source: &str, destination: &str, date: NaiveDate) -> FlightDeal {
        let mut rng = rand::thread_rng();
        let base_price: u32 = rng.gen_range(3000..6000);
        let discount = rng.gen_range(0.10..0.40);
        let price = base_price - (base_price as f64 * discount) as u32;
        let airline_index = rng.gen_range(0..AIRLINES.len());

        FlightDeal {
            id: Uuid::new_v4().to_string(),
            source: source.to_string(),
            destination: destination.to_string(),
            price,
            old_price: base_price,
            currency: "INR".to_string(),
            date,
            airline: AIRLINES[airline_index].to_string(),
        }
    }
}

#[async_trait]
impl FlightProvider for MockFlightProvider {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn search(&self, params: &FlightSearchParams) -> Result<Vec<Flight>> {
        tracing::debug!(
            "[MockFlightProvider] Generating {} flights for {} -> {}",
            MOCK_FLIGHT_COUNT,
            params.source,
            params.destination
        );
        Ok(self.generate(params, MOCK_FLIGHT_COUNT))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    fn params() -> FlightSearchParams {
        FlightSearchParams::new("DEL", "BOM", NaiveDate::from_ymd_opt(2026, 9, 1).unwrap())
    }

    #[tokio::test]
    async fn test_search_returns_eight_flights() {
        let provider = MockFlightProvider::new();
        let flights = provider.search(&params()).await.unwrap();
        assert_eq!(flights.len(), 8);
    }

    #[test]
    fn test_generated_flights_match_route_and_shape() {
        let provider = MockFlightProvider::new();
        for flight in provider.generate(&params(), 20) {
            assert_eq!(flight.departure_airport, "DEL");
            assert_eq!(flight.arrival_airport, "BOM");
            assert_eq!(flight.currency, "INR");
            assert!(flight.non_stop);
            assert!(!flight.airline.is_empty());
            assert!(!flight.flight_number.is_empty());

            let hour = flight.departure_time.hour();
            assert!((6..20).contains(&hour), "departure hour {hour} outside daytime window");

            let duration = flight.duration_minutes();
            assert!((60..180).contains(&duration), "duration {duration} outside 60-180");

            // Base band 3000-6000 with ±1000 variance, floored at 500.
            assert!(flight.price >= 500 && flight.price < 7000);
        }
    }

    #[test]
    fn test_deal_is_discounted() {
        let provider = MockFlightProvider::new();
        let deal = provider.generate_deal("DEL", "BOM", NaiveDate::from_ymd_opt(2026, 9, 1).unwrap());
        assert!(deal.price < deal.old_price);
        assert!(AIRLINES.contains(&deal.airline.as_str()));
    }
}
