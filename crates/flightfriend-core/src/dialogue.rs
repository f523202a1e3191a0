//! Dialogue state for a single conversation.
//!
//! The state is an explicit context object owned by the session handler and
//! passed `&mut` into every classify/parse call. There is no ambient global:
//! one conversation, one `DialogueState`. It is never persisted to the
//! backend; reloading history repopulates messages only, not this state.

use crate::flight::FlightSearchParams;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use strum::{Display, EnumString};

/// The last conversational topic handled by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Topic {
    Greeting,
    Thanks,
    FlightSearchInitiated,
    AskingForSource,
    AskingForDestination,
    AskingForLocations,
    SortedByPrice,
    SortedByDuration,
    NoFlightsFound,
    AskedFilterNonstop,
    AskedFilterAirline,
    AskedWhichAirline,
    SetPriceAlert,
    BaggageInfo,
    CheckinInfo,
    AirlineInfo,
    TravelTips,
    OutOfDomain,
    Fallback,
}

impl Topic {
    /// Topics after which a sort/filter refinement request is meaningful.
    pub fn results_presented(&self) -> bool {
        matches!(
            self,
            Topic::SortedByPrice
                | Topic::SortedByDuration
                | Topic::AskedFilterNonstop
                | Topic::AskedFilterAirline
                | Topic::SetPriceAlert
        )
    }
}

/// Which required search slot the engine is currently waiting for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PendingClarification {
    #[default]
    None,
    NeedSource,
    NeedDestination,
    NeedBoth,
}

/// Coarse price preference picked up from the user's wording.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PricePreference {
    #[default]
    Unset,
    Budget,
    Premium,
}

/// Per-conversation mutable state consulted and updated by every parse call.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DialogueState {
    /// Last topic the engine handled, if any.
    pub last_topic: Option<Topic>,
    /// City codes mentioned so far (codes, not raw aliases, so that
    /// "Bombay" and "Mumbai" count once).
    pub mentioned_cities: BTreeSet<String>,
    /// Airline names mentioned so far (lowercase).
    pub mentioned_airlines: BTreeSet<String>,
    /// Budget/premium hint from the user's wording.
    pub price_preference: PricePreference,
    /// Which search slot, if any, the engine asked the user for.
    pub pending: PendingClarification,
    /// Source city code stored while waiting for the destination.
    pub pending_source: Option<String>,
    /// Destination city code stored while waiting for the source.
    pub pending_destination: Option<String>,
    /// The most recently emitted search, kept for refinement requests
    /// ("sort by duration", "only IndiGo").
    pub last_search: Option<FlightSearchParams>,
}

impl DialogueState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resets everything. Called on an explicit "new conversation" action.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Records an emitted search command: slots are consumed, clarification
    /// ends, and the search is remembered for refinements.
    pub fn record_search(&mut self, params: FlightSearchParams) {
        self.mentioned_cities.insert(params.source.clone());
        self.mentioned_cities.insert(params.destination.clone());
        self.pending = PendingClarification::None;
        self.pending_source = None;
        self.pending_destination = None;
        self.last_topic = Some(Topic::FlightSearchInitiated);
        self.last_search = Some(params);
    }

    /// Condensed summary handed to the generative-text fallback as context.
    pub fn context_summary(&self) -> String {
        let mut summary = String::from("User initiated interaction.");
        if let Some(topic) = self.last_topic {
            summary.push_str(&format!(" Last topic discussed: {topic}."));
        }
        if let Some(search) = &self.last_search {
            summary.push_str(&format!(
                " User searched for flights from {} to {} on {}.",
                search.source, search.destination, search.date
            ));
        }
        match self.price_preference {
            PricePreference::Budget => summary.push_str(" User seems budget-conscious."),
            PricePreference::Premium => summary.push_str(" User might prefer premium options."),
            PricePreference::Unset => {}
        }
        let cities = if self.mentioned_cities.is_empty() {
            "None".to_string()
        } else {
            self.mentioned_cities.iter().cloned().collect::<Vec<_>>().join(", ")
        };
        summary.push_str(&format!(" Known mentioned cities: {cities}."));
        let airlines = if self.mentioned_airlines.is_empty() {
            "None".to_string()
        } else {
            self.mentioned_airlines.iter().cloned().collect::<Vec<_>>().join(", ")
        };
        summary.push_str(&format!(" Known mentioned airlines: {airlines}."));
        summary
    }
}
