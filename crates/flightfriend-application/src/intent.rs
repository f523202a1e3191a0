//! Ordered rule-based intent classification.
//!
//! Rules fire in a fixed order: greeting and thanks first, then the
//! state-dependent continuations (pending clarification, refinement of a
//! presented result set), then the domain-relevance gate, then fresh
//! flight-search detection, and finally the topic buckets. State-dependent
//! branches outrank fresh classification so multi-turn slot filling is
//! never derailed by a terse reply like "Delhi" or "2".

use crate::extract;
use flightfriend_core::cities;
use flightfriend_core::dialogue::{DialogueState, PendingClarification, Topic};
use once_cell::sync::Lazy;
use regex::Regex;

/// What a topic question is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TopicKind {
    Baggage,
    Checkin,
    Airline,
    Tips,
    PriceAlert,
    General,
}

/// Classification result for one user message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    Greeting,
    Thanks,
    /// Continuation of a pending source/destination clarification.
    ClarificationReply,
    FlightSearch,
    /// Sort/filter/alert request against the last presented result set.
    Refinement,
    TopicQuery(TopicKind),
    OutOfDomain,
}

/// Vocabulary that marks a message as flight-related. A message sharing no
/// token with this list and naming no known city is out of domain.
const FLIGHT_TERMS: &[&str] = &[
    "flight", "fly", "travel", "airline", "plane", "trip", "route", "journey", "ticket",
    "departure", "arrival", "airport", "book", "fare", "price", "schedule", "timing", "layover",
    "direct", "nonstop", "connecting", "one-way", "round-trip", "search", "destination", "baggage",
    "passenger", "boarding", "landing", "domestic", "international", "economy", "business",
    "first class", "cheap", "expensive", "delay", "cancel", "indigo", "air india", "spicejet",
    "vistara", "airasia", "goair", "lufthansa", "delta", "etihad", "emirates", "jet", "kingfisher",
    "qatar", "thai", "singapore",
];

const SEARCH_KEYWORDS: &[&str] = &[
    "find", "search", "look for", "flight", "from", "show me", "book", "travel", "trip", "ticket",
];

static GREETING: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^(?:hi|hello|hey|greetings)\b").expect("valid"));
static THANKS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(?:thank|thanks|thx)\b").expect("valid"));
static OPTION_NUMBER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*([1-4])\s*$").expect("valid"));
static BAGGAGE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(?:baggage|luggage|bag limit|allowance)\b").expect("valid"));
static CHECKIN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(?:check in|check-in|boarding pass)\b").expect("valid"));
static TIPS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(?:tip|advice|hack)s?\b").expect("valid"));
static PRICE_ALERT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(?:alert|notify|notification|price drop)s?\b").expect("valid"));

/// Classifies one message against the current dialogue state.
pub fn classify(text: &str, state: &DialogueState) -> Intent {
    let lower = text.to_lowercase();

    if GREETING.is_match(text) {
        return Intent::Greeting;
    }
    if THANKS.is_match(text) {
        return Intent::Thanks;
    }

    if state.pending != PendingClarification::None {
        return Intent::ClarificationReply;
    }
    if refinement_applicable(state) && refinement_requested(&lower) {
        return Intent::Refinement;
    }

    if !in_domain(&lower) {
        return Intent::OutOfDomain;
    }

    if SEARCH_KEYWORDS.iter().any(|kw| lower.contains(kw)) {
        return Intent::FlightSearch;
    }

    Intent::TopicQuery(topic_kind(&lower))
}

/// Refinements only make sense after results were presented, or while the
/// engine is waiting to hear which airline to filter by.
fn refinement_applicable(state: &DialogueState) -> bool {
    match state.last_topic {
        Some(topic) => topic.results_presented() || topic == Topic::AskedWhichAirline,
        None => false,
    }
}

/// Whether the message looks like one of the follow-up options: a bare
/// option number, a sort request, a filter request, or a price alert.
pub fn refinement_requested(lower: &str) -> bool {
    OPTION_NUMBER.is_match(lower)
        || lower.contains("filter")
        || lower.contains("non-stop")
        || lower.contains("nonstop")
        || lower.contains("sort")
        || lower.contains("fastest")
        || lower.contains("shortest")
        || lower.contains("duration")
        || lower.contains("cheapest")
        || lower.contains("lowest price")
        || lower.contains("airline")
        || extract::detect_airline(lower).is_some()
        || (lower.contains("price")
            && ["alert", "track", "monitor", "eye", "watch", "notify"]
                .iter()
                .any(|kw| lower.contains(kw)))
}

/// The bare option number the user picked, if the message is just "1".."4".
pub fn option_number(text: &str) -> Option<u8> {
    OPTION_NUMBER
        .captures(text)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

fn in_domain(lower: &str) -> bool {
    FLIGHT_TERMS.iter().any(|term| lower.contains(term)) || cities::mentions_known_city(lower)
}

fn topic_kind(lower: &str) -> TopicKind {
    if BAGGAGE.is_match(lower) {
        TopicKind::Baggage
    } else if CHECKIN.is_match(lower) {
        TopicKind::Checkin
    } else if extract::detect_airline(lower).is_some() {
        TopicKind::Airline
    } else if TIPS.is_match(lower) {
        TopicKind::Tips
    } else if PRICE_ALERT.is_match(lower) {
        TopicKind::PriceAlert
    } else {
        TopicKind::General
    }
}
