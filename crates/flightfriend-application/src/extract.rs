//! City, airline and preference extraction from free text.
//!
//! Route slots are filled by three escalating strategies: an explicit
//! "from X to Y" phrase, a bare "X to Y" phrase, and a direct scan for
//! known city names in text order. A city never comes from thin air: every
//! slot is either a lookup-table hit or text the user actually typed.

use flightfriend_core::cities::{self, ResolvedCity};
use flightfriend_core::dialogue::PricePreference;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

/// Airlines the refinement flow can filter by, lowercase.
pub const KNOWN_AIRLINES: [&str; 6] = [
    "indigo",
    "air india",
    "vistara",
    "spicejet",
    "goair",
    "airasia",
];

const FROM_INDICATORS: [&str; 4] = ["from", "departing", "leaving", "starting"];
const TO_INDICATORS: [&str; 6] = ["to", "towards", "for", "arriving", "destination", "bound"];

/// Zero, one or two route slots recovered from a message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteSlots {
    pub source: Option<ResolvedCity>,
    pub destination: Option<ResolvedCity>,
}

static FROM_TO: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)(?:from|departing|leaving)\s+([A-Za-z\s]+?)\s+(?:to|towards|for)\s+([A-Za-z\s]+?)(?:$|\s+on\b|\s+around\b|\s+near\b|[.,!?])",
    )
    .expect("from-to pattern is valid")
});

static BARE_PAIR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b([A-Za-z][A-Za-z\s]+?)\s+(?:to|->|-)\s+([A-Za-z][A-Za-z\s]+?)(?:$|\s+on\b|\s+around\b|\s+near\b|[.,!?])")
        .expect("bare pair pattern is valid")
});

/// Extracts as many of the two route slots as can be confidently
/// identified.
pub fn extract_route(text: &str) -> RouteSlots {
    if let Some(caps) = FROM_TO.captures(text) {
        let source = resolve_side(caps.get(1).map_or("", |m| m.as_str()));
        let destination = resolve_side(caps.get(2).map_or("", |m| m.as_str()));
        if source.is_some() || destination.is_some() {
            debug!("[Extract] Matched 'from X to Y' phrase");
            return RouteSlots {
                source,
                destination,
            };
        }
    }

    // The bare pair form has no anchoring keyword, so it only counts when
    // both sides name a city from the lookup table; anything else falls
    // through to the direct scan.
    if let Some(caps) = BARE_PAIR.captures(text) {
        let source = resolve_known_side(caps.get(1).map_or("", |m| m.as_str()));
        let destination = resolve_known_side(caps.get(2).map_or("", |m| m.as_str()));
        if source.is_some() && destination.is_some() {
            debug!("[Extract] Matched bare 'X to Y' phrase");
            return RouteSlots {
                source,
                destination,
            };
        }
    }

    scan_known_cities(text)
}

/// Resolves one captured side of a route phrase.
///
/// A known city anywhere in the captured span wins (so "the lovely city of
/// Pune" still resolves); otherwise the whole trimmed span gets the
/// prefix-code fallback.
fn resolve_side(captured: &str) -> Option<ResolvedCity> {
    let trimmed = captured.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Some(info) = cities::extract_known_cities(trimmed).first() {
        return Some(ResolvedCity {
            code: info.code.to_string(),
            name: info.name.to_string(),
            known: true,
        });
    }
    Some(cities::resolve(trimmed))
}

/// Like [`resolve_side`] but only accepts lookup-table cities.
fn resolve_known_side(captured: &str) -> Option<ResolvedCity> {
    cities::extract_known_cities(captured)
        .first()
        .map(|info| ResolvedCity {
            code: info.code.to_string(),
            name: info.name.to_string(),
            known: true,
        })
}

/// Third strategy: direct scan for known city names, in text order.
fn scan_known_cities(text: &str) -> RouteSlots {
    let found = cities::extract_known_cities(text);
    match found.len() {
        0 => RouteSlots::default(),
        1 => {
            let city = ResolvedCity {
                code: found[0].code.to_string(),
                name: found[0].name.to_string(),
                known: true,
            };
            // One city: indicator words decide which slot it fills.
            // Undecidable messages treat it as the destination.
            let lower = text.to_lowercase();
            let code = found[0].code;
            let alias_hit = |indicators: &[&str]| {
                cities::aliases()
                    .filter(|(_, info)| info.code == code)
                    .any(|(alias, _)| {
                        indicators
                            .iter()
                            .any(|ind| lower.contains(&format!("{ind} {alias}")))
                    })
            };
            let is_source = alias_hit(&FROM_INDICATORS);
            let is_destination = alias_hit(&TO_INDICATORS);
            if is_source && !is_destination {
                RouteSlots {
                    source: Some(city),
                    destination: None,
                }
            } else {
                RouteSlots {
                    source: None,
                    destination: Some(city),
                }
            }
        }
        _ => RouteSlots {
            source: Some(ResolvedCity {
                code: found[0].code.to_string(),
                name: found[0].name.to_string(),
                known: true,
            }),
            destination: Some(ResolvedCity {
                code: found[1].code.to_string(),
                name: found[1].name.to_string(),
                known: true,
            }),
        },
    }
}

/// First known airline mentioned in the text, lowercase.
pub fn detect_airline(text: &str) -> Option<&'static str> {
    let lower = text.to_lowercase();
    KNOWN_AIRLINES
        .iter()
        .find(|airline| lower.contains(*airline))
        .copied()
}

/// Budget/premium hint from the user's wording, if any.
pub fn detect_price_preference(text: &str) -> Option<PricePreference> {
    let lower = text.to_lowercase();
    if lower.contains("cheap") || lower.contains("budget") {
        Some(PricePreference::Budget)
    } else if lower.contains("premium") || lower.contains("business") {
        Some(PricePreference::Premium)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn codes(slots: &RouteSlots) -> (Option<&str>, Option<&str>) {
        (
            slots.source.as_ref().map(|c| c.code.as_str()),
            slots.destination.as_ref().map(|c| c.code.as_str()),
        )
    }

    #[test]
    fn test_from_x_to_y_phrase() {
        let slots = extract_route("find me flights from Delhi to Mumbai on 25th December");
        assert_eq!(codes(&slots), (Some("DEL"), Some("BOM")));
    }

    #[test]
    fn test_bare_x_to_y_phrase() {
        let slots = extract_route("Chennai to Hyderabad next Friday");
        assert_eq!(codes(&slots), (Some("MAA"), Some("HYD")));
    }

    #[test]
    fn test_two_cities_in_text_order() {
        let slots = extract_route("I need a ticket, Bangalore and then Goa");
        assert_eq!(codes(&slots), (Some("BLR"), Some("GOI")));
    }

    #[test]
    fn test_aliases_fill_the_same_slots() {
        let a = extract_route("flights from Bombay to Calcutta");
        let b = extract_route("flights from Mumbai to Kolkata");
        assert_eq!(codes(&a), codes(&b));
        assert_eq!(codes(&a), (Some("BOM"), Some("CCU")));
    }

    #[test]
    fn test_unknown_city_gets_prefix_code() {
        let slots = extract_route("flights from Shimla to Delhi");
        let source = slots.source.unwrap();
        assert_eq!(source.code, "SHI");
        assert!(!source.known);
        assert_eq!(slots.destination.unwrap().code, "DEL");
    }

    #[test]
    fn test_single_city_with_from_indicator_is_source() {
        let slots = extract_route("I want a flight departing Jaipur");
        assert_eq!(codes(&slots), (Some("JAI"), None));
    }

    #[test]
    fn test_single_city_defaults_to_destination() {
        let slots = extract_route("show me a flight ticket for goa");
        assert_eq!(codes(&slots), (None, Some("GOI")));
    }

    #[test]
    fn test_no_city_yields_empty_slots() {
        assert_eq!(extract_route("find me a flight please"), RouteSlots::default());
    }

    #[test]
    fn test_detect_airline() {
        assert_eq!(detect_airline("only Air India please"), Some("air india"));
        assert_eq!(detect_airline("prefer IndiGo"), Some("indigo"));
        assert_eq!(detect_airline("anything works"), None);
    }

    #[test]
    fn test_detect_price_preference() {
        assert_eq!(
            detect_price_preference("cheapest option"),
            Some(PricePreference::Budget)
        );
        assert_eq!(
            detect_price_preference("business class please"),
            Some(PricePreference::Premium)
        );
        assert_eq!(detect_price_preference("whatever"), None);
    }
}
