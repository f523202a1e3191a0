//! Response templates and result rendering.
//!
//! Fixed pools of reply variants, picked uniformly at random so the bot
//! does not repeat itself verbatim. Result sets are embedded as a
//! `<flight-results>` block of per-flight tags which the display layer
//! parses back into cards; that parse is best-effort and degrades missing
//! fields to placeholders instead of failing the render.

use flightfriend_core::cities::ResolvedCity;
use flightfriend_core::flight::{format_inr, Flight, FlightFilter, FlightSearchParams, SortKey};
use once_cell::sync::Lazy;
use rand::seq::SliceRandom;
use regex::Regex;

/// How many results are rendered into one reply.
const MAX_RESULTS_SHOWN: usize = 5;

const GREETINGS: &[&str] = &[
    "Hey there! I'm Flight Friend. Ready to find some amazing flight deals for you?",
    "Hello! Your friendly flight assistant, Flight Friend, reporting for duty! How can I help with your travel plans today?",
    "Hi! I'm Flight Friend. Need help searching for flights or need some travel tips? Just ask!",
    "Welcome! I'm Flight Friend, here to make your flight planning a breeze. What trip are you dreaming of?",
];

const INITIAL_GREETINGS: &[&str] = &[
    "Hi there! I'm Flight Friend, your travel buddy. Let's find you some great flights! Where are you thinking of going?",
    "Hello! Flight Friend here. I can help search for flights, track prices, or give travel advice. How can I assist you today?",
    "Welcome to Flight Friend! Ready to plan your next adventure? Tell me your route and dates!",
    "Hey! Your flight assistant is ready. Ask me anything about flights!",
];

const THANKS_REPLIES: &[&str] = &[
    "You're welcome! I wish you a happy and safe journey!",
    "Glad I could help! Have a wonderful and safe trip!",
    "You're welcome! Wishing you smooth skies and a fantastic journey!",
    "Anytime! I hope you have a safe and enjoyable flight!",
    "You're welcome! May your journey be as smooth as possible!",
    "Glad to help! Wishing you a safe and pleasant travel experience!",
];

const OUT_OF_DOMAIN_REPLIES: &[&str] = &[
    "I'm sorry, but I can only provide assistance with flight-related queries. Please ask me about finding flights, checking prices, or sorting flight options by duration and price.",
    "I apologize, but I'm designed specifically to help with flight information. Could you ask me about flights instead?",
    "I can't provide information about that topic. I'm specialized in helping you find and sort flights by duration and price. Please ask me about flights instead.",
    "Sorry, but that's outside my area of expertise. I can only help with flight-related questions. Feel free to ask me about finding flights or comparing flight options!",
];

const SEARCH_CONFIRMATIONS: &[&str] = &[
    "Alright! Searching for flights from {source} to {destination} for {date}. Give me just a moment...",
    "Okay, looking up flights from {source} to {destination} departing on {date}. I'll be right back with the options!",
    "Got it! Let's find the best flights between {source} and {destination} on {date}. Searching now...",
    "Perfect! I'm on the hunt for flights from {source} to {destination} for {date}. Please wait while I gather the details.",
];

const NO_FLIGHTS_REPLIES: &[&str] = &[
    "Hmm, it seems there are no direct flights available from {source} to {destination} on {date}. Would you like to try searching for flights on a different date or maybe check nearby airports?",
    "Unfortunately, I couldn't find any flights matching your search from {source} to {destination} for {date}. Sometimes changing the date slightly can help. Want to try another date?",
    "It looks like flights are scarce for {source} to {destination} on {date}. Perhaps try searching on adjacent dates or explore alternative routes?",
];

const RESULT_INTROS: &[&str] = &[
    "Great news! I found {count} {special}flights from {source} to {destination} for {date}. Sorted by {sort}{filter_note}, here are the top {shown}:",
    "Success! I discovered {count} {special}flight options for your trip from {source} to {destination} on {date}. Here they are, sorted by {sort}{filter_note}:",
    "Okay, I've got {count} {special}flights ready for you from {source} to {destination} on {date}. Displaying the top {shown} sorted by {sort}{filter_note}:",
];

const TRAVEL_TIPS: &[&str] = &[
    "Sure! One tip for finding cheaper flights in India is to be flexible with your travel dates. Flying mid-week (Tuesday or Wednesday) is often less expensive than on weekends.",
    "Happy to share a tip! Consider booking flights about 4-6 weeks in advance for domestic Indian travel - that's often the sweet spot for pricing.",
    "Here's a piece of advice: Sign up for airline newsletters! They sometimes send out exclusive deals or announce sales early.",
    "Travel tip! Check prices for nearby airports if possible. Sometimes flying into or out of a slightly less convenient airport can save you a good amount.",
    "Budget tip: Early morning or late-night 'red-eye' flights can sometimes be significantly cheaper if your schedule allows!",
];

const DEFAULT_REPLIES: &[&str] = &[
    "I'm here to help with all things flights! Feel free to ask me to search for a specific route, like 'flights Delhi to Bangalore tomorrow'.",
    "Hmm, I'm not quite sure how to answer that specifically. I'm best at finding flights, providing travel tips, and giving airline info. Could you try rephrasing?",
    "I can search for flights if you tell me the origin, destination, and date. For example: 'Find flights from Chennai to Hyderabad next Friday'.",
    "Let's get your travel planning started! What flight route are you interested in?",
    "I'm ready to assist! Ask me about flight prices, schedules, or general travel advice.",
];

fn pick(pool: &[&str]) -> String {
    let mut rng = rand::thread_rng();
    (*pool.choose(&mut rng).unwrap_or(&pool[0])).to_string()
}

pub fn greeting() -> String {
    pick(GREETINGS)
}

/// Opening message of a brand-new conversation.
pub fn initial_greeting() -> String {
    pick(INITIAL_GREETINGS)
}

pub fn thanks() -> String {
    pick(THANKS_REPLIES)
}

pub fn out_of_domain() -> String {
    pick(OUT_OF_DOMAIN_REPLIES)
}

pub fn travel_tip() -> String {
    pick(TRAVEL_TIPS)
}

pub fn default_fallback() -> String {
    pick(DEFAULT_REPLIES)
}

pub fn search_confirmation(source: &ResolvedCity, destination: &ResolvedCity, date_text: &str) -> String {
    pick(SEARCH_CONFIRMATIONS)
        .replace("{source}", &format!("{} ({})", source.name, source.code))
        .replace(
            "{destination}",
            &format!("{} ({})", destination.name, destination.code),
        )
        .replace("{date}", date_text)
}

pub fn no_flights(params: &FlightSearchParams, date_text: &str) -> String {
    pick(NO_FLIGHTS_REPLIES)
        .replace("{source}", &params.source)
        .replace("{destination}", &params.destination)
        .replace("{date}", date_text)
}

pub fn ask_for_locations() -> String {
    "I'd be happy to find flights for you! Could you please let me know both your departure and destination cities? For example: 'Delhi to Mumbai'".to_string()
}

pub fn ask_for_source(destination: &str) -> String {
    format!(
        "I can help you find flights to {destination}! Could you please tell me which city you'll be departing from?"
    )
}

pub fn ask_for_destination(source: &str) -> String {
    format!(
        "I can help you find flights from {source}! Could you please tell me which city you'd like to fly to?"
    )
}

pub fn got_source_ask_destination(source: &str) -> String {
    format!("Got it, you're departing from {source}. Where would you like to fly to?")
}

pub fn unrecognized_city() -> String {
    "I didn't recognize a valid city in your message. Could you please specify a major city in India? For example: Delhi, Mumbai, Bangalore, etc.".to_string()
}

pub fn lost_track_of_route() -> String {
    "I seem to have lost track of your route. Can you please tell me both the departure and destination cities?".to_string()
}

pub fn same_city() -> String {
    "It looks like the departure and destination cities are the same. Could you please provide different cities for your flight search?".to_string()
}

pub fn which_airline() -> String {
    "Which airline would you like to see flights for? Some popular options are IndiGo, Air India, Vistara, SpiceJet, GoAir, and AirAsia.".to_string()
}

pub fn unrecognized_airline() -> String {
    "I didn't recognize that airline. Could you try one of these: IndiGo, Air India, Vistara, SpiceJet, GoAir, or AirAsia?".to_string()
}

pub fn filter_nonstop_confirmation() -> String {
    "I'll filter those results to show non-stop flights only. One moment...".to_string()
}

pub fn sort_duration_confirmation() -> String {
    "Okay, sorting those results by the shortest duration. One moment...".to_string()
}

pub fn sort_price_confirmation() -> String {
    "Sure thing! Let me sort those flight results by the lowest price for you.".to_string()
}

pub fn airline_filter_confirmation(airline: &str) -> String {
    format!(
        "I'll filter the results to show only {} flights. One moment...",
        capitalize(airline)
    )
}

pub fn price_alert_set(params: &FlightSearchParams, date_text: &str) -> String {
    format!(
        "Great! I've set up a price alert for flights from {} to {} on {date_text}. I'll let you know if the prices change significantly! Is there anything else you'd like to know about this route?",
        params.source, params.destination
    )
}

pub fn baggage_info(airline: Option<&str>) -> String {
    let base = "Baggage allowances vary significantly between airlines, fare types (economy, business), and routes (domestic vs. international). ";
    match airline {
        Some(name) => format!(
            "{base}For {}, it's best to check their official website for the most accurate and up-to-date information regarding checked and carry-on baggage limits based on your specific ticket.",
            capitalize(name)
        ),
        None => format!(
            "{base}Generally, domestic economy flights in India have a checked baggage limit (often 15kg) and a cabin bag limit (often 7kg), but you should always check the specific airline's website for details about your fare."
        ),
    }
}

pub fn checkin_info(airline: Option<&str>) -> String {
    let base = "Check-in procedures and timings can differ. ";
    match airline {
        Some(name) => format!(
            "{base}For {}, you can usually check in online via their website or app starting 24-48 hours before departure. Airport check-in counters typically close 45-60 minutes before domestic flights. Please verify the exact timings on their official website.",
            capitalize(name)
        ),
        None => format!(
            "{base}Most airlines allow online check-in starting 24-48 hours before the flight via their website or app. For domestic flights in India, it's generally recommended to arrive at the airport 1.5-2 hours before departure, and check-in counters often close 45-60 minutes prior. Always confirm with your specific airline."
        ),
    }
}

pub fn airline_info(airline: &str) -> String {
    format!(
        "{} is a popular choice! They fly many routes. To get specific prices and schedules, it's best to search for your exact trip details. Want me to search flights for {airline}?",
        capitalize(airline)
    )
}

pub fn price_alert_info() -> String {
    "I can definitely help keep an eye on prices for you! Once you search for a specific flight route and date, just ask me to set up a price alert, and I'll let you know if the fare changes.".to_string()
}

/// Human-readable date, e.g. "1 September 2026".
pub fn display_date(date: chrono::NaiveDate) -> String {
    date.format("%-d %B %Y").to_string()
}

fn capitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

/// Renders a non-empty, already filtered and sorted result set.
///
/// Structure: randomized intro, the `<flight-results>` block for the top
/// five flights, a summary that always names the absolute cheapest flight
/// (and the fastest too when sorting by price), then the follow-up options.
pub fn render_results(params: &FlightSearchParams, flights: &[Flight]) -> String {
    let sort = params.effective_sort();
    let date_text = display_date(params.date);

    let mut special = String::new();
    let mut filter_note = String::new();
    if params.filter == Some(FlightFilter::NonStop) {
        special = "non-stop ".to_string();
        filter_note = " (showing non-stop flights only)".to_string();
    }
    if let Some(airline) = &params.airline {
        special = format!("{} ", capitalize(airline));
        filter_note = format!(" (showing {} flights only)", capitalize(airline));
    }

    let shown = &flights[..flights.len().min(MAX_RESULTS_SHOWN)];
    let intro = pick(RESULT_INTROS)
        .replace("{count}", &flights.len().to_string())
        .replace("{special}", &special)
        .replace("{source}", &params.source)
        .replace("{destination}", &params.destination)
        .replace("{date}", &date_text)
        .replace("{sort}", &sort.to_string())
        .replace("{filter_note}", &filter_note)
        .replace("{shown}", &shown.len().to_string());

    let mut block = String::from("<flight-results>");
    for flight in shown {
        block.push_str(&format!(
            "\n<flight>\n<airline>{}</airline>\n<flight_number>{}</flight_number>\n<departure_time>{}</departure_time>\n<arrival_time>{}</arrival_time>\n<departure_iso>{}</departure_iso>\n<arrival_iso>{}</arrival_iso>\n<duration>{}</duration>\n<price>{}</price>\n</flight>",
            flight.airline,
            flight.flight_number,
            flight.departure_time.format("%H:%M"),
            flight.arrival_time.format("%H:%M"),
            flight.departure_time.to_rfc3339(),
            flight.arrival_time.to_rfc3339(),
            flight.duration_display(),
            flight.formatted_price(),
        ));
    }
    block.push_str("\n</flight-results>");

    // Cheapest by absolute price, regardless of the active sort.
    let Some(cheapest) = flights.iter().min_by_key(|f| f.price) else {
        return intro;
    };
    let mut summary = format!(
        "The absolute cheapest option is with {} for {} ({} flight time).",
        cheapest.airline,
        cheapest.formatted_price(),
        cheapest.duration_display()
    );
    if sort == SortKey::Price {
        if let Some(fastest) = flights.iter().min_by_key(|f| f.duration_minutes()) {
            summary.push_str(&format!(
                " The fastest is {} with {} for {}.",
                fastest.duration_display(),
                fastest.airline,
                fastest.formatted_price()
            ));
        }
    }

    let second_option = match sort {
        SortKey::Price => "2. Sort by shortest duration?",
        SortKey::Duration => "2. Sort by lowest price?",
    };
    let follow_up = format!(
        "How do these look? I can also help you:\n1. Filter these results (e.g., non-stop only).\n{second_option}\n3. Look for a specific airline?\n4. Keep an eye on prices for this route?\n\nJust let me know!"
    );

    format!("{intro}\n\n{block}\n\n{summary}\n\n{follow_up}")
}

/// One flight card recovered from a results block. All fields are display
/// strings; anything missing degrades to a placeholder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlightCard {
    pub airline: String,
    pub flight_number: String,
    pub departure_time: String,
    pub arrival_time: String,
    pub duration: String,
    pub price: String,
}

static RESULTS_BLOCK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)<flight-results>(.*?)</flight-results>").expect("results block pattern is valid")
});
static FLIGHT_RECORD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)<flight>(.*?)</flight>").expect("flight record pattern is valid"));

/// Best-effort parse of the results block back into display cards.
pub fn parse_results_block(message: &str) -> Vec<FlightCard> {
    let Some(block) = RESULTS_BLOCK.captures(message).and_then(|c| c.get(1)) else {
        return Vec::new();
    };
    FLIGHT_RECORD
        .captures_iter(block.as_str())
        .map(|caps| {
            let record = caps.get(1).map_or("", |m| m.as_str());
            FlightCard {
                airline: field(record, "airline").unwrap_or_else(|| "Unknown".to_string()),
                flight_number: field(record, "flight_number")
                    .unwrap_or_else(|| "Unknown".to_string()),
                departure_time: field(record, "departure_time")
                    .unwrap_or_else(|| "TBD".to_string()),
                arrival_time: field(record, "arrival_time").unwrap_or_else(|| "TBD".to_string()),
                duration: field(record, "duration").unwrap_or_else(|| "TBD".to_string()),
                price: field(record, "price").unwrap_or_else(|| "TBD".to_string()),
            }
        })
        .collect()
}

fn field(record: &str, name: &str) -> Option<String> {
    let pattern = Regex::new(&format!(r"(?s)<{name}>(.*?)</{name}>")).ok()?;
    pattern
        .captures(record)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|value| !value.is_empty())
}

/// Removes the results block from a message, for plain display.
pub fn strip_results_block(message: &str) -> String {
    RESULTS_BLOCK.replace_all(message, "").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone, Utc};

    fn flight(airline: &str, price: u32, minutes: i64) -> Flight {
        let departure = Utc.with_ymd_and_hms(2026, 9, 1, 9, 0, 0).unwrap();
        Flight {
            id: "f".to_string(),
            airline: airline.to_string(),
            flight_number: "XX100".to_string(),
            departure_airport: "DEL".to_string(),
            arrival_airport: "BOM".to_string(),
            departure_time: departure,
            arrival_time: departure + chrono::Duration::minutes(minutes),
            price,
            currency: "INR".to_string(),
            non_stop: true,
        }
    }

    fn params() -> FlightSearchParams {
        FlightSearchParams::new("DEL", "BOM", NaiveDate::from_ymd_opt(2026, 9, 1).unwrap())
    }

    #[test]
    fn test_results_render_and_parse_back() {
        let flights = vec![
            flight("IndiGo", 3200, 120),
            flight("Air India", 4100, 95),
            flight("Vistara", 5800, 140),
        ];
        let rendered = render_results(&params(), &flights);

        let cards = parse_results_block(&rendered);
        assert_eq!(cards.len(), 3);
        assert_eq!(cards[0].airline, "IndiGo");
        assert_eq!(cards[0].departure_time, "09:00");
        assert_eq!(cards[0].duration, "2h 0m");
        assert_eq!(cards[0].price, "₹3,200");
    }

    #[test]
    fn test_results_limited_to_five() {
        let flights: Vec<Flight> = (0..8).map(|i| flight("IndiGo", 3000 + i, 100)).collect();
        let rendered = render_results(&params(), &flights);
        assert_eq!(parse_results_block(&rendered).len(), 5);
        assert!(rendered.contains("I found 8") || rendered.contains("discovered 8") || rendered.contains("I've got 8"));
    }

    #[test]
    fn test_summary_always_names_cheapest() {
        let mut p = params();
        p.sort = Some(SortKey::Duration);
        let flights = vec![flight("Vistara", 5800, 80), flight("SpiceJet", 2900, 150)];
        let rendered = render_results(&p, &flights);
        assert!(rendered.contains("cheapest option is with SpiceJet"));
        // Fastest call-out only appears when sorting by price.
        assert!(!rendered.contains("The fastest is"));
    }

    #[test]
    fn test_price_sort_also_names_fastest() {
        let flights = vec![flight("Vistara", 5800, 80), flight("SpiceJet", 2900, 150)];
        let rendered = render_results(&params(), &flights);
        assert!(rendered.contains("cheapest option is with SpiceJet"));
        assert!(rendered.contains("The fastest is 1h 20m with Vistara"));
    }

    #[test]
    fn test_airline_filter_noted_in_intro() {
        let mut p = params();
        p.airline = Some("indigo".to_string());
        let rendered = render_results(&p, &[flight("IndiGo", 3000, 100)]);
        assert!(rendered.contains("(showing Indigo flights only)"));
    }

    #[test]
    fn test_malformed_record_degrades_to_placeholders() {
        let message = "<flight-results>\n<flight>\n<airline>IndiGo</airline>\n</flight>\n</flight-results>";
        let cards = parse_results_block(message);
        assert_eq!(cards.len(), 1);
        assert_eq!(cards[0].airline, "IndiGo");
        assert_eq!(cards[0].flight_number, "Unknown");
        assert_eq!(cards[0].price, "TBD");
    }

    #[test]
    fn test_no_block_yields_no_cards() {
        assert!(parse_results_block("just text").is_empty());
    }

    #[test]
    fn test_strip_results_block() {
        let flights = vec![flight("IndiGo", 3000, 100)];
        let rendered = render_results(&params(), &flights);
        let stripped = strip_results_block(&rendered);
        assert!(!stripped.contains("<flight-results>"));
        assert!(stripped.contains("cheapest option"));
    }

    #[test]
    fn test_pools_are_non_empty_and_varied() {
        assert!(!greeting().is_empty());
        assert!(!thanks().is_empty());
        assert!(!out_of_domain().is_empty());
        assert!(!default_fallback().is_empty());
        assert!(!initial_greeting().is_empty());
    }

    #[test]
    fn test_display_date() {
        assert_eq!(
            display_date(NaiveDate::from_ymd_opt(2026, 9, 1).unwrap()),
            "1 September 2026"
        );
    }
}
