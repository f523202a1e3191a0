//! Conversation engine.
//!
//! One engine serves one conversation at a time: every call takes the
//! conversation's `DialogueState` by `&mut` and returns a `BotReply`. The
//! engine never performs flight searches itself; when a reply carries a
//! command the caller runs it against a provider chain and hands the
//! results back through [`ChatbotEngine::present_results`].

use crate::command::BotReply;
use crate::dates;
use crate::extract::{self, RouteSlots};
use crate::intent::{self, Intent, TopicKind};
use crate::templates;
use chrono::{Duration, NaiveDate, Utc};
use flightfriend_core::cities::ResolvedCity;
use flightfriend_core::dialogue::{DialogueState, PendingClarification, Topic};
use flightfriend_core::flight::{Flight, FlightFilter, FlightSearchParams, SortKey};
use flightfriend_interaction::GeminiClient;
use std::sync::Arc;
use tracing::{debug, info};

pub struct ChatbotEngine {
    gemini: Arc<GeminiClient>,
}

impl ChatbotEngine {
    pub fn new(gemini: Arc<GeminiClient>) -> Self {
        Self { gemini }
    }

    /// Opening message for a fresh conversation.
    pub fn initial_greeting(&self) -> BotReply {
        BotReply::text(templates::initial_greeting())
    }

    /// Handles one user message.
    pub async fn respond(&self, state: &mut DialogueState, text: &str) -> BotReply {
        self.respond_on(state, text, Utc::now().date_naive()).await
    }

    /// Same as [`respond`](Self::respond) with an injected "today", so date
    /// resolution is deterministic under test.
    pub async fn respond_on(
        &self,
        state: &mut DialogueState,
        text: &str,
        today: NaiveDate,
    ) -> BotReply {
        self.observe(state, text);
        let intent = intent::classify(text, state);
        debug!("[ChatbotEngine] Classified intent: {intent:?}");

        match intent {
            Intent::Greeting => self.handle_greeting(state, text).await,
            Intent::Thanks => {
                state.last_topic = Some(Topic::Thanks);
                BotReply::text(templates::thanks())
            }
            Intent::ClarificationReply => self.handle_clarification(state, text, today),
            Intent::Refinement => self.handle_refinement(state, text),
            Intent::FlightSearch => self.handle_search(state, text, today),
            Intent::TopicQuery(kind) => self.handle_topic(state, text, kind).await,
            Intent::OutOfDomain => {
                state.last_topic = Some(Topic::OutOfDomain);
                BotReply::text(templates::out_of_domain())
            }
        }
    }

    /// Records passive observations: airlines named, price preference.
    fn observe(&self, state: &mut DialogueState, text: &str) {
        if let Some(airline) = extract::detect_airline(text) {
            state.mentioned_airlines.insert(airline.to_string());
        }
        if let Some(preference) = extract::detect_price_preference(text) {
            state.price_preference = preference;
        }
    }

    async fn handle_greeting(&self, state: &mut DialogueState, text: &str) -> BotReply {
        state.last_topic = Some(Topic::Greeting);
        match self.generative_reply(text, state).await {
            Some(reply) => BotReply::text(reply),
            None => BotReply::text(templates::greeting()),
        }
    }

    /// Fresh flight-search request: fill slots, then either emit a command
    /// or open a clarification.
    fn handle_search(&self, state: &mut DialogueState, text: &str, today: NaiveDate) -> BotReply {
        let slots = extract::extract_route(text);
        let date = dates::resolve_travel_date(text, today);

        match slots {
            RouteSlots {
                source: Some(source),
                destination: Some(destination),
            } => self.emit_search(state, &source, &destination, date),
            RouteSlots {
                source: Some(source),
                destination: None,
            } => {
                state.pending = PendingClarification::NeedDestination;
                state.pending_source = Some(source.code.clone());
                state.mentioned_cities.insert(source.code);
                state.last_topic = Some(Topic::AskingForDestination);
                BotReply::text(templates::ask_for_destination(&source.name))
            }
            RouteSlots {
                source: None,
                destination: Some(destination),
            } => {
                state.pending = PendingClarification::NeedSource;
                state.pending_destination = Some(destination.code.clone());
                state.mentioned_cities.insert(destination.code);
                state.last_topic = Some(Topic::AskingForSource);
                BotReply::text(templates::ask_for_source(&destination.name))
            }
            RouteSlots {
                source: None,
                destination: None,
            } => {
                state.pending = PendingClarification::NeedBoth;
                state.last_topic = Some(Topic::AskingForLocations);
                BotReply::text(templates::ask_for_locations())
            }
        }
    }

    /// Follow-up message while a source/destination slot is missing. Only
    /// lookup-table cities are accepted here; free text never fills a slot.
    fn handle_clarification(
        &self,
        state: &mut DialogueState,
        text: &str,
        today: NaiveDate,
    ) -> BotReply {
        let found = flightfriend_core::cities::extract_known_cities(text);
        if found.is_empty() {
            return BotReply::text(templates::unrecognized_city());
        }
        let first = ResolvedCity {
            code: found[0].code.to_string(),
            name: found[0].name.to_string(),
            known: true,
        };
        let date = dates::resolve_travel_date(text, today);

        match state.pending {
            PendingClarification::NeedSource => match state.pending_destination.clone() {
                Some(dest_code) => {
                    let destination = resolve_code(&dest_code);
                    self.emit_search(state, &first, &destination, date)
                }
                None => self.restart_clarification(state),
            },
            PendingClarification::NeedDestination => match state.pending_source.clone() {
                Some(source_code) => {
                    let source = resolve_code(&source_code);
                    self.emit_search(state, &source, &first, date)
                }
                None => self.restart_clarification(state),
            },
            PendingClarification::NeedBoth => {
                if found.len() >= 2 {
                    let second = ResolvedCity {
                        code: found[1].code.to_string(),
                        name: found[1].name.to_string(),
                        known: true,
                    };
                    self.emit_search(state, &first, &second, date)
                } else {
                    // One city while both are missing: take it as the
                    // departure and ask for the destination.
                    state.pending = PendingClarification::NeedDestination;
                    state.pending_source = Some(first.code.clone());
                    state.mentioned_cities.insert(first.code);
                    state.last_topic = Some(Topic::AskingForDestination);
                    BotReply::text(templates::got_source_ask_destination(&first.name))
                }
            }
            PendingClarification::None => {
                // Classification only routes here with a pending slot, but
                // recover by treating it as a fresh search.
                self.handle_search(state, text, today)
            }
        }
    }

    fn restart_clarification(&self, state: &mut DialogueState) -> BotReply {
        state.pending = PendingClarification::NeedBoth;
        state.pending_source = None;
        state.pending_destination = None;
        state.last_topic = Some(Topic::AskingForLocations);
        BotReply::text(templates::lost_track_of_route())
    }

    /// Synthesizes the search command, or rejects a same-city route.
    fn emit_search(
        &self,
        state: &mut DialogueState,
        source: &ResolvedCity,
        destination: &ResolvedCity,
        date: NaiveDate,
    ) -> BotReply {
        if source.code == destination.code {
            return BotReply::text(templates::same_city());
        }
        let params = FlightSearchParams::new(source.code.clone(), destination.code.clone(), date);
        info!(
            "[ChatbotEngine] Emitting search {} -> {} on {}",
            params.source, params.destination, params.date
        );
        state.record_search(params.clone());
        let text = templates::search_confirmation(source, destination, &templates::display_date(date));
        BotReply::with_command(text, params)
    }

    /// Sort/filter/alert request against the last presented result set.
    fn handle_refinement(&self, state: &mut DialogueState, text: &str) -> BotReply {
        let lower = text.to_lowercase();
        let option = intent::option_number(text);

        // Waiting to hear which airline to filter by.
        if state.last_topic == Some(Topic::AskedWhichAirline) {
            return match extract::detect_airline(&lower) {
                Some(airline) => self.refine_airline(state, airline),
                None => BotReply::text(templates::unrecognized_airline()),
            };
        }

        let Some(last) = state.last_search.clone() else {
            return BotReply::text(templates::lost_track_of_route());
        };

        if option == Some(1)
            || lower.contains("filter")
            || lower.contains("non-stop")
            || lower.contains("nonstop")
        {
            let mut params = last;
            params.filter = Some(FlightFilter::NonStop);
            params.sort = None;
            state.record_search(params.clone());
            state.last_topic = Some(Topic::AskedFilterNonstop);
            return BotReply::with_command(templates::filter_nonstop_confirmation(), params);
        }

        if option == Some(2)
            || lower.contains("sort by duration")
            || lower.contains("fastest")
            || lower.contains("shortest")
            || lower.contains("duration")
        {
            // Option 2 toggles: after a duration sort it means back to price.
            let to_duration = option != Some(2) || state.last_topic != Some(Topic::SortedByDuration);
            return if to_duration {
                self.refine_sort(state, SortKey::Duration)
            } else {
                self.refine_sort(state, SortKey::Price)
            };
        }

        if lower.contains("sort by price") || lower.contains("cheapest") || lower.contains("lowest price")
        {
            return self.refine_sort(state, SortKey::Price);
        }

        if option == Some(3) || lower.contains("airline") || extract::detect_airline(&lower).is_some()
        {
            return match extract::detect_airline(&lower) {
                Some(airline) => self.refine_airline(state, airline),
                None => {
                    state.last_topic = Some(Topic::AskedWhichAirline);
                    BotReply::text(templates::which_airline())
                }
            };
        }

        if option == Some(4) || lower.contains("price") {
            state.last_topic = Some(Topic::SetPriceAlert);
            let date_text = templates::display_date(last.date);
            return BotReply::text(templates::price_alert_set(&last, &date_text));
        }

        BotReply::text(templates::default_fallback())
    }

    fn refine_sort(&self, state: &mut DialogueState, sort: SortKey) -> BotReply {
        let Some(mut params) = state.last_search.clone() else {
            return BotReply::text(templates::lost_track_of_route());
        };
        params.sort = Some(sort);
        state.record_search(params.clone());
        let text = match sort {
            SortKey::Duration => templates::sort_duration_confirmation(),
            SortKey::Price => templates::sort_price_confirmation(),
        };
        BotReply::with_command(text, params)
    }

    fn refine_airline(&self, state: &mut DialogueState, airline: &str) -> BotReply {
        let Some(mut params) = state.last_search.clone() else {
            return BotReply::text(templates::lost_track_of_route());
        };
        params.airline = Some(airline.to_string());
        state.record_search(params.clone());
        state.last_topic = Some(Topic::AskedFilterAirline);
        BotReply::with_command(templates::airline_filter_confirmation(airline), params)
    }

    async fn handle_topic(
        &self,
        state: &mut DialogueState,
        text: &str,
        kind: TopicKind,
    ) -> BotReply {
        let airline = extract::detect_airline(text);
        match kind {
            TopicKind::Baggage => {
                state.last_topic = Some(Topic::BaggageInfo);
                BotReply::text(templates::baggage_info(airline))
            }
            TopicKind::Checkin => {
                state.last_topic = Some(Topic::CheckinInfo);
                BotReply::text(templates::checkin_info(airline))
            }
            TopicKind::Airline => {
                state.last_topic = Some(Topic::AirlineInfo);
                match self.generative_reply(text, state).await {
                    Some(reply) => BotReply::text(reply),
                    None => BotReply::text(templates::airline_info(airline.unwrap_or("the airline"))),
                }
            }
            TopicKind::Tips => {
                state.last_topic = Some(Topic::TravelTips);
                match self.generative_reply(text, state).await {
                    Some(reply) => BotReply::text(reply),
                    None => BotReply::text(templates::travel_tip()),
                }
            }
            TopicKind::PriceAlert => {
                state.last_topic = Some(Topic::SetPriceAlert);
                BotReply::text(templates::price_alert_info())
            }
            TopicKind::General => {
                state.last_topic = Some(Topic::Fallback);
                match self.generative_reply(text, state).await {
                    Some(reply) => BotReply::text(reply),
                    None => BotReply::text(templates::default_fallback()),
                }
            }
        }
    }

    /// Tries the generative endpoint with a condensed state summary as
    /// context. `None` on any failure; callers fall back to templates.
    async fn generative_reply(&self, text: &str, state: &DialogueState) -> Option<String> {
        let prompt = format!(
            "You are Flight Friend, a warm, friendly, and highly helpful flight assistant. \
Your goal is to make finding flight information easy and pleasant.\n\
Respond conversationally to the user's message about flights, travel, or related topics. \
Keep your responses helpful and relatively concise.\n\n\
Current context of our chat: {}\n\n\
User's message: \"{}\"\n\n\
Your friendly response:",
            state.context_summary(),
            text
        );
        match self.gemini.generate(&prompt).await {
            Ok(reply) if !reply.trim().is_empty() => Some(reply.trim().to_string()),
            Ok(_) => None,
            Err(err) => {
                debug!("[ChatbotEngine] Generative fallback failed: {err}");
                None
            }
        }
    }

    /// Filters, sorts and renders an executed search's results, updating
    /// the dialogue topic so refinements become available.
    pub fn present_results(
        &self,
        state: &mut DialogueState,
        params: &FlightSearchParams,
        mut flights: Vec<Flight>,
    ) -> BotReply {
        if params.filter == Some(FlightFilter::NonStop) {
            flights.retain(|f| f.non_stop);
        }
        if let Some(airline) = &params.airline {
            let wanted = airline.to_lowercase();
            flights.retain(|f| f.airline.to_lowercase().contains(&wanted));
        }
        match params.effective_sort() {
            SortKey::Price => flights.sort_by_key(|f| f.price),
            SortKey::Duration => flights.sort_by_key(|f| f.duration_minutes()),
        }

        if flights.is_empty() {
            state.last_topic = Some(Topic::NoFlightsFound);
            let date_text = templates::display_date(params.date);
            return BotReply::text(templates::no_flights(params, &date_text));
        }

        state.last_topic = Some(match params.effective_sort() {
            SortKey::Price => Topic::SortedByPrice,
            SortKey::Duration => Topic::SortedByDuration,
        });
        BotReply::text(templates::render_results(params, &flights))
    }
}

fn resolve_code(code: &str) -> ResolvedCity {
    flightfriend_core::cities::aliases()
        .find(|(_, info)| info.code == code)
        .map(|(_, info)| ResolvedCity {
            code: info.code.to_string(),
            name: info.name.to_string(),
            known: true,
        })
        .unwrap_or_else(|| ResolvedCity {
            code: code.to_string(),
            name: code.to_string(),
            known: false,
        })
}

// Keeps the default-date rule in one place for callers that need it.
pub fn default_travel_date(today: NaiveDate) -> NaiveDate {
    today + Duration::days(1)
}
