//! Structured search commands and the reply envelope.
//!
//! The engine returns a `BotReply`: display text plus an optional
//! `FlightSearchParams`. The caller acts on the typed field and never has
//! to re-parse rendered text. The legacy markup form
//! `<flight-search source=".." destination=".." date=".." />` is still
//! rendered into the text (and parseable back out) for transcript
//! compatibility and for UIs that consume the text channel only.

use chrono::NaiveDate;
use flightfriend_core::flight::{FlightFilter, FlightSearchParams, SortKey};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::warn;

/// One bot turn: what to display, and what (if anything) to search for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BotReply {
    pub text: String,
    pub command: Option<FlightSearchParams>,
}

impl BotReply {
    /// A plain text reply.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            command: None,
        }
    }

    /// A reply that also triggers a search.
    pub fn with_command(text: impl Into<String>, command: FlightSearchParams) -> Self {
        Self {
            text: text.into(),
            command: Some(command),
        }
    }

    /// Renders the full transcript form: display text with the command
    /// markup appended, matching what the text-only channel carries.
    pub fn render(&self) -> String {
        match &self.command {
            Some(params) => format!("{}\n\n{}", self.text, render_command(params)),
            None => self.text.clone(),
        }
    }
}

static COMMAND_TAG: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"<flight-search\s+source="([^"]+)"\s+destination="([^"]+)"\s+date="([^"]+)"(?:\s+filter="([^"]+)")?(?:\s+airline="([^"]+)")?(?:\s+sort="([^"]+)")?\s*/?>"#,
    )
    .expect("command tag pattern is valid")
});

/// Renders a search as the embedded markup tag. Optional attributes are
/// omitted entirely when unset.
pub fn render_command(params: &FlightSearchParams) -> String {
    let mut tag = format!(
        r#"<flight-search source="{}" destination="{}" date="{}""#,
        params.source,
        params.destination,
        params.date.format("%Y-%m-%d")
    );
    if let Some(filter) = params.filter {
        tag.push_str(&format!(r#" filter="{filter}""#));
    }
    if let Some(airline) = &params.airline {
        tag.push_str(&format!(r#" airline="{airline}""#));
    }
    if let Some(sort) = params.sort {
        tag.push_str(&format!(r#" sort="{sort}""#));
    }
    tag.push_str(" />");
    tag
}

/// Extracts the first search command embedded in a message, if any.
///
/// Accepts both a plain ISO date and a full RFC 3339 timestamp (older
/// transcripts carry the latter). Unknown filter/sort values are dropped
/// with a warning rather than failing the whole command.
pub fn parse_command(message: &str) -> Option<FlightSearchParams> {
    let caps = COMMAND_TAG.captures(message)?;
    let date = parse_tag_date(caps.get(3)?.as_str())?;

    let filter = caps.get(4).and_then(|m| {
        m.as_str()
            .parse::<FlightFilter>()
            .map_err(|_| warn!("[Command] Unknown filter value: {}", m.as_str()))
            .ok()
    });
    let sort = caps.get(6).and_then(|m| {
        m.as_str()
            .parse::<SortKey>()
            .map_err(|_| warn!("[Command] Unknown sort value: {}", m.as_str()))
            .ok()
    });

    Some(FlightSearchParams {
        source: caps.get(1)?.as_str().to_string(),
        destination: caps.get(2)?.as_str().to_string(),
        date,
        filter,
        airline: caps.get(5).map(|m| m.as_str().to_string()),
        sort,
    })
}

/// Removes all command markup from a message, for display.
pub fn strip_commands(message: &str) -> String {
    COMMAND_TAG.replace_all(message, "").trim().to_string()
}

fn parse_tag_date(raw: &str) -> Option<NaiveDate> {
    if let Ok(date) = raw.parse::<NaiveDate>() {
        return Some(date);
    }
    chrono::DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.date_naive())
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> FlightSearchParams {
        FlightSearchParams::new("DEL", "BOM", NaiveDate::from_ymd_opt(2026, 9, 1).unwrap())
    }

    #[test]
    fn test_minimal_command_round_trip() {
        let rendered = render_command(&params());
        assert_eq!(
            rendered,
            r#"<flight-search source="DEL" destination="BOM" date="2026-09-01" />"#
        );
        assert_eq!(parse_command(&rendered).unwrap(), params());
    }

    #[test]
    fn test_full_command_round_trip() {
        let mut full = params();
        full.filter = Some(FlightFilter::NonStop);
        full.airline = Some("indigo".to_string());
        full.sort = Some(SortKey::Duration);

        let rendered = render_command(&full);
        assert_eq!(parse_command(&rendered).unwrap(), full);
    }

    #[test]
    fn test_parse_accepts_rfc3339_timestamps() {
        let legacy = r#"<flight-search source="DEL" destination="BOM" date="2026-09-01T18:30:00.000Z" />"#;
        let parsed = parse_command(legacy).unwrap();
        assert_eq!(parsed.date, NaiveDate::from_ymd_opt(2026, 9, 1).unwrap());
    }

    #[test]
    fn test_parse_within_surrounding_text() {
        let reply = BotReply::with_command("Searching now...", params());
        let transcript = reply.render();
        assert!(transcript.starts_with("Searching now..."));
        assert_eq!(parse_command(&transcript).unwrap(), params());
    }

    #[test]
    fn test_strip_commands_leaves_display_text() {
        let reply = BotReply::with_command("On it!", params());
        assert_eq!(strip_commands(&reply.render()), "On it!");
    }

    #[test]
    fn test_unknown_optional_values_are_dropped() {
        let tag = r#"<flight-search source="DEL" destination="BOM" date="2026-09-01" filter="red-eye" sort="altitude" />"#;
        let parsed = parse_command(tag).unwrap();
        assert!(parsed.filter.is_none());
        assert!(parsed.sort.is_none());
    }

    #[test]
    fn test_no_command_in_plain_text() {
        assert!(parse_command("no tags here").is_none());
    }
}
