//! City and airport lookup table.
//!
//! Static mapping from city names (and their common aliases) to IATA-style
//! codes and display names. The parser never guesses a city that is absent
//! from both this table and the message text.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;

/// A known city with its IATA-style code and canonical display name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CityInfo {
    pub code: &'static str,
    pub name: &'static str,
}

/// A city resolved from free text. Either a table hit or the documented
/// fallback (first three letters uppercased).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedCity {
    pub code: String,
    pub name: String,
    /// True when the name was found in the lookup table.
    pub known: bool,
}

/// Alias -> city table. Aliases are lowercase; several aliases may map to
/// the same code (bombay/mumbai, madras/chennai, ...).
static CITY_TABLE: &[(&str, CityInfo)] = &[
    ("delhi", CityInfo { code: "DEL", name: "Delhi" }),
    ("new delhi", CityInfo { code: "DEL", name: "Delhi" }),
    ("mumbai", CityInfo { code: "BOM", name: "Mumbai" }),
    ("bombay", CityInfo { code: "BOM", name: "Mumbai" }),
    ("bangalore", CityInfo { code: "BLR", name: "Bangalore" }),
    ("bengaluru", CityInfo { code: "BLR", name: "Bangalore" }),
    ("hyderabad", CityInfo { code: "HYD", name: "Hyderabad" }),
    ("chennai", CityInfo { code: "MAA", name: "Chennai" }),
    ("madras", CityInfo { code: "MAA", name: "Chennai" }),
    ("kolkata", CityInfo { code: "CCU", name: "Kolkata" }),
    ("calcutta", CityInfo { code: "CCU", name: "Kolkata" }),
    ("ahmedabad", CityInfo { code: "AMD", name: "Ahmedabad" }),
    ("pune", CityInfo { code: "PNQ", name: "Pune" }),
    ("jaipur", CityInfo { code: "JAI", name: "Jaipur" }),
    ("ranchi", CityInfo { code: "IXR", name: "Ranchi" }),
    ("patna", CityInfo { code: "PAT", name: "Patna" }),
    ("lucknow", CityInfo { code: "LKO", name: "Lucknow" }),
    ("guwahati", CityInfo { code: "GAU", name: "Guwahati" }),
    ("bhubaneswar", CityInfo { code: "BBI", name: "Bhubaneswar" }),
    ("goa", CityInfo { code: "GOI", name: "Goa (Mopa/Dabolim)" }),
    ("varanasi", CityInfo { code: "VNS", name: "Varanasi" }),
    ("srinagar", CityInfo { code: "SXR", name: "Srinagar" }),
    ("coimbatore", CityInfo { code: "CJB", name: "Coimbatore" }),
    ("trivandrum", CityInfo { code: "TRV", name: "Trivandrum" }),
    ("thiruvananthapuram", CityInfo { code: "TRV", name: "Trivandrum" }),
    ("indore", CityInfo { code: "IDR", name: "Indore" }),
    ("nagpur", CityInfo { code: "NAG", name: "Nagpur" }),
    ("chandigarh", CityInfo { code: "IXC", name: "Chandigarh" }),
    ("amritsar", CityInfo { code: "ATQ", name: "Amritsar" }),
    ("raipur", CityInfo { code: "RPR", name: "Raipur" }),
    ("visakhapatnam", CityInfo { code: "VTZ", name: "Visakhapatnam" }),
    ("vizag", CityInfo { code: "VTZ", name: "Visakhapatnam" }),
    ("bhopal", CityInfo { code: "BHO", name: "Bhopal" }),
    ("udaipur", CityInfo { code: "UDR", name: "Udaipur" }),
    ("kochi", CityInfo { code: "COK", name: "Kochi" }),
    ("cochin", CityInfo { code: "COK", name: "Kochi" }),
];

static CITY_MAP: Lazy<HashMap<&'static str, &'static CityInfo>> = Lazy::new(|| {
    CITY_TABLE
        .iter()
        .map(|(alias, info)| (*alias, info))
        .collect()
});

/// Word-boundary pattern over every known alias, longest first so that
/// multi-word aliases ("new delhi") win over their suffixes.
static CITY_PATTERN: Lazy<Regex> = Lazy::new(|| {
    let mut aliases: Vec<&str> = CITY_TABLE.iter().map(|(alias, _)| *alias).collect();
    aliases.sort_by_key(|alias| std::cmp::Reverse(alias.len()));
    let pattern = format!(r"\b({})\b", aliases.join("|"));
    Regex::new(&pattern).expect("city alias pattern is valid")
});

/// Looks up a city by exact (case-insensitive) alias.
pub fn lookup(name: &str) -> Option<&'static CityInfo> {
    CITY_MAP.get(name.trim().to_lowercase().as_str()).copied()
}

/// Resolves a free-text city name to a code and display name.
///
/// Unknown names fall back to the first three letters uppercased, with the
/// name capitalized. The caller can inspect `known` to tell the two apart.
pub fn resolve(name: &str) -> ResolvedCity {
    let trimmed = name.trim();
    if let Some(info) = lookup(trimmed) {
        return ResolvedCity {
            code: info.code.to_string(),
            name: info.name.to_string(),
            known: true,
        };
    }
    let lower = trimmed.to_lowercase();
    let code: String = lower.chars().take(3).collect::<String>().to_uppercase();
    let mut chars = lower.chars();
    let name = match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    };
    ResolvedCity {
        code,
        name,
        known: false,
    }
}

/// Returns every known city mentioned in the text, in text order,
/// de-duplicated by code (the first alias for a city wins).
pub fn extract_known_cities(text: &str) -> Vec<&'static CityInfo> {
    let lower = text.to_lowercase();
    let mut seen_codes: Vec<&str> = Vec::new();
    let mut found = Vec::new();
    for m in CITY_PATTERN.find_iter(&lower) {
        if let Some(info) = CITY_MAP.get(m.as_str()).copied() {
            if !seen_codes.contains(&info.code) {
                seen_codes.push(info.code);
                found.push(info);
            }
        }
    }
    found
}

/// True when the text mentions at least one known city.
pub fn mentions_known_city(text: &str) -> bool {
    CITY_PATTERN.is_match(&text.to_lowercase())
}

/// Iterates every (alias, city) pair in the table.
pub fn aliases() -> impl Iterator<Item = (&'static str, &'static CityInfo)> {
    CITY_TABLE.iter().map(|(alias, info)| (*alias, info))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aliases_resolve_to_same_code() {
        // Every alias pair must map to one code.
        for (a, b, code) in [
            ("Bombay", "Mumbai", "BOM"),
            ("Madras", "Chennai", "MAA"),
            ("Calcutta", "Kolkata", "CCU"),
            ("Bengaluru", "Bangalore", "BLR"),
            ("Vizag", "Visakhapatnam", "VTZ"),
            ("Cochin", "Kochi", "COK"),
            ("New Delhi", "Delhi", "DEL"),
            ("Thiruvananthapuram", "Trivandrum", "TRV"),
        ] {
            assert_eq!(resolve(a).code, code, "{a} should resolve to {code}");
            assert_eq!(resolve(b).code, code, "{b} should resolve to {code}");
        }
    }

    #[test]
    fn test_unknown_city_falls_back_to_prefix_code() {
        let resolved = resolve("Shimla");
        assert_eq!(resolved.code, "SHI");
        assert_eq!(resolved.name, "Shimla");
        assert!(!resolved.known);
    }

    #[test]
    fn test_extract_preserves_text_order() {
        let cities = extract_known_cities("cheap flights from Mumbai to Delhi please");
        let codes: Vec<&str> = cities.iter().map(|c| c.code).collect();
        assert_eq!(codes, vec!["BOM", "DEL"]);
    }

    #[test]
    fn test_extract_dedups_aliases_of_one_city() {
        let cities = extract_known_cities("bombay or mumbai, whichever");
        assert_eq!(cities.len(), 1);
        assert_eq!(cities[0].code, "BOM");
    }

    #[test]
    fn test_multi_word_alias_wins_over_suffix() {
        let cities = extract_known_cities("fly out of new delhi tomorrow");
        assert_eq!(cities.len(), 1);
        assert_eq!(cities[0].code, "DEL");
    }

    #[test]
    fn test_word_boundary_does_not_match_substrings() {
        assert!(!mentions_known_city("the goal is unclear"));
        assert!(mentions_known_city("flights to goa"));
    }
}
