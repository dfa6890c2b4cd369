//! Pulls a city and an "online only" intent out of free-text search input,
//! e.g. `beach cleanup near bombay` or `remote tutoring`.

use serde::Serialize;

const LOCATION_INDICATORS: [&str; 4] = ["in", "near", "at", "around"];

const VIRTUAL_KEYWORDS: [&str; 4] = ["virtual", "online", "remote", "wfh"];

const KNOWN_CITIES: [&str; 24] = [
    "mumbai",
    "navi mumbai",
    "delhi",
    "bengaluru",
    "chennai",
    "kolkata",
    "hyderabad",
    "pune",
    "ahmedabad",
    "jaipur",
    "lucknow",
    "chandigarh",
    "gurugram",
    "noida",
    "kochi",
    "thiruvananthapuram",
    "goa",
    "indore",
    "bhopal",
    "nagpur",
    "surat",
    "vadodara",
    "coimbatore",
    "mysuru",
];

/// Old or alternate names -> canonical city.
const CITY_ALIASES: [(&str, &str); 10] = [
    ("bombay", "mumbai"),
    ("calcutta", "kolkata"),
    ("madras", "chennai"),
    ("bangalore", "bengaluru"),
    ("gurgaon", "gurugram"),
    ("poona", "pune"),
    ("new delhi", "delhi"),
    ("trivandrum", "thiruvananthapuram"),
    ("cochin", "kochi"),
    ("mysore", "mysuru"),
];

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ParsedQuery {
    /// Input with the location phrase and virtual keywords removed.
    pub keywords: String,
    pub city: Option<String>,
    pub is_virtual: bool,
}

impl ParsedQuery {
    /// Algolia `filters` expression for the extracted facets.
    pub fn to_search_filters(&self) -> Option<String> {
        let mut clauses = Vec::new();
        if let Some(city) = &self.city {
            clauses.push(format!("city:\"{}\"", city));
        }
        if self.is_virtual {
            clauses.push("is_virtual:true".to_string());
        }
        (!clauses.is_empty()).then(|| clauses.join(" AND "))
    }
}

/// Canonical name for a known city or alias.
pub fn normalize_city(name: &str) -> Option<&'static str> {
    let name = name.trim().to_lowercase();
    CITY_ALIASES
        .iter()
        .find(|(alias, _)| *alias == name)
        .map(|(_, canonical)| *canonical)
        .or_else(|| KNOWN_CITIES.iter().copied().find(|city| *city == name))
}

/// Facet value for any city name: canonical when known, else lowercased.
pub fn city_facet(name: &str) -> String {
    match normalize_city(name) {
        Some(canonical) => canonical.to_string(),
        None => name.trim().to_lowercase(),
    }
}

fn tokenize(input: &str) -> Vec<String> {
    input
        .to_lowercase()
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c.is_whitespace() || c == '-' {
                c
            } else {
                ' '
            }
        })
        .collect::<String>()
        .split_whitespace()
        .map(str::to_string)
        .collect()
}

/// City starting at `idx`, trying two-token names first. Returns the
/// canonical name and how many tokens it spans.
fn city_at(tokens: &[String], idx: usize) -> Option<(&'static str, usize)> {
    if let Some(next) = tokens.get(idx + 1) {
        let pair = format!("{} {}", tokens[idx], next);
        if let Some(city) = normalize_city(&pair) {
            return Some((city, 2));
        }
    }
    tokens
        .get(idx)
        .and_then(|token| normalize_city(token))
        .map(|city| (city, 1))
}

pub fn parse_search_query(input: &str) -> ParsedQuery {
    let tokens = tokenize(input);
    let mut consumed = vec![false; tokens.len()];
    let mut city = None;

    // "in mumbai", "near new delhi"
    for idx in 0..tokens.len() {
        if !LOCATION_INDICATORS.contains(&tokens[idx].as_str()) {
            continue;
        }
        if let Some((found, span)) = city_at(&tokens, idx + 1) {
            city = Some(found.to_string());
            consumed[idx..=idx + span].iter_mut().for_each(|c| *c = true);
            break;
        }
    }

    // a bare city name anywhere
    if city.is_none() {
        let mut idx = 0;
        while idx < tokens.len() {
            if let Some((found, span)) = city_at(&tokens, idx) {
                city = Some(found.to_string());
                consumed[idx..idx + span].iter_mut().for_each(|c| *c = true);
                break;
            }
            idx += 1;
        }
    }

    let mut is_virtual = false;
    for idx in 0..tokens.len() {
        let token = tokens[idx].as_str();
        if VIRTUAL_KEYWORDS.contains(&token) {
            is_virtual = true;
            consumed[idx] = true;
        } else if token == "from" && tokens.get(idx + 1).is_some_and(|t| t == "home") {
            is_virtual = true;
            consumed[idx] = true;
            consumed[idx + 1] = true;
        }
    }

    let keywords = tokens
        .iter()
        .zip(&consumed)
        .filter(|(_, consumed)| !**consumed)
        .map(|(token, _)| token.as_str())
        .collect::<Vec<_>>()
        .join(" ");

    ParsedQuery {
        keywords,
        city,
        is_virtual,
    }
}
