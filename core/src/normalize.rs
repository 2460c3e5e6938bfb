//! Name normalisation for ticket-supplied county and state names.
//!
//! RULE: every comparison the resolver makes goes through these
//! functions, on both the ticket side and the crosswalk side.
//! Normalised forms are lower-case with single spaces.

/// (abbreviation, full name) for the 50 states, DC and Puerto Rico.
const STATES: &[(&str, &str)] = &[
    ("al", "alabama"),
    ("ak", "alaska"),
    ("az", "arizona"),
    ("ar", "arkansas"),
    ("ca", "california"),
    ("co", "colorado"),
    ("ct", "connecticut"),
    ("de", "delaware"),
    ("dc", "district of columbia"),
    ("fl", "florida"),
    ("ga", "georgia"),
    ("hi", "hawaii"),
    ("id", "idaho"),
    ("il", "illinois"),
    ("in", "indiana"),
    ("ia", "iowa"),
    ("ks", "kansas"),
    ("ky", "kentucky"),
    ("la", "louisiana"),
    ("me", "maine"),
    ("md", "maryland"),
    ("ma", "massachusetts"),
    ("mi", "michigan"),
    ("mn", "minnesota"),
    ("ms", "mississippi"),
    ("mo", "missouri"),
    ("mt", "montana"),
    ("ne", "nebraska"),
    ("nv", "nevada"),
    ("nh", "new hampshire"),
    ("nj", "new jersey"),
    ("nm", "new mexico"),
    ("ny", "new york"),
    ("nc", "north carolina"),
    ("nd", "north dakota"),
    ("oh", "ohio"),
    ("ok", "oklahoma"),
    ("or", "oregon"),
    ("pa", "pennsylvania"),
    ("ri", "rhode island"),
    ("sc", "south carolina"),
    ("sd", "south dakota"),
    ("tn", "tennessee"),
    ("tx", "texas"),
    ("ut", "utah"),
    ("vt", "vermont"),
    ("va", "virginia"),
    ("wa", "washington"),
    ("wv", "west virginia"),
    ("wi", "wisconsin"),
    ("wy", "wyoming"),
    ("pr", "puerto rico"),
];

/// Lower-case, trim, and collapse runs of whitespace to one space.
pub fn clean(input: &str) -> String {
    input
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Full lower-case state name for a 2-letter abbreviation.
pub fn state_name_for_abbreviation(abbr: &str) -> Option<&'static str> {
    let abbr = clean(abbr);
    STATES
        .iter()
        .find(|(a, _)| *a == abbr)
        .map(|(_, name)| *name)
}

/// True if `name` (already cleaned) is one of the known full state names.
pub fn is_known_state(name: &str) -> bool {
    STATES.iter().any(|(_, n)| *n == name)
}

/// Normalise a state given as a full name or a 2-letter abbreviation.
///
/// Unknown names pass through cleaned; the resolver reports them as
/// "state not found" when no crosswalk row carries them.
pub fn normalize_state(input: &str) -> String {
    let cleaned = clean(input).replace('.', "");
    if cleaned.len() == 2 {
        if let Some(full) = state_name_for_abbreviation(&cleaned) {
            return full.to_string();
        }
    }
    cleaned
}

/// Longest known state name that ends `text` on a word boundary.
///
/// Longest-first keeps "virginia" from claiming "... west virginia".
pub fn trailing_state_name(text: &str) -> Option<&'static str> {
    let text = clean(text);
    STATES
        .iter()
        .map(|(_, name)| *name)
        .filter(|name| ends_with_word(&text, name))
        .max_by_key(|name| name.len())
}

fn ends_with_word(text: &str, suffix: &str) -> bool {
    if text == suffix {
        return true;
    }
    text.strip_suffix(suffix)
        .map(|head| head.ends_with(' '))
        .unwrap_or(false)
}

/// Normalise a county name.
///
///   "Queen Anne's County" → "queen annes"
///   "St. Mary's"          → "saint marys"
///   "  DeKalb   County "  → "dekalb"
pub fn normalize_county(input: &str) -> String {
    let lowered = clean(input).replace('\u{2019}', "'");
    let without_possessive = lowered.replace("'s", "s").replace('\'', "");

    let expanded: Vec<String> = without_possessive
        .split(' ')
        .filter(|t| !t.is_empty())
        .map(expand_saint)
        .collect();
    let joined = clean(&expanded.join(" ").replace('.', ""));

    strip_trailing_county(&joined).to_string()
}

fn expand_saint(token: &str) -> String {
    match token {
        "st" | "st." => return "saint".to_string(),
        "ste" | "ste." => return "sainte".to_string(),
        _ => {}
    }
    if let Some(rest) = token.strip_prefix("ste.") {
        return format!("sainte {rest}");
    }
    if let Some(rest) = token.strip_prefix("st.") {
        return format!("saint {rest}");
    }
    token.to_string()
}

/// Drop a trailing " county" word from an already-cleaned name.
pub fn strip_trailing_county(name: &str) -> &str {
    name.strip_suffix(" county").unwrap_or(name)
}

/// Remove every literal "county" and re-clean. Used by the last matching
/// tier, which tolerates "County" appearing anywhere in the name.
pub fn strip_county_literal(name: &str) -> String {
    clean(&name.replace("county", " "))
}

/// "New York, New York" on a ticket means Manhattan.
pub fn rewrite_manhattan(county: &str, state: &str) -> Option<&'static str> {
    if clean(county) == "new york" && normalize_state(state) == "new york" {
        Some("New York County")
    } else {
        None
    }
}
