//! Structured field extraction from speech metadata sentences
//!
//! Metadata arrives as a single free-text sentence such as:
//!
//! ```text
//! Speech by Mr. John Smith, Governor of the European Central Bank, at the
//! Annual Conference, 3 May 2024.
//! ```
//!
//! Each field has its own extractor. [`MetadataParser::parse`] runs them in
//! a fixed order; a rule that finds nothing leaves its field empty. The
//! location rule reads the speech date, so the date rule runs first.

use crate::models::StructuredFields;
use once_cell::sync::Lazy;
use regex::Regex;

static LEADING_TITLE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"^\s*"([^"]+)""#).expect("valid title regex"));

static ANY_TITLE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"["“”]([^"“”]+)["“”]"#).expect("valid quoted-title regex"));

static SPEECH_TYPE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*([A-Za-z]+(?:\s+[a-z]+)?)\s+(?:by|remarks)").expect("valid speech type regex")
});

static SPEAKER_WITH_ROLE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:by|remarks by)\s+([^,]+),\s+(.+?)(?:,\s+at|,\s+on|at|on|,\s+\d)")
        .expect("valid speaker regex")
});

static SPEAKER_ONLY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:by|remarks by)\s+([^,]+)").expect("valid speaker regex"));

static EVENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:at|on)\s+the\s+(.+?)(?:,|\.|$)").expect("valid event regex"));

static SPEECH_DATE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(\d{1,2}\s+(?:January|February|March|April|May|June|July|August|September|October|November|December)\s+\d{4})",
    )
    .expect("valid date regex")
});

static CITY_REGION_BEFORE_DATE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r",\s+([^,]+,\s+[A-Za-z]+)(?:,\s+\d)").expect("valid location regex")
});

static ORGANIZER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)organi[sz]ed by\s+([^,]+)").expect("valid organizer regex"));

const KNOWN_CITIES: &[&str] = &[
    "Washington DC",
    "New York City",
    "Frankfurt",
    "London",
    "Tokyo",
    "Paris",
    "Berlin",
    "Basel",
    "Zurich",
];

static KNOWN_CITY_PATTERNS: Lazy<Vec<(&'static str, Regex)>> = Lazy::new(|| {
    KNOWN_CITIES
        .iter()
        .map(|city| {
            let pattern = format!(r"(?i)\b{}\b", regex::escape(city));
            (*city, Regex::new(&pattern).expect("valid city regex"))
        })
        .collect()
});

/// One extraction step. Fills zero or more fields of `fields`.
type Rule = fn(&str, &mut StructuredFields);

/// Rules in execution order
const RULES: &[Rule] = &[
    apply_title,
    apply_speech_type,
    apply_speaker_and_role,
    apply_event,
    apply_speech_date,
    apply_location,
    apply_organizer,
];

fn apply_title(text: &str, fields: &mut StructuredFields) {
    fields.title = title(text);
}

fn apply_speech_type(text: &str, fields: &mut StructuredFields) {
    fields.speech_type = speech_type(text);
}

fn apply_speaker_and_role(text: &str, fields: &mut StructuredFields) {
    let (speaker, role) = speaker_and_role(text);
    fields.speaker = speaker;
    fields.role = role;
}

fn apply_event(text: &str, fields: &mut StructuredFields) {
    fields.event = event(text);
}

fn apply_speech_date(text: &str, fields: &mut StructuredFields) {
    fields.speech_date = speech_date(text);
}

fn apply_location(text: &str, fields: &mut StructuredFields) {
    fields.location = location(text, fields.speech_date.as_deref());
}

fn apply_organizer(text: &str, fields: &mut StructuredFields) {
    fields.organizer = organizer(text);
}

/// Stateless metadata sentence parser
#[derive(Debug, Clone, Copy, Default)]
pub struct MetadataParser;

impl MetadataParser {
    pub fn new() -> Self {
        Self
    }

    /// Extract every field the rules can find. Never fails.
    pub fn parse(&self, raw_text: &str) -> StructuredFields {
        let mut fields = StructuredFields::default();
        for rule in RULES {
            rule(raw_text, &mut fields);
        }
        fields
    }
}

/// Leading quoted phrase, else the first quoted phrase anywhere
pub fn title(text: &str) -> Option<String> {
    LEADING_TITLE
        .captures(text)
        .or_else(|| ANY_TITLE.captures(text))
        .and_then(|caps| non_empty(caps.get(1)?.as_str()))
}

/// Word or two-word phrase opening the sentence before "by"/"remarks"
pub fn speech_type(text: &str) -> Option<String> {
    SPEECH_TYPE
        .captures(text)
        .and_then(|caps| non_empty(caps.get(1)?.as_str()))
}

/// Speaker name and, when present, the role that follows it
pub fn speaker_and_role(text: &str) -> (Option<String>, Option<String>) {
    if let Some(caps) = SPEAKER_WITH_ROLE.captures(text) {
        let speaker = caps.get(1).and_then(|m| non_empty(m.as_str()));
        let role = caps.get(2).and_then(|m| {
            let role = m.as_str().trim();
            non_empty(role.strip_suffix(',').unwrap_or(role))
        });
        return (speaker, role);
    }

    let speaker = SPEAKER_ONLY
        .captures(text)
        .and_then(|caps| non_empty(caps.get(1)?.as_str()));
    (speaker, None)
}

/// Event name after "at the"/"on the"
pub fn event(text: &str) -> Option<String> {
    let caps = EVENT.captures(text)?;
    let event = caps.get(1)?.as_str().trim();
    non_empty(event.strip_prefix("the ").unwrap_or(event))
}

/// `D[D] Month YYYY`
pub fn speech_date(text: &str) -> Option<String> {
    SPEECH_DATE
        .captures(text)
        .and_then(|caps| non_empty(caps.get(1)?.as_str()))
}

/// Location, trying in turn: `, City, Region,` before a digit; a known
/// city; the comma-delimited segment just before the speech date
pub fn location(text: &str, speech_date: Option<&str>) -> Option<String> {
    if let Some(caps) = CITY_REGION_BEFORE_DATE.captures(text) {
        return caps.get(1).and_then(|m| non_empty(m.as_str()));
    }

    if let Some((city, _)) = KNOWN_CITY_PATTERNS
        .iter()
        .find(|(_, pattern)| pattern.is_match(text))
    {
        return Some(city.to_string());
    }

    segment_before_date(text, speech_date?)
}

fn segment_before_date(text: &str, speech_date: &str) -> Option<String> {
    let date_index = text.find(speech_date).filter(|&i| i > 0)?;
    let before = text[..date_index].trim();

    let last_comma = before.rfind(',')?;
    let second_last_comma = before[..last_comma].rfind(',')?;

    let segment = before[second_last_comma + 1..last_comma].trim();
    let lowered = segment.to_lowercase();
    if lowered.contains("organised by") || lowered.contains("organized by") {
        return None;
    }
    non_empty(segment)
}

/// Organizer named after "organised by" / "organized by"
pub fn organizer(text: &str) -> Option<String> {
    ORGANIZER
        .captures(text)
        .and_then(|caps| non_empty(caps.get(1)?.as_str()))
}

fn non_empty(value: &str) -> Option<String> {
    let value = value.trim();
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}
