//! Keyword tables and matching helpers for newsworthiness scoring.
//!
//! Matching is surface-level: a term matches when it appears at a word start
//! in the lowercased text. Prefix terms like "unioniz" therefore catch
//! "unionize", "unionizing" and "unionization".

pub const LABOR_ACTIONS: &[&str] = &[
    "strike",
    "walkout",
    "walk out",
    "walked off",
    "lockout",
    "picket",
    "layoff",
    "laid off",
    "union drive",
    "unioniz",
    "wage theft",
    "collective bargaining",
    "sick-out",
    "work stoppage",
];

pub const WORKER_TERMS: &[&str] = &[
    "worker",
    "employee",
    "union",
    "labor",
    "staff",
    "nurses",
    "teachers",
    "drivers",
    "organizer",
];

pub const SCALE_TERMS: &[&str] = &[
    "nationwide",
    "statewide",
    "industry-wide",
    "thousands of",
    "hundreds of",
    "across the country",
];

pub const BREAKING_TERMS: &[&str] = &[
    "breaking",
    "just in",
    "developing",
    "happening now",
    "live updates",
];

pub const DEADLINE_TERMS: &[&str] = &[
    "vote",
    "deadline",
    "tomorrow",
    "this week",
    "expires",
    "set for",
    "scheduled",
];

pub const WIRE_MENTIONS: &[&str] = &[
    "reuters",
    "associated press",
    "bloomberg",
    "agence france-presse",
];

pub const HEDGES: &[&str] = &[
    "allegedly",
    "reportedly",
    "rumored",
    "rumoured",
    "unconfirmed",
    "sources say",
    "it is claimed",
];

pub const NATIONAL_TERMS: &[&str] = &[
    "nationwide",
    "national",
    "federal",
    "congress",
    "across the country",
    "u.s.",
    "united states",
    "white house",
    "department of labor",
    "nlrb",
];

/// (term, region slug)
pub const MAJOR_METROS: &[(&str, &str)] = &[
    ("new york", "new_york"),
    ("nyc", "new_york"),
    ("los angeles", "los_angeles"),
    ("chicago", "chicago"),
    ("houston", "houston"),
    ("phoenix", "phoenix"),
    ("philadelphia", "philadelphia"),
    ("san antonio", "san_antonio"),
    ("san diego", "san_diego"),
    ("dallas", "dallas"),
    ("san francisco", "san_francisco"),
    ("seattle", "seattle"),
    ("boston", "boston"),
    ("atlanta", "atlanta"),
    ("miami", "miami"),
    ("detroit", "detroit"),
    ("minneapolis", "minneapolis"),
    ("denver", "denver"),
];

pub const MULTI_STATE_TERMS: &[&str] = &[
    "multi-state",
    "multistate",
    "several states",
    "across states",
    "states including",
];

pub const STATES: &[&str] = &[
    "alabama", "alaska", "arizona", "arkansas", "california", "colorado", "connecticut",
    "delaware", "florida", "georgia", "hawaii", "idaho", "illinois", "indiana", "iowa", "kansas",
    "kentucky", "louisiana", "maine", "maryland", "massachusetts", "michigan", "minnesota",
    "mississippi", "missouri", "montana", "nebraska", "nevada", "new hampshire", "new jersey",
    "new mexico", "north carolina", "north dakota", "ohio", "oklahoma", "oregon", "pennsylvania",
    "rhode island", "south carolina", "south dakota", "tennessee", "texas", "utah", "vermont",
    "virginia", "west virginia", "wisconsin", "wyoming",
];

pub const LOCAL_TERMS: &[&str] = &[
    "county",
    "town",
    "township",
    "village",
    "city council",
    "local",
    "neighborhood",
];

pub const CONFLICT_TERMS: &[&str] = &[
    "strike",
    "dispute",
    "lawsuit",
    "sued",
    "sues",
    "safety violation",
    "osha",
    "walkout",
    "lockout",
    "picket",
    "grievance",
    "unfair labor practice",
    "retaliat",
    "protest",
    "fired",
];

pub const RESOLUTION_TERMS: &[&str] = &[
    "settlement",
    "settled",
    "agreement reached",
    "tentative agreement",
    "deal reached",
    "resolved",
    "ratified",
    "strike ends",
    "ends strike",
];

pub const NOVELTY_TERMS: &[&str] = &[
    "first-of-its-kind",
    "first of its kind",
    "first ever",
    "first-ever",
    "unprecedented",
    "historic",
    "escalat",
    "record",
];

pub const SAFETY_TERMS: &[&str] = &["safety", "osha", "injur", "hazard", "unsafe"];

pub const WAGE_TERMS: &[&str] = &["wage", "pay", "salary", "overtime", "minimum wage"];

pub const POLICY_TERMS: &[&str] = &[
    "bill",
    "legislation",
    "law",
    "regulation",
    "nlrb",
    "department of labor",
    "ruling",
];

pub const BUSINESS_TERMS: &[&str] = &["profit", "earnings", "ceo", "merger", "acquisition"];

/// True when `term` occurs in `lower` starting at a word boundary.
pub fn has_term(lower: &str, term: &str) -> bool {
    lower.match_indices(term).any(|(i, _)| {
        lower[..i]
            .chars()
            .next_back()
            .map_or(true, |prev| !prev.is_alphanumeric())
    })
}

/// Number of distinct terms from `terms` present in `lower`.
pub fn count_terms(lower: &str, terms: &[&str]) -> usize {
    terms.iter().filter(|t| has_term(lower, t)).count()
}

pub fn any_term(lower: &str, terms: &[&str]) -> bool {
    terms.iter().any(|t| has_term(lower, t))
}
