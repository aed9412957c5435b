/// US state postal codes plus DC.
#[rustfmt::skip]
pub const STATE_CODES: [&str; 51] = [
    "AL", "AK", "AZ", "AR", "CA", "CO", "CT", "DE", "DC", "FL",
    "GA", "HI", "ID", "IL", "IN", "IA", "KS", "KY", "LA", "ME",
    "MD", "MA", "MI", "MN", "MS", "MO", "MT", "NE", "NV", "NH",
    "NJ", "NM", "NY", "NC", "ND", "OH", "OK", "OR", "PA", "RI",
    "SC", "SD", "TN", "TX", "UT", "VT", "VA", "WA", "WV", "WI",
    "WY",
];

/// Upper-cased two-letter code if it names a state (or DC).
pub fn normalize_state(code: &str) -> Option<String> {
    let upper = code.trim().to_ascii_uppercase();
    STATE_CODES.contains(&upper.as_str()).then_some(upper)
}
