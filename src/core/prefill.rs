use serde::{Deserialize, Serialize};

use super::error::InputError;
use super::leaps::LeapPrefill;
use super::states::normalize_state;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    Rent,
    Retirement,
    Debt,
    Invest,
}

impl Intent {
    pub fn as_str(self) -> &'static str {
        match self {
            Intent::Rent => "rent",
            Intent::Retirement => "retirement",
            Intent::Debt => "debt",
            Intent::Invest => "invest",
        }
    }

    fn parse(raw: &str) -> Result<Self, InputError> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "rent" | "move" | "moving" => Ok(Intent::Rent),
            "retirement" | "retire" | "401k" => Ok(Intent::Retirement),
            "debt" => Ok(Intent::Debt),
            "invest" | "investing" => Ok(Intent::Invest),
            other => Err(InputError::UnknownIntent(other.to_string())),
        }
    }
}

/// Raw query-string values, exactly as another page wrote them.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PrefillQuery {
    pub salary: Option<String>,
    pub state: Option<String>,
    pub intent: Option<String>,
    #[serde(rename = "match")]
    pub employer_match: Option<String>,
    pub match_pct: Option<String>,
    pub current_pct: Option<String>,
    pub recommended_pct: Option<String>,
    pub delta30yr: Option<String>,
}

/// Validated page-to-page state.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Prefill {
    pub salary: f64,
    pub state: String,
    pub intent: Intent,
    pub employer_match: bool,
    pub match_pct: f64,
    pub current_pct: f64,
    pub recommended_pct: f64,
    pub delta30yr: Option<f64>,
}

fn parse_number(field: &'static str, raw: &str) -> Result<f64, InputError> {
    let cleaned: String = raw
        .chars()
        .filter(|c| !matches!(c, ',' | '$' | '%') && !c.is_whitespace())
        .collect();
    match cleaned.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(v),
        _ => Err(InputError::InvalidNumber {
            field,
            value: raw.to_string(),
        }),
    }
}

fn optional_number(field: &'static str, raw: Option<&str>) -> Result<Option<f64>, InputError> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        Some(s) => parse_number(field, s).map(Some),
        None => Ok(None),
    }
}

fn parse_flag(raw: Option<&str>) -> bool {
    matches!(
        raw.map(|s| s.trim().to_ascii_lowercase()).as_deref(),
        Some("1" | "true" | "yes" | "on")
    )
}

impl PrefillQuery {
    pub fn from_pairs<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let mut query = PrefillQuery::default();
        for (key, value) in pairs {
            let slot = match key {
                "salary" => &mut query.salary,
                "state" => &mut query.state,
                "intent" => &mut query.intent,
                "match" => &mut query.employer_match,
                "matchPct" => &mut query.match_pct,
                "currentPct" => &mut query.current_pct,
                "recommendedPct" => &mut query.recommended_pct,
                "delta30yr" => &mut query.delta30yr,
                _ => continue,
            };
            *slot = Some(value.to_string());
        }
        query
    }

    pub fn into_prefill(self) -> Result<Prefill, InputError> {
        let salary_raw = self
            .salary
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or(InputError::MissingField("salary"))?;
        let salary = parse_number("salary", salary_raw)?;
        if salary <= 0.0 {
            return Err(InputError::NotPositive("salary"));
        }

        let state_raw = self
            .state
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or(InputError::MissingField("state"))?;
        let state = normalize_state(state_raw)
            .ok_or_else(|| InputError::UnknownState(state_raw.to_string()))?;

        let intent_raw = self
            .intent
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .ok_or(InputError::MissingField("intent"))?;
        let intent = Intent::parse(intent_raw)?;

        let employer_match = parse_flag(self.employer_match.as_deref());
        let match_pct = optional_number("matchPct", self.match_pct.as_deref())?
            .unwrap_or(0.0)
            .max(0.0);
        let current_pct = optional_number("currentPct", self.current_pct.as_deref())?
            .unwrap_or(0.0)
            .max(0.0);
        let recommended_pct = optional_number("recommendedPct", self.recommended_pct.as_deref())?
            .unwrap_or(if employer_match { match_pct } else { current_pct })
            .max(0.0);
        let delta30yr = optional_number("delta30yr", self.delta30yr.as_deref())?;

        Ok(Prefill {
            salary,
            state,
            intent,
            employer_match,
            match_pct,
            current_pct,
            recommended_pct,
            delta30yr,
        })
    }
}

impl Prefill {
    pub fn to_query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![
            ("salary", format!("{}", self.salary)),
            ("state", self.state.clone()),
            ("intent", self.intent.as_str().to_string()),
            ("match", if self.employer_match { "1" } else { "0" }.to_string()),
            ("matchPct", format!("{}", self.match_pct)),
            ("currentPct", format!("{}", self.current_pct)),
            ("recommendedPct", format!("{}", self.recommended_pct)),
        ];
        if let Some(delta) = self.delta30yr {
            pairs.push(("delta30yr", format!("{delta}")));
        }
        pairs
    }

    pub fn to_leap_prefill(&self) -> LeapPrefill {
        LeapPrefill {
            salary_annual: self.salary,
            employer_match_enabled: self.employer_match,
            current_401k_pct: self.current_pct,
            recommended_401k_pct: self.recommended_pct,
            ef_current: 0.0,
            post_tax_savings_monthly: None,
            plan_year: None,
        }
    }
}
