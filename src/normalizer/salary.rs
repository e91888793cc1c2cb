use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::LazyLock;

use super::ambiguous;

static AMOUNT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)(?P<cur>[$€£]|\b(?:usd|eur|gbp|cad|aud|inr)\b)?\s*(?P<num>\d{1,3}(?:,\d{3})+(?:\.\d+)?|\d+(?:\.\d+)?)(?P<k>\s?k\b)?",
    )
    .expect("amount pattern is valid")
});

const NOT_DISCLOSED_PHRASES: &[&str] = &[
    "not disclosed",
    "undisclosed",
    "not specified",
    "not provided",
    "not available",
    "competitive",
    "negotiable",
    "commensurate",
    "depending on experience",
    "doe",
];

/// Unit of time a pay figure covers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PayPeriod {
    Hour,
    Day,
    Week,
    Month,
    Year,
}

impl PayPeriod {
    /// Map schema.org `unitText` values (`HOUR`, `YEAR`, ...) and free-text words
    pub fn from_unit_text(unit: &str) -> Option<Self> {
        let unit = unit.trim().to_ascii_lowercase();
        let period = match unit.as_str() {
            "hour" | "hourly" | "hr" | "per hour" => PayPeriod::Hour,
            "day" | "daily" => PayPeriod::Day,
            "week" | "weekly" | "wk" => PayPeriod::Week,
            "month" | "monthly" | "mo" => PayPeriod::Month,
            "year" | "yearly" | "annual" | "annually" | "annum" | "yr" => PayPeriod::Year,
            _ => return None,
        };
        Some(period)
    }

    fn detect(text: &str) -> Option<Self> {
        let lower = text.to_ascii_lowercase();
        let has = |words: &[&str]| words.iter().any(|w| contains_word(&lower, w));

        if has(&["hour", "hourly", "hr"]) {
            Some(PayPeriod::Hour)
        } else if has(&["day", "daily"]) {
            Some(PayPeriod::Day)
        } else if has(&["week", "weekly", "wk"]) {
            Some(PayPeriod::Week)
        } else if has(&["month", "monthly"]) {
            Some(PayPeriod::Month)
        } else if has(&["year", "yearly", "annual", "annually", "annum", "yr"]) {
            Some(PayPeriod::Year)
        } else {
            None
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            PayPeriod::Hour => "hour",
            PayPeriod::Day => "day",
            PayPeriod::Week => "week",
            PayPeriod::Month => "month",
            PayPeriod::Year => "year",
        }
    }
}

/// Canonical compensation range; a single figure has `min == max`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalaryRange {
    pub min: f64,
    pub max: f64,
    pub currency: Option<String>,
    pub period: Option<PayPeriod>,
}

impl SalaryRange {
    /// Build a range, ordering the bounds. Returns `None` for negative or non-finite figures.
    pub fn new(a: f64, b: f64, currency: Option<String>, period: Option<PayPeriod>) -> Option<Self> {
        if !a.is_finite() || !b.is_finite() || a < 0.0 || b < 0.0 {
            return None;
        }
        Some(Self {
            min: a.min(b),
            max: a.max(b),
            currency: currency.map(|c| c.trim().to_ascii_uppercase()),
            period,
        })
    }
}

impl fmt::Display for SalaryRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let amount = |value: f64| match self.currency.as_deref() {
            Some("USD") => format!("${}", group_thousands(value)),
            Some("EUR") => format!("€{}", group_thousands(value)),
            Some("GBP") => format!("£{}", group_thousands(value)),
            Some(code) => format!("{} {}", code, group_thousands(value)),
            None => group_thousands(value),
        };

        if self.min == self.max {
            write!(f, "{}", amount(self.min))?;
        } else {
            write!(f, "{}–{}", amount(self.min), amount(self.max))?;
        }

        if let Some(period) = self.period {
            write!(f, " per {}", period.as_str())?;
        }
        Ok(())
    }
}

/// Outcome of salary normalization
#[derive(Debug, Clone, PartialEq)]
pub enum Salary {
    /// No compensation information anywhere
    NotFound,
    /// The posting explicitly withholds compensation
    NotDisclosed,
    Range(SalaryRange),
}

impl Salary {
    pub fn range(&self) -> Option<&SalaryRange> {
        match self {
            Salary::Range(range) => Some(range),
            _ => None,
        }
    }

    pub fn into_range(self) -> Option<SalaryRange> {
        match self {
            Salary::Range(range) => Some(range),
            _ => None,
        }
    }
}

/// Joins two figures into a range: `$80k - $95k`, `95k to 80k`
static RANGE_JOIN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*(?:-|–|—|to)\s*$").expect("range join pattern is valid")
});

/// A period attached directly to a figure: `42/hr`, `25 per hour`, `3,000 a month`
static ATTACHED_PERIOD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*(?:/|per\b|an?\b)\s*(?:hour|hr|day|week|wk|month|mo|year|yr|annum)\b")
        .expect("attached period pattern is valid")
});

const SALARY_LABELS: &[&str] = &["salary", "pay", "compensation", "wage", "wages", "base pay"];

/// One figure found in compensation text
struct Figure {
    currency: Option<String>,
    value: f64,
    start: usize,
    end: usize,
}

fn figures(raw: &str) -> Vec<Figure> {
    AMOUNT
        .captures_iter(raw)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let num = caps.name("num")?.as_str();
            let k = caps.name("k");
            let tail = &raw[whole.end()..];

            // 401k and 403b are plan names; 10% and 5th are not pay
            if matches!(num, "401" | "403") && (k.is_some() || tail.starts_with(['b', 'B'])) {
                return None;
            }
            if tail.starts_with(|c: char| c == '%' || c.is_alphanumeric()) {
                return None;
            }

            let mut value: f64 = num.replace(',', "").parse().ok()?;
            if k.is_some() {
                value *= 1000.0;
            }
            Some(Figure {
                currency: caps.name("cur").map(|c| currency_code(c.as_str())),
                value,
                start: whole.start(),
                end: whole.end(),
            })
        })
        .collect()
}

/// Parse free-text compensation such as `"$80,000 – $95,000 per year"`,
/// `"$42/hr"` or `"Not disclosed"`
///
/// Two figures form a range only when a dash or `to` joins them; any other
/// second figure is ignored. A figure without a currency marker counts only
/// when a period is attached to it or the text carries a salary label.
/// Unparseable text yields [`Salary::NotFound`] instead of a guess.
pub fn parse_salary(raw: Option<&str>) -> Salary {
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return Salary::NotFound;
    };
    let lower = raw.to_lowercase();
    let found = figures(raw);

    let first = match found.iter().position(|f| f.currency.is_some()) {
        Some(idx) => Some(idx),
        None if NOT_DISCLOSED_PHRASES.iter().any(|p| contains_word(&lower, p)) => {
            return Salary::NotDisclosed;
        }
        None => {
            let labelled = SALARY_LABELS.iter().any(|l| contains_word(&lower, l));
            found.iter().enumerate().position(|(idx, f)| {
                let after = found
                    .get(idx + 1)
                    .filter(|next| RANGE_JOIN.is_match(&raw[f.end..next.start]))
                    .map_or(f.end, |next| next.end);
                labelled || ATTACHED_PERIOD.is_match(&raw[after..])
            })
        }
    };

    let Some(idx) = first else {
        ambiguous("salary", raw);
        return Salary::NotFound;
    };
    let low = &found[idx];
    let high = found
        .get(idx + 1)
        .filter(|next| RANGE_JOIN.is_match(&raw[low.end..next.start]))
        .map_or(low.value, |next| next.value);

    match SalaryRange::new(low.value, high, low.currency.clone(), PayPeriod::detect(raw)) {
        Some(range) => Salary::Range(range),
        None => {
            ambiguous("salary", raw);
            Salary::NotFound
        }
    }
}

fn currency_code(marker: &str) -> String {
    match marker {
        "$" => "USD".to_string(),
        "€" => "EUR".to_string(),
        "£" => "GBP".to_string(),
        code => code.to_ascii_uppercase(),
    }
}

fn contains_word(haystack: &str, word: &str) -> bool {
    haystack.match_indices(word).any(|(idx, _)| {
        let before = haystack[..idx].chars().next_back();
        let after = haystack[idx + word.len()..].chars().next();
        !before.is_some_and(char::is_alphanumeric) && !after.is_some_and(char::is_alphanumeric)
    })
}

fn group_thousands(value: f64) -> String {
    let total_cents = (value * 100.0).round() as u64;
    let (whole, cents) = (total_cents / 100, total_cents % 100);
    let digits = whole.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    if cents > 0 {
        format!("{grouped}.{cents:02}")
    } else {
        grouped
    }
}
