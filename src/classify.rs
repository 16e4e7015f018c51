//! Per-token column type classification.
//!
//! A token is classified by a fixed priority order: empty tokens carry no
//! type information, `YYYY-MM-DD` dates win next, then boolean, integer and
//! float literals, and anything else degrades to a width-sized string type.
//! Classification never fails.
//!
//! [`TypeVotes`] extends the single-token decision to a sample of several
//! rows by majority vote.

use std::{fmt, str::FromStr, sync::LazyLock};

use chrono::{Datelike, NaiveDate};
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer, de};

/// Widths at or above this value are emitted as `TEXT` instead of `VARCHAR`.
pub const DEFAULT_VARCHAR_LIMIT: usize = 254;
/// Added to the observed maximum width before sizing a string column.
pub const DEFAULT_WIDTH_MARGIN: usize = 2;

const DIGITS: &str = r"[0-9](?:_?[0-9])*";

static DATE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]{4}-[0-9]{2}-[0-9]{2}$").expect("valid date pattern"));

static INTEGER_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"^[+-]?(?:",
        r"0(?:_?0)*",
        r"|[1-9](?:_?[0-9])*",
        r"|0[xX](?:_?[0-9a-fA-F])+",
        r"|0[oO](?:_?[0-7])+",
        r"|0[bB](?:_?[01])+",
        r")$"
    ))
    .expect("valid integer pattern")
});

static FLOAT_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    let exponent = format!("[eE][+-]?{DIGITS}");
    let pattern = format!(
        r"^[+-]?(?:{d}\.(?:{d})?(?:{e})?|\.{d}(?:{e})?|{d}{e})$",
        d = DIGITS,
        e = exponent
    );
    Regex::new(&pattern).expect("valid float pattern")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnType {
    Date,
    Boolean,
    Integer,
    Float,
    Varchar(usize),
    Text,
}

impl ColumnType {
    pub fn variants() -> &'static [&'static str] {
        &["DATE", "BOOLEAN", "INTEGER", "FLOAT", "VARCHAR(n)", "TEXT"]
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnType::Date => f.write_str("DATE"),
            ColumnType::Boolean => f.write_str("BOOLEAN"),
            ColumnType::Integer => f.write_str("INTEGER"),
            ColumnType::Float => f.write_str("FLOAT"),
            ColumnType::Varchar(width) => write!(f, "VARCHAR({width})"),
            ColumnType::Text => f.write_str("TEXT"),
        }
    }
}

impl FromStr for ColumnType {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_uppercase();
        match normalized.as_str() {
            "DATE" => Ok(ColumnType::Date),
            "BOOLEAN" | "BOOL" | "BIT" => Ok(ColumnType::Boolean),
            "INTEGER" | "INT" => Ok(ColumnType::Integer),
            "FLOAT" | "REAL" => Ok(ColumnType::Float),
            "TEXT" => Ok(ColumnType::Text),
            other => other
                .strip_prefix("VARCHAR(")
                .and_then(|rest| rest.strip_suffix(')'))
                .and_then(|width| width.trim().parse::<usize>().ok())
                .map(ColumnType::Varchar)
                .ok_or_else(|| {
                    format!(
                        "Unknown column type '{value}'. Supported types: {}",
                        ColumnType::variants().join(", ")
                    )
                }),
        }
    }
}

impl Serialize for ColumnType {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ColumnType {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let token = String::deserialize(deserializer)?;
        ColumnType::from_str(&token).map_err(de::Error::custom)
    }
}

/// What a single non-empty token looks like, before any width is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Date,
    Boolean,
    Integer,
    Float,
    Text,
}

/// Returns `None` for tokens that are empty after trimming.
pub fn token_kind(token: &str) -> Option<TokenKind> {
    let trimmed = token.trim();
    if trimmed.is_empty() {
        return None;
    }
    if is_date(trimmed) {
        return Some(TokenKind::Date);
    }
    Some(match parse_literal(trimmed) {
        Some(Literal::Boolean) => TokenKind::Boolean,
        Some(Literal::Integer) => TokenKind::Integer,
        Some(Literal::Float) => TokenKind::Float,
        None => TokenKind::Text,
    })
}

/// Years start at 1; `0000-01-01` is not a date.
pub fn is_date(token: &str) -> bool {
    DATE_PATTERN.is_match(token)
        && NaiveDate::parse_from_str(token, "%Y-%m-%d").is_ok_and(|date| date.year() >= 1)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Literal {
    Boolean,
    Integer,
    Float,
}

fn parse_literal(token: &str) -> Option<Literal> {
    if token.eq_ignore_ascii_case("true") || token.eq_ignore_ascii_case("false") {
        Some(Literal::Boolean)
    } else if INTEGER_PATTERN.is_match(token) {
        Some(Literal::Integer)
    } else if FLOAT_PATTERN.is_match(token) {
        Some(Literal::Float)
    } else {
        None
    }
}

/// Numeric value of an integer literal accepted by the classifier, when it
/// fits in an `i64`.
pub fn integer_value(token: &str) -> Option<i64> {
    let trimmed = token.trim();
    if !INTEGER_PATTERN.is_match(trimmed) {
        return None;
    }
    let cleaned = trimmed.replace('_', "");
    let (negative, body) = match cleaned.as_bytes().first() {
        Some(b'-') => (true, &cleaned[1..]),
        Some(b'+') => (false, &cleaned[1..]),
        _ => (false, cleaned.as_str()),
    };
    let (radix, digits) = match body.get(..2) {
        Some("0x" | "0X") => (16, &body[2..]),
        Some("0o" | "0O") => (8, &body[2..]),
        Some("0b" | "0B") => (2, &body[2..]),
        _ => (10, body),
    };
    let magnitude = i128::from_str_radix(digits, radix).ok()?;
    i64::try_from(if negative { -magnitude } else { magnitude }).ok()
}

/// Numeric value of a float literal accepted by the classifier.
pub fn float_value(token: &str) -> Option<f64> {
    let trimmed = token.trim();
    if !FLOAT_PATTERN.is_match(trimmed) {
        return None;
    }
    trimmed.replace('_', "").parse::<f64>().ok()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypeClassifier {
    varchar_limit: usize,
}

impl Default for TypeClassifier {
    fn default() -> Self {
        Self::new(DEFAULT_VARCHAR_LIMIT)
    }
}

impl TypeClassifier {
    pub fn new(varchar_limit: usize) -> Self {
        Self { varchar_limit }
    }

    pub fn varchar_limit(&self) -> usize {
        self.varchar_limit
    }

    /// Picks the best-fit type for `token`. `max_width` already includes the
    /// safety margin and only matters for the string fallback.
    pub fn classify(&self, token: &str, max_width: usize) -> ColumnType {
        match token_kind(token) {
            Some(TokenKind::Date) => ColumnType::Date,
            Some(TokenKind::Boolean) => ColumnType::Boolean,
            Some(TokenKind::Integer) => ColumnType::Integer,
            Some(TokenKind::Float) => ColumnType::Float,
            Some(TokenKind::Text) | None => self.string_type(max_width),
        }
    }

    pub fn string_type(&self, max_width: usize) -> ColumnType {
        if max_width < self.varchar_limit {
            ColumnType::Varchar(max_width)
        } else {
            ColumnType::Text
        }
    }
}

/// Classifies `token` with the default `VARCHAR` limit.
pub fn classify(token: &str, max_width: usize) -> ColumnType {
    TypeClassifier::default().classify(token, max_width)
}

/// Tally of token kinds seen in one column's sample rows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TypeVotes {
    non_empty: usize,
    boolean: usize,
    date: usize,
    integer: usize,
    float: usize,
}

impl TypeVotes {
    pub fn record(&mut self, token: &str) {
        let Some(kind) = token_kind(token) else {
            return;
        };
        self.non_empty += 1;
        match kind {
            TokenKind::Boolean => self.boolean += 1,
            TokenKind::Date => self.date += 1,
            TokenKind::Integer => self.integer += 1,
            TokenKind::Float => self.float += 1,
            TokenKind::Text => {}
        }
    }

    pub fn non_empty(&self) -> usize {
        self.non_empty
    }

    fn majority(&self, count: usize) -> bool {
        count > 0 && count * 2 > self.non_empty
    }

    /// With a single recorded token this agrees with [`TypeClassifier::classify`].
    pub fn decide(&self, classifier: &TypeClassifier, max_width: usize) -> ColumnType {
        if self.majority(self.boolean) {
            ColumnType::Boolean
        } else if self.majority(self.date) {
            ColumnType::Date
        } else if self.float == 0 && self.majority(self.integer) {
            ColumnType::Integer
        } else if self.majority(self.integer + self.float) {
            ColumnType::Float
        } else {
            classifier.string_type(max_width)
        }
    }
}
