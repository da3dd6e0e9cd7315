use serde::{Deserialize, Serialize};

/// Scalar value carried in the URL query string. The literal form decides the
/// type: `true`/`false` are booleans, integer literals are `Int`, other
/// finite numeric literals are `Float`, everything else stays text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum QueryValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl QueryValue {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_u32(&self) -> Option<u32> {
        self.as_i64().and_then(|n| u32::try_from(n).ok())
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }
}

pub fn decode_query_value(raw: &str) -> QueryValue {
    match raw {
        "true" => return QueryValue::Bool(true),
        "false" => return QueryValue::Bool(false),
        _ => {}
    }
    if let Ok(n) = raw.parse::<i64>() {
        return QueryValue::Int(n);
    }
    if let Ok(f) = raw.parse::<f64>() {
        // Non-finite literals are not losslessly re-encodable; keep as text.
        if f.is_finite() {
            return QueryValue::Float(f);
        }
    }
    QueryValue::Text(raw.to_string())
}

pub fn encode_query_value(value: &QueryValue) -> String {
    match value {
        QueryValue::Bool(b) => b.to_string(),
        QueryValue::Int(n) => n.to_string(),
        // `{:?}` keeps the decimal point ("1.5" -> "1.5", "2.0" -> "2.0"),
        // so the decoded type survives the trip back through the URL.
        QueryValue::Float(f) => format!("{f:?}"),
        QueryValue::Text(s) => s.clone(),
    }
}
