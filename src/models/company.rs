// file: src/models/company.rs
// description: Company metadata as stored in the index and its display-ready record
// reference: Used for semantic company search results

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Placeholder for any display field the index did not provide.
pub const NOT_AVAILABLE: &str = "N/A";

/// Metadata attached to an indexed company vector. Every field is optional;
/// numbers and booleans are kept as text, any other shape counts as absent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompanyMetadata {
    pub ticker: Option<String>,
    pub name: Option<String>,
    pub business_summary: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub country: Option<String>,
    pub industry: Option<String>,
    pub sector: Option<String>,
}

fn scalar_text(value: Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        _ => None,
    }
}

impl CompanyMetadata {
    /// Reads the display keys out of a raw metadata map. Never fails: any
    /// field that is missing or not a scalar is left as `None`.
    pub fn from_map(map: &Map<String, Value>) -> Self {
        let field = |key: &str| map.get(key).cloned().and_then(scalar_text);

        Self {
            ticker: field("Ticker"),
            name: field("Name"),
            business_summary: field("Business Summary"),
            city: field("City"),
            state: field("State"),
            country: field("Country"),
            industry: field("Industry"),
            sector: field("Sector"),
        }
    }
}

/// A matched company with every display field resolved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompanyRecord {
    #[serde(rename = "Ticker")]
    pub ticker: String,

    #[serde(rename = "Name")]
    pub name: String,

    #[serde(rename = "Business Summary")]
    pub business_summary: String,

    #[serde(rename = "City")]
    pub city: String,

    #[serde(rename = "State")]
    pub state: String,

    #[serde(rename = "Country")]
    pub country: String,

    #[serde(rename = "Industry")]
    pub industry: String,

    #[serde(rename = "Sector")]
    pub sector: String,

    /// Similarity score reported by the index for this match
    #[serde(rename = "Score")]
    pub score: f32,
}

impl CompanyRecord {
    pub fn from_metadata(metadata: CompanyMetadata, score: f32) -> Self {
        let resolve = |field: Option<String>| field.unwrap_or_else(|| NOT_AVAILABLE.to_string());

        Self {
            ticker: resolve(metadata.ticker),
            name: resolve(metadata.name),
            business_summary: resolve(metadata.business_summary),
            city: resolve(metadata.city),
            state: resolve(metadata.state),
            country: resolve(metadata.country),
            industry: resolve(metadata.industry),
            sector: resolve(metadata.sector),
            score,
        }
    }

    /// Labelled display fields in presentation order.
    pub fn display_fields(&self) -> [(&'static str, &str); 6] {
        [
            ("Business Summary", self.business_summary.as_str()),
            ("City", self.city.as_str()),
            ("State", self.state.as_str()),
            ("Country", self.country.as_str()),
            ("Industry", self.industry.as_str()),
            ("Sector", self.sector.as_str()),
        ]
    }

    pub fn title(&self) -> String {
        format!("{} ({})", self.name, self.ticker)
    }
}
