//! The structured summary record and its nested types.
//!
//! These types are the contract between the model and the rest of the
//! program. Field presence and JSON types are enforced by `serde` when a
//! payload is deserialised; the count and range constraints that `serde`
//! cannot express live in [`crate::pipeline::validate`].
//!
//! Integer fields go through [`lenient`] so that `7`, `7.0` and `"7"` are all
//! accepted. Models emit all three for the same field. No other coercion is
//! performed: a number where a string is expected is a validation failure.

use serde::{Deserialize, Serialize};

/// Smallest number of key findings a summary may carry.
pub const MIN_KEY_FINDINGS: usize = 3;
/// Largest number of key findings a summary may carry.
pub const MAX_KEY_FINDINGS: usize = 8;
/// Lowest accepted relevance score.
pub const MIN_RELEVANCE: u8 = 1;
/// Highest accepted relevance score.
pub const MAX_RELEVANCE: u8 = 10;

/// A validated summary of one academic paper.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaperSummary {
    pub title: String,
    pub authors: Vec<String>,
    /// Original abstract or executive summary.
    #[serde(rename = "abstract")]
    pub abstract_text: String,
    /// Main research question or objective.
    pub research_question: String,
    /// Between [`MIN_KEY_FINDINGS`] and [`MAX_KEY_FINDINGS`] findings.
    pub key_findings: Vec<KeyFinding>,
    pub methodology: Methodology,
    /// Main conclusions and implications.
    pub conclusions: String,
    pub limitations: Vec<String>,
    pub future_research: Vec<String>,
    pub citations: Vec<Citation>,
    /// Free-form category; see [`PaperSummary::category`].
    pub paper_category: String,
    /// Relevance / impact, 1–10.
    #[serde(deserialize_with = "lenient::integer")]
    pub relevance_score: u8,
}

impl PaperSummary {
    /// Map the free-form `paper_category` onto the documented categories.
    pub fn category(&self) -> PaperCategory {
        PaperCategory::from_label(&self.paper_category)
    }
}

/// One key finding with its supporting evidence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyFinding {
    pub finding: String,
    pub evidence: String,
    #[serde(default, deserialize_with = "lenient::optional_integer")]
    pub page_reference: Option<u32>,
    /// Why this finding is important.
    pub significance: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Methodology {
    pub approach: String,
    pub data_sources: Vec<String>,
    pub analysis_methods: Vec<String>,
    #[serde(default)]
    pub sample_size: Option<String>,
    /// Limitations the authors acknowledge about their method.
    pub limitations: Vec<String>,
}

/// A work cited by the paper, with the role it plays there.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Citation {
    pub authors: Vec<String>,
    pub title: String,
    #[serde(default)]
    pub journal: Option<String>,
    #[serde(default, deserialize_with = "lenient::optional_integer")]
    pub year: Option<i32>,
    #[serde(default)]
    pub doi: Option<String>,
    #[serde(default)]
    pub page_numbers: Option<String>,
    /// How this citation is used in the paper.
    pub citation_context: String,
}

/// The documented paper categories.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaperCategory {
    Empirical,
    Theoretical,
    Review,
    MetaAnalysis,
    CaseStudy,
    /// Anything the model produced outside the documented set.
    Other(String),
}

impl PaperCategory {
    /// Case- and separator-insensitive match (`"Meta Analysis"`, `"meta-analysis"`).
    pub fn from_label(label: &str) -> Self {
        let key: String = label
            .trim()
            .chars()
            .filter(|c| c.is_alphanumeric())
            .flat_map(char::to_lowercase)
            .collect();
        match key.as_str() {
            "empirical" => PaperCategory::Empirical,
            "theoretical" => PaperCategory::Theoretical,
            "review" => PaperCategory::Review,
            "metaanalysis" => PaperCategory::MetaAnalysis,
            "casestudy" => PaperCategory::CaseStudy,
            _ => PaperCategory::Other(label.trim().to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            PaperCategory::Empirical => "empirical",
            PaperCategory::Theoretical => "theoretical",
            PaperCategory::Review => "review",
            PaperCategory::MetaAnalysis => "meta-analysis",
            PaperCategory::CaseStudy => "case-study",
            PaperCategory::Other(s) => s,
        }
    }
}

// ── Field table ──────────────────────────────────────────────────────────
//
// Describes the JSON shape of the record once, for both the tool schema sent
// to the model and the structural check run on its reply.

/// JSON shape of a single field.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Shape {
    Text,
    Integer { min: Option<i64>, max: Option<i64> },
    TextList,
    Record(&'static [Field]),
    RecordList {
        fields: &'static [Field],
        min: Option<usize>,
        max: Option<usize>,
    },
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct Field {
    pub name: &'static str,
    pub shape: Shape,
    pub required: bool,
    pub description: &'static str,
}

impl Field {
    const fn new(name: &'static str, shape: Shape, description: &'static str) -> Self {
        Self {
            name,
            shape,
            required: true,
            description,
        }
    }

    const fn optional(mut self) -> Self {
        self.required = false;
        self
    }
}

const FINDING_FIELDS: &[Field] = &[
    Field::new("finding", Shape::Text, "Main finding or result"),
    Field::new("evidence", Shape::Text, "Supporting evidence or data"),
    Field::new(
        "page_reference",
        Shape::Integer {
            min: Some(0),
            max: Some(u32::MAX as i64),
        },
        "Page number where the finding appears ([PAGE X] marker)",
    )
    .optional(),
    Field::new("significance", Shape::Text, "Why this finding is important"),
];

const METHODOLOGY_FIELDS: &[Field] = &[
    Field::new("approach", Shape::Text, "Overall methodological approach"),
    Field::new("data_sources", Shape::TextList, "Data sources used"),
    Field::new("analysis_methods", Shape::TextList, "Analysis techniques employed"),
    Field::new("sample_size", Shape::Text, "Sample size, if reported").optional(),
    Field::new("limitations", Shape::TextList, "Acknowledged limitations"),
];

const CITATION_FIELDS: &[Field] = &[
    Field::new("authors", Shape::TextList, "Authors of the cited work"),
    Field::new("title", Shape::Text, "Title of the cited work"),
    Field::new("journal", Shape::Text, "Journal or venue").optional(),
    Field::new(
        "year",
        Shape::Integer {
            min: Some(i32::MIN as i64),
            max: Some(i32::MAX as i64),
        },
        "Publication year",
    )
    .optional(),
    Field::new("doi", Shape::Text, "DOI, if given").optional(),
    Field::new("page_numbers", Shape::Text, "Page numbers of the cited work").optional(),
    Field::new("citation_context", Shape::Text, "How this citation is used in the paper"),
];

pub(crate) const SUMMARY_FIELDS: &[Field] = &[
    Field::new("title", Shape::Text, "Paper title"),
    Field::new("authors", Shape::TextList, "Paper authors in order"),
    Field::new("abstract", Shape::Text, "Original abstract or executive summary"),
    Field::new("research_question", Shape::Text, "Main research question or objective"),
    Field::new(
        "key_findings",
        Shape::RecordList {
            fields: FINDING_FIELDS,
            min: Some(MIN_KEY_FINDINGS),
            max: Some(MAX_KEY_FINDINGS),
        },
        "The 3-8 most important results",
    ),
    Field::new("methodology", Shape::Record(METHODOLOGY_FIELDS), "How the study was done"),
    Field::new("conclusions", Shape::Text, "Main conclusions and implications"),
    Field::new("limitations", Shape::TextList, "Study limitations"),
    Field::new("future_research", Shape::TextList, "Suggested future research directions"),
    Field::new(
        "citations",
        Shape::RecordList {
            fields: CITATION_FIELDS,
            min: None,
            max: None,
        },
        "Key citations referenced",
    ),
    Field::new(
        "paper_category",
        Shape::Text,
        "Type of research: empirical, theoretical, review, meta-analysis, or case-study",
    ),
    Field::new(
        "relevance_score",
        Shape::Integer {
            min: Some(MIN_RELEVANCE as i64),
            max: Some(MAX_RELEVANCE as i64),
        },
        "Relevance/impact score 1-10 (10 = groundbreaking)",
    ),
];

/// Integer deserialisers that accept integral floats and numeric strings.
pub(crate) mod lenient {
    use serde::de::{self, Deserializer, Unexpected};
    use serde::Deserialize;
    use serde_json::Value;

    /// The integer a JSON value stands for, under the documented coercions.
    pub(crate) fn as_integer(value: &Value) -> Option<i64> {
        match value {
            Value::Number(n) => n
                .as_i64()
                .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
            Value::String(s) => s.trim().parse::<i64>().ok(),
            _ => None,
        }
    }

    fn to_i64<E: de::Error>(value: &Value) -> Result<i64, E> {
        if let Some(i) = as_integer(value) {
            return Ok(i);
        }
        match value {
            Value::Number(_) => Err(E::invalid_type(
                Unexpected::Other("non-integral number"),
                &"an integer",
            )),
            Value::String(s) => Err(E::invalid_value(Unexpected::Str(s), &"an integer")),
            Value::Bool(b) => Err(E::invalid_type(Unexpected::Bool(*b), &"an integer")),
            Value::Null => Err(E::invalid_type(Unexpected::Unit, &"an integer")),
            Value::Array(_) => Err(E::invalid_type(Unexpected::Seq, &"an integer")),
            Value::Object(_) => Err(E::invalid_type(Unexpected::Map, &"an integer")),
        }
    }

    fn narrow<T, E>(i: i64) -> Result<T, E>
    where
        T: TryFrom<i64>,
        E: de::Error,
    {
        T::try_from(i).map_err(|_| E::invalid_value(Unexpected::Signed(i), &"an integer in range"))
    }

    pub fn integer<'de, D, T>(deserializer: D) -> Result<T, D::Error>
    where
        D: Deserializer<'de>,
        T: TryFrom<i64>,
    {
        let value = Value::deserialize(deserializer)?;
        narrow(to_i64::<D::Error>(&value)?)
    }

    pub fn optional_integer<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
    where
        D: Deserializer<'de>,
        T: TryFrom<i64>,
    {
        match Value::deserialize(deserializer)? {
            Value::Null => Ok(None),
            value => narrow(to_i64::<D::Error>(&value)?).map(Some),
        }
    }
}
