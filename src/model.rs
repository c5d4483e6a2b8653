//! Data structures describing a single interview report render.
//!
//! [`ReportRequest`] is decoded straight from the JSON body posted by report producers. Decoding is
//! lenient: every field is optional, strings are taken verbatim and scalar values are
//! rendered with their JSON text so that a numeric interview ID still reaches the page.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Filename stem used when a request carries no interview ID.
pub const FALLBACK_FILENAME_STEM: &str = "report";

/// The fields overlaid on the report template.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct ReportRequest {
    /// Candidate name, printed in the larger heading size.
    #[serde(default, deserialize_with = "lenient_string")]
    pub name: String,
    /// Role the candidate interviewed for.
    #[serde(default, deserialize_with = "lenient_string")]
    pub role: String,
    /// Pre-formatted interview date.
    #[serde(default, deserialize_with = "lenient_string")]
    pub date: String,
    /// Interview identifier, also used as the download filename stem.
    #[serde(default, deserialize_with = "lenient_string")]
    pub interview_id: String,
    /// Location of the candidate photo, fetched while rendering.
    #[serde(default, deserialize_with = "lenient_optional_string")]
    pub candidate_photo: Option<String>,
    /// Free-form summary text. Newlines are kept as line breaks.
    #[serde(default, deserialize_with = "lenient_string")]
    pub ai_overview: String,
}

impl ReportRequest {
    /// Creates an empty request.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the candidate name and returns the updated request.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Sets the role and returns the updated request.
    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.role = role.into();
        self
    }

    /// Sets the date line and returns the updated request.
    pub fn with_date(mut self, date: impl Into<String>) -> Self {
        self.date = date.into();
        self
    }

    /// Sets the interview ID and returns the updated request.
    pub fn with_interview_id(mut self, interview_id: impl Into<String>) -> Self {
        self.interview_id = interview_id.into();
        self
    }

    /// Sets the photo URL and returns the updated request.
    pub fn with_candidate_photo(mut self, url: impl Into<Option<String>>) -> Self {
        self.candidate_photo = url.into().filter(|url| !url.is_empty());
        self
    }

    /// Sets the overview text and returns the updated request.
    pub fn with_ai_overview(mut self, overview: impl Into<String>) -> Self {
        self.ai_overview = overview.into();
        self
    }

    /// Returns the photo URL if one was supplied.
    pub fn photo_url(&self) -> Option<&str> {
        self.candidate_photo
            .as_deref()
            .filter(|url| !url.trim().is_empty())
    }

    /// Returns the filename offered to the client when downloading the rendered report.
    ///
    /// Characters that cannot appear inside a quoted `Content-Disposition` filename, or that
    /// would introduce a path, are replaced with `_`.
    pub fn download_filename(&self) -> String {
        let stem = self.interview_id.trim();
        let stem = if stem.is_empty() {
            FALLBACK_FILENAME_STEM
        } else {
            stem
        };

        let sanitized: String = stem
            .chars()
            .map(|c| match c {
                '"' | '\\' | '/' => '_',
                c if c.is_control() => '_',
                c => c,
            })
            .collect();

        format!("{}.pdf", sanitized)
    }
}

/// A finished PDF together with the filename it should be downloaded as.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RenderedDocument {
    /// Serialized PDF bytes.
    pub bytes: Vec<u8>,
    /// Suggested download filename, see [`ReportRequest::download_filename`].
    pub filename: String,
}

fn value_to_text(value: Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s),
        other => Some(other.to_string()),
    }
}

fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(value_to_text(value).unwrap_or_default())
}

fn lenient_optional_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(value_to_text(value).filter(|s| !s.is_empty()))
}
