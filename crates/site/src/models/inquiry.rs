//! Contact-form inquiries.
//!
//! Inquiries are stored as content rows keyed `inquiry_<millis>` with the
//! record below serialized as JSON in the row body.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use mrtc_core::{ContentEntry, INQUIRY_KEY_PREFIX};

/// Handling state of an inquiry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InquiryStatus {
    #[default]
    New,
    Done,
}

impl std::str::FromStr for InquiryStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "new" => Ok(Self::New),
            "done" => Ok(Self::Done),
            other => Err(format!("unknown inquiry status: {other}")),
        }
    }
}

/// Row title prefix written for every inquiry.
pub const INQUIRY_TITLE_PREFIX: &str = "문의 - ";

/// Stored inquiry body.
///
/// Every field has a default so that older rows, written before `note`,
/// `status` or `createdAt` existed, still read back.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Inquiry {
    pub name: String,
    pub phone: String,
    pub message: String,
    pub note: String,
    pub created_at: Option<DateTime<Utc>>,
    #[serde(deserialize_with = "lenient_status")]
    pub status: InquiryStatus,
}

/// Unknown or missing statuses read as `new`.
fn lenient_status<'de, D>(deserializer: D) -> Result<InquiryStatus, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.and_then(|s| s.parse().ok()).unwrap_or_default())
}

impl Inquiry {
    /// Content key for an inquiry received at `at`.
    #[must_use]
    pub fn key_for(at: DateTime<Utc>) -> String {
        format!("{INQUIRY_KEY_PREFIX}{}", at.timestamp_millis())
    }

    /// Build the content row holding this inquiry.
    ///
    /// # Errors
    ///
    /// Returns an error if the inquiry cannot be serialized.
    pub fn to_entry(&self, key: &str) -> Result<ContentEntry, serde_json::Error> {
        let mut entry = ContentEntry::empty(key);
        entry.title = format!("{INQUIRY_TITLE_PREFIX}{}", self.name);
        entry.subtitle.clone_from(&self.phone);
        entry.body = serde_json::to_string(self)?;
        Ok(entry)
    }

    /// Read an inquiry back from its content row.
    ///
    /// A body that is not a JSON object reads as empty. A missing name or
    /// phone falls back to the row title and subtitle.
    #[must_use]
    pub fn from_entry(entry: &ContentEntry) -> Self {
        let mut inquiry: Self = serde_json::from_str(&entry.body).unwrap_or_default();
        if inquiry.name.is_empty() {
            inquiry.name = entry
                .title
                .strip_prefix(INQUIRY_TITLE_PREFIX)
                .unwrap_or(&entry.title)
                .to_owned();
        }
        if inquiry.phone.is_empty() {
            inquiry.phone.clone_from(&entry.subtitle);
        }
        inquiry
    }
}

/// Inquiry as listed to super admins.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InquiryView {
    pub key: String,
    #[serde(flatten)]
    pub inquiry: Inquiry,
}
