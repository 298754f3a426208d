//! Pending package entries from `/nodes/{node}/apt/update`.

use crate::core::domain::value_object::serde_helpers::lenient_string;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct AptUpdateEntry {
    #[serde(rename = "Package", default, deserialize_with = "lenient_string")]
    pub package: Option<String>,
    #[serde(rename = "Title", default, deserialize_with = "lenient_string")]
    pub title: Option<String>,
    #[serde(rename = "Version", default, deserialize_with = "lenient_string")]
    pub version: Option<String>,
    #[serde(rename = "OldVersion", default, deserialize_with = "lenient_string")]
    pub old_version: Option<String>,
}

impl AptUpdateEntry {
    /// `"{Title} - {Version}"`; the package name stands in for a missing title.
    pub fn label(&self) -> String {
        let title = self
            .title
            .as_deref()
            .or(self.package.as_deref())
            .unwrap_or_default();
        format!("{} - {}", title, self.version.as_deref().unwrap_or_default())
    }
}
