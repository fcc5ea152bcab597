use serde::{Deserialize, Serialize};

use crate::entities::Coordinates;

/// Candidate for name-based import; coordinates come from the geocoder.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ImportCandidate {
    pub name: Option<String>,
    pub category: Option<String>,
    pub description: Option<String>,
    pub city: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Created {
    pub name: String,
    pub coordinates: Coordinates,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Failed {
    pub name: String,
    pub error: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Skipped {
    pub name: String,
    pub reason: String,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ImportResults {
    pub created: Vec<Created>,
    pub failed: Vec<Failed>,
    pub skipped: Vec<Skipped>,
}

impl ImportResults {
    pub fn created(&mut self, name: &str, coordinates: Coordinates, note: Option<&str>) {
        tracing::info!(name, "created");
        self.created.push(Created {
            name: name.into(),
            coordinates,
            note: note.map(Into::into),
        });
    }

    pub fn failed(&mut self, name: &str, error: &str) {
        tracing::info!(name, error, "failed");
        self.failed.push(Failed {
            name: name.into(),
            error: error.into(),
        });
    }

    pub fn skipped(&mut self, name: &str, reason: &str) {
        tracing::info!(name, reason, "skipped");
        self.skipped.push(Skipped {
            name: name.into(),
            reason: reason.into(),
        });
    }

    pub fn summarize(self, label: &str) -> ImportSummary {
        ImportSummary {
            message: format!(
                "{}: {} created, {} failed, {} skipped",
                label,
                self.created.len(),
                self.failed.len(),
                self.skipped.len()
            ),
            results: self,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ImportSummary {
    pub message: String,
    pub results: ImportResults,
}
