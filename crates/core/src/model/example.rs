use serde::{Deserialize, Serialize};

use crate::model::ids::ExampleId;

/// One unit of annotation work, loaded from a static dataset file.
///
/// Judgment datasets carry one chosen completion and up to three rejected
/// completions with the model that produced each; writing datasets only need
/// the prompt. Missing arrays deserialize as empty so both shapes share one
/// type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Example {
    pub id: ExampleId,
    pub prompt: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub country: String,
    #[serde(default)]
    pub chosen: Vec<String>,
    #[serde(default)]
    pub chosen_model: Vec<String>,
    #[serde(default)]
    pub rejected: Vec<String>,
    #[serde(default)]
    pub rejected_model: Vec<String>,
}

impl Example {
    /// The chosen completion shown in the judgment form.
    #[must_use]
    pub fn chosen_text(&self) -> Option<&str> {
        self.chosen.first().map(String::as_str)
    }

    #[must_use]
    pub fn chosen_model_name(&self) -> Option<&str> {
        self.chosen_model.first().map(String::as_str)
    }

    /// The rejected completion in the given slot, if the dataset has one.
    #[must_use]
    pub fn rejected_text(&self, slot: usize) -> Option<&str> {
        self.rejected.get(slot).map(String::as_str)
    }

    #[must_use]
    pub fn rejected_model_name(&self, slot: usize) -> Option<&str> {
        self.rejected_model.get(slot).map(String::as_str)
    }
}
