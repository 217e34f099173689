//! Parameter metadata.
//!
//! One [`Parameter`] describes one exported variable. Labels are language
//! maps; every label this crate writes is English.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Base URI of the CF standard name vocabulary.
pub const CF_STANDARD_NAME_VOCAB: &str = "http://vocab.nerc.ac.uk/standard_name/";

const ENGLISH: &str = "en";

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum ParameterType {
    #[default]
    Parameter,
}

/// Metadata of one variable: description, unit and observed property.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Parameter {
    #[serde(rename = "type")]
    pub kind: ParameterType,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<LocalizedText>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<Unit>,

    #[serde(rename = "observedProperty")]
    pub observed_property: ObservedProperty,
}

impl Parameter {
    /// A parameter whose observed property carries `label`.
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            kind: ParameterType::Parameter,
            description: None,
            unit: None,
            observed_property: ObservedProperty {
                id: None,
                label: LocalizedText::en(label),
            },
        }
    }

    pub fn with_description(self, description: impl Into<String>) -> Self {
        Self {
            description: Some(LocalizedText::en(description)),
            ..self
        }
    }

    pub fn with_unit(self, unit: Unit) -> Self {
        Self {
            unit: Some(unit),
            ..self
        }
    }

    /// Point the observed property at its CF standard name URI.
    pub fn with_standard_name(mut self, standard_name: &str) -> Self {
        self.observed_property.id = Some(standard_name_uri(standard_name));
        self
    }
}

/// Vocabulary URI of a CF standard name, e.g. `.../standard_name/sea_ice_area_fraction/`.
pub fn standard_name_uri(standard_name: &str) -> String {
    format!("{}{}/", CF_STANDARD_NAME_VOCAB, standard_name)
}

/// Text keyed by language tag.
///
/// Plain strings are accepted when reading and treated as English.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(from = "TextRepr")]
pub struct LocalizedText(BTreeMap<String, String>);

#[derive(Deserialize)]
#[serde(untagged)]
enum TextRepr {
    Plain(String),
    Map(BTreeMap<String, String>),
}

impl From<TextRepr> for LocalizedText {
    fn from(repr: TextRepr) -> Self {
        match repr {
            TextRepr::Plain(s) => LocalizedText::en(s),
            TextRepr::Map(m) => LocalizedText(m),
        }
    }
}

impl LocalizedText {
    pub fn en(text: impl Into<String>) -> Self {
        Self::default().with(ENGLISH, text)
    }

    /// Add or replace the text for one language.
    pub fn with(mut self, lang: &str, text: impl Into<String>) -> Self {
        self.0.insert(lang.to_string(), text.into());
        self
    }

    pub fn get(&self, lang: &str) -> Option<&str> {
        self.0.get(lang).map(String::as_str)
    }

    /// English text if present, else the first language in tag order.
    pub fn text(&self) -> &str {
        self.get(ENGLISH)
            .or_else(|| self.0.values().next().map(String::as_str))
            .unwrap_or_default()
    }
}

/// The quantity a parameter measures.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ObservedProperty {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    pub label: LocalizedText,
}

/// Unit of a parameter. CF `units` strings become the symbol.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Unit {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<LocalizedText>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub symbol: Option<String>,
}

impl Unit {
    pub fn from_symbol(symbol: impl Into<String>) -> Self {
        Self {
            label: None,
            symbol: Some(symbol.into()),
        }
    }

    pub fn labelled(label: impl Into<String>, symbol: impl Into<String>) -> Self {
        Self {
            label: Some(LocalizedText::en(label)),
            symbol: Some(symbol.into()),
        }
    }
}
