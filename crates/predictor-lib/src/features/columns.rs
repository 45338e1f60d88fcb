//! Ordered feature column list fixed at training time

use super::schema::{
    InputScheme, RawField, ACTORS_BOX_OFFICE_PCT, ACTOR_PREFIX, DIRECTOR_BOX_OFFICE_PCT,
    DIRECTOR_PREFIX, GENRE_PREFIX,
};
use std::collections::HashMap;

/// Ordered, unique list of trained feature names
///
/// Column *i* of every aligned row corresponds to name *i* of this list.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureColumns {
    names: Vec<String>,
    index: HashMap<String, usize>,
    scheme: InputScheme,
    /// False for a purely numeric list, which fits either scheme's inputs
    scheme_pinned: bool,
}

impl FeatureColumns {
    /// Validate a column list and infer the input scheme it was trained with
    pub fn new(names: Vec<String>) -> Result<Self, String> {
        if names.is_empty() {
            return Err("feature column list is empty".to_string());
        }

        let mut index = HashMap::with_capacity(names.len());
        for (position, name) in names.iter().enumerate() {
            if name.trim().is_empty() {
                return Err(format!("feature column {} has an empty name", position));
            }
            if index.insert(name.clone(), position).is_some() {
                return Err(format!("duplicate feature column `{}`", name));
            }
        }

        let (scheme, scheme_pinned) = infer_scheme(&names)?;
        Ok(Self {
            names,
            index,
            scheme,
            scheme_pinned,
        })
    }

    /// Decode the JSON array artifact
    pub fn from_json(bytes: &[u8]) -> Result<Self, String> {
        let names: Vec<String> = serde_json::from_slice(bytes).map_err(|e| e.to_string())?;
        Self::new(names)
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn scheme(&self) -> InputScheme {
        self.scheme
    }

    /// Whether inputs exclusive to `scheme` fit this list
    pub fn accepts(&self, scheme: InputScheme) -> bool {
        !self.scheme_pinned || self.scheme == scheme
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    /// Numeric raw fields whose trained column is part of this list
    pub fn required_fields(&self) -> Vec<RawField> {
        RawField::ALL
            .into_iter()
            .filter(|field| field.column().is_some_and(|column| self.contains(column)))
            .collect()
    }

    /// Number of indicator levels known for a categorical prefix
    pub fn level_count(&self, prefix: &str) -> usize {
        let marker = format!("{}_", prefix);
        self.names.iter().filter(|n| n.starts_with(&marker)).count()
    }
}

/// The scheme a list was trained with, and whether its columns pin it
fn infer_scheme(names: &[String]) -> Result<(InputScheme, bool), String> {
    let indicator_prefixes = [DIRECTOR_PREFIX, ACTOR_PREFIX, GENRE_PREFIX].map(|p| format!("{}_", p));

    let has_indicators = names
        .iter()
        .any(|name| indicator_prefixes.iter().any(|p| name.starts_with(p.as_str())));
    let has_percentages = names
        .iter()
        .any(|name| name == ACTORS_BOX_OFFICE_PCT || name == DIRECTOR_BOX_OFFICE_PCT);

    match (has_indicators, has_percentages) {
        (true, true) => Err(
            "feature columns mix box-office percentage columns with categorical indicators"
                .to_string(),
        ),
        (true, false) => Ok((InputScheme::Categorical, true)),
        (false, true) => Ok((InputScheme::Percentages, true)),
        // A purely numeric list carries no scheme-specific column; report it
        // as percentages but accept either scheme's inputs
        (false, false) => Ok((InputScheme::Percentages, false)),
    }
}
