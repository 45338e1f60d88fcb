//! Static schema of recognized raw input fields
//!
//! Each raw field has a fixed set of accepted keys and maps to either a
//! trained numeric column or a family of one-hot indicator columns.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Trained column holding `log1p(budget)`
pub const LOG_BUDGET: &str = "log_budget";

/// Trained column names of the precomputed-percentage scheme
pub const ACTORS_BOX_OFFICE_PCT: &str = "Actors Box Office %";
pub const DIRECTOR_BOX_OFFICE_PCT: &str = "Director Box Office %";

/// Indicator prefixes used by the categorical scheme
pub const DIRECTOR_PREFIX: &str = "director";
pub const ACTOR_PREFIX: &str = "actor";
pub const GENRE_PREFIX: &str = "genre";

/// Name of the indicator column for a categorical level (`<prefix>_<value>`)
pub fn indicator_name(prefix: &str, level: &str) -> String {
    format!("{}_{}", prefix, level)
}

/// The two mutually exclusive input contracts a trained model can expect
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputScheme {
    /// Actor and director performance given as precomputed box-office percentages
    Percentages,
    /// Raw director, actor list and genre expanded into indicator columns
    Categorical,
}

impl fmt::Display for InputScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InputScheme::Percentages => write!(f, "percentages"),
            InputScheme::Categorical => write!(f, "categorical"),
        }
    }
}

/// How a raw field reaches the feature row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Copied into a trained numeric column, possibly through a derived transform
    Numeric { column: &'static str },
    /// Expanded into `<prefix>_<value>` indicators
    Categorical { prefix: &'static str, multi: bool },
}

/// Recognized raw input fields
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RawField {
    RunningTime,
    Budget,
    ActorsBoxOfficePct,
    DirectorBoxOfficePct,
    AwardNominations,
    ReleaseYear,
    ImdbScore,
    Director,
    Actors,
    Genre,
}

impl RawField {
    pub const ALL: [RawField; 10] = [
        RawField::RunningTime,
        RawField::Budget,
        RawField::ActorsBoxOfficePct,
        RawField::DirectorBoxOfficePct,
        RawField::AwardNominations,
        RawField::ReleaseYear,
        RawField::ImdbScore,
        RawField::Director,
        RawField::Actors,
        RawField::Genre,
    ];

    /// Accepted keys; the first one is canonical
    pub fn keys(&self) -> &'static [&'static str] {
        match self {
            RawField::RunningTime => &["running_time", "Running time"],
            RawField::Budget => &["budget"],
            RawField::ActorsBoxOfficePct => &["actors_box_office_pct", ACTORS_BOX_OFFICE_PCT],
            RawField::DirectorBoxOfficePct => &["director_box_office_pct", DIRECTOR_BOX_OFFICE_PCT],
            RawField::AwardNominations => &[
                "award_nominations",
                "Oscar and Golden Globes nominations",
            ],
            RawField::ReleaseYear => &["release_year", "Release year"],
            RawField::ImdbScore => &["imdb_score", "IMDb score"],
            RawField::Director => &["director", "directors"],
            RawField::Actors => &["actors"],
            RawField::Genre => &["genre"],
        }
    }

    pub fn canonical_key(&self) -> &'static str {
        self.keys()[0]
    }

    pub fn from_key(key: &str) -> Option<RawField> {
        Self::ALL.into_iter().find(|field| field.keys().contains(&key))
    }

    pub fn kind(&self) -> FieldKind {
        match self {
            RawField::RunningTime => FieldKind::Numeric { column: "Running time" },
            RawField::Budget => FieldKind::Numeric { column: LOG_BUDGET },
            RawField::ActorsBoxOfficePct => FieldKind::Numeric {
                column: ACTORS_BOX_OFFICE_PCT,
            },
            RawField::DirectorBoxOfficePct => FieldKind::Numeric {
                column: DIRECTOR_BOX_OFFICE_PCT,
            },
            RawField::AwardNominations => FieldKind::Numeric {
                column: "Oscar and Golden Globes nominations",
            },
            RawField::ReleaseYear => FieldKind::Numeric { column: "Release year" },
            RawField::ImdbScore => FieldKind::Numeric { column: "IMDb score" },
            RawField::Director => FieldKind::Categorical {
                prefix: DIRECTOR_PREFIX,
                multi: false,
            },
            RawField::Actors => FieldKind::Categorical {
                prefix: ACTOR_PREFIX,
                multi: true,
            },
            RawField::Genre => FieldKind::Categorical {
                prefix: GENRE_PREFIX,
                multi: false,
            },
        }
    }

    /// Trained column for numeric fields
    pub fn column(&self) -> Option<&'static str> {
        match self.kind() {
            FieldKind::Numeric { column } => Some(column),
            FieldKind::Categorical { .. } => None,
        }
    }

    /// The scheme a field is exclusive to, `None` for fields both schemes share
    pub fn scheme(&self) -> Option<InputScheme> {
        match self {
            RawField::ActorsBoxOfficePct | RawField::DirectorBoxOfficePct => {
                Some(InputScheme::Percentages)
            }
            RawField::Director | RawField::Actors | RawField::Genre => {
                Some(InputScheme::Categorical)
            }
            _ => None,
        }
    }

    /// Human label used when prompting
    pub fn label(&self) -> &'static str {
        match self {
            RawField::RunningTime => "Running time (minutes)",
            RawField::Budget => "Budget",
            RawField::ActorsBoxOfficePct => "Actors Box Office %",
            RawField::DirectorBoxOfficePct => "Director Box Office %",
            RawField::AwardNominations => "Oscar and Golden Globes nominations",
            RawField::ReleaseYear => "Release year",
            RawField::ImdbScore => "IMDb score",
            RawField::Director => "Director",
            RawField::Actors => "Actors (comma-separated)",
            RawField::Genre => "Genre",
        }
    }
}

impl fmt::Display for RawField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.canonical_key())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_key_resolves_to_its_field() {
        for field in RawField::ALL {
            for key in field.keys() {
                assert_eq!(RawField::from_key(key), Some(field), "key {}", key);
            }
        }
        assert_eq!(RawField::from_key("title"), None);
    }

    #[test]
    fn test_keys_are_unique_across_fields() {
        let mut seen = std::collections::HashSet::new();
        for field in RawField::ALL {
            for key in field.keys() {
                assert!(seen.insert(*key), "duplicate key {}", key);
            }
        }
    }

    #[test]
    fn test_budget_maps_to_derived_column() {
        assert_eq!(RawField::Budget.column(), Some(LOG_BUDGET));
        assert_eq!(RawField::Actors.column(), None);
    }

    #[test]
    fn test_scheme_exclusive_fields() {
        assert_eq!(
            RawField::ActorsBoxOfficePct.scheme(),
            Some(InputScheme::Percentages)
        );
        assert_eq!(RawField::Genre.scheme(), Some(InputScheme::Categorical));
        assert_eq!(RawField::Budget.scheme(), None);
        assert_eq!(RawField::ImdbScore.scheme(), None);
    }

    #[test]
    fn test_indicator_name_convention() {
        assert_eq!(indicator_name(DIRECTOR_PREFIX, "Jane Doe"), "director_Jane Doe");
        assert_eq!(indicator_name(ACTOR_PREFIX, "A"), "actor_A");
    }
}
