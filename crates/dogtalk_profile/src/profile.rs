//! The dog profile record.

use std::fmt;
use std::str::FromStr;

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ProfileError;

/// Personality traits offered during registration.
pub const PERSONALITY_TRAITS: &[&str] = &[
    "Energetic",
    "Calm",
    "Friendly",
    "Shy",
    "Playful",
    "Independent",
    "Affectionate",
    "Protective",
];

/// Favorite activities offered during registration.
pub const FAVORITE_ACTIVITIES: &[&str] = &[
    "Walking",
    "Playing fetch",
    "Swimming",
    "Dog park",
    "Agility training",
    "Cuddling",
];

/// Gender of the dog
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    #[default]
    Male,
    Female,
}

impl Gender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Male => "male",
            Self::Female => "female",
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Gender {
    type Err = ProfileError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "male" | "m" => Ok(Self::Male),
            "female" | "f" => Ok(Self::Female),
            other => Err(ProfileError::InvalidGender(other.to_string())),
        }
    }
}

/// Everything the persona knows about the dog it plays.
///
/// Built incrementally by the registration wizard and treated as immutable
/// once a chat session starts.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DogProfile {
    pub name: String,
    pub breed: String,
    /// Age in years, as typed by the owner
    pub age: String,
    pub gender: Gender,
    /// Weight in kg, as typed by the owner
    pub weight: String,
    pub birthday: NaiveDate,
    /// Trait tags in the order they were selected
    #[serde(default)]
    pub personality: Vec<String>,
    pub favorite_activity: String,
    pub favorite_treat: String,
    pub has_allergies: bool,
    /// Only meaningful when `has_allergies` is set
    #[serde(default)]
    pub allergies: String,
    /// Image references (paths or URIs), in upload order
    #[serde(default)]
    pub photos: Vec<String>,
}

impl Default for DogProfile {
    fn default() -> Self {
        Self {
            name: String::new(),
            breed: String::new(),
            age: String::new(),
            gender: Gender::default(),
            weight: String::new(),
            birthday: Utc::now().date_naive(),
            personality: Vec::new(),
            favorite_activity: String::new(),
            favorite_treat: String::new(),
            has_allergies: false,
            allergies: String::new(),
            photos: Vec::new(),
        }
    }
}

impl DogProfile {
    /// Create a profile with just a name and breed; everything else defaulted.
    pub fn new(name: impl Into<String>, breed: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            breed: breed.into(),
            ..Self::default()
        }
    }

    /// Check whether the dog has a trait, ignoring case.
    pub fn has_trait(&self, tag: &str) -> bool {
        self.personality.iter().any(|t| t.eq_ignore_ascii_case(tag))
    }

    /// Add a trait tag unless it is already present.
    ///
    /// Returns `true` if the tag was added.
    pub fn add_trait(&mut self, tag: impl Into<String>) -> bool {
        let tag = tag.into();
        if tag.trim().is_empty() || self.has_trait(&tag) {
            return false;
        }
        self.personality.push(tag);
        true
    }

    /// Flip a trait tag on or off, keeping the order of the remaining tags.
    pub fn toggle_trait(&mut self, tag: &str) {
        if self.has_trait(tag) {
            self.personality.retain(|t| !t.eq_ignore_ascii_case(tag));
        } else {
            self.add_trait(tag);
        }
    }

    /// Traits joined for display and prompts: `"Playful, Friendly"`.
    pub fn personality_list(&self) -> String {
        self.personality.join(", ")
    }

    /// Allergies text, or `None` when the dog has none.
    pub fn allergies(&self) -> Option<&str> {
        if self.has_allergies && !self.allergies.trim().is_empty() {
            Some(self.allergies.as_str())
        } else {
            None
        }
    }
}
