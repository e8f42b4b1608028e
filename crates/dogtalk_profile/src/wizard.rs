//! Registration wizard.
//!
//! A forward-only, three-step form that accumulates a [`DogProfile`].
//! The only hard gate is on leaving the photo step: at least
//! [`MIN_PHOTOS`] photos must have been added.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{ProfileError, ProfileResult};
use crate::profile::{DogProfile, Gender};

/// Photos required before the wizard lets the owner leave step 2.
pub const MIN_PHOTOS: usize = 3;

/// Wizard step
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "kebab-case")]
pub enum WizardStep {
    /// Name, breed, age, gender
    BasicInfo,
    /// Photo upload
    Photos,
    /// Weight, birthday, personality, favorites, allergies
    Details,
}

impl WizardStep {
    /// 1-based step number.
    pub fn number(&self) -> u8 {
        match self {
            Self::BasicInfo => 1,
            Self::Photos => 2,
            Self::Details => 3,
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Self::BasicInfo => "Basic Information",
            Self::Photos => "Photo Upload",
            Self::Details => "Additional Information",
        }
    }

    fn following(&self) -> Option<Self> {
        match self {
            Self::BasicInfo => Some(Self::Photos),
            Self::Photos => Some(Self::Details),
            Self::Details => None,
        }
    }
}

impl fmt::Display for WizardStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Step {}: {}", self.number(), self.title())
    }
}

/// Result of calling [`RegistrationWizard::next`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WizardAdvance {
    /// Moved forward to the given step
    Moved(WizardStep),
    /// Step 3 completed; the finished profile
    Finished(DogProfile),
}

/// Form state for registering a dog.
#[derive(Debug, Clone)]
pub struct RegistrationWizard {
    step: WizardStep,
    profile: DogProfile,
    finished: bool,
}

impl Default for RegistrationWizard {
    fn default() -> Self {
        Self::new()
    }
}

impl RegistrationWizard {
    /// Start a new wizard on step 1 with an empty profile.
    pub fn new() -> Self {
        Self {
            step: WizardStep::BasicInfo,
            profile: DogProfile::default(),
            finished: false,
        }
    }

    /// Current step.
    pub fn step(&self) -> WizardStep {
        self.step
    }

    /// The profile as filled in so far.
    pub fn profile(&self) -> &DogProfile {
        &self.profile
    }

    /// Whether the wizard has already produced its profile.
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Whether `next()` would succeed right now.
    ///
    /// Front ends use this to enable or disable their Next/Finish button.
    pub fn can_advance(&self) -> bool {
        if self.finished {
            return false;
        }
        match self.step {
            WizardStep::Photos => self.profile.photos.len() >= MIN_PHOTOS,
            _ => true,
        }
    }

    /// Advance one step, or finish when on the last step.
    pub fn next(&mut self) -> ProfileResult<WizardAdvance> {
        if self.finished {
            return Err(ProfileError::validation("registration already finished"));
        }

        if self.step == WizardStep::Photos && self.profile.photos.len() < MIN_PHOTOS {
            debug!(
                photos = self.profile.photos.len(),
                "Photo gate closed, staying on step 2"
            );
            return Err(ProfileError::NotEnoughPhotos {
                step: self.step,
                have: self.profile.photos.len(),
                need: MIN_PHOTOS,
            });
        }

        match self.step.following() {
            Some(step) => {
                debug!("Wizard advanced to {}", step);
                self.step = step;
                Ok(WizardAdvance::Moved(step))
            }
            None => {
                self.finished = true;
                let profile = std::mem::take(&mut self.profile);
                info!(name = %profile.name, breed = %profile.breed, "Registration finished");
                Ok(WizardAdvance::Finished(profile))
            }
        }
    }

    // Step 1

    pub fn set_name(&mut self, name: impl Into<String>) -> &mut Self {
        self.profile.name = name.into();
        self
    }

    pub fn set_breed(&mut self, breed: impl Into<String>) -> &mut Self {
        self.profile.breed = breed.into();
        self
    }

    pub fn set_age(&mut self, age: impl Into<String>) -> &mut Self {
        self.profile.age = age.into();
        self
    }

    pub fn set_gender(&mut self, gender: Gender) -> &mut Self {
        self.profile.gender = gender;
        self
    }

    // Step 2

    /// Add a photo reference. Returns the number of photos so far.
    pub fn add_photo(&mut self, reference: impl Into<String>) -> usize {
        self.profile.photos.push(reference.into());
        self.profile.photos.len()
    }

    /// Photos still needed before step 2 can be left.
    pub fn photos_missing(&self) -> usize {
        MIN_PHOTOS.saturating_sub(self.profile.photos.len())
    }

    // Step 3

    pub fn set_weight(&mut self, weight: impl Into<String>) -> &mut Self {
        self.profile.weight = weight.into();
        self
    }

    pub fn set_birthday(&mut self, birthday: NaiveDate) -> &mut Self {
        self.profile.birthday = birthday;
        self
    }

    pub fn toggle_personality(&mut self, tag: &str) -> &mut Self {
        self.profile.toggle_trait(tag);
        self
    }

    pub fn set_favorite_activity(&mut self, activity: impl Into<String>) -> &mut Self {
        self.profile.favorite_activity = activity.into();
        self
    }

    pub fn set_favorite_treat(&mut self, treat: impl Into<String>) -> &mut Self {
        self.profile.favorite_treat = treat.into();
        self
    }

    pub fn set_has_allergies(&mut self, has_allergies: bool) -> &mut Self {
        self.profile.has_allergies = has_allergies;
        self
    }

    pub fn set_allergies(&mut self, allergies: impl Into<String>) -> &mut Self {
        self.profile.allergies = allergies.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wizard_on_photo_step() -> RegistrationWizard {
        let mut wizard = RegistrationWizard::new();
        wizard.set_name("Rex").set_breed("Labrador").set_age("3");
        assert_eq!(wizard.next().unwrap(), WizardAdvance::Moved(WizardStep::Photos));
        wizard
    }

    #[test]
    fn test_step_one_has_no_gate() {
        let mut wizard = RegistrationWizard::new();
        assert!(wizard.can_advance());
        assert_eq!(wizard.next().unwrap(), WizardAdvance::Moved(WizardStep::Photos));
    }

    #[test]
    fn test_photo_gate_blocks_below_minimum() {
        let mut wizard = wizard_on_photo_step();
        wizard.add_photo("a.jpg");
        wizard.add_photo("b.jpg");

        assert!(!wizard.can_advance());
        assert_eq!(wizard.photos_missing(), 1);
        let err = wizard.next().unwrap_err();
        assert!(matches!(err, ProfileError::NotEnoughPhotos { have: 2, need: 3, .. }));
        assert_eq!(wizard.step(), WizardStep::Photos);
    }

    #[test]
    fn test_photo_gate_opens_at_exactly_three() {
        let mut wizard = wizard_on_photo_step();
        for photo in ["a.jpg", "b.jpg", "c.jpg"] {
            wizard.add_photo(photo);
        }

        assert!(wizard.can_advance());
        assert_eq!(wizard.next().unwrap(), WizardAdvance::Moved(WizardStep::Details));
    }

    #[test]
    fn test_finish_hands_over_profile_once() {
        let mut wizard = wizard_on_photo_step();
        for photo in ["a.jpg", "b.jpg", "c.jpg", "d.jpg"] {
            wizard.add_photo(photo);
        }
        wizard.next().unwrap();
        wizard
            .toggle_personality("Playful")
            .toggle_personality("Friendly")
            .set_favorite_activity("Playing fetch")
            .set_favorite_treat("Bacon");

        let profile = match wizard.next().unwrap() {
            WizardAdvance::Finished(profile) => profile,
            other => panic!("expected finish, got {:?}", other),
        };
        assert_eq!(profile.name, "Rex");
        assert_eq!(profile.photos.len(), 4);
        assert_eq!(profile.personality_list(), "Playful, Friendly");

        assert!(wizard.is_finished());
        assert!(!wizard.can_advance());
        assert!(wizard.next().is_err());
    }

    #[test]
    fn test_step_display() {
        assert_eq!(WizardStep::Photos.to_string(), "Step 2: Photo Upload");
        assert_eq!(WizardStep::Details.number(), 3);
    }
}
