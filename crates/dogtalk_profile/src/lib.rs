//! # dogtalk_profile
//!
//! Everything about the dog behind a chat persona.
//!
//! - **Profile**: the `DogProfile` record that parameterizes persona prompts
//! - **Wizard**: the 3-step registration flow that builds a profile
//! - **Store**: where finished profiles are kept between sessions
//!
//! # Example
//!
//! ```rust,ignore
//! use dogtalk_profile::{Gender, RegistrationWizard, WizardAdvance};
//!
//! let mut wizard = RegistrationWizard::new();
//! wizard.set_name("Rex").set_breed("Labrador").set_age("3").set_gender(Gender::Male);
//! wizard.next()?; // step 2
//! for photo in ["a.jpg", "b.jpg", "c.jpg"] {
//!     wizard.add_photo(photo);
//! }
//! wizard.next()?; // step 3
//! wizard.toggle_personality("Playful");
//! if let WizardAdvance::Finished(profile) = wizard.next()? {
//!     store.save(&profile)?;
//! }
//! ```

pub mod error;
pub mod profile;
pub mod store;
pub mod wizard;

pub use error::{ProfileError, ProfileResult};
pub use profile::{DogProfile, Gender, FAVORITE_ACTIVITIES, PERSONALITY_TRAITS};
pub use store::{slugify, FileProfileStore, MemoryProfileStore, ProfileStore};
pub use wizard::{RegistrationWizard, WizardAdvance, WizardStep, MIN_PHOTOS};
