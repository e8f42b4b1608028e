//! Register command - Walk the registration wizard and save the dog.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::Args;
use tracing::info;

use dogtalk_profile::{
    DogProfile, FileProfileStore, Gender, ProfileStore, RegistrationWizard, WizardAdvance,
};

#[derive(Args)]
pub struct RegisterArgs {
    /// Dog's name
    #[arg(short, long)]
    pub name: String,

    /// Breed
    #[arg(short, long)]
    pub breed: String,

    /// Age in years
    #[arg(short, long, default_value = "")]
    pub age: String,

    /// male or female
    #[arg(short, long, default_value = "male")]
    pub gender: String,

    /// Photo of the dog (repeat, at least 3)
    #[arg(short, long = "photo", value_name = "PATH")]
    pub photos: Vec<PathBuf>,

    /// Weight, free text
    #[arg(long, default_value = "")]
    pub weight: String,

    /// Birthday as YYYY-MM-DD (defaults to today)
    #[arg(long)]
    pub birthday: Option<NaiveDate>,

    /// Personality trait (repeatable), e.g. Playful, Calm, Friendly
    #[arg(short, long = "trait", value_name = "TRAIT")]
    pub traits: Vec<String>,

    /// Favorite activity, e.g. "Playing fetch"
    #[arg(long, default_value = "")]
    pub activity: String,

    /// Favorite treat
    #[arg(long, default_value = "")]
    pub treat: String,

    /// Known allergies
    #[arg(long)]
    pub allergies: Option<String>,

    /// Replace an existing dog with the same name
    #[arg(short, long)]
    pub force: bool,

    /// Start chatting right after registration
    #[arg(long)]
    pub chat: bool,

    /// With --chat, use canned replies instead of an LLM
    #[arg(long, requires = "chat")]
    pub offline: bool,
}

pub async fn execute(args: RegisterArgs, root: &Path) -> Result<()> {
    let store = FileProfileStore::new(root);

    if !args.force && store.get(&args.name)?.is_some() {
        anyhow::bail!(
            "{} is already registered. Use --force to replace the profile.",
            args.name
        );
    }

    let profile = build_profile(&args)?;
    store
        .save(&profile)
        .with_context(|| format!("Failed to save profile for {}", profile.name))?;
    info!("Saved profile {:?} to {:?}", profile.name, store.profiles_dir());

    println!("✅ {} the {} is registered!", profile.name, profile.breed);

    if args.chat {
        println!();
        super::chat::run_session(profile, root, args.offline).await?;
    } else {
        println!();
        println!("Next steps:");
        println!("  dogtalk chat --profile \"{}\"", profile.name);
    }

    Ok(())
}

/// Drive the wizard from command-line arguments.
fn build_profile(args: &RegisterArgs) -> Result<DogProfile> {
    let mut wizard = RegistrationWizard::new();

    println!("📋 {}", wizard.step());
    let gender: Gender = args.gender.parse()?;
    wizard
        .set_name(args.name.trim())
        .set_breed(args.breed.trim())
        .set_age(args.age.trim())
        .set_gender(gender);
    wizard.next()?;

    println!("📋 {}", wizard.step());
    for photo in &args.photos {
        if !photo.is_file() {
            anyhow::bail!("Photo not found: {}", photo.display());
        }
        let count = wizard.add_photo(photo.display().to_string());
        println!("  📷 {} ({})", photo.display(), count);
    }
    wizard.next().context("Not enough photos, pass --photo at least 3 times")?;

    println!("📋 {}", wizard.step());
    wizard
        .set_weight(args.weight.trim())
        .set_favorite_activity(args.activity.trim())
        .set_favorite_treat(args.treat.trim());
    if let Some(birthday) = args.birthday {
        wizard.set_birthday(birthday);
    }
    for tag in &args.traits {
        if !wizard.profile().has_trait(tag) {
            wizard.toggle_personality(tag);
        }
    }
    if let Some(allergies) = args.allergies.as_deref().filter(|a| !a.trim().is_empty()) {
        wizard.set_has_allergies(true).set_allergies(allergies.trim());
    }

    match wizard.next()? {
        WizardAdvance::Finished(profile) => Ok(profile),
        WizardAdvance::Moved(step) => anyhow::bail!("Registration stopped early at {}", step),
    }
}
