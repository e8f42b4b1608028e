//! Profiles command - List registered dogs.

use std::path::Path;

use anyhow::{Context, Result};
use clap::Args;

use dogtalk_profile::{FileProfileStore, ProfileStore};

#[derive(Args)]
pub struct ProfilesArgs {
    /// Print full profiles as JSON
    #[arg(long)]
    json: bool,
}

pub async fn execute(args: ProfilesArgs, root: &Path) -> Result<()> {
    let store = FileProfileStore::new(root);
    let profiles = store.list().context("Failed to read profiles")?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&profiles)?);
        return Ok(());
    }

    if profiles.is_empty() {
        println!("No dogs registered yet.");
        println!();
        println!("Register one with:");
        println!("  dogtalk register --name Rex --breed Labrador --photo a.jpg --photo b.jpg --photo c.jpg");
        return Ok(());
    }

    println!("🐶 Registered dogs:");
    for profile in &profiles {
        let traits = profile.personality_list();
        if traits.is_empty() {
            println!("  {} ({})", profile.name, profile.breed);
        } else {
            println!("  {} ({}) - {}", profile.name, profile.breed, traits);
        }
    }

    Ok(())
}
