//! Profile storage.
//!
//! Profiles are stored in the workspace under:
//! `.dogtalk/profiles/<slug>.json`
//!
//! Directory structure:
//! ```text
//! .dogtalk/
//! ├── settings.json        # LLM provider settings (read by dogtalk_chat)
//! └── profiles/
//!     ├── rex.json
//!     └── miss-daisy.json
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use parking_lot::{Mutex, MutexGuard};
use tracing::{debug, warn};

use crate::error::{ProfileError, ProfileResult};
use crate::profile::DogProfile;

/// Convert a profile name to a file-safe slug
pub fn slugify(s: &str) -> String {
    s.chars()
        .map(|c| {
            if c.is_alphanumeric() {
                c.to_lowercase().next().unwrap_or(c)
            } else {
                '-'
            }
        })
        .collect::<String>()
        .split('-')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}

/// Somewhere to keep registered dogs.
pub trait ProfileStore: Send + Sync {
    /// All stored profiles.
    fn list(&self) -> ProfileResult<Vec<DogProfile>>;

    /// Look up a profile by name (case-insensitive).
    fn get(&self, name: &str) -> ProfileResult<Option<DogProfile>>;

    /// Save a profile, replacing any profile with the same name.
    fn save(&self, profile: &DogProfile) -> ProfileResult<()>;

    /// Look up a profile by name, failing if it does not exist.
    fn get_required(&self, name: &str) -> ProfileResult<DogProfile> {
        self.get(name)?
            .ok_or_else(|| ProfileError::NotFound(name.to_string()))
    }
}

fn check_name(profile: &DogProfile) -> ProfileResult<String> {
    let slug = slugify(&profile.name);
    if slug.is_empty() {
        return Err(ProfileError::validation(format!(
            "profile name {:?} has no usable characters",
            profile.name
        )));
    }
    Ok(slug)
}

/// In-memory store, mostly for tests and previews.
#[derive(Debug, Default)]
pub struct MemoryProfileStore {
    /// Insertion-ordered
    profiles: Mutex<Vec<DogProfile>>,
}

impl MemoryProfileStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-filled with profiles.
    ///
    /// Fails on the first profile whose name cannot be stored.
    pub fn with_profiles(profiles: impl IntoIterator<Item = DogProfile>) -> ProfileResult<Self> {
        let store = Self::new();
        for profile in profiles {
            store.save(&profile)?;
        }
        Ok(store)
    }

    fn lock(&self) -> MutexGuard<'_, Vec<DogProfile>> {
        self.profiles.lock()
    }
}

impl ProfileStore for MemoryProfileStore {
    fn list(&self) -> ProfileResult<Vec<DogProfile>> {
        Ok(self.lock().clone())
    }

    fn get(&self, name: &str) -> ProfileResult<Option<DogProfile>> {
        let slug = slugify(name);
        Ok(self
            .lock()
            .iter()
            .find(|p| slugify(&p.name) == slug)
            .cloned())
    }

    fn save(&self, profile: &DogProfile) -> ProfileResult<()> {
        let slug = check_name(profile)?;
        let mut profiles = self.lock();
        match profiles.iter_mut().find(|p| slugify(&p.name) == slug) {
            Some(existing) => *existing = profile.clone(),
            None => profiles.push(profile.clone()),
        }
        Ok(())
    }
}

/// JSON-file store rooted at a workspace directory.
#[derive(Debug, Clone)]
pub struct FileProfileStore {
    /// Root path of the dogtalk workspace
    workspace_root: PathBuf,
}

impl FileProfileStore {
    /// Create a store for a workspace
    pub fn new(workspace_root: impl AsRef<Path>) -> Self {
        Self {
            workspace_root: workspace_root.as_ref().to_path_buf(),
        }
    }

    /// Directory the store was opened on
    pub fn workspace_root(&self) -> &Path {
        &self.workspace_root
    }

    /// Directory holding the profile files
    pub fn profiles_dir(&self) -> PathBuf {
        self.workspace_root.join(".dogtalk").join("profiles")
    }

    fn profile_path(&self, slug: &str) -> PathBuf {
        self.profiles_dir().join(format!("{}.json", slug))
    }
}

impl ProfileStore for FileProfileStore {
    fn list(&self) -> ProfileResult<Vec<DogProfile>> {
        let dir = self.profiles_dir();
        if !dir.exists() {
            return Ok(Vec::new());
        }

        let mut profiles = Vec::new();
        for entry in fs::read_dir(&dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }

            let parsed = fs::read_to_string(&path)
                .map_err(ProfileError::from)
                .and_then(|content| serde_json::from_str::<DogProfile>(&content).map_err(Into::into));
            match parsed {
                Ok(profile) => profiles.push(profile),
                Err(e) => warn!("Skipping unreadable profile {:?}: {}", path, e),
            }
        }

        profiles.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));
        Ok(profiles)
    }

    fn get(&self, name: &str) -> ProfileResult<Option<DogProfile>> {
        let slug = slugify(name);
        if slug.is_empty() {
            return Ok(None);
        }

        let path = self.profile_path(&slug);
        if !path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(&path)?;
        Ok(Some(serde_json::from_str(&content)?))
    }

    fn save(&self, profile: &DogProfile) -> ProfileResult<()> {
        let slug = check_name(profile)?;
        fs::create_dir_all(self.profiles_dir())?;

        let path = self.profile_path(&slug);
        let content = serde_json::to_string_pretty(profile)?;
        fs::write(&path, content)?;

        debug!("Saved profile {:?} to {:?}", profile.name, path);
        Ok(())
    }
}
