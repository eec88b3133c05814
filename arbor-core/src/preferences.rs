//! # Preferences
//!
//! User preferences, saved as TOML in the platform's preferences directory. A missing file is the same as
//! default preferences. A file that fails to load also falls back to defaults, but is remembered as a failure so
//! that it isn't blindly overwritten.

use crate::state::transform::ReparentPolicy;

const DOCUMENTATION: &str = r#"# Arbor preferences. You may edit this file, but be aware that formatting and comments will not
# be preserved, and all keys and values are case sensitive.

# history_limit = <number>
#   How many commands can be undone per scene. Leave out for no limit.
# reparent_policy = "preserve_world" | "keep_local"
#   Whether moving a node to a new parent keeps it in place in the world ("preserve_world"),
#   or keeps its transform relative to its parent, moving it along with the new parent ("keep_local").

"#;

#[must_use]
pub fn preferences_dir() -> Option<std::path::PathBuf> {
    let mut base_dir = dirs::preference_dir()?;
    base_dir.push("arbor");
    Some(base_dir)
}

#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct Preferences {
    /// Maximum number of undoable commands per scene, or None for unlimited.
    pub history_limit: Option<usize>,
    pub reparent_policy: ReparentPolicy,
}

#[derive(Debug)]
pub struct PreferencesFile {
    failed_to_load: bool,
    pub preferences: Preferences,
}
impl PreferencesFile {
    const FILENAME: &'static str = "preferences.toml";
    /// Load from the user's preferences directory.
    /// (Or defaulted, if unavailable for some reason)
    #[must_use]
    pub fn from_default_file() -> Self {
        if let Some(mut path) = preferences_dir() {
            path.push(Self::FILENAME);
            Self::load_or_default(&path)
        } else {
            log::warn!("No preferences dir found, using default preferences");
            Self {
                failed_to_load: true,
                preferences: Preferences::default(),
            }
        }
    }
    #[must_use]
    pub fn load_or_default(path: &std::path::Path) -> Self {
        match Self::load(path) {
            Ok(preferences) => Self {
                failed_to_load: false,
                preferences: preferences.unwrap_or_default(),
            },
            Err(err) => {
                log::warn!(
                    "Failed to load preferences from {}, using defaults: {err:#}",
                    path.display()
                );
                Self {
                    failed_to_load: true,
                    preferences: Preferences::default(),
                }
            }
        }
    }
    /// Ok(None) if there's no file.
    fn load(path: &std::path::Path) -> anyhow::Result<Option<Preferences>> {
        let string = match std::fs::read_to_string(path) {
            Ok(string) => string,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                log::debug!("No preferences at {}", path.display());
                return Ok(None);
            }
            Err(err) => return Err(err.into()),
        };
        Ok(Some(toml::from_str(&string)?))
    }
    /// Whether the file existed but couldn't be read or parsed.
    #[must_use]
    pub fn did_fail_to_load(&self) -> bool {
        self.failed_to_load
    }
    /// Save into the user's preferences directory.
    pub fn save(&self) -> anyhow::Result<()> {
        let mut preferences =
            preferences_dir().ok_or_else(|| anyhow::anyhow!("No preferences dir found"))?;
        // Explicity do *not* create recursively. If not found, the user probably has a good reason.
        // Ignore errors (could already exist). Any real errors will be emitted by file access below.
        let _ = std::fs::DirBuilder::new().create(&preferences);

        preferences.push(Self::FILENAME);
        self.save_to(&preferences)
    }
    pub fn save_to(&self, path: &std::path::Path) -> anyhow::Result<()> {
        let mut string = toml::ser::to_string_pretty(&self.preferences)?;
        // Prefix some documentation.
        string = DOCUMENTATION.to_owned() + &string;
        std::fs::write(path, string)?;
        Ok(())
    }
}
