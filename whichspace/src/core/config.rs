use std::path::{Path, PathBuf};

/// Identifier the window server gives the built-in/primary display.
pub const DEFAULT_MAIN_DISPLAY: &str = "Main";

/// Rewritten (deleted and recreated) by the window server whenever the space
/// layout changes.
pub const DEFAULT_SPACES_FILE: &str = "~/Library/Preferences/com.apple.spaces.plist";

/// Shown while the active space has no number.
pub const DEFAULT_UNKNOWN_LABEL: &str = "?";

/// Application configuration settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub main_display: String,
    /// Absolute path of the watched preferences file.
    pub spaces_file: PathBuf,
    pub unknown_label: String,
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_main_display(mut self, main_display: Option<String>) -> Self {
        if let Some(main_display) = main_display {
            self.main_display = main_display;
        }
        self
    }

    pub fn with_spaces_file(mut self, spaces_file: Option<String>) -> Self {
        if let Some(spaces_file) = spaces_file {
            self.spaces_file = expand_home(&spaces_file);
        }
        self
    }

    pub fn with_unknown_label(mut self, unknown_label: Option<String>) -> Self {
        if let Some(unknown_label) = unknown_label {
            self.unknown_label = unknown_label;
        }
        self
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            main_display: DEFAULT_MAIN_DISPLAY.to_string(),
            spaces_file: expand_home(DEFAULT_SPACES_FILE),
            unknown_label: DEFAULT_UNKNOWN_LABEL.to_string(),
        }
    }
}

/// Expand a leading `~` to the current user's home directory.
pub fn expand_home(path: &str) -> PathBuf {
    expand_home_with(path, dirs::home_dir().as_deref())
}

fn expand_home_with(path: &str, home: Option<&Path>) -> PathBuf {
    let Some(home) = home else {
        return PathBuf::from(path);
    };

    if path == "~" {
        home.to_path_buf()
    } else if let Some(rest) = path.strip_prefix("~/") {
        home.join(rest)
    } else {
        PathBuf::from(path)
    }
}
