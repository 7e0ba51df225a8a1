use std::fmt::{self, Display};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Color theme of the chat surface.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Theme {
    /// Dark text on a light background.
    #[default]
    Light,
    /// Light text on a dark background.
    Dark,
}

impl Theme {
    /// Returns the other theme.
    #[inline]
    pub fn toggled(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }
}

impl Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        })
    }
}

/// The string is neither `light` nor `dark`.
#[derive(Debug, PartialEq, Eq)]
pub struct ParseThemeError;

impl Display for ParseThemeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("expected `light` or `dark`")
    }
}

impl std::error::Error for ParseThemeError {}

impl FromStr for Theme {
    type Err = ParseThemeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "light" => Ok(Theme::Light),
            "dark" => Ok(Theme::Dark),
            _ => Err(ParseThemeError),
        }
    }
}

/// Persists the theme choice in a small file.
///
/// A store without a path (no config directory on this platform) keeps
/// nothing and always loads the default theme.
#[derive(Clone, Debug)]
pub struct ThemeStore {
    path: Option<PathBuf>,
}

impl ThemeStore {
    /// A store backed by `path`.
    #[inline]
    pub fn at<P: Into<PathBuf>>(path: P) -> Self {
        Self {
            path: Some(path.into()),
        }
    }

    /// A store at `<config dir>/ragchat/theme`.
    pub fn user_default() -> Self {
        let path = dirs::config_dir().map(|dir| dir.join("ragchat").join("theme"));
        if path.is_none() {
            debug!("no config directory, theme won't be persisted");
        }
        Self { path }
    }

    /// Where the theme is stored, if anywhere.
    #[inline]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Reads the stored theme, falling back to [`Theme::Light`] if the file
    /// is missing or holds something else.
    pub fn load(&self) -> Theme {
        let Some(path) = &self.path else {
            return Theme::default();
        };
        match fs::read_to_string(path) {
            Ok(content) => content.parse().unwrap_or_else(|_| {
                debug!("ignoring invalid theme file {}", path.display());
                Theme::default()
            }),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Theme::default(),
            Err(err) => {
                warn!("failed to read theme file {}: {err}", path.display());
                Theme::default()
            }
        }
    }

    /// Writes `theme`, creating the parent directory if needed.
    pub fn save(&self, theme: Theme) -> io::Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, theme.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse() {
        assert_eq!("dark".parse::<Theme>(), Ok(Theme::Dark));
        assert_eq!("light\n".parse::<Theme>(), Ok(Theme::Light));
        assert_eq!("Dark".parse::<Theme>(), Err(ParseThemeError));
        assert_eq!(Theme::Dark.toggled().toggled(), Theme::Dark);
    }

    #[test]
    fn test_missing_file_is_light() {
        let dir = tempfile::tempdir().unwrap();
        let store = ThemeStore::at(dir.path().join("nested").join("theme"));
        assert_eq!(store.load(), Theme::Light);
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ragchat").join("theme");
        let store = ThemeStore::at(&path);

        store.save(Theme::Dark).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "dark");
        assert_eq!(store.load(), Theme::Dark);

        store.save(Theme::Light).unwrap();
        assert_eq!(ThemeStore::at(&path).load(), Theme::Light);
    }

    #[test]
    fn test_invalid_file_is_light() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("theme");
        fs::write(&path, "solarized").unwrap();
        assert_eq!(ThemeStore::at(&path).load(), Theme::Light);
    }

    #[test]
    fn test_unwritable_store() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("file");
        fs::write(&blocker, "").unwrap();
        // The parent "directory" is a regular file.
        let store = ThemeStore::at(blocker.join("theme"));
        assert!(store.save(Theme::Dark).is_err());
        assert_eq!(store.load(), Theme::Light);
    }
}
