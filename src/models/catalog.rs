use serde::{Deserialize, Serialize};

/// Perceived difficulty of a game, inferred from community tags during
/// enrichment or imported with the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Low,
    Medium,
    High,
}

impl Difficulty {
    /// Parses catalog text tolerantly; unknown values fall back to Medium.
    pub fn from_raw(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "low" | "easy" => Difficulty::Low,
            "high" | "hard" => Difficulty::High,
            _ => Difficulty::Medium,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Low => "low",
            Difficulty::Medium => "medium",
            Difficulty::High => "high",
        }
    }
}

/// Dominant multiplayer mode of a game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MultiplayerMode {
    Solo,
    Coop,
    Pvp,
    Mmo,
}

impl MultiplayerMode {
    /// Parses catalog text tolerantly; unknown values fall back to Solo.
    pub fn from_raw(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "coop" | "co-op" => MultiplayerMode::Coop,
            "pvp" | "multiplayer" | "competitive" => MultiplayerMode::Pvp,
            "mmo" => MultiplayerMode::Mmo,
            _ => MultiplayerMode::Solo,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MultiplayerMode::Solo => "solo",
            MultiplayerMode::Coop => "coop",
            MultiplayerMode::Pvp => "pvp",
            MultiplayerMode::Mmo => "mmo",
        }
    }

    /// Whether the mode supports playing with other people.
    pub fn is_multiplayer(&self) -> bool {
        !matches!(self, MultiplayerMode::Solo)
    }
}

/// Platform a user may request recommendations for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Windows,
    Mac,
    Linux,
}

impl std::str::FromStr for Platform {
    type Err = crate::error::AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "windows" => Ok(Platform::Windows),
            "mac" => Ok(Platform::Mac),
            "linux" => Ok(Platform::Linux),
            other => Err(crate::error::AppError::InvalidInput(format!(
                "invalid platform: {}",
                other
            ))),
        }
    }
}

impl Platform {
    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Windows => "windows",
            Platform::Mac => "mac",
            Platform::Linux => "linux",
        }
    }
}

/// Read-only catalog metadata for a single game.
///
/// Rows are appended by the enrichment worker or bulk import; the core never
/// mutates them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub app_id: i64,
    pub name: String,
    pub developers: Option<String>,
    pub publishers: Option<String>,
    /// Raw genre list as delivered upstream, e.g. "Action, RPG"
    pub genres: String,
    /// Raw community tag list, comma separated
    pub tags: String,
    pub header_image: Option<String>,
    pub price: Option<f64>,
    pub positive: i32,
    pub negative: i32,
    pub avg_session_minutes: Option<i32>,
    pub difficulty: Difficulty,
    pub multiplayer_mode: MultiplayerMode,
    pub windows: bool,
    pub mac: bool,
    pub linux: bool,
    /// Concatenated search document (name + genres + tags)
    pub document: Option<String>,
}

impl CatalogEntry {
    pub fn supports(&self, platform: Platform) -> bool {
        match platform {
            Platform::Windows => self.windows,
            Platform::Mac => self.mac,
            Platform::Linux => self.linux,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_difficulty_aliases() {
        assert_eq!(Difficulty::from_raw("easy"), Difficulty::Low);
        assert_eq!(Difficulty::from_raw("LOW"), Difficulty::Low);
        assert_eq!(Difficulty::from_raw("hard"), Difficulty::High);
        assert_eq!(Difficulty::from_raw("high"), Difficulty::High);
        assert_eq!(Difficulty::from_raw("medium"), Difficulty::Medium);
        assert_eq!(Difficulty::from_raw("???"), Difficulty::Medium);
    }

    #[test]
    fn test_multiplayer_aliases() {
        assert_eq!(MultiplayerMode::from_raw("singleplayer"), MultiplayerMode::Solo);
        assert_eq!(MultiplayerMode::from_raw("co-op"), MultiplayerMode::Coop);
        assert_eq!(MultiplayerMode::from_raw("multiplayer"), MultiplayerMode::Pvp);
        assert_eq!(MultiplayerMode::from_raw("MMO"), MultiplayerMode::Mmo);
        assert!(MultiplayerMode::Coop.is_multiplayer());
        assert!(!MultiplayerMode::Solo.is_multiplayer());
    }

    #[test]
    fn test_platform_parse() {
        assert_eq!("windows".parse::<Platform>().unwrap(), Platform::Windows);
        assert_eq!(" Linux ".parse::<Platform>().unwrap(), Platform::Linux);
        assert!("amiga".parse::<Platform>().is_err());
    }

    #[test]
    fn test_entry_platform_support() {
        let entry = CatalogEntry {
            app_id: 1,
            name: "Test".into(),
            developers: None,
            publishers: None,
            genres: String::new(),
            tags: String::new(),
            header_image: None,
            price: None,
            positive: 0,
            negative: 0,
            avg_session_minutes: None,
            difficulty: Difficulty::Medium,
            multiplayer_mode: MultiplayerMode::Solo,
            windows: true,
            mac: false,
            linux: true,
            document: None,
        };
        assert!(entry.supports(Platform::Windows));
        assert!(!entry.supports(Platform::Mac));
        assert!(entry.supports(Platform::Linux));
    }
}
