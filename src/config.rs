//! Feed properties loaded from an optional TOML file.
//!
//! The file is optional: a missing file yields `FeedProperties::default()`,
//! and every lookup falls back to a built-in default, so property access
//! never fails. Nested tables are flattened into dotted keys, so
//! `[feed] title = "x"` and `"feed.title" = "x"` are equivalent.
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read properties file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid TOML in properties file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Properties file too large: {0}")]
    TooLarge(String),
}

// ============================================================================
// Known Properties
// ============================================================================

/// Properties the feed service reads, each with a built-in default.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedProperty {
    Title,
    Author,
    GeneratorUri,
    GeneratorTitle,
    IdPrefix,
    PageSize,
}

impl FeedProperty {
    pub const ALL: [FeedProperty; 6] = [
        FeedProperty::Title,
        FeedProperty::Author,
        FeedProperty::GeneratorUri,
        FeedProperty::GeneratorTitle,
        FeedProperty::IdPrefix,
        FeedProperty::PageSize,
    ];

    pub fn key(self) -> &'static str {
        match self {
            FeedProperty::Title => "feed.title",
            FeedProperty::Author => "feed.author",
            FeedProperty::GeneratorUri => "feed.generator.uri",
            FeedProperty::GeneratorTitle => "feed.generator.title",
            FeedProperty::IdPrefix => "feed.id.prefix",
            FeedProperty::PageSize => "feed.page.size",
        }
    }

    pub fn default_value(self) -> &'static str {
        match self {
            FeedProperty::Title => "Event feed",
            FeedProperty::Author => "Atomfeed",
            FeedProperty::GeneratorUri => "https://github.com/ICT4H/atomfeed",
            FeedProperty::GeneratorTitle => "Atomfeed",
            FeedProperty::IdPrefix => "",
            FeedProperty::PageSize => "5",
        }
    }
}

// ============================================================================
// Properties
// ============================================================================

/// Immutable property overrides. Absent keys resolve to defaults.
#[derive(Debug, Clone, Default)]
pub struct FeedProperties {
    overrides: HashMap<String, String>,
}

impl FeedProperties {
    /// Maximum properties file size (1 MB).
    const MAX_FILE_SIZE: u64 = 1_048_576;

    /// Build from explicit key/value overrides.
    pub fn from_overrides<I, K, V>(overrides: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            overrides: overrides
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Load overrides from a TOML file.
    ///
    /// - Missing file → `Ok(FeedProperties::default())`
    /// - Empty file → `Ok(FeedProperties::default())`
    /// - Invalid TOML → `Err(ConfigError::Parse)`
    /// - Unknown keys → kept, logged as warning
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::metadata(path) {
            Ok(meta) if meta.len() > Self::MAX_FILE_SIZE => {
                return Err(ConfigError::TooLarge(format!(
                    "Properties file is {} bytes (max {} bytes)",
                    meta.len(),
                    Self::MAX_FILE_SIZE
                )));
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "No properties file found, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
            Ok(_) => {}
        }

        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                // Deleted between metadata and read
                tracing::debug!(path = %path.display(), "Properties file disappeared, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
        };

        let properties = Self::parse(&content)?;
        tracing::info!(
            path = %path.display(),
            overrides = properties.overrides.len(),
            "Loaded feed properties"
        );
        Ok(properties)
    }

    /// Parse TOML content into flattened dotted-key overrides.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        let table: toml::Table = content.parse()?;
        let mut overrides = HashMap::new();
        flatten_into(&mut overrides, None, &table);

        for key in overrides.keys() {
            if !FeedProperty::ALL.iter().any(|p| p.key() == key) {
                tracing::warn!(key = %key, "Unknown key in properties file");
            }
        }

        Ok(Self { overrides })
    }

    /// Value of a known property, or its built-in default.
    pub fn get(&self, property: FeedProperty) -> &str {
        self.get_or(property.key(), property.default_value())
    }

    /// Value for an arbitrary key, or `default` when not overridden.
    pub fn get_or<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        self.overrides.get(key).map(String::as_str).unwrap_or(default)
    }

    /// Configured page size, falling back to the default on unparsable or zero values.
    pub fn page_size(&self) -> u32 {
        let raw = self.get(FeedProperty::PageSize);
        match raw.trim().parse::<u32>() {
            Ok(n) if n > 0 => n,
            _ => {
                tracing::warn!(value = %raw, "Invalid feed.page.size, using default");
                FeedProperty::PageSize
                    .default_value()
                    .parse()
                    .unwrap_or(5)
            }
        }
    }
}

fn flatten_into(out: &mut HashMap<String, String>, prefix: Option<&str>, table: &toml::Table) {
    for (key, value) in table {
        let full_key = match prefix {
            Some(p) => format!("{p}.{key}"),
            None => key.clone(),
        };
        match value {
            toml::Value::Table(inner) => flatten_into(out, Some(&full_key), inner),
            toml::Value::String(s) => {
                out.insert(full_key, s.clone());
            }
            other => {
                out.insert(full_key, other.to_string());
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
