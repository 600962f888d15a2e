//! Error types for modelbench-mcp.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur during configuration operations.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Configuration file could not be read.
    #[error("failed to read configuration file: {path}")]
    ReadError {
        /// Path to the configuration file.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// Configuration file could not be parsed.
    #[error("failed to parse configuration file: {path}")]
    ParseError {
        /// Path to the configuration file.
        path: PathBuf,
        /// The underlying JSON error.
        #[source]
        source: serde_json::Error,
    },

    /// Configuration file not found.
    #[error("configuration file not found: {path}")]
    NotFound {
        /// Path where the configuration file was expected.
        path: PathBuf,
    },

    /// Configuration validation failed.
    #[error("configuration validation failed: {message}")]
    ValidationError {
        /// Description of the validation failure.
        message: String,
    },
}

/// Errors raised by tool and resource handlers against the scene model.
///
/// These surface as application-level failures (tool results flagged
/// `isError`, or resource-not-found responses), never as transport
/// failures.
#[derive(Error, Debug)]
pub enum SceneError {
    /// A referenced entity could not be resolved by uuid or name.
    #[error("{kind} not found: {identifier}")]
    NotFound {
        /// The collection searched ("texture", "element", "project", "bar item").
        kind: &'static str,
        /// The identifier that failed to resolve.
        identifier: String,
    },

    /// An identifier matched more than one entity by name.
    #[error("{kind} identifier '{identifier}' is ambiguous ({matches} name matches)")]
    Ambiguous {
        /// The collection searched.
        kind: &'static str,
        /// The ambiguous identifier.
        identifier: String,
        /// How many entities share the name.
        matches: usize,
    },

    /// A texture file could not be read from disk.
    #[error("failed to load texture from {path}")]
    TextureLoad {
        /// The path that was read.
        path: String,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// A texture could not be fetched from a remote URL.
    #[error("failed to fetch texture from {url}")]
    TextureFetch {
        /// The URL that was fetched.
        url: String,
        /// The underlying HTTP error.
        #[source]
        source: reqwest::Error,
    },

    /// Fetched bytes could not be decoded as an image.
    #[error("failed to decode texture data from {source_name}")]
    TextureDecode {
        /// The path, URL or texture name the data came from.
        source_name: String,
        /// The underlying decode error.
        #[source]
        source: image::ImageError,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_error_display() {
        let error = ConfigError::NotFound {
            path: PathBuf::from("/path/to/config.json"),
        };
        let msg = error.to_string();
        assert!(msg.contains("not found"));
        assert!(msg.contains("config.json"));
    }

    #[test]
    fn validation_error_display() {
        let error = ConfigError::ValidationError {
            message: "endpoint must start with '/'".to_string(),
        };
        let msg = error.to_string();
        assert!(msg.contains("endpoint must start with '/'"));
    }

    #[test]
    fn not_found_names_collection_and_identifier() {
        let error = SceneError::NotFound {
            kind: "texture",
            identifier: "stone".to_string(),
        };
        let msg = error.to_string();
        assert!(msg.contains("texture"));
        assert!(msg.contains("stone"));
    }

    #[test]
    fn ambiguous_reports_match_count() {
        let error = SceneError::Ambiguous {
            kind: "element",
            identifier: "cube".to_string(),
            matches: 3,
        };
        assert!(error.to_string().contains("3 name matches"));
    }
}
