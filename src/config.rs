//! # Document Configuration
//!
//! Metadata and output options for generated interface documents, loaded
//! from environment variables.
//!
//! ## Environment Variables
//!
//! | Variable | Default | Meaning |
//! |---|---|---|
//! | `ROUTESCHEMA_DOC_TITLE` | `API` | `info.title` |
//! | `ROUTESCHEMA_DOC_DESCRIPTION` | unset | `info.description` |
//! | `ROUTESCHEMA_DOC_VERSION` | `1.0.0` | `info.version` |
//! | `ROUTESCHEMA_DOC_CONTACT` | unset | `info.contact.email` |
//! | `ROUTESCHEMA_DOC_LICENSE` | unset | `info.license.name` |
//! | `ROUTESCHEMA_DOC_OUTPUT` | unset | file written after generation |
//! | `ROUTESCHEMA_DOC_COLLISIONS` | `reuse` | `reuse` or `reject` |
//!
//! ## Naming collisions
//!
//! Two different record shapes can synthesize the same schema name (same
//! parent and field name, different fields). With [`CollisionPolicy::Reuse`]
//! the first node stays in the table and later references point at it, with
//! a warning logged. With [`CollisionPolicy::Reject`] generation fails with
//! [`crate::openapi::DocumentError::NameCollision`].
//!
//! ```rust
//! use routeschema::config::{CollisionPolicy, DocumentConfig};
//!
//! let config = DocumentConfig::new("Pet Store", "2.0.0")
//!     .collisions(CollisionPolicy::Reject);
//! assert_eq!(config.title, "Pet Store");
//! ```

use std::env;
use std::path::PathBuf;
use std::str::FromStr;

/// What the generator does when one name is claimed by two shapes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CollisionPolicy {
    /// Keep the first node, log a warning
    #[default]
    Reuse,
    /// Fail generation
    Reject,
}

impl FromStr for CollisionPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "reuse" => Ok(CollisionPolicy::Reuse),
            "reject" | "error" => Ok(CollisionPolicy::Reject),
            other => Err(format!("unknown collision policy '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentConfig {
    pub title: String,
    pub description: Option<String>,
    pub version: String,
    /// Contact email
    pub contact: Option<String>,
    /// License name
    pub license: Option<String>,
    pub output_file: Option<PathBuf>,
    pub collisions: CollisionPolicy,
}

impl Default for DocumentConfig {
    fn default() -> Self {
        Self::new("API", "1.0.0")
    }
}

impl DocumentConfig {
    pub fn new(title: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: None,
            version: version.into(),
            contact: None,
            license: None,
            output_file: None,
            collisions: CollisionPolicy::Reuse,
        }
    }

    pub fn from_env() -> Self {
        let var = |name: &str| env::var(name).ok().filter(|v| !v.trim().is_empty());
        let defaults = Self::default();
        Self {
            title: var("ROUTESCHEMA_DOC_TITLE").unwrap_or(defaults.title),
            description: var("ROUTESCHEMA_DOC_DESCRIPTION"),
            version: var("ROUTESCHEMA_DOC_VERSION").unwrap_or(defaults.version),
            contact: var("ROUTESCHEMA_DOC_CONTACT"),
            license: var("ROUTESCHEMA_DOC_LICENSE"),
            output_file: var("ROUTESCHEMA_DOC_OUTPUT").map(PathBuf::from),
            collisions: var("ROUTESCHEMA_DOC_COLLISIONS")
                .and_then(|v| v.parse().ok())
                .unwrap_or_default(),
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn contact(mut self, email: impl Into<String>) -> Self {
        self.contact = Some(email.into());
        self
    }

    pub fn license(mut self, name: impl Into<String>) -> Self {
        self.license = Some(name.into());
        self
    }

    pub fn output_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_file = Some(path.into());
        self
    }

    pub fn collisions(mut self, policy: CollisionPolicy) -> Self {
        self.collisions = policy;
        self
    }
}
