//! Error types for presentation resolution.

use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while resolving a presentation into slide views.
///
/// Only structural failures live here. Optional resources (images, hyperlink
/// targets, bullet fonts) that cannot be found degrade to their documented
/// defaults and are never reported through this type.
#[derive(Error, Debug)]
pub enum Error {
    /// Failed to open or read the input file.
    #[error("Failed to read file: {0}")]
    IoError(#[from] std::io::Error),

    /// ZIP archive error.
    #[error("ZIP error: {0}")]
    ZipError(String),

    /// A package part is not well-formed XML.
    #[error("XML parsing error in '{part}' at byte {position}: {message}")]
    ParseError {
        part: String,
        position: usize,
        message: String,
    },

    /// A link of the slide -> layout -> master chain cannot be located.
    #[error("Missing required {link} part: {path}")]
    MissingRequiredPart { link: ChainLink, path: String },

    /// The presentation has no theme; every color lookup depends on it.
    #[error("Presentation theme could not be located")]
    MissingTheme,

    /// The presentation part itself is absent or unusable.
    #[error("Invalid presentation: {0}")]
    InvalidPresentation(String),
}

/// A required link of the part chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChainLink {
    Slide,
    Layout,
    Master,
    Theme,
}

impl std::fmt::Display for ChainLink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ChainLink::Slide => "slide",
            ChainLink::Layout => "slide layout",
            ChainLink::Master => "slide master",
            ChainLink::Theme => "theme",
        };
        f.write_str(name)
    }
}

impl Error {
    /// Create a missing chain-link error.
    pub fn missing(link: ChainLink, path: impl Into<String>) -> Self {
        Self::MissingRequiredPart {
            link,
            path: path.into(),
        }
    }

    /// Whether this error must abort the whole document rather than one slide.
    pub fn is_fatal_for_document(&self) -> bool {
        matches!(
            self,
            Self::MissingTheme
                | Self::InvalidPresentation(_)
                | Self::ZipError(_)
                | Self::IoError(_)
                | Self::MissingRequiredPart {
                    link: ChainLink::Theme,
                    ..
                }
        )
    }
}
