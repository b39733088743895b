//! On-disk form of the BIR.
//!
//! ```json
//! {"format": "bir", "version": 1, "root": { ... }}
//! ```
//!
//! Readers ignore unknown keys and default missing optional ones.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{Bir, Namespace};

pub const FORMAT: &str = "bir";
pub const VERSION: u32 = 1;

#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("malformed BIR document: {0}")]
    Json(#[from] serde_json::Error),

    #[error("not a BIR document (format `{0}`)")]
    WrongFormat(String),

    #[error("unsupported BIR version {found} (this reader understands {})", VERSION)]
    UnsupportedVersion { found: u32 },
}

/// The versioned envelope around a [`Bir`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BirDocument {
    pub format: String,
    pub version: u32,
    #[serde(default)]
    pub root: Namespace,
}

impl BirDocument {
    pub fn new(bir: &Bir) -> Self {
        BirDocument {
            format: FORMAT.to_string(),
            version: VERSION,
            root: bir.root.clone(),
        }
    }

    pub fn into_bir(self) -> Bir {
        Bir { root: self.root }
    }

    /// Serialize `bir` as a pretty-printed JSON document.
    pub fn to_json(bir: &Bir) -> Result<String, DocumentError> {
        Ok(serde_json::to_string_pretty(&BirDocument::new(bir))?)
    }

    /// Parse a JSON document, checking its format and version.
    pub fn from_json(text: &str) -> Result<Bir, DocumentError> {
        let doc: BirDocument = serde_json::from_str(text)?;
        if doc.format != FORMAT {
            return Err(DocumentError::WrongFormat(doc.format));
        }
        if doc.version != VERSION {
            return Err(DocumentError::UnsupportedVersion { found: doc.version });
        }
        Ok(doc.into_bir())
    }
}
