use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::models::SourceKind;

#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("no customers found in the imported file")]
    EmptyImport,

    #[error("waybill number not found: {code}")]
    CodeNotFound { code: String },

    #[error("{kind} scanner unavailable: {reason}")]
    SourceUnavailable { kind: SourceKind, reason: String },

    #[error("cannot read spreadsheet {}: {reason}", .path.display())]
    Sheet { path: PathBuf, reason: String },

    #[error("scan input failed: {0}")]
    Io(#[from] io::Error),
}

impl DeliveryError {
    /// Kinds that are reported to the courier and then carried on from.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::EmptyImport | Self::CodeNotFound { .. } | Self::SourceUnavailable { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, DeliveryError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recoverable_kinds() {
        assert!(DeliveryError::EmptyImport.is_recoverable());
        assert!(DeliveryError::CodeNotFound { code: "zzz".into() }.is_recoverable());
        assert!(DeliveryError::SourceUnavailable {
            kind: SourceKind::Camera,
            reason: "no device".into(),
        }
        .is_recoverable());
        assert!(!DeliveryError::Io(io::Error::other("closed")).is_recoverable());
    }

    #[test]
    fn messages_name_the_code_and_source() {
        let err = DeliveryError::CodeNotFound { code: "zzz".into() };
        assert_eq!(err.to_string(), "waybill number not found: zzz");

        let err = DeliveryError::SourceUnavailable {
            kind: SourceKind::Camera,
            reason: "permission denied".into(),
        };
        assert_eq!(err.to_string(), "camera scanner unavailable: permission denied");
    }
}
