use crate::id::EntityId;

pub type CanvasResult<T> = Result<T, CanvasError>;

/// Failures surfaced to the host. None of them leave the document half-mutated.
#[derive(thiserror::Error, Debug)]
pub enum CanvasError {
    #[error("malformed payload: {0}")]
    MalformedPayload(String),

    #[error("unknown entity {0}")]
    UnknownEntity(EntityId),

    #[error("{child} cannot be placed inside {parent}")]
    InvalidParent { child: String, parent: EntityId },

    #[error("entity {0} has immutable geometry")]
    ImmutableGeometry(EntityId),

    #[error("invalid config: {0}")]
    InvalidConfig(String),
}

impl CanvasError {
    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::MalformedPayload(msg.into())
    }

    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }
}

impl From<serde_json::Error> for CanvasError {
    fn from(e: serde_json::Error) -> Self {
        Self::MalformedPayload(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_prefixes_are_stable() {
        assert!(
            CanvasError::malformed("x")
                .to_string()
                .starts_with("malformed payload:")
        );
        assert!(
            CanvasError::invalid_config("x")
                .to_string()
                .starts_with("invalid config:")
        );
        let id = EntityId::intern("ghost");
        assert_eq!(
            CanvasError::UnknownEntity(id).to_string(),
            "unknown entity ghost"
        );
    }

    #[test]
    fn json_errors_become_malformed_payloads() {
        let err: CanvasError = serde_json::from_str::<serde_json::Value>("{")
            .unwrap_err()
            .into();
        assert!(matches!(err, CanvasError::MalformedPayload(_)));
    }
}
