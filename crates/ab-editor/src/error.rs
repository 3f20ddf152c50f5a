use ab_core::{CanvasError, EntityId};

/// Why a gesture could not start (or its commit was refused).
#[derive(thiserror::Error, Debug)]
pub enum GestureError {
    #[error("a gesture on {active} is already in progress")]
    SessionActive { active: EntityId },

    #[error("unknown entity {0}")]
    UnknownEntity(EntityId),

    #[error("entity {0} cannot be resized")]
    NotResizable(EntityId),

    #[error("entity {0} is not placed on a sub-grid")]
    NotGridPlaced(EntityId),

    #[error("entity {0} cannot be dragged")]
    NotDraggable(EntityId),

    #[error(transparent)]
    Document(#[from] CanvasError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_prefixes_are_stable() {
        let id = EntityId::intern("busy_chart");
        assert_eq!(
            GestureError::SessionActive { active: id }.to_string(),
            "a gesture on busy_chart is already in progress"
        );
        let err: GestureError = CanvasError::malformed("bad").into();
        assert_eq!(err.to_string(), "malformed payload: bad");
    }
}
