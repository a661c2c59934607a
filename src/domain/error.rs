// Error taxonomy shared by every layer
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PanelError {
    /// Bad caller input, rejected before anything is persisted
    #[error("{0}")]
    Validation(String),

    #[error("{kind} {id} not found")]
    NotFound { kind: &'static str, id: String },

    /// Document store or query service failure
    #[error("{message}")]
    Upstream { status: Option<u16>, message: String },
}

impl PanelError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn panel_not_found(id: &str) -> Self {
        Self::NotFound {
            kind: "Panel",
            id: id.to_string(),
        }
    }

    pub fn visualization_not_found(id: &str) -> Self {
        Self::NotFound {
            kind: "Visualization",
            id: id.to_string(),
        }
    }

    pub fn upstream(status: Option<u16>, message: impl Into<String>) -> Self {
        Self::Upstream {
            status,
            message: message.into(),
        }
    }
}

pub type PanelResult<T> = Result<T, PanelError>;
