use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum ContractError {
    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Access denied: {0}")]
    AccessDenied(String),

    #[error("User {user_id} has already signed contract {contract_id}")]
    AlreadySigned { contract_id: Uuid, user_id: Uuid },

    #[error("User {user_id} is not a party to contract {contract_id}")]
    NotAParty { contract_id: Uuid, user_id: Uuid },

    #[error("Signature invalid: {0}")]
    SignatureInvalid(String),

    #[error("No signature log matches the supplied signature for contract {0}")]
    SignatureNotFound(Uuid),

    #[error("All parties have already signed contract {0}")]
    AllSigned(Uuid),

    #[error("Persistence error: {0}")]
    PersistenceError(String),
}

impl ContractError {
    /// Stable machine-readable code callers can branch on.
    pub fn code(&self) -> &'static str {
        match self {
            ContractError::ValidationError(_) => "VALIDATION_ERROR",
            ContractError::InvalidState(_) => "INVALID_STATE",
            ContractError::NotFound(_) => "NOT_FOUND",
            ContractError::AccessDenied(_) => "ACCESS_DENIED",
            ContractError::AlreadySigned { .. } => "ALREADY_SIGNED",
            ContractError::NotAParty { .. } => "NOT_A_PARTY",
            ContractError::SignatureInvalid(_) => "SIGNATURE_INVALID",
            ContractError::SignatureNotFound(_) => "SIGNATURE_NOT_FOUND",
            ContractError::AllSigned(_) => "ALL_SIGNED",
            ContractError::PersistenceError(_) => "PERSISTENCE_ERROR",
        }
    }

    pub fn contract_not_found(id: Uuid) -> Self {
        ContractError::NotFound(format!("contract {id}"))
    }
}

impl From<Box<dyn std::error::Error + Send + Sync>> for ContractError {
    fn from(err: Box<dyn std::error::Error + Send + Sync>) -> Self {
        ContractError::PersistenceError(err.to_string())
    }
}

impl From<validator::ValidationErrors> for ContractError {
    fn from(errors: validator::ValidationErrors) -> Self {
        ContractError::ValidationError(errors.to_string())
    }
}

pub type ContractResult<T> = Result<T, ContractError>;
