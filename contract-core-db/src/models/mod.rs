pub mod amendment;
pub mod contract;
pub mod party;
pub mod signature_log;

pub use amendment::*;
pub use contract::*;
pub use party::*;
pub use signature_log::*;

use uuid::Uuid;

/// Entities addressed by a UUID primary key.
pub trait Identifiable {
    fn get_id(&self) -> Uuid;
}
