pub mod common_enums;
pub mod events;
pub mod requests;
pub mod signing;

pub use common_enums::*;
pub use events::*;
pub use requests::*;
pub use signing::*;
