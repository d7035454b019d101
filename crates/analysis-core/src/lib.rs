pub mod asset_class;
pub mod error;
pub mod traits;
pub mod types;

pub use asset_class::*;
pub use error::*;
pub use traits::*;
pub use types::*;
