pub mod dependencies;
pub mod error;
pub mod levels;
pub mod load;
pub mod types;

pub use dependencies::*;
pub use error::*;
pub use levels::*;
pub use load::*;
pub use types::*;
