pub mod error;
pub mod fix;
pub mod packet;

pub use error::*;
pub use fix::*;
pub use packet::*;
