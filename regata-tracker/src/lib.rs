pub mod broadcast;
pub mod config;
pub mod error;
pub mod gps;
pub mod metrics;
pub mod pipeline;
pub mod source;
pub mod store;

pub use broadcast::*;
pub use config::*;
pub use error::*;
pub use gps::*;
pub use metrics::*;
pub use pipeline::*;
pub use source::*;
pub use store::*;
