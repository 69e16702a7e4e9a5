pub mod market;
pub mod record;
pub mod snapshot;

pub use market::*;
pub use record::*;
pub use snapshot::*;
