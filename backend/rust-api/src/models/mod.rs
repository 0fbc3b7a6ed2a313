pub mod snapshot;
pub mod tutor;

pub use snapshot::*;
pub use tutor::*;
