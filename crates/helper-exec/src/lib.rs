pub mod contracts;
pub mod dispatcher;
pub mod executor;

pub use contracts::*;
pub use dispatcher::*;
pub use executor::*;
