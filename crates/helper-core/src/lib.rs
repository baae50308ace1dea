pub mod actions;
pub mod config;
pub mod error;
pub mod extract;
pub mod gate;
pub mod persistence;
pub mod reducer;
pub mod registry;
pub mod responder;
pub mod session;
pub mod settings;
pub mod state;
pub mod terminal;

pub use actions::*;
pub use config::*;
pub use error::*;
pub use reducer::*;
pub use state::*;

pub use persistence::*;
