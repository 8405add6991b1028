mod config;
mod error;
mod events;
mod store;

pub use config::FirebaseConfig;
pub use error::{FirebaseError, FirebaseResult};
pub use store::FirebaseGameStore;
