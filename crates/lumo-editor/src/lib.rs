pub mod history;
pub mod store;

pub use history::History;
pub use store::{GraphStore, StoreConfig, StoreSnapshot};
