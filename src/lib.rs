pub mod annotate;
pub mod error;
pub mod locate;
pub mod model;
pub mod propagate;
pub mod save;
pub mod session;
pub mod store;
pub mod target;
