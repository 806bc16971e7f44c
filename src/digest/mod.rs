pub mod cache;
pub mod config;
pub mod known_users;
pub mod model;
pub mod paths;
pub mod pipeline;
pub mod stamp;
pub mod stream;
pub mod summary;
pub mod users;
pub mod warn;
