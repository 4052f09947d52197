pub mod period;
pub mod settings;
pub mod summary;
pub mod transaction;
