pub mod backend;
pub mod keys;
pub mod manager;
