pub mod mapping;
pub mod session;
pub mod settings;
