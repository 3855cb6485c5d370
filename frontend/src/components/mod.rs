pub mod chat;
pub mod settings;
