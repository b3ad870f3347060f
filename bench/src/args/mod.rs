pub mod common;
pub mod connections;
pub mod defaults;
pub mod output;
