pub mod cli;
pub mod config;
pub mod db;
pub mod draft;
pub mod embedding;
pub mod error;
pub mod init;
pub mod models;
pub mod repository;
pub mod services;

pub use error::DramaturgError;
