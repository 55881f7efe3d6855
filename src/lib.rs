pub mod catalog;
pub mod config;
pub mod db;
pub mod errors;
pub mod gateway;
pub mod handlers;
pub mod models;
pub mod services;
pub mod state;
