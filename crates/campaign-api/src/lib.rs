pub mod auth;
pub mod config;
pub mod database;
pub mod domain;
pub mod handlers;
pub mod logging;
pub mod repositories;
pub mod router;
pub mod services;
pub mod state;
pub mod utils;

#[cfg(test)]
mod test;
