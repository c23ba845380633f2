pub mod app;
pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod state;
pub mod users;

#[cfg(test)]
pub(crate) mod test_support;
