pub mod app;
pub mod auth;
pub mod candidates;
pub mod client;
pub mod clock;
pub mod config;
pub mod db;
pub mod error;
pub mod extract;
pub mod hr;
pub mod jobs;
pub mod mailer;
pub mod state;
pub mod storage;
