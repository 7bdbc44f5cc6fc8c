pub mod cache;
pub mod catalog;
pub mod config;
pub mod error;
pub mod models;
pub mod output;
pub mod page;
pub mod remote;
pub mod search;
pub mod sync;
