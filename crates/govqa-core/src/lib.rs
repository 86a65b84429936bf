#![deny(warnings)]
#![deny(dead_code)]
#![deny(unused_variables)]
#![deny(unused_imports)]

//! Shared vocabulary of the retrieval core: chunk and result types, the
//! error taxonomy, collaborator traits, settings and curated tables.

pub mod config;
pub mod error;
pub mod settings;
pub mod tables;
pub mod traits;
pub mod types;

pub use error::{Error, Result};
