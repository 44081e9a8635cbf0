//! Registration flow: draft model and the backend client

pub mod client;
pub mod types;

pub use client::{DraftClient, INIT_DATA_HEADER};
pub use types::{Discipline, Draft, DraftError, DraftResponse, RegistrationMode};
