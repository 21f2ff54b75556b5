//! Client-side helpers for talking to a Hubbub server

pub mod token_store;
pub mod upload;

pub use token_store::{FileTokenStore, MemoryTokenStore, TokenStore};
pub use upload::{UploadClient, UploadError};
