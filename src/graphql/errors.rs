//! Error constructors carrying an `extensions.code`

use async_graphql::{Error, ErrorExtensions};

fn coded(message: impl Into<String>, code: &'static str) -> Error {
    Error::new(message.into()).extend_with(|_, e| e.set("code", code))
}

pub fn unauthorized(message: impl Into<String>) -> Error {
    coded(message, "UNAUTHORIZED")
}

pub fn forbidden(message: impl Into<String>) -> Error {
    coded(message, "FORBIDDEN")
}

pub fn not_found(message: impl Into<String>) -> Error {
    coded(message, "NOT_FOUND")
}

pub fn bad_input(message: impl Into<String>) -> Error {
    coded(message, "BAD_USER_INPUT")
}
