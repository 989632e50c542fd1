// Shared error type used across the application

pub mod error;
