// Core domain: models, errors, payload codec

pub mod crypto;
pub mod errors;
pub mod models;
pub mod payload;
