// File-backed sources: region table and per-region credentials

pub mod credential_store;
pub mod region_table;
