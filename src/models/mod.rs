// src/models/mod.rs

pub mod catalog;
pub mod quiz_set;
pub mod session;
