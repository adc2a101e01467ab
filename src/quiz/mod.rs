// src/quiz/mod.rs

pub mod driver;
pub mod observer;
pub mod sampler;
pub mod session;
