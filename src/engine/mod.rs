//! Core engine — the balance → bet → settle → pause loop.

pub mod accountant;
pub mod session;
