//! # Repository Layer
//!
//! One repository per aggregate, all bound to the shared pool.
//!
//! Writes that touch stock never happen here - order and sale inserts,
//! together with the stock decrements, live in [`crate::checkout`] so
//! the whole commit is one atomic unit.

pub mod attendance;
pub mod order;
pub mod product;
pub mod sale;
