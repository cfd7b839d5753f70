//! # DoodhDaily Backend
//!
//! Domain services and persistence for the milk-purchase tracker: a
//! sqlite-backed key/value store, the calendar grid renderer, the cost
//! calculator, the holiday cache and the daily reminder scheduler, plus
//! the axum REST surface that binds them together.

pub mod db;
pub mod domain;
pub mod rest;
pub mod store;
