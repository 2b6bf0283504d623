//! Production scheduling core for an EPS injection-molding factory.
//!
//! Synthesizes mold manufacturing orders from customer demand, schedules
//! them onto machines under a rich constraint set, and splits the result
//! into a gantt-style per-day block layout. Persistence, importers, the
//! HTTP façade and downstream reporting are external collaborators; this
//! crate operates purely on an in-memory snapshot.

pub mod calendar;
pub mod candidate_generator;
pub mod completion;
pub mod constraints;
pub mod demo_data;
pub mod domain;
pub mod dto;
pub mod engine;
pub mod error;
pub mod gap_calculator;
pub mod merger;
pub mod mmo_synthesis;
pub mod selector;
pub mod splitter;
pub mod time_estimator;
pub mod validator;
