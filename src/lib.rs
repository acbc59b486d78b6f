//! # lbsim
//!
//! Discrete-time simulation of a dispatcher that spreads synthetic network
//! requests over a fixed pool of workers in round-robin order, against a
//! hard cycle horizon.
//!
//! The [`dispatcher::Dispatcher`] runs the loop; [`worker::Worker`] applies
//! the admission deadline and records events; [`report`] merges the logs and
//! derives the finished/rejected counts.

pub mod config;
pub mod dispatcher;
pub mod error;
pub mod event;
pub mod generator;
pub mod model;
pub mod queue;
pub mod report;
pub mod telemetry;
pub mod worker;
