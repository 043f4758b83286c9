//! result-writer: asynchronous result sink backed by a dedicated writer thread
//!
//! Producers submit integer results from any thread; a single background
//! worker drains them in FIFO order into a pluggable [`sink::ResultSink`].

pub mod common;
pub mod config;
pub mod lifecycle;
pub mod queue;
pub mod sink;
pub mod worker;
