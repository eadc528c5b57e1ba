//! Backend bridge: command queue, worker runtime, timers, and download sink.

pub mod commands;
pub mod download;
pub mod runtime;
pub mod timers;
