//! Hirely background worker: runs the auto-confirm sweep on a timer.

pub mod config;
