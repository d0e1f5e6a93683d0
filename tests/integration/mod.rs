//! Integration tests for treesync

mod cache_behavior;
mod cli;
mod failure_propagation;
