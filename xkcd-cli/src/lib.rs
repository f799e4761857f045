// ABOUTME: Library exports for the xkcd viewer modules for testing and the binary
// ABOUTME: Makes internal modules available to integration tests

pub mod archive;
pub mod cache;
pub mod cli;
pub mod config;
pub mod constants;
pub mod display;
pub mod picker;
pub mod show;
