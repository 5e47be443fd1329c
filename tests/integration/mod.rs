//! Integration tests for the content package manager

mod access_control;
mod batching;
mod config_integration;
mod dependencies;
mod directory_archive;
mod filter_properties;
mod filter_scoping;
mod id_conflicts;
mod merge_modes;
mod package_manager;
