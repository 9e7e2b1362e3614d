pub mod app;
pub mod cli;
pub mod command;
pub mod config;
pub mod controller;
pub mod diff;
pub mod error;
pub mod executor;
pub mod git;
pub mod labels;
pub mod main_lib;
pub mod model;
pub mod navigator;
pub mod provider;
pub mod reconcile;
pub mod screenshot;
pub mod snapshot;
pub mod tree;
pub mod ui;
pub mod view;
