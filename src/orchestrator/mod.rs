//! Application-level orchestration.
//!
//! This module owns the workflow state and every asynchronous step that feeds it
//! (decode, submission, download). UI and CLI layers only send commands and
//! render the events that come back.

mod controller;
mod download;

pub(crate) use controller::{run_controller, UiCommand};
pub(crate) use download::default_download_dir;
