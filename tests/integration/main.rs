//! Integration tests for the reactive endpoint layer

mod flag_lifecycle;
mod merged_views;
mod publish_lifecycle;
mod support;
