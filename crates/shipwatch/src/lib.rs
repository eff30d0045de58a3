//! shipwatch: trigger a Jenkins build and follow it to the end.
//!
//! The binary asks which repository to build and with which parameters,
//! triggers the Jenkins job, then polls Jenkins and (for repositories whose
//! deploy hands off to AWS CodePipeline) the pipeline execution until both
//! reach a final state.
//!
//! The pieces live in their own crates:
//!
//! - `shipwatch-core`: errors, states, the catalog and the tracking loop
//! - `shipwatch-jenkins`: the Jenkins HTTP adapter
//! - `shipwatch-aws`: the CodePipeline adapter and MFA session refresh
//! - `shipwatch-events`: step progress and its renderers
//!
//! This crate wires them to the command line.

pub mod cli;
pub mod commands;
pub mod prompt;
pub mod tracing;
