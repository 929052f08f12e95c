//! Core library for readmegen
//!
//! This crate implements the **Functional Core** of the readmegen gateway,
//! following the Functional Core - Imperative Shell architectural pattern.
//!
//! - **`readmegen_core`** (this crate): pure transformation and decision
//!   functions with zero network I/O
//! - **`readmegen`**: the HTTP gateway binary (the Imperative Shell)
//!
//! All request validation, prompt construction, stream-event encoding, and
//! admission-control arithmetic lives here so it can be tested with fixture
//! data and no mocking. The shell crate owns sockets, HTTP clients, and task
//! spawning.
//!
//! # Module Organization
//!
//! - [`request`]: the inbound generation request and its validation rules
//! - [`prompt`]: system instruction and user prompt construction
//! - [`event`]: stream events and model-output cleanup
//! - [`ratelimit`]: the shared token bucket used for admission control
//! - [`template`]: format-template locator rewriting

pub mod event;
pub mod prompt;
pub mod ratelimit;
pub mod request;
pub mod template;
