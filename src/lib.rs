//! Matrícula Assist: enrollment and FAQ chat bot with its enrollment backend.

pub mod backend;
pub mod channels;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod faq;
pub mod flow;
pub mod logging;
pub mod store;
pub mod submitter;
