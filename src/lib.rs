//! Post-processing for Whisper speech transcripts.
//!
//! Rewrites systematic misrecognitions with an ordered, curated rule table and
//! clears text that Whisper fabricates for screams and grunts.

pub mod app;
pub mod batch;
pub mod cli;
pub mod config;
pub mod global;
pub mod normalizer;
pub mod rules;
pub mod transcript;
pub mod validator;
