//! Core of the slidegist markdown presenter: slide segmentation and
//! rendering, the client ownership token, the gist gateway, local drafts and
//! the presentation session.
pub mod config;
pub mod gist;
pub mod ownership;
pub mod session;
pub mod slides;
pub mod storage;
pub mod types;
