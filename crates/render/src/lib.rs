//! REST client for the remote scene renderer.
//!
//! Wraps the renderer's `POST /render` endpoint using [`reqwest`] and
//! implements [`framesmith_core::render::Renderer`].

pub mod api;
pub mod config;

pub use api::RenderApi;
pub use config::RendererConfig;
