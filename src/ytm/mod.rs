//! YouTube Music (InnerTube) browsing.
//!
//! Raw responses flow `api` -> `renderers` (typed, lenient decode) ->
//! `normalize` (one node to one item) -> `pages` (sections, continuations).

pub mod api;
pub mod auth;
pub mod models;
pub mod normalize;
pub mod pages;
pub mod renderers;
