//! Network-facing lookups for a single URL
//!
//! This module handles:
//! - Building the browser-like HTTP client
//! - Resolving redirects to the final destination
//! - Extracting page titles through an external page dumper

mod client;
mod redirect;
mod title;

pub use client::{build_api_client, build_http_client, MAX_REDIRECTS};
pub use redirect::{is_auth_url, unwrap_youtube_redirect, RedirectResolver, UrlResolver};
pub use title::{
    parse_title, LynxDumper, PageDumper, PageTitle, TitleError, TitleExtractor,
    NO_TITLE_SENTINEL,
};
