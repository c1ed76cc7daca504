//! Microlight personal site engine
//!
//! Sends webmentions for posts that reference other pages, and receives,
//! verifies and stores webmentions about this site's posts.

pub mod config;
pub mod db;
pub mod web;
pub mod webmention;
