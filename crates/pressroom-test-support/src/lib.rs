#![forbid(unsafe_code)]
#![deny(
    unused_must_use,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]

//! Shared test helpers used across Pressroom suites.
//! Layout: fixtures.rs (zip archives, trigger events, fake generators), mocks.rs (recording
//! storage and reporter).

pub mod fixtures;
pub mod mocks;
