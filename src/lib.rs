//! Synthesizes short straight-line programs from input/output examples.
//!
//! A program is a chain of [SSA] assignments over the function parameters
//! followed by a single `return` ([`program`]). [Monte Carlo Tree Search]
//! ([`search`]) grows a tree of partial programs, completing them at random
//! and scoring the results with an [`evaluation::Evaluator`] to decide which
//! partial program to extend next.
//!
//! [SSA]: https://en.wikipedia.org/wiki/Static_single-assignment_form
//! [Monte Carlo Tree Search]: https://en.wikipedia.org/wiki/Monte_Carlo_tree_search

// TODO: Gradually move most of warnings to deny.
#![warn(missing_docs, variant_size_differences)]
// Rustc lints.
#![warn(
    absolute_paths_not_starting_with_crate,
    keyword_idents,
    macro_use_extern_crate,
    trivial_casts,
    trivial_numeric_casts,
    unreachable_pub,
    unused_extern_crates,
    unused_import_braces,
    unused_lifetimes,
    unused_qualifications,
    unused_results
)]
// Rustdoc lints.
#![warn(
    rustdoc::private_doc_tests,
    rustdoc::missing_crate_level_docs,
    rustdoc::broken_intra_doc_links,
    rustdoc::invalid_codeblock_attributes,
    rustdoc::invalid_html_tags,
    rustdoc::invalid_rust_codeblocks,
    rustdoc::bare_urls
)]
// Clippy lints.
#![warn(
    clippy::correctness,
    clippy::suspicious,
    clippy::style,
    clippy::complexity,
    clippy::pedantic,
    clippy::nursery,
    clippy::cargo
)]
// Search throughput matters.
#![deny(clippy::perf)]

pub mod evaluation;
pub mod program;
pub mod search;

use shadow_rs::shadow;

shadow!(build);

/// Returns the full version that can be used to identify how the binary was
/// built in the first place.
#[must_use]
pub fn version() -> String {
    format!(
        "{} (commit {}, branch {})",
        build::PKG_VERSION,
        build::SHORT_COMMIT,
        build::BRANCH
    )
}

/// Logs the version and build type on startup.
pub fn log_build_info() {
    log::info!("{} {}", build::PROJECT_NAME, version());
    log::debug!("release build: {}", !shadow_rs::is_debug());
    if !shadow_rs::git_clean() {
        log::warn!("built with uncommitted changes");
    }
}
