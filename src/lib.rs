//! A library for verifying [Metamath](http://us.metamath.org/#faq)
//! databases.  The entry point is [`Database`] in the `database` module: feed
//! it the name of a database (plus any injected sources) and it makes one
//! linear pass over the tokens, checking every declaration and mechanically
//! verifying every proof as it goes.

// rust lints we want
#![warn(
    bare_trait_objects,
    elided_lifetimes_in_paths,
    missing_docs,
    missing_copy_implementations,
    missing_debug_implementations,
    future_incompatible,
    rust_2018_idioms,
    trivial_numeric_casts,
    variant_size_differences,
    unreachable_pub,
    unused
)]
// all the clippy
#![warn(clippy::all, clippy::pedantic)]
// all the clippy lints we don't want
#![allow(
    clippy::enum_glob_use,
    clippy::if_not_else,
    clippy::missing_errors_doc,
    clippy::module_name_repetitions,
    clippy::option_if_let_else,
    clippy::redundant_pub_crate,
    clippy::too_many_lines
)]

mod scope;
mod util;
mod verify;

pub mod database;
pub mod diag;
pub mod parser;
pub mod statement;

#[cfg(test)]
mod parser_tests;

pub use database::Database;
pub use diag::Diagnostic;
pub use statement::{as_str, Token};
