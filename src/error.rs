//! Result and error types shared by the library and the `maaf` binary.

use crate::newick;
use crate::tree::BuildError;
use std::io;
use std::result;
use thiserror::Error;

/// A result type whose error type is `Error`
pub type Result<T> = result::Result<T, Error>;

/// The errors that can stop a computation before or after the search
#[derive(Debug, Error)]
pub enum Error {

    /// Error from the Newick parser
    #[error("Parse error: {0}")]
    Parse(#[from] newick::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The input does not consist of exactly two trees
    #[error("expected exactly two trees, found {0}")]
    TreeCount(usize),

    /// The two trees have different leaf sets
    #[error("the trees have different leaf sets: {0}")]
    TaxaMismatch(String),

    /// The trees have too few leaves for a meaningful comparison
    #[error("at least two taxa are required, found {0}")]
    TooFewTaxa(usize),

    /// A tree that could not be built
    #[error("invalid tree: {0}")]
    Build(#[from] BuildError),

    /// A worker thread could not be started
    #[error("failed to start worker thread: {0}")]
    Spawn(io::Error),

    /// All workers terminated without deciding the minimum forest size
    #[error("the search terminated without a result")]
    NoResult,
}
