//! Upstream pipelines
//!
//! A pipeline is the deterministic computation whose output is cached. It
//! exposes two things:
//!
//! - `definition()`: a stable serialization of what it computes, hashed into
//!   the run fingerprint
//! - `elements()`: a fresh pull-based sequence of its output, restartable by
//!   calling it again
//!
//! The snapshot never calls `elements()` when replaying a finished run.

use std::convert::Infallible;
use stratacache_core::BoxError;

/// Deterministic source of elements
pub trait Pipeline {
    /// Element type
    type Item;

    /// Error produced by the source
    type Error: Into<BoxError>;

    /// Sequence of elements for one run
    type Elements: Iterator<Item = Result<Self::Item, Self::Error>>;

    /// Stable description of the computation
    ///
    /// Two pipelines with equal definitions must produce equal sequences.
    fn definition(&self) -> Vec<u8>;

    /// Start a fresh pass over the elements
    fn elements(&self) -> Self::Elements;
}

/// Pipeline built from a definition string and a fallible closure
pub struct FnPipeline<F> {
    definition: Vec<u8>,
    source: F,
}

impl<F, I, T, E> FnPipeline<F>
where
    F: Fn() -> I,
    I: IntoIterator<Item = Result<T, E>>,
    E: Into<BoxError>,
{
    /// Create a pipeline
    pub fn new(definition: impl Into<Vec<u8>>, source: F) -> Self {
        FnPipeline {
            definition: definition.into(),
            source,
        }
    }
}

impl<F, I, T, E> Pipeline for FnPipeline<F>
where
    F: Fn() -> I,
    I: IntoIterator<Item = Result<T, E>>,
    E: Into<BoxError>,
{
    type Item = T;
    type Error = E;
    type Elements = I::IntoIter;

    fn definition(&self) -> Vec<u8> {
        self.definition.clone()
    }

    fn elements(&self) -> Self::Elements {
        (self.source)().into_iter()
    }
}

/// Pipeline built from a definition string and an infallible closure
pub struct IterPipeline<F> {
    definition: Vec<u8>,
    source: F,
}

impl<F, I> IterPipeline<F>
where
    F: Fn() -> I,
    I: IntoIterator,
{
    /// Create a pipeline
    pub fn new(definition: impl Into<Vec<u8>>, source: F) -> Self {
        IterPipeline {
            definition: definition.into(),
            source,
        }
    }
}

impl<F, I> Pipeline for IterPipeline<F>
where
    F: Fn() -> I,
    I: IntoIterator,
{
    type Item = I::Item;
    type Error = Infallible;
    type Elements = std::iter::Map<I::IntoIter, fn(I::Item) -> Result<I::Item, Infallible>>;

    fn definition(&self) -> Vec<u8> {
        self.definition.clone()
    }

    fn elements(&self) -> Self::Elements {
        (self.source)().into_iter().map(Ok as fn(I::Item) -> Result<I::Item, Infallible>)
    }
}
