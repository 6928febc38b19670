use std::fmt;
use thiserror::Error;

pub type Result<T, N> = std::result::Result<T, CycleError<N>>;

/// A dependency cycle with no node the policy allows to sacrifice.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Dependency cycle cannot be broken between: {}", join(.members))]
pub struct CycleError<T>
where
    T: fmt::Display + fmt::Debug,
{
    /// Members of the irreducible cycle, in insertion order
    pub members: Vec<T>,
}

fn join<T: fmt::Display>(members: &[T]) -> String {
    members
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}
