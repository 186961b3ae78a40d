//! Record mutation
//!
//! Listeners that change the records of each batch in the record store
//! instead of exporting them: collection membership, permissions and
//! deletion.

pub mod listener;

pub use listener::{Mutation, MutationListener};
