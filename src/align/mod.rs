//! Fuzzy alignment primitives.
//!
//! - [`edit_distance`]: infix and global Levenshtein alignment with an
//!   optional character equivalence relation
//! - [`search`]: the windowed hill-climb that locates one unit after the
//!   cursor
//! - [`noise`]: excision of unconfirmed insertion runs from a global trace
//!
//! All functions operate on `char` slices that have already been passed
//! through a comparison lens, so indices line up with the glyph characters
//! they were built from.

pub mod edit_distance;
pub mod noise;
pub mod search;

pub use edit_distance::{align, similarity, AlignMode, Alignment, EditOp};
pub use search::{search, AlignmentResult, AlignmentWindow, SearchOutcome};
