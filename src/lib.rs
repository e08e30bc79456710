//! A paginated data grid over remote list APIs.
//!
//! The [`grid`] module holds the engine: a bounded page cache, the paginator that
//! keeps it filled, and the mutation callbacks that keep it coherent after writes
//! made elsewhere. Output is produced by an injected [`grid::Renderer`], and page
//! requests go through an injected [`transport::Transport`].

pub mod grid;
pub mod transport;

pub use grid::{Grid, GridHandle, GridOptions, Record};
