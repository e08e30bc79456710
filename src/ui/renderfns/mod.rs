pub mod header;
pub mod pagination;
pub mod utils;

pub use header::draw_header;
pub use pagination::draw_pagination;
pub use utils::{cell_text, truncate, width_constraint};
