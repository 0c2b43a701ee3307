pub mod fifo;
pub mod ordered;

pub use fifo::BoundedFifoBuffer;
pub use ordered::{Comparator, OrderedWindowCache, ascending, descending};
