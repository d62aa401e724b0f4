pub mod feed;
pub mod verdict;

pub use feed::*;
pub use verdict::*;
