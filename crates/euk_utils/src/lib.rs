pub mod color;
pub mod utils;
