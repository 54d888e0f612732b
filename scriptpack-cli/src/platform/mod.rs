//! 平台相关的终端输出

mod cli;

pub use cli::{format_order, print_error, write_output};
