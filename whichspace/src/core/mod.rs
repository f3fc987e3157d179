mod config;
mod resolver;
mod space;

pub use config::*;
pub use resolver::*;
pub use space::*;
