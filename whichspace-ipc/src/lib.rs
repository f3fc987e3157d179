pub mod command;

pub use command::{Command, Response, SpaceInfo};
