mod skylight;
mod status_item;
mod workspace;

pub use skylight::*;
pub use status_item::*;
pub use workspace::*;
