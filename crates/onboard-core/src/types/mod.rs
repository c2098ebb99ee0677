mod endpoint_app;
mod list;

pub use endpoint_app::*;
pub use list::*;
