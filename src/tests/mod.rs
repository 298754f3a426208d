pub(crate) mod common;
mod resources;
