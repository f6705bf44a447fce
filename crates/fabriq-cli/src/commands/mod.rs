pub mod apply;
pub mod plan;
pub mod reset;
pub mod resources;
pub mod unlink;
