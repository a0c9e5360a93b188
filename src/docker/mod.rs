// Docker command assembly: `docker run` for scripts, `docker build` for images.

pub mod command;
pub mod engine;
pub mod images;

pub use command::RunCommand;
pub use engine::{current_user, ensure_available};
pub use images::{DockerfileSource, ImageBuilder, build_command};
