// Project layout: script path resolution and the Dockerfiles folder.

mod dockerfiles;
mod paths;

pub use dockerfiles::{
    DOCKERFILE_SUFFIX, DOCKERFILES_DIR, ImageRef, dockerfiles_dir, filter_dockerfiles, image_tag,
    list_dockerfiles, repository_name, resolve_image,
};
pub use paths::{ExecTarget, absolutize, exec_target, module_path, relative_path};
