// Remote staging over ssh/scp: project archive, transfer, unpack.

pub mod archive;
pub mod ssh;
pub mod sync;

pub use ssh::{RemoteSpec, SshTarget, remote_join};
pub use sync::{RemoteSync, STAMP_FORMAT, timestamp};
