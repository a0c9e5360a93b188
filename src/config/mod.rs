mod loader;
mod types;

pub use loader::{COMMON_KEY, CONFIG_FILE, select};
pub use types::{BuildConfig, BuildSetting, GpuRuntime};
