//! Tiered configuration.
//!
//! Configuration is merged field-by-field from:
//! 1. **Defaults** - `Config::default()`
//! 2. **Project** - `$CWD/task-board/config.yaml`
//! 3. **User** - `~/.task-board/config.yaml`
//! 4. **Environment** - variables below
//!
//! ## Environment Variables
//! - `TASK_BOARD_CONFIG_PATH` - Explicit config file (skips the file tiers)
//! - `TASK_BOARD_PROJECT_DIR` - Project config dir (default: `./task-board`)
//! - `TASK_BOARD_USER_DIR` - User config dir (default: `~/.task-board`)
//! - `TASK_BOARD_DB_PATH` - Database path
//! - `TASK_BOARD_BIND` - HTTP bind address
//! - `TASK_BOARD_PORT` - HTTP port

mod loader;
mod merge;
mod types;

pub use loader::{ConfigLoader, ConfigPaths, ConfigTier};
pub use merge::{merge_into, merge_tiers};
pub use types::*;
