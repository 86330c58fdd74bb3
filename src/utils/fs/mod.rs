//! File system helpers used by the backup planner, the file syncer and the
//! add-on updater.

pub mod dirs;
pub mod perms;

pub use dirs::{
    copy_dir, copy_file, ensure_dir, ensure_parent_dir, holds_files, list_subdirs, remove_dir_all,
};
pub use perms::set_mode;
