//! Command handlers, one function per subcommand.

mod entries;
mod init;
mod maintenance;
mod misc;

pub use entries::{
    handle_add, handle_delete, handle_edit, handle_export, handle_list, handle_show,
};
pub use init::handle_init;
pub use maintenance::{handle_backup, handle_check};
pub use misc::handle_completions;
