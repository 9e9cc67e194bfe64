//! Script source model: which folders exist, the policy each one runs
//! under, and the scripts found in them.

mod layout;
mod source;

pub use layout::{FolderLayout, MigrationsFolder};
pub use source::{DiskScripts, MemoryScripts, ScriptSource};
