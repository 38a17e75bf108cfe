pub mod add;
pub mod common;
pub mod completions;
pub mod delete;
pub mod edit;
pub mod encrypt;
pub mod key;
pub mod list;
pub mod location;
pub mod move_cmd;
pub mod settings;
pub mod show;
