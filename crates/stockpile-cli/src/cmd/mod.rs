pub mod completions;
pub mod dashboard;
pub mod init;
pub mod lookup;
pub mod project;
pub mod recipe;
pub mod status;
pub mod stock;
pub mod wipe;
