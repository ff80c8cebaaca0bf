pub mod commands;
pub mod run;
