pub mod config;
pub mod git;
pub mod handler;
pub mod index;
pub mod notify;
pub mod pipeline;
pub mod process;
pub mod publish;
pub mod secrets;
