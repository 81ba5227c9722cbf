pub mod app;
pub mod cli;
pub mod domain;
pub mod infra;
pub mod ui;

use infra::logging::LogTarget;

pub fn init(target: LogTarget) -> anyhow::Result<()> {
    infra::logging::init(target)
}
