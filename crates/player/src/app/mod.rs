mod bootstrap;
mod demo_engine;
mod demo_media;
mod host;
mod loop_runner;

pub(crate) use bootstrap::{build_app, BootstrapError};
pub(crate) use loop_runner::run;
