use crate::config::Config;
use crate::engine::Context;
use crate::errors::Result;

/// A unit of work driven by its merged configuration scope.
///
/// Handlers are created fresh for every step by the [`HandlerRegistry`](crate::handlers::HandlerRegistry),
/// so construction must be cheap and free of side effects. `run` returns the
/// output parameters to publish on the running pipeline, if any.
pub trait Handler {
    fn run(&self, ctx: &mut Context, config: &Config) -> Result<Option<Config>>;

    fn name(&self) -> &'static str;
}
