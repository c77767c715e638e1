//! The check run: wire the adapters, run the pipeline, report the verdict.

use tracing::{debug, instrument};

use chartcheck_adapters::{DirectoryBundleLoader, SimpleRenderer};
use chartcheck_core::application::CheckService;

use crate::{cli::CheckArgs, config::AppConfig, error::CliResult, output::OutputManager};

/// Execute a check with the given flags and configuration.
#[instrument(skip_all)]
pub fn execute(args: CheckArgs, config: AppConfig, output: &OutputManager) -> CliResult<()> {
    let service = build_service(&config);
    let request = args.into_request(&config);
    debug!(?request, "check request");

    let verdict = service.check(&request)?;
    output.verdict(&request, &verdict)?;
    Ok(())
}

fn build_service(config: &AppConfig) -> CheckService {
    let loader = match config.charts_dir() {
        Some(root) => DirectoryBundleLoader::new().with_search_root(root),
        None => DirectoryBundleLoader::new(),
    };
    CheckService::new(Box::new(loader), Box::new(SimpleRenderer::new()))
}
