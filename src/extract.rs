//! The extraction pipeline, from a project source to a verified [`Guide`].

use std::time::Instant;

use tracing::{error, info, info_span};

use crate::config::ExtractionConfig;
use crate::error::IResult;
use crate::guide::arsenals::build_arsenals;
use crate::guide::assemble::{Resolved, assemble};
use crate::guide::resolve::ExtractionContext;
use crate::guide::shops::merge_shops;
use crate::guide::types::Guide;
use crate::resources::{ResourceSource, load_resources};

/// Runs one pipeline stage inside its own span, logging when it starts,
/// how long it took, or why it failed.
fn stage<T>(name: &'static str, run: impl FnOnce() -> IResult<T>) -> IResult<T> {
    info_span!("stage", stage = name).in_scope(|| {
        let start = Instant::now();
        info!("started");
        let result = run();
        match &result {
            Ok(_) => info!(elapsed_ms = start.elapsed().as_millis() as u64, "finished"),
            Err(e) => error!(error = %e, "failed"),
        }
        result
    })
}

/// Loads, links and assembles the whole guide. Any error aborts the run and
/// nothing is returned; the dataset is only usable when every reference in
/// it resolves.
pub fn extract_guide(source: &dyn ResourceSource, config: &ExtractionConfig) -> IResult<Guide> {
    let resources = stage("load", || load_resources(source))?;
    let ctx = stage("index", || ExtractionContext::new(resources, config))?;

    let entities = stage("resolve", || {
        Ok(Resolved {
            skills: ctx.resolve_skills(),
            items: ctx.resolve_items()?,
            classes: ctx.resolve_classes()?,
            units: ctx.resolve_units()?,
            ..Default::default()
        })
    })?;
    let shops = stage("shops", || merge_shops(&ctx))?;
    let arsenals = stage("arsenals", || build_arsenals(&ctx, &entities.items))?;

    let guide = stage("assemble", || {
        Ok(assemble(
            &ctx,
            Resolved {
                shops,
                arsenals,
                ..entities
            },
        ))
    })?;
    stage("verify", || guide.verify_links())?;

    for (kind, count) in guide.counts() {
        info!(%kind, count, "extracted");
    }
    Ok(guide)
}
