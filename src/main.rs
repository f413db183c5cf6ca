use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use anyhow::Context;
use chairside_casegen::{GenerationLifecycle, GeneratorConfig, HttpGenerator, SectionKind};
use chairside_core::{
    aggregate_visits, CaseStudyRequest, EngineConfig, Selection, SelectionAction, TreatmentJourney,
};
use chairside_records::RecordFeed;

/// Main entry point for the Chairside runner
///
/// Loads one patient's clinical-record feed from a JSON file, aggregates it
/// into a per-tooth treatment journey, and logs the group summaries. If a
/// generator endpoint is configured, it then selects the full journey, builds
/// a case-study request, and drives one generation round end to end,
/// printing the narrative and the session cost ledger.
///
/// # Environment Variables
/// - `CHAIRSIDE_FEED`: Path to the record feed JSON (default: "feed.json")
/// - `CHAIRSIDE_TITLE`: Optional case-study title
/// - `CASEGEN_BASE_URL`: Generator service base URL; generation is skipped when unset
/// - `CASEGEN_API_KEY`: Optional bearer token for the generator service
///
/// # Returns
/// * `Ok(())` - If the journey was built (and any generation round completed)
/// * `Err(anyhow::Error)` - If the feed cannot be read or decoded, or startup fails
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("chairside=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let feed_path = std::env::var("CHAIRSIDE_FEED").unwrap_or_else(|_| "feed.json".into());
    let json = std::fs::read_to_string(&feed_path)
        .with_context(|| format!("reading record feed from {feed_path}"))?;
    let feed = RecordFeed::from_json(&json).context("decoding record feed")?;

    let config = EngineConfig::default();
    let visits = aggregate_visits(&feed, &config);
    tracing::info!(patient = %feed.patient, visits = visits.len(), "++ aggregated visits");

    let journey = TreatmentJourney::build(feed.patient, visits);
    for group in journey.groups() {
        let summary = group.summary();
        tracing::info!(
            tooth = %summary.tooth,
            visits = summary.visit_count,
            from = %summary.first_visit.date_naive(),
            to = %summary.last_visit.date_naive(),
            treatment = %summary.treatment,
            "treatment group"
        );
    }

    let base_url = match std::env::var("CASEGEN_BASE_URL") {
        Ok(url) if !url.trim().is_empty() => url,
        _ => {
            tracing::info!("CASEGEN_BASE_URL not set; skipping generation round");
            return Ok(());
        }
    };

    // Select the entire journey for the demo round.
    let teeth: Vec<_> = journey.groups().map(|g| g.tooth()).collect();
    let mut selection = Selection::new();
    for tooth in teeth {
        selection = selection.apply(&journey, SelectionAction::SelectGroup(tooth));
    }

    let request = CaseStudyRequest::build(
        &journey,
        &selection,
        std::env::var("CHAIRSIDE_TITLE").ok(),
        None,
    )?;

    let generator = HttpGenerator::new(GeneratorConfig {
        base_url,
        api_key: std::env::var("CASEGEN_API_KEY").ok(),
    })?;

    let mut lifecycle = GenerationLifecycle::new();
    lifecycle
        .dispatch(&generator, &request)
        .await
        .context("dispatching generation")?;

    match lifecycle.result() {
        Some(study) => {
            println!("# Case study {} ({})", study.id, study.meta.model);
            for kind in SectionKind::ALL {
                println!("\n## {kind}\n{}", study.sections.section(kind));
            }
            let ledger = lifecycle.ledger();
            tracing::info!(
                calls = ledger.calls(),
                tokens = ledger.total_tokens(),
                cost_usd = ledger.total_cost_usd(),
                "session cost"
            );
        }
        None => {
            if let Some(message) = lifecycle.last_error() {
                tracing::error!(error = message, "generation failed");
            }
        }
    }

    Ok(())
}
