//! One-shot analysis commands printing their report as JSON on stdout

use anyhow::Context;
use tracing::info;

use crate::cli::serve::load_config;
use crate::infrastructure::logging::init_logging;

/// Runs the cluster analyzer once over the configured cache
pub async fn run_clusters() -> anyhow::Result<()> {
    let config = load_config()?;
    init_logging(&config.logging);

    let state = crate::create_app_state_with_config(&config).await?;
    let analysis = state
        .cluster_analyzer
        .analyze()
        .await
        .context("cluster analysis failed")?;

    info!(
        clusters = analysis.stats.total_clusters,
        duplicates = analysis.duplicates.len(),
        "Cluster analysis finished"
    );

    println!("{}", serde_json::to_string_pretty(&analysis)?);
    Ok(())
}

/// Runs user analytics once against the configured prediction threshold
pub async fn run_users() -> anyhow::Result<()> {
    let config = load_config()?;
    init_logging(&config.logging);

    let state = crate::create_app_state_with_config(&config).await?;
    let report = state
        .analytics
        .analyze(config.prediction.confidence_threshold)
        .await
        .context("user analytics failed")?;

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
