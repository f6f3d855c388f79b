use colored::Colorize;
use groundwork_cloud::{
    FileEngine, Plan, ReconcileEngine, ReplicationConfigurator, ReplicationOutcome,
    ReplicationRequest, ResourceRecord, StateManager,
};
use groundwork_cloud_aws::{AwsObjectStorage, AwsReplicationRoles};
use groundwork_core::{CertificateTable, Environment, RemovalPolicy};
use groundwork_topology::Topology;

pub async fn handle(
    env: Environment,
    project_root: &std::path::Path,
    skip_replication: bool,
) -> anyhow::Result<()> {
    println!("Environment: {}", env.to_string().cyan());

    // Configuration errors abort here, before any resource mutation: a
    // missing certificate fails synthesis with nothing declared.
    let certs = CertificateTable::from_env();
    let topology = groundwork_topology::synthesize(env, &certs)?;
    let batch = topology.graph.to_batch();

    let manager = StateManager::new(project_root);
    let state = manager.load().await?;
    let plan = Plan::diff(&batch, &state);

    println!();
    println!("{}", format!("Plan: {}", plan.summary()).bold());

    if plan.has_changes {
        let lock = manager.acquire_lock().await?;
        let result = submit(env, &manager, &batch).await;
        lock.release().await?;
        result?;
    } else {
        println!();
        println!(
            "{}",
            "✓ Topology is already provisioned, nothing to do".green().bold()
        );
    }

    // The one imperative sequence: versioning must be confirmed on the source
    // bucket before the replication configuration is issued. Runs on every
    // non-skipped invocation; an already-configured pair is a no-op.
    if skip_replication {
        println!(
            "{}",
            format!(
                "  Skipping replication configuration {} -> {}",
                topology.shared.replication.source, topology.shared.replication.destination
            )
            .dimmed()
        );
    } else {
        configure_replication(&topology).await?;
    }

    if plan.has_changes {
        if !batch.outputs.is_empty() {
            println!();
            println!("{}", "Outputs:".bold());
            for (name, value) in &batch.outputs {
                println!("  {} = {}", name, value.cyan());
            }
        }
        println!();
        println!("{}", "✓ Provisioning complete!".green().bold());
    }
    Ok(())
}

async fn submit(
    env: Environment,
    manager: &StateManager,
    batch: &groundwork_cloud::ResourceBatch,
) -> anyhow::Result<()> {
    let engine = FileEngine::new(manager.out_dir());

    println!();
    println!(
        "{}",
        format!("Submitting batch to {} engine...", engine.name()).blue()
    );
    let result = engine.submit(batch).await?;
    if !result.is_success() {
        // Reconciliation failures are surfaced verbatim; siblings that were
        // already created stay in place for inspection.
        for failure in &result.failed {
            eprintln!(
                "  {} {}: {}",
                "✗".red(),
                failure.action_id,
                failure.error.as_deref().unwrap_or("unknown error")
            );
        }
        anyhow::bail!("{} resources failed to provision", result.failed.len());
    }
    println!("  ✓ {} resources submitted", result.succeeded.len());

    let mut state = manager.load().await?;
    for decl in &batch.resources {
        // Specs that carry their own removal policy win; everything else
        // falls back to the environment's blanket policy.
        let retain = match decl.spec.get("removal_policy").and_then(|v| v.as_str()) {
            Some(policy) => policy == "retain",
            None => RemovalPolicy::for_environment(env) == RemovalPolicy::Retain,
        };
        state.set_resource(
            decl.key(),
            ResourceRecord::new(&decl.id, &decl.resource_type, retain)
                .with_attribute("environment", serde_json::json!(env.as_str())),
        );
    }
    manager.save(&state).await?;
    Ok(())
}

async fn configure_replication(topology: &Topology) -> anyhow::Result<()> {
    let link = &topology.shared.replication;
    println!();
    println!(
        "{}",
        format!(
            "Configuring replication {} -> {}...",
            link.source, link.destination
        )
        .blue()
    );

    let (s3, iam) = groundwork_cloud_aws::clients().await;
    let storage = AwsObjectStorage::new(s3);
    let roles = AwsReplicationRoles::new(iam);
    let configurator = ReplicationConfigurator::new(&storage, &roles);
    let request = ReplicationRequest {
        source: link.source.clone(),
        destination: link.destination.clone(),
        role_name: link.role_name.clone(),
    };
    match configurator.configure(&request).await? {
        ReplicationOutcome::Configured => println!("  ✓ Replication configured"),
        ReplicationOutcome::AlreadyConfigured => {
            println!("  ℹ Replication already configured");
        }
    }
    Ok(())
}
