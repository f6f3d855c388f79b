use colored::Colorize;
use groundwork_core::{CertificateTable, Environment};

pub fn handle(env: Environment) -> anyhow::Result<()> {
    let certs = CertificateTable::from_env();
    let topology = groundwork_topology::synthesize(env, &certs)?;
    let batch = topology.graph.to_batch();

    // Summary on stderr so the batch on stdout stays pipeable.
    eprintln!(
        "{}",
        format!(
            "✓ Synthesized {} resources for {}",
            batch.resources.len(),
            env
        )
        .green()
    );

    println!("{}", serde_json::to_string_pretty(&batch)?);
    Ok(())
}
