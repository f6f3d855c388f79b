use colored::Colorize;
use groundwork_core::{CertificateTable, Environment};
use std::collections::BTreeMap;

pub fn handle(env: Environment) -> anyhow::Result<()> {
    println!("{}", "Validating topology...".blue());
    println!("Environment: {}", env.to_string().cyan());

    let certs = CertificateTable::from_env();
    match certs.lookup(env) {
        Ok(arn) => println!("  ✓ TLS certificate: {}", arn.cyan()),
        Err(e) => {
            eprintln!();
            eprintln!("{}", "✗ Configuration error".red().bold());
            eprintln!("  {}", e);
            eprintln!();
            eprintln!(
                "Set GROUNDWORK_CERT_ARN_{} to the certificate ARN for this environment",
                env.as_str().to_uppercase()
            );
            std::process::exit(1);
        }
    }

    match groundwork_topology::synthesize(env, &certs) {
        Ok(topology) => {
            println!("{}", "✓ Topology is valid!".green().bold());
            println!();
            println!("Summary:");

            let batch = topology.graph.to_batch();
            let mut by_type: BTreeMap<&str, usize> = BTreeMap::new();
            for decl in &batch.resources {
                *by_type.entry(decl.resource_type.as_str()).or_default() += 1;
            }
            println!("  Resources: {}", batch.resources.len());
            for (resource_type, count) in &by_type {
                println!("    - {} ({})", resource_type.cyan(), count);
            }
            println!("  Grants: {}", batch.grants.len());

            let db = topology
                .shared
                .access
                .role(groundwork_core::model::SecurityGroupRole::Database);
            println!("  Database ingress rules: {}", db.ingress.len());
            for rule in &db.ingress {
                println!("    - {} ({})", rule.description.cyan(), rule.port);
            }

            println!(
                "  Worker app secret: {} ({})",
                topology.worker.app_secret.resolved_name().cyan(),
                if topology.worker.app_secret.is_late_bound() {
                    "late-bound"
                } else {
                    "direct handle"
                }
            );
        }
        Err(e) => {
            eprintln!();
            eprintln!("{}", "✗ Topology error".red().bold());
            eprintln!("  {}", e);
            std::process::exit(1);
        }
    }

    Ok(())
}
