use colored::Colorize;
use groundwork_cloud::{FileEngine, ReconcileEngine, StateManager};
use groundwork_core::Environment;

pub async fn handle(
    env: Environment,
    project_root: &std::path::Path,
    yes: bool,
) -> anyhow::Result<()> {
    println!("{}", "Tearing down...".yellow());
    println!("Environment: {}", env.to_string().cyan());

    let manager = StateManager::new(project_root);
    let state = manager.load().await?;

    let env_marker = serde_json::json!(env.as_str());
    let mut destroyable = Vec::new();
    let mut retained = Vec::new();
    for (key, record) in &state.resources {
        if record.attributes.get("environment") != Some(&env_marker) {
            continue;
        }
        if record.retain {
            retained.push(key.clone());
        } else {
            destroyable.push(key.clone());
        }
    }
    destroyable.sort();
    retained.sort();

    if destroyable.is_empty() && retained.is_empty() {
        println!();
        println!("{}", "ℹ Nothing to tear down".dimmed());
        return Ok(());
    }

    if !retained.is_empty() {
        println!();
        println!(
            "{}",
            format!("Retained resources ({}) will be left in place:", retained.len()).bold()
        );
        for key in &retained {
            println!("  • {}", key.yellow());
        }
    }

    if destroyable.is_empty() {
        println!();
        println!(
            "{}",
            "✓ Every remaining resource carries a retain policy, nothing destroyed"
                .green()
                .bold()
        );
        return Ok(());
    }

    println!();
    println!(
        "{}",
        format!("Resources to destroy ({}):", destroyable.len()).bold()
    );
    for key in &destroyable {
        println!("  • {}", key.cyan());
    }

    if !yes {
        println!();
        print!("Destroy these resources? [y/N]: ");
        use std::io::Write;
        std::io::stdout().flush()?;

        let mut input = String::new();
        std::io::stdin().read_line(&mut input)?;
        if !input.trim().eq_ignore_ascii_case("y") {
            println!("{}", "Cancelled.".yellow());
            return Ok(());
        }
    }

    let lock = manager.acquire_lock().await?;
    let result = destroy_all(&manager, &destroyable).await;
    lock.release().await?;
    result?;

    println!();
    println!("{}", "✓ Teardown complete!".green().bold());
    Ok(())
}

async fn destroy_all(manager: &StateManager, keys: &[String]) -> anyhow::Result<()> {
    let engine = FileEngine::new(manager.out_dir());
    let mut state = manager.load().await?;

    for key in keys {
        println!("{}", format!("■ Destroying {key}...").yellow());
        engine.destroy(key).await?;
        state.remove_resource(key);
    }

    manager.save(&state).await?;
    Ok(())
}
