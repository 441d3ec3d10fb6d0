use super::Context;
use artifact_shield::error::Result;

/// Print the effective configuration and file locations
pub fn show_config(ctx: &Context) -> Result<()> {
    println!("Current configuration:");
    println!("{}", serde_json::to_string_pretty(&ctx.config)?);
    println!("\nConfig file: {}", ctx.home.config_path().display());
    println!("Audit log: {}", ctx.audit.path().display());
    Ok(())
}

/// Print the most recent audit entries
pub fn show_audit(ctx: &Context, count: usize) -> Result<()> {
    let entries = ctx.audit.tail(count);
    if entries.is_empty() {
        println!("No audit log entries");
        return Ok(());
    }

    println!("Recent audit log entries:\n");
    for entry in entries {
        println!("  {entry}");
    }
    Ok(())
}
