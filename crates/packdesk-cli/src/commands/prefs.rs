use anyhow::Result;

use super::Context;

pub fn show(ctx: &Context) -> Result<()> {
    let prefs = ctx.portal.prefs();
    println!("Profile: {} ({})", ctx.config.profile(), prefs.dir().display());

    match prefs.delivery_order_defaults() {
        Some(defaults) => println!("{}", serde_json::to_string_pretty(&defaults)?),
        None => println!("No remembered order defaults"),
    }
    Ok(())
}

pub fn clear(ctx: &Context) -> Result<()> {
    ctx.portal.prefs().clear_delivery_order_defaults()?;
    println!("Cleared remembered order defaults for profile {}", ctx.config.profile());
    Ok(())
}
