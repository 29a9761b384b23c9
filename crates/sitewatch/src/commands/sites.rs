//! Site command handler.

use tabled::Tabled;

use sitewatch_core::{Site, SiteSource};

use crate::cli::GlobalOpts;
use crate::config::Runtime;
use crate::error::CliError;
use crate::output;

#[derive(Tabled)]
struct SiteRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Health")]
    health: String,
    #[tabled(rename = "Role")]
    role: String,
}

fn to_row(site: &Site, color: bool) -> SiteRow {
    SiteRow {
        id: site.id.clone(),
        name: site.name.clone(),
        health: output::paint_status(&site.health.to_string(), color),
        role: site.role.to_string(),
    }
}

/// List sites from the directory. Unlike the monitor, a directory failure
/// here is reported rather than treated as an empty fleet.
pub async fn handle(runtime: &Runtime, global: &GlobalOpts) -> Result<(), CliError> {
    let fleet = runtime.interactive_fleet()?;
    let sites = fleet.list_sites(&runtime.monitor.directory).await?;

    let color = output::should_color(&global.color);
    let out = output::render_list(&global.output, &sites, |s| to_row(s, color), |s| s.id.clone());
    output::print_output(&out, global.quiet);
    Ok(())
}
