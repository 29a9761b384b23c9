//! Device command handler.

use tabled::Tabled;

use sitewatch_api::SiteRef;
use sitewatch_core::Device;

use crate::cli::{DevicesArgs, GlobalOpts};
use crate::config::Runtime;
use crate::error::CliError;
use crate::output;

#[derive(Tabled)]
struct DeviceRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Site")]
    site: String,
}

fn to_row(device: &Device, color: bool) -> DeviceRow {
    DeviceRow {
        id: device.id.clone(),
        name: device.name.clone(),
        status: output::paint_status(&device.status, color),
        site: device.site_id.clone(),
    }
}

pub async fn handle(runtime: &Runtime, args: &DevicesArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let fleet = runtime.interactive_fleet()?;
    let site = SiteRef::new(&args.site, &args.site);
    let devices: Vec<Device> = fleet
        .list_devices(&site)
        .await?
        .into_iter()
        .map(|r| Device::from_record(r, &args.site))
        .collect();

    let color = output::should_color(&global.color);
    let out = output::render_list(&global.output, &devices, |d| to_row(d, color), |d| d.id.clone());
    output::print_output(&out, global.quiet);
    Ok(())
}
