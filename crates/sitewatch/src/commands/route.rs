//! Route command: show where a call would go and how it would
//! authenticate, without sending it.

use serde::Serialize;

use crate::cli::{GlobalOpts, RouteArgs};
use crate::config::Runtime;
use crate::error::CliError;
use crate::output;

/// Secret-free view of a plan.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RouteView {
    identifier: String,
    class: String,
    url: String,
    credential: String,
    strategy: String,
    secondary_bearer: bool,
    headers: Vec<String>,
}

fn detail(view: &RouteView) -> String {
    output::detail_block(&[
        ("Identifier", view.identifier.clone()),
        ("Class", view.class.clone()),
        ("URL", view.url.clone()),
        ("Credential", view.credential.clone()),
        ("Strategy", view.strategy.clone()),
        ("Secondary bearer", if view.secondary_bearer { "yes" } else { "no" }.into()),
        ("Headers", if view.headers.is_empty() { "-".into() } else { view.headers.join(", ") }),
    ])
}

pub fn handle(runtime: &Runtime, args: &RouteArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let fleet = runtime.interactive_fleet()?;
    let plan = fleet.plan(&args.site, &args.path, &[])?;

    // Header names only
    let mut headers: Vec<String> = plan.auth.headers.keys().map(|k| k.as_str().to_owned()).collect();
    headers.sort();

    let view = RouteView {
        identifier: args.site.clone(),
        class: plan.route.class.to_string(),
        url: plan.route.url.to_string(),
        credential: plan.auth.kind.to_string(),
        strategy: plan.auth.strategy.to_owned(),
        secondary_bearer: plan.auth.secondary_bearer,
        headers,
    };

    let out = output::render_single(&global.output, &view, detail, |v| v.url.clone());
    output::print_output(&out, global.quiet);
    Ok(())
}
