//! Config subcommand handlers.

use sitewatch_config::Config;

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::config;
use crate::error::CliError;
use crate::output;

const MASK: &str = "****";

/// Copy of `cfg` with every plaintext secret masked. Env var names are
/// not secrets and are kept.
fn redacted(cfg: &Config) -> Config {
    let mut cfg = cfg.clone();
    for profile in cfg.profiles.values_mut() {
        if profile.directory_token.is_some() {
            profile.directory_token = Some(MASK.into());
        }
        if profile.session.is_some() {
            profile.session = Some(MASK.into());
        }
        for token in profile.sessions.values_mut() {
            MASK.clone_into(token);
        }
    }
    cfg
}

fn to_toml(cfg: &Config) -> String {
    toml::to_string_pretty(cfg).unwrap_or_else(|e| format!("# failed to render config: {e}"))
}

pub fn handle(args: &ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        ConfigCommand::Path => {
            output::print_output(&config::config_file(global).display().to_string(), global.quiet);
            Ok(())
        }

        ConfigCommand::Show => {
            let cfg = redacted(&config::load(global)?);
            let out = output::render_single(&global.output, &cfg, to_toml, to_toml);
            output::print_output(&out, global.quiet);
            Ok(())
        }
    }
}
