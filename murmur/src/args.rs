use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;

/// Speech-to-text and chat proxy for hosted `OpenAI`-compatible APIs
#[derive(Debug, Parser)]
#[command(name = "murmur", version, about)]
pub struct Args {
    /// Path to an optional TOML configuration file
    #[arg(short, long, env = "MURMUR_CONFIG")]
    pub config: Option<PathBuf>,

    /// Override the listen address (takes precedence over `PORT`)
    #[arg(long, env = "MURMUR_LISTEN")]
    pub listen: Option<SocketAddr>,

    /// Log filter directives, e.g. `info,stt=debug`
    #[arg(long, env = "RUST_LOG", default_value = "info")]
    pub log_filter: String,
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn args_are_well_formed() {
        Args::command().debug_assert();
    }

    #[test]
    fn flags_parse() {
        let args = Args::try_parse_from([
            "murmur",
            "--config",
            "murmur.toml",
            "--listen",
            "127.0.0.1:9000",
            "--log-filter",
            "debug",
        ])
        .unwrap();

        assert_eq!(args.config, Some(PathBuf::from("murmur.toml")));
        assert_eq!(args.listen, Some("127.0.0.1:9000".parse().unwrap()));
        assert_eq!(args.log_filter, "debug");
    }
}
