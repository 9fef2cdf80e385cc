//! Client configuration.
//!
//! Settings come from the Solana CLI configuration file (by default
//! `~/.config/solana/cli/config.yml`) and can be overridden on the command
//! line.

use core::str::FromStr;

use clap::ArgMatches;
use solana_sdk::commitment_config::CommitmentConfig;

use crate::Error;

/// Resolved client settings.
#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    pub json_rpc_url: String,
    pub keypair_path: String,
    pub commitment: CommitmentConfig,
}

impl Config {
    /// Resolves settings from command line flags falling back to the CLI
    /// configuration file.
    ///
    /// A configuration file given with `--config` must exist.  The default one
    /// is optional.
    pub fn from_matches(matches: &ArgMatches) -> Result<Self, Error> {
        let file = match matches.get_one::<String>("config") {
            Some(path) => solana_cli_config::Config::load(path)
                .map_err(|err| Error::Config(path.clone(), err.to_string()))?,
            None => {
                let path: &Option<String> = &solana_cli_config::CONFIG_FILE;
                path.as_deref()
                    .and_then(|path| solana_cli_config::Config::load(path).ok())
                    .unwrap_or_default()
            }
        };
        Self::merge(file, matches)
    }

    fn merge(
        file: solana_cli_config::Config,
        matches: &ArgMatches,
    ) -> Result<Self, Error> {
        let flag = |name: &str| matches.get_one::<String>(name).cloned();
        let commitment = flag("commitment").unwrap_or(file.commitment);
        let commitment = CommitmentConfig::from_str(&commitment)
            .map_err(|err| Error::Config(commitment.clone(), err.to_string()))?;
        let config = Self {
            json_rpc_url: flag("url").unwrap_or(file.json_rpc_url),
            keypair_path: flag("keypair").unwrap_or(file.keypair_path),
            commitment,
        };
        log::debug!("{config:?}");
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn file() -> solana_cli_config::Config {
        solana_cli_config::Config {
            json_rpc_url: "http://127.0.0.1:8899".into(),
            keypair_path: "/tmp/id.json".into(),
            commitment: "confirmed".into(),
            ..Default::default()
        }
    }

    #[test]
    fn test_file_defaults() {
        let matches =
            crate::cli().get_matches_from(["echo-booth", "airdrop", "1"]);
        let config = Config::merge(file(), &matches).unwrap();
        assert_eq!(
            Config {
                json_rpc_url: "http://127.0.0.1:8899".into(),
                keypair_path: "/tmp/id.json".into(),
                commitment: CommitmentConfig::confirmed(),
            },
            config
        );
    }

    #[test]
    fn test_flags_override_file() {
        let matches = crate::cli().get_matches_from([
            "echo-booth",
            "--url",
            "https://api.devnet.solana.com",
            "--keypair",
            "/tmp/other.json",
            "--commitment",
            "finalized",
            "airdrop",
            "1",
        ]);
        let config = Config::merge(file(), &matches).unwrap();
        assert_eq!("https://api.devnet.solana.com", config.json_rpc_url);
        assert_eq!("/tmp/other.json", config.keypair_path);
        assert_eq!(CommitmentConfig::finalized(), config.commitment);
    }

    #[test]
    fn test_bad_commitment_in_file() {
        let matches =
            crate::cli().get_matches_from(["echo-booth", "airdrop", "1"]);
        let file = solana_cli_config::Config {
            commitment: "eventually".into(),
            ..file()
        };
        assert!(Config::merge(file, &matches).is_err());
    }
}
