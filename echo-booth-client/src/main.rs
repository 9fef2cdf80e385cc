use core::str::FromStr;
use std::process::ExitCode;

use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use echo_booth::echo::DecodedBuffer;
use echo_booth::pda::VaultSide;
use solana_client::rpc_client::RpcClient;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Signer;
use solana_sdk::signer::keypair::Keypair;

use crate::config::Config;
use crate::transport::{Transport, TransportError};

mod commands;
mod config;
mod transport;


type Result<T = (), E = Error> = core::result::Result<T, E>;


fn main() -> ExitCode {
    if let Err(err) = run() {
        eprintln!("{err}");
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}


/// Executes the program.
fn run() -> Result {
    solana_logger::setup_with_default("info");

    let matches = cli().get_matches();
    let config = Config::from_matches(&matches)?;
    let client = RpcClient::new_with_commitment(
        config.json_rpc_url.clone(),
        config.commitment,
    );
    log::debug!("Using RPC node at {}", config.json_rpc_url);

    let keypair = || read_keypair(&config);
    match matches.subcommand() {
        Some((name, args)) => dispatch(&client, &keypair, name, args),
        None => Err(Error::Msg("missing sub-command")),
    }
}


/// Builds the command line parser.
pub(crate) fn cli() -> Command {
    let pubkey = |name: &'static str, help: &'static str| {
        Arg::new(name).required(true).value_parser(parse_pubkey).help(help)
    };
    let number = |name: &'static str, help: &'static str| {
        Arg::new(name).required(true).value_parser(value_parser!(u64)).help(help)
    };
    let text = Arg::new("text").required(true).help("ASCII text to echo");

    Command::new("echo-booth")
        .version(clap::crate_version!())
        .about(clap::crate_description!())
        .subcommand_required(true)
        .arg(
            Arg::new("url")
                .short('u')
                .long("url")
                .global(true)
                .help("URL of the JSON RPC node"),
        )
        .arg(
            Arg::new("keypair")
                .short('k')
                .long("keypair")
                .global(true)
                .help("Path to the keypair which signs and pays"),
        )
        .arg(
            Arg::new("config")
                .short('C')
                .long("config")
                .global(true)
                .help("Path to the Solana CLI configuration file"),
        )
        .arg(
            Arg::new("commitment")
                .long("commitment")
                .global(true)
                .value_parser(["processed", "confirmed", "finalized"])
                .help("Commitment level to wait for"),
        )
        .subcommand(
            Command::new("airdrop")
                .about("Requests lamports for the keypair")
                .arg(number("lamports", "Number of lamports")),
        )
        .subcommand(
            Command::new("echo")
                .about("Echoes text into a new buffer")
                .arg(pubkey("program-id", "Address of the Echo program"))
                .arg(text.clone()),
        )
        .subcommand(
            Command::new("init-authorized-echo")
                .about("Creates an authorised echo buffer")
                .arg(pubkey("program-id", "Address of the Echo program"))
                .arg(number("buffer-seed", "Seed distinguishing the buffer"))
                .arg(number("buffer-size", "Size of the buffer in bytes")),
        )
        .subcommand(
            Command::new("authorized-echo")
                .about("Echoes text into an authorised buffer")
                .arg(pubkey("program-id", "Address of the Echo program"))
                .arg(number("buffer-seed", "Seed distinguishing the buffer"))
                .arg(text),
        )
        .subcommand(
            Command::new("show-echo")
                .about("Prints contents of an echo buffer")
                .arg(pubkey("address", "Address of the buffer"))
                .arg(
                    Arg::new("authorized")
                        .long("authorized")
                        .action(ArgAction::SetTrue)
                        .help("Decode as an authorised buffer"),
                )
                .arg(
                    Arg::new("vending-machine")
                        .long("vending-machine")
                        .action(ArgAction::SetTrue)
                        .conflicts_with("authorized")
                        .help("Decode as a vending machine buffer"),
                ),
        )
        .subcommand(
            Command::new("init-booth")
                .about("Creates and initialises an exchange booth")
                .arg(pubkey("program-id", "Address of the Exchange Booth program"))
                .arg(pubkey("mint-a", "Mint of the first token"))
                .arg(pubkey("mint-b", "Mint of the second token"))
                .arg(pubkey("oracle", "Address of the price oracle")),
        )
        .subcommand(
            Command::new("withdraw")
                .about("Withdraws tokens from one of the booth’s vaults")
                .arg(pubkey("program-id", "Address of the Exchange Booth program"))
                .arg(pubkey("exchange-booth", "Address of the booth"))
                .arg(pubkey(
                    "admins-token-account",
                    "Token account receiving the tokens",
                ))
                .arg(
                    Arg::new("vault-side")
                        .required(true)
                        .value_parser(["a", "b"])
                        .help("Vault to withdraw from"),
                )
                .arg(number("amount", "Number of tokens")),
        )
        .subcommand(
            Command::new("show-booth")
                .about("Prints an exchange booth record")
                .arg(pubkey("address", "Address of the booth")),
        )
        .subcommand(
            Command::new("close-booth")
                .about("Closes an exchange booth")
                .arg(pubkey("program-id", "Address of the Exchange Booth program"))
                .arg(pubkey("exchange-booth", "Address of the booth")),
        )
}


/// Runs a sub-command and prints its result.
///
/// `keypair` is only called by sub-commands which sign transactions.
fn dispatch(
    transport: &dyn Transport,
    keypair: &dyn Fn() -> Result<Keypair>,
    name: &str,
    args: &ArgMatches,
) -> Result {
    match name {
        "airdrop" => {
            let lamports = *get(args, "lamports")?;
            let sig =
                commands::airdrop(transport, &keypair()?.pubkey(), lamports)?;
            println!("{sig}");
        }
        "echo" => {
            let (buffer, text) = commands::echo(
                transport,
                &keypair()?,
                *get(args, "program-id")?,
                get::<String>(args, "text")?,
            )?;
            println!("buffer: {buffer}");
            println!("text: {text}");
        }
        "init-authorized-echo" => {
            let (buffer, bump) = commands::init_authorized_echo(
                transport,
                &keypair()?,
                *get(args, "program-id")?,
                *get(args, "buffer-seed")?,
                *get(args, "buffer-size")?,
            )?;
            println!("buffer: {buffer}");
            println!("bump seed: {bump}");
        }
        "authorized-echo" => {
            let buffer = commands::authorized_echo(
                transport,
                &keypair()?,
                *get(args, "program-id")?,
                *get(args, "buffer-seed")?,
                get::<String>(args, "text")?,
            )?;
            print_echo(&DecodedBuffer::Authorized(buffer));
        }
        "show-echo" => {
            let address = get(args, "address")?;
            let buffer = if args.get_flag("vending-machine") {
                commands::show_vending_machine_echo(transport, address)?.into()
            } else {
                commands::show_echo(
                    transport,
                    address,
                    args.get_flag("authorized"),
                )?
            };
            print_echo(&buffer);
        }
        "init-booth" => {
            let params = commands::init_booth(
                transport,
                &keypair()?,
                *get(args, "program-id")?,
                *get(args, "mint-a")?,
                *get(args, "mint-b")?,
                *get(args, "oracle")?,
            )?;
            println!("exchange booth: {}", params.exchange_booth);
            println!("vault a: {}", params.vault_a);
            println!("vault b: {}", params.vault_b);
        }
        "withdraw" => {
            let side = match get::<String>(args, "vault-side")?.as_str() {
                "a" => VaultSide::A,
                _ => VaultSide::B,
            };
            let sig = commands::withdraw(
                transport,
                &keypair()?,
                *get(args, "program-id")?,
                *get(args, "exchange-booth")?,
                *get(args, "admins-token-account")?,
                side,
                *get(args, "amount")?,
            )?;
            println!("{sig}");
        }
        "show-booth" => {
            let booth = commands::show_booth(transport, get(args, "address")?)?;
            println!("initialized: {}", booth.initialized);
            println!("admin: {}", booth.admin);
            println!("mint a: {}", booth.mint_a);
            println!("mint b: {}", booth.mint_b);
            println!("vault a: {}", booth.vault_a);
            println!("vault b: {}", booth.vault_b);
            println!("oracle: {}", booth.oracle);
        }
        "close-booth" => {
            let sig = commands::close_booth(
                transport,
                &keypair()?,
                *get(args, "program-id")?,
                *get(args, "exchange-booth")?,
            )?;
            println!("{sig}");
        }
        _ => return Err(Error::Msg("unknown sub-command")),
    }
    Ok(())
}


fn print_echo(buffer: &DecodedBuffer) {
    match buffer {
        DecodedBuffer::Plain(_) => (),
        DecodedBuffer::Authorized(buf) => {
            println!("bump seed: {}", buf.bump_seed);
            println!("buffer seed: {}", buf.buffer_seed);
        }
        DecodedBuffer::VendingMachine(buf) => {
            println!("bump seed: {}", buf.bump_seed);
            println!("price: {}", buf.price);
            println!("mint: {}", buf.vending_machine_mint);
        }
    }
    println!("text: {}", buffer.text());
}


/// Returns value of a required argument.
fn get<'a, T: Clone + Send + Sync + 'static>(
    args: &'a ArgMatches,
    name: &'static str,
) -> Result<&'a T> {
    args.get_one::<T>(name).ok_or(Error::Msg("missing argument"))
}


fn parse_pubkey(value: &str) -> Result<Pubkey, String> {
    Pubkey::from_str(value).map_err(|err| format!("{value}: {err}"))
}


/// Reads keypair from the configured location.
fn read_keypair(config: &Config) -> Result<Keypair> {
    log::debug!("Reading keypair from {}", config.keypair_path);
    solana_sdk::signer::keypair::read_keypair_file(&config.keypair_path)
        .map_err(|err| Error::Config(config.keypair_path.clone(), err.to_string()))
}


#[derive(Debug, derive_more::From, derive_more::Display)]
enum Error {
    Msg(&'static str),
    #[display("{_0}: {_1}")]
    #[from(ignore)]
    Config(String, String),
    Lib(echo_booth::Error),
    Transport(TransportError),
}


#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_cli() {
        cli().debug_assert();
    }

    fn args(args: &[&str]) -> Vec<String> {
        core::iter::once("echo-booth")
            .chain(args.iter().copied())
            .map(String::from)
            .collect()
    }

    #[test]
    fn test_parse_withdraw() {
        let booth = Pubkey::new_unique();
        let matches = cli().get_matches_from(args(&[
            "withdraw",
            &Pubkey::new_unique().to_string(),
            &booth.to_string(),
            &Pubkey::new_unique().to_string(),
            "b",
            "500",
        ]));
        let (name, args) = matches.subcommand().unwrap();
        assert_eq!("withdraw", name);
        assert_eq!(&booth, get::<Pubkey>(args, "exchange-booth").unwrap());
        assert_eq!(&500, get::<u64>(args, "amount").unwrap());
    }

    #[test]
    fn test_read_only_commands_need_no_keypair() {
        use echo_booth::exchange_booth::ExchangeBooth;

        use crate::transport::mock::MockTransport;

        let transport = MockTransport::new();
        let address = Pubkey::new_unique();
        let booth = ExchangeBooth {
            initialized: true,
            admin: Pubkey::new_unique(),
            mint_a: Pubkey::new_unique(),
            mint_b: Pubkey::new_unique(),
            vault_a: Pubkey::new_unique(),
            vault_b: Pubkey::new_unique(),
            oracle: Pubkey::new_unique(),
        };
        let buffer = Pubkey::new_unique();
        let mut accounts = transport.accounts.borrow_mut();
        accounts.insert(address, booth.encode().unwrap());
        accounts.insert(buffer, b"hi\0\0".to_vec());
        drop(accounts);

        let no_keypair = || -> Result<Keypair> {
            Err(Error::Config("/nonexistent".into(), "no such file".into()))
        };
        let run = |argv: &[&str]| {
            let matches = cli().get_matches_from(args(argv));
            let (name, sub) = matches.subcommand().unwrap();
            dispatch(&transport, &no_keypair, name, sub)
        };

        run(&["show-booth", address.to_string().as_str()]).unwrap();
        run(&["show-echo", buffer.to_string().as_str()]).unwrap();
        assert!(matches!(
            run(&["airdrop", "1"]),
            Err(Error::Config(path, _)) if path == "/nonexistent"
        ));
        assert!(transport.airdrops.borrow().is_empty());
    }

    #[test]
    fn test_parse_rejects_bad_input() {
        let key = Pubkey::new_unique().to_string();
        assert!(cli().try_get_matches_from(args(&["show-booth", "nope"])).is_err());
        assert!(cli()
            .try_get_matches_from(args(&["withdraw", &key, &key, &key, "c", "1"]))
            .is_err());
        assert!(cli().try_get_matches_from(args(&[])).is_err());
        assert!(cli()
            .try_get_matches_from(args(&[
                "show-echo",
                &key,
                "--authorized",
                "--vending-machine",
            ]))
            .is_err());
        assert!(cli()
            .try_get_matches_from(args(&["--commitment", "eventually", "airdrop", "1"]))
            .is_err());
    }
}
