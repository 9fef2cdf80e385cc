//! Implementation of the sub-commands.
//!
//! Each command builds instructions with the `echo_booth` codecs, submits them
//! through a [`Transport`] and, where it makes sense, reads the affected
//! account back.

use echo_booth::echo::{
    self, AuthorizedEchoBuffer, DecodedBuffer, VendingMachineEchoBuffer,
};
use echo_booth::exchange_booth::{
    self, ExchangeBooth, InitParams, WithdrawParams,
};
use echo_booth::pda::{self, VaultSide};
use solana_sdk::instruction::Instruction;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::{Keypair, Signature, Signer};

use crate::transport::Transport;
use crate::{Error, Result};

/// Requests an airdrop of `lamports` to `address`.
pub fn airdrop(
    transport: &dyn Transport,
    address: &Pubkey,
    lamports: u64,
) -> Result<Signature> {
    Ok(transport.request_airdrop(address, lamports)?)
}

/// Creates a fresh echo buffer sized to fit `text`, echoes the text into it
/// and reads it back.
///
/// Returns address of the buffer and the text stored on-chain.
pub fn echo(
    transport: &dyn Transport,
    payer: &Keypair,
    program_id: Pubkey,
    text: &str,
) -> Result<(Pubkey, String)> {
    if text.is_empty() {
        return Err(Error::Msg("text to echo must not be empty"));
    }
    let buffer = Keypair::new();
    let create = create_account(
        transport,
        &payer.pubkey(),
        &buffer.pubkey(),
        text.len(),
        &program_id,
    )?;
    let echo = echo::echo(program_id, buffer.pubkey(), text)?;

    log::info!("Echoing {} bytes into {}…", text.len(), buffer.pubkey());
    let signers: [&dyn Signer; 2] = [payer, &buffer];
    transport.submit_and_confirm(&[create, echo], &payer.pubkey(), &signers)?;

    let stored = show_echo(transport, &buffer.pubkey(), false)?;
    Ok((buffer.pubkey(), stored.text().to_owned()))
}

/// Creates an authorised echo buffer owned by `authority`.
///
/// Returns address and bump seed of the buffer.
pub fn init_authorized_echo(
    transport: &dyn Transport,
    authority: &Keypair,
    program_id: Pubkey,
    buffer_seed: u64,
    buffer_size: u64,
) -> Result<(Pubkey, u8)> {
    let (ix, buffer, bump) = echo::initialize_authorized_echo(
        program_id,
        authority.pubkey(),
        buffer_seed,
        buffer_size,
    )?;
    log::info!("Initialising authorised buffer {buffer} (bump {bump})…");
    transport.submit_and_confirm(&[ix], &authority.pubkey(), &[authority as &dyn Signer])?;
    Ok((buffer, bump))
}

/// Echoes `text` into the authorised buffer identified by `buffer_seed` and
/// reads the buffer back.
pub fn authorized_echo(
    transport: &dyn Transport,
    authority: &Keypair,
    program_id: Pubkey,
    buffer_seed: u64,
    text: &str,
) -> Result<AuthorizedEchoBuffer> {
    let (buffer, _) = pda::authorized_buffer_address(
        &authority.pubkey(),
        buffer_seed,
        &program_id,
    )?;
    let ix =
        echo::authorized_echo(program_id, buffer, authority.pubkey(), text)?;
    log::info!("Echoing {} bytes into {buffer}…", text.len());
    transport.submit_and_confirm(&[ix], &authority.pubkey(), &[authority as &dyn Signer])?;

    match show_echo(transport, &buffer, true)? {
        DecodedBuffer::Authorized(buf) => Ok(buf),
        _ => Err(Error::Msg("expected authorised buffer")),
    }
}

/// Reads and decodes an echo buffer.
pub fn show_echo(
    transport: &dyn Transport,
    address: &Pubkey,
    authorized: bool,
) -> Result<DecodedBuffer> {
    let data = transport.fetch_account_data(address)?;
    Ok(echo::decode_buffer(&data, authorized)?)
}

/// Reads and decodes a vending machine echo buffer.
pub fn show_vending_machine_echo(
    transport: &dyn Transport,
    address: &Pubkey,
) -> Result<VendingMachineEchoBuffer> {
    let data = transport.fetch_account_data(address)?;
    Ok(VendingMachineEchoBuffer::decode(&data)?)
}

/// Creates an exchange booth account and initialises it.
///
/// The booth’s address is a fresh keypair.  Vault addresses are derived from
/// it.  Returns the parameters the booth was initialised with.
pub fn init_booth(
    transport: &dyn Transport,
    admin: &Keypair,
    program_id: Pubkey,
    mint_a: Pubkey,
    mint_b: Pubkey,
    oracle: Pubkey,
) -> Result<InitParams> {
    let booth = Keypair::new();
    let create = create_account(
        transport,
        &admin.pubkey(),
        &booth.pubkey(),
        ExchangeBooth::LEN,
        &program_id,
    )?;
    let params = InitParams::with_derived_vaults(
        program_id,
        admin.pubkey(),
        booth.pubkey(),
        mint_a,
        mint_b,
        oracle,
    )?;
    log::info!(
        "Initialising exchange booth {} with vaults {} and {}…",
        params.exchange_booth,
        params.vault_a,
        params.vault_b
    );
    let init = exchange_booth::init(&params);
    let signers: [&dyn Signer; 2] = [admin, &booth];
    transport.submit_and_confirm(&[create, init], &admin.pubkey(), &signers)?;
    Ok(params)
}

/// Withdraws `amount` tokens from one of the booth’s vaults into the admin’s
/// token account.
///
/// Vault and mint are taken from the booth record stored on-chain.
pub fn withdraw(
    transport: &dyn Transport,
    admin: &Keypair,
    program_id: Pubkey,
    exchange_booth: Pubkey,
    admins_token_account: Pubkey,
    side: VaultSide,
    amount: u64,
) -> Result<Signature> {
    let booth = show_booth(transport, &exchange_booth)?;
    let params = WithdrawParams {
        program_id,
        admin: admin.pubkey(),
        admins_token_account,
        vault: *booth.vault(side),
        mint: *booth.mint(side),
        exchange_booth,
        amount,
    };
    log::info!("Withdrawing {amount} tokens from vault {}…", params.vault);
    let ix = exchange_booth::withdraw(&params);
    Ok(transport.submit_and_confirm(&[ix], &admin.pubkey(), &[admin as &dyn Signer])?)
}

/// Reads and decodes an exchange booth record.
pub fn show_booth(
    transport: &dyn Transport,
    address: &Pubkey,
) -> Result<ExchangeBooth> {
    let data = transport.fetch_account_data(address)?;
    Ok(ExchangeBooth::decode(&data)?)
}

/// Closes an exchange booth returning its lamports to the admin.
pub fn close_booth(
    transport: &dyn Transport,
    admin: &Keypair,
    program_id: Pubkey,
    exchange_booth: Pubkey,
) -> Result<Signature> {
    let ix = exchange_booth::close(program_id, admin.pubkey(), exchange_booth);
    log::info!("Closing exchange booth {exchange_booth}…");
    Ok(transport.submit_and_confirm(&[ix], &admin.pubkey(), &[admin as &dyn Signer])?)
}

/// Builds a system program instruction creating a rent-exempt account of
/// `space` bytes owned by `owner`.
fn create_account(
    transport: &dyn Transport,
    payer: &Pubkey,
    account: &Pubkey,
    space: usize,
    owner: &Pubkey,
) -> Result<Instruction> {
    let lamports = transport.minimum_balance_for_rent_exemption(space)?;
    log::debug!("Creating {account} with {space} bytes and {lamports} lamports");
    Ok(solana_system_interface::instruction::create_account(
        payer,
        account,
        lamports,
        space as u64,
        owner,
    ))
}
