//! Byte-exact checks of the instruction data the on-chain programs expect.

use echo_booth::echo::{self, DecodedBuffer};
use echo_booth::exchange_booth::{self, InitParams, WithdrawParams};
use echo_booth::pda::{self, VaultSide};
use pretty_assertions::assert_eq;
use solana_program::pubkey::Pubkey;

fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|byte| format!("{byte:02x}")).collect()
}

#[test]
fn test_initialize_bytes() {
    let data = echo::encode_initialize(0, 20).unwrap();
    assert_eq!(17, data.len());
    assert_eq!(
        concat!("01", "0000000000000000", "1400000000000000"),
        hex(&data)
    );
}

#[test]
fn test_echo_bytes() {
    let data = echo::encode_echo("hi").unwrap();
    assert_eq!("02020000006869", hex(&data));
}

#[test]
fn test_withdraw_bytes() {
    let data = exchange_booth::encode_withdraw(1_000_000);
    assert_eq!("0240420f0000000000", hex(&data));
}

/// Walks through the authorised echo lifecycle the way a client does:
/// initialise the buffer, echo into it twice and read it back.  The program is
/// simulated by writing the echoed text into a zeroed buffer.
#[test]
fn test_authorized_echo_lifecycle() {
    let program_id = Pubkey::new_unique();
    let authority = Pubkey::new_unique();

    let (init, buffer, bump) =
        echo::initialize_authorized_echo(program_id, authority, 1, 32).unwrap();
    assert_eq!(Ok((1, 32)), echo::decode_initialize_args(&init.data));

    let mut account = vec![0u8; 32];
    account[0] = bump;
    account[1..9].copy_from_slice(&1u64.to_le_bytes());

    for text in ["a much longer message", "short"] {
        let ix = echo::authorized_echo(program_id, buffer, authority, text)
            .unwrap();
        let payload = &ix.data[5..];
        account[echo::AUTHORIZED_HEADER_LEN..].fill(0);
        account[echo::AUTHORIZED_HEADER_LEN..][..payload.len()]
            .copy_from_slice(payload);

        let decoded = echo::decode_buffer(&account, true).unwrap();
        assert_eq!(text, decoded.text());
        let DecodedBuffer::Authorized(decoded) = decoded else {
            panic!("expected authorised buffer");
        };
        assert_eq!(Ok(buffer), decoded.address(&authority, &program_id));
    }
}

#[test]
fn test_init_uses_derived_vaults() {
    let program_id = Pubkey::new_unique();
    let booth = Pubkey::new_unique();
    let params = InitParams::with_derived_vaults(
        program_id,
        Pubkey::new_unique(),
        booth,
        Pubkey::new_unique(),
        Pubkey::new_unique(),
        Pubkey::new_unique(),
    )
    .unwrap();
    let ix = exchange_booth::init(&params);
    let (vault_a, _) = pda::vault_address(VaultSide::A, &booth, &program_id)
        .unwrap();
    let (vault_b, _) = pda::vault_address(VaultSide::B, &booth, &program_id)
        .unwrap();
    assert_eq!(10, ix.accounts.len());
    assert_eq!(vault_a, ix.accounts[4].pubkey);
    assert_eq!(vault_b, ix.accounts[5].pubkey);

    let withdraw = exchange_booth::withdraw(&WithdrawParams {
        program_id,
        admin: params.admin,
        admins_token_account: Pubkey::new_unique(),
        vault: vault_b,
        mint: params.mint_b,
        exchange_booth: booth,
        amount: 10,
    });
    assert_eq!(6, withdraw.accounts.len());
    assert_eq!(9, withdraw.data.len());
}
