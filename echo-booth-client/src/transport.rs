//! Submitting transactions and reading accounts.
//!
//! Commands never talk to the RPC node directly.  They are handed a
//! [`Transport`] which makes it possible to run them against an in-memory
//! ledger in tests.

use solana_client::client_error::ClientError;
use solana_client::rpc_client::RpcClient;
use solana_sdk::instruction::Instruction;
use solana_sdk::message::Message;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::{Signature, Signer};
use solana_sdk::signer::SignerError;
use solana_sdk::transaction::Transaction;
use solana_transaction_status::option_serializer::OptionSerializer;
use solana_transaction_status::UiTransactionEncoding;

/// Failure reported by the transport.
///
/// On-chain failures (insufficient funds, wrong signer, account mismatch) come
/// back as an opaque [`TransportError::Client`].
#[derive(Debug, derive_more::From, derive_more::Display)]
pub enum TransportError {
    #[display("account {_0} not found")]
    #[from(ignore)]
    NotFound(Pubkey),
    Client(ClientError),
    Signing(SignerError),
}

type Result<T, E = TransportError> = core::result::Result<T, E>;

/// Ledger collaborator used by the commands.
pub trait Transport {
    /// Sends a transaction with given instructions and waits until it’s
    /// confirmed.  `payer` pays the fee and must be among `signers`.
    fn submit_and_confirm(
        &self,
        instructions: &[Instruction],
        payer: &Pubkey,
        signers: &[&dyn Signer],
    ) -> Result<Signature>;

    /// Returns data of the account at `address`.
    fn fetch_account_data(&self, address: &Pubkey) -> Result<Vec<u8>>;

    /// Requests an airdrop and waits until it lands.
    fn request_airdrop(
        &self,
        address: &Pubkey,
        lamports: u64,
    ) -> Result<Signature>;

    /// Returns the balance an account of `len` bytes needs to be rent exempt.
    fn minimum_balance_for_rent_exemption(&self, len: usize) -> Result<u64>;
}

impl Transport for RpcClient {
    fn submit_and_confirm(
        &self,
        instructions: &[Instruction],
        payer: &Pubkey,
        signers: &[&dyn Signer],
    ) -> Result<Signature> {
        let blockhash = self.get_latest_blockhash()?;
        log::debug!("Latest blockhash: {blockhash}");

        let message =
            Message::new_with_blockhash(instructions, Some(payer), &blockhash);
        let mut tx = Transaction::new_unsigned(message);
        tx.try_sign(signers, blockhash)?;

        log::info!(
            "Sending transaction with {} instruction(s)…",
            instructions.len()
        );
        let sig = self.send_and_confirm_transaction(&tx)?;
        log::info!("Signature: {sig}");

        if let Err(err) = log_transaction(self, &sig) {
            log::warn!("Couldn’t fetch transaction {sig}: {err}");
        }
        Ok(sig)
    }

    fn fetch_account_data(&self, address: &Pubkey) -> Result<Vec<u8>> {
        self.get_account_with_commitment(address, self.commitment())?
            .value
            .map(|account| account.data)
            .ok_or(TransportError::NotFound(*address))
    }

    fn request_airdrop(
        &self,
        address: &Pubkey,
        lamports: u64,
    ) -> Result<Signature> {
        log::info!("Requesting airdrop of {lamports} lamports to {address}…");
        let sig = RpcClient::request_airdrop(self, address, lamports)?;
        self.poll_for_signature(&sig)?;
        log::info!("Airdrop received: {sig}");
        Ok(sig)
    }

    fn minimum_balance_for_rent_exemption(&self, len: usize) -> Result<u64> {
        Ok(self.get_minimum_balance_for_rent_exemption(len)?)
    }
}

/// Logs slot and program log messages of an executed transaction.
fn log_transaction(
    client: &RpcClient,
    sig: &Signature,
) -> Result<(), ClientError> {
    let encoding = UiTransactionEncoding::Binary;
    let resp = client.get_transaction(sig, encoding)?;
    let (slot, tx) = (resp.slot, resp.transaction);
    log::debug!("Executed in slot: {slot}");

    let messages = tx.meta.map(|meta| meta.log_messages);
    if let Some(OptionSerializer::Some(messages)) = messages {
        for msg in messages {
            log::debug!("{msg}");
        }
    }
    Ok(())
}

#[cfg(test)]
pub(crate) mod mock {
    use std::cell::RefCell;
    use std::collections::HashMap;

    use echo_booth::echo::{self, EchoInstruction};
    use echo_booth::exchange_booth::{ExchangeBooth, ExchangeBoothInstruction};

    use super::*;

    /// Record of a submitted transaction.
    #[derive(Debug)]
    pub struct Submitted {
        pub instructions: Vec<Instruction>,
        pub payer: Pubkey,
        pub signers: Vec<Pubkey>,
    }

    /// In-memory ledger which mimics what the Echo and Exchange Booth programs
    /// do to account data.
    pub struct MockTransport {
        pub echo_program: Pubkey,
        pub booth_program: Pubkey,
        pub accounts: RefCell<HashMap<Pubkey, Vec<u8>>>,
        pub submitted: RefCell<Vec<Submitted>>,
        pub airdrops: RefCell<Vec<(Pubkey, u64)>>,
    }

    impl MockTransport {
        pub fn new() -> Self {
            Self {
                echo_program: Pubkey::new_unique(),
                booth_program: Pubkey::new_unique(),
                accounts: Default::default(),
                submitted: Default::default(),
                airdrops: Default::default(),
            }
        }

        fn execute(&self, ix: &Instruction) {
            let mut accounts = self.accounts.borrow_mut();
            if ix.program_id == self.echo_program {
                let target = ix.accounts[0].pubkey;
                match EchoInstruction::decode(&ix.data).unwrap() {
                    EchoInstruction::Echo { data } => {
                        accounts.insert(target, data);
                    }
                    EchoInstruction::InitializeAuthorizedEcho {
                        buffer_seed,
                        buffer_size,
                    } => {
                        let (_, bump) = echo_booth::pda::authorized_buffer_address(
                            &ix.accounts[1].pubkey,
                            buffer_seed,
                            &self.echo_program,
                        )
                        .unwrap();
                        let mut buf = vec![0; buffer_size as usize];
                        buf[0] = bump;
                        buf[1..9].copy_from_slice(&buffer_seed.to_le_bytes());
                        accounts.insert(target, buf);
                    }
                    EchoInstruction::AuthorizedEcho { data } => {
                        let buf = accounts.get_mut(&target).unwrap();
                        let text = &mut buf[echo::AUTHORIZED_HEADER_LEN..];
                        text.fill(0);
                        text[..data.len()].copy_from_slice(&data);
                    }
                    other => panic!("unexpected instruction {other:?}"),
                }
            } else if ix.program_id == self.booth_program {
                match ExchangeBoothInstruction::decode(&ix.data).unwrap() {
                    ExchangeBoothInstruction::InitializeExchangeBooth => {
                        let key = |idx: usize| ix.accounts[idx].pubkey;
                        let booth = ExchangeBooth {
                            initialized: true,
                            admin: key(0),
                            mint_a: key(2),
                            mint_b: key(3),
                            vault_a: key(4),
                            vault_b: key(5),
                            oracle: key(6),
                        };
                        accounts.insert(key(1), booth.encode().unwrap());
                    }
                    ExchangeBoothInstruction::Withdraw { .. } => (),
                    ExchangeBoothInstruction::CloseExchangeBooth => {
                        accounts.remove(&ix.accounts[1].pubkey);
                    }
                    other => panic!("unexpected instruction {other:?}"),
                }
            }
        }
    }

    impl Transport for MockTransport {
        fn submit_and_confirm(
            &self,
            instructions: &[Instruction],
            payer: &Pubkey,
            signers: &[&dyn Signer],
        ) -> Result<Signature> {
            let signers =
                signers.iter().map(|signer| signer.pubkey()).collect::<Vec<_>>();
            assert!(signers.contains(payer));
            for ix in instructions {
                for meta in ix.accounts.iter().filter(|meta| meta.is_signer) {
                    assert!(signers.contains(&meta.pubkey), "{meta:?} unsigned");
                }
                self.execute(ix);
            }
            self.submitted.borrow_mut().push(Submitted {
                instructions: instructions.to_vec(),
                payer: *payer,
                signers,
            });
            Ok(Signature::new_unique())
        }

        fn fetch_account_data(&self, address: &Pubkey) -> Result<Vec<u8>> {
            self.accounts
                .borrow()
                .get(address)
                .cloned()
                .ok_or(TransportError::NotFound(*address))
        }

        fn request_airdrop(
            &self,
            address: &Pubkey,
            lamports: u64,
        ) -> Result<Signature> {
            self.airdrops.borrow_mut().push((*address, lamports));
            Ok(Signature::new_unique())
        }

        fn minimum_balance_for_rent_exemption(&self, len: usize) -> Result<u64> {
            Ok(890_880 + 6_960 * len as u64)
        }
    }
}
