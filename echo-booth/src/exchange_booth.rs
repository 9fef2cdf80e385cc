// echo-booth — instruction codecs for the Echo and Exchange Booth Solana
//              programs
// © 2025 by the echo-booth authors
//
// This program is free software; you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free Software
// Foundation; either version 2 of the License, or (at your option) any later
// version.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE.  See the GNU General Public License for more
// details.
//
// You should have received a copy of the GNU General Public License along with
// this program; if not, see <https://www.gnu.org/licenses/>.

//! Exchange Booth program instructions and exchange booth account layout.

use borsh::{BorshDeserialize, BorshSerialize};
use solana_program::instruction::{AccountMeta, Instruction};
use solana_program::pubkey::{Pubkey, PUBKEY_BYTES};

use crate::pda::{self, VaultSide};
use crate::{EncodingError, Result, ValidationError};

/// Length of the `Withdraw` instruction data.
pub const WITHDRAW_LEN: usize = 1 + 8;

/// Instruction discriminants.
pub mod opcode {
    pub const INITIALIZE_EXCHANGE_BOOTH: u8 = 0;
    pub const DEPOSIT: u8 = 1;
    pub const WITHDRAW: u8 = 2;
    pub const EXCHANGE: u8 = 3;
    pub const CLOSE_EXCHANGE_BOOTH: u8 = 4;
}

/// Instruction understood by the Exchange Booth program.
#[derive(Clone, Copy, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub enum ExchangeBoothInstruction {
    InitializeExchangeBooth,
    /// Has no builder.  The program doesn’t define its accounts.
    Deposit,
    Withdraw { amount: u64 },
    Exchange { tokens_to_transfer: u64 },
    CloseExchangeBooth,
}

impl ExchangeBoothInstruction {
    pub fn opcode(&self) -> u8 {
        match self {
            Self::InitializeExchangeBooth => opcode::INITIALIZE_EXCHANGE_BOOTH,
            Self::Deposit => opcode::DEPOSIT,
            Self::Withdraw { .. } => opcode::WITHDRAW,
            Self::Exchange { .. } => opcode::EXCHANGE,
            Self::CloseExchangeBooth => opcode::CLOSE_EXCHANGE_BOOTH,
        }
    }

    /// Serialises the instruction.  Amounts are little-endian `u64`.
    pub fn encode(&self) -> Result<Vec<u8>> {
        borsh::to_vec(self).map_err(|_| ValidationError::Unserializable.into())
    }

    /// Parses instruction data.  Trailing bytes are an error.
    pub fn decode(data: &[u8]) -> Result<Self> {
        borsh::from_slice(data).map_err(|_| EncodingError::Malformed.into())
    }
}

/// Encodes `InitializeExchangeBooth` instruction data.
pub fn encode_init() -> [u8; 1] {
    [opcode::INITIALIZE_EXCHANGE_BOOTH]
}

/// Encodes `Withdraw` instruction data: `[2][amount LE]`.
pub fn encode_withdraw(amount: u64) -> [u8; WITHDRAW_LEN] {
    let mut buf = [0; WITHDRAW_LEN];
    buf[0] = opcode::WITHDRAW;
    buf[1..].copy_from_slice(&amount.to_le_bytes());
    buf
}

/// Accounts taking part in exchange booth initialisation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InitParams {
    pub program_id: Pubkey,
    pub admin: Pubkey,
    pub exchange_booth: Pubkey,
    pub mint_a: Pubkey,
    pub mint_b: Pubkey,
    pub vault_a: Pubkey,
    pub vault_b: Pubkey,
    pub oracle: Pubkey,
}

impl InitParams {
    /// Constructs parameters with vault addresses derived from the exchange
    /// booth address.
    pub fn with_derived_vaults(
        program_id: Pubkey,
        admin: Pubkey,
        exchange_booth: Pubkey,
        mint_a: Pubkey,
        mint_b: Pubkey,
        oracle: Pubkey,
    ) -> Result<Self> {
        let (vault_a, _) =
            pda::vault_address(VaultSide::A, &exchange_booth, &program_id)?;
        let (vault_b, _) =
            pda::vault_address(VaultSide::B, &exchange_booth, &program_id)?;
        Ok(Self {
            program_id,
            admin,
            exchange_booth,
            mint_a,
            mint_b,
            vault_a,
            vault_b,
            oracle,
        })
    }
}

/// Builds an `InitializeExchangeBooth` instruction.
///
/// The account order and flags below are what the program expects; any
/// deviation is rejected on-chain:
///
/// | index | writable | signer | description      |
/// |-------|----------|--------|------------------|
/// | 0     | ❌       | ✅     | admin            |
/// | 1     | ✅       | ❌     | exchange_booth   |
/// | 2     | ❌       | ❌     | mint_a           |
/// | 3     | ❌       | ❌     | mint_b           |
/// | 4     | ✅       | ❌     | vault_a          |
/// | 5     | ✅       | ❌     | vault_b          |
/// | 6     | ❌       | ❌     | oracle           |
/// | 7     | ❌       | ❌     | system_program   |
/// | 8     | ❌       | ❌     | token_program    |
/// | 9     | ❌       | ❌     | rent sysvar      |
pub fn init(params: &InitParams) -> Instruction {
    Instruction {
        program_id: params.program_id,
        accounts: vec![
            AccountMeta::new_readonly(params.admin, true),
            AccountMeta::new(params.exchange_booth, false),
            AccountMeta::new_readonly(params.mint_a, false),
            AccountMeta::new_readonly(params.mint_b, false),
            AccountMeta::new(params.vault_a, false),
            AccountMeta::new(params.vault_b, false),
            AccountMeta::new_readonly(params.oracle, false),
            AccountMeta::new_readonly(solana_program::system_program::ID, false),
            AccountMeta::new_readonly(spl_token::ID, false),
            AccountMeta::new_readonly(solana_program::sysvar::rent::ID, false),
        ],
        data: encode_init().to_vec(),
    }
}

/// Accounts and amount of a withdrawal from one of the vaults.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WithdrawParams {
    pub program_id: Pubkey,
    pub admin: Pubkey,
    pub admins_token_account: Pubkey,
    pub vault: Pubkey,
    pub mint: Pubkey,
    pub exchange_booth: Pubkey,
    /// Must not exceed the vault’s balance.  Only the program can check that.
    pub amount: u64,
}

/// Builds a `Withdraw` instruction.
///
/// | index | writable | signer | description           |
/// |-------|----------|--------|-----------------------|
/// | 0     | ❌       | ✅     | admin                 |
/// | 1     | ✅       | ❌     | admins_token_account  |
/// | 2     | ✅       | ❌     | vault                 |
/// | 3     | ❌       | ❌     | mint                  |
/// | 4     | ❌       | ❌     | exchange_booth        |
/// | 5     | ❌       | ❌     | token_program         |
pub fn withdraw(params: &WithdrawParams) -> Instruction {
    Instruction {
        program_id: params.program_id,
        accounts: vec![
            AccountMeta::new_readonly(params.admin, true),
            AccountMeta::new(params.admins_token_account, false),
            AccountMeta::new(params.vault, false),
            AccountMeta::new_readonly(params.mint, false),
            AccountMeta::new_readonly(params.exchange_booth, false),
            AccountMeta::new_readonly(spl_token::ID, false),
        ],
        data: encode_withdraw(params.amount).to_vec(),
    }
}

/// Accounts and amount of a token exchange.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExchangeParams {
    pub program_id: Pubkey,
    pub user: Pubkey,
    pub user_token_a: Pubkey,
    pub user_token_b: Pubkey,
    pub vault_a: Pubkey,
    pub vault_b: Pubkey,
    pub mint_a: Pubkey,
    pub mint_b: Pubkey,
    pub exchange_booth: Pubkey,
    pub tokens_to_transfer: u64,
}

/// Builds an `Exchange` instruction.
///
/// Accounts: user (signer), user’s token A and token B accounts (writable),
/// both vaults (writable), both mints, exchange booth and token program.
pub fn exchange(params: &ExchangeParams) -> Instruction {
    let data = ExchangeBoothInstruction::Exchange {
        tokens_to_transfer: params.tokens_to_transfer,
    };
    let accounts = vec![
        AccountMeta::new_readonly(params.user, true),
        AccountMeta::new(params.user_token_a, false),
        AccountMeta::new(params.user_token_b, false),
        AccountMeta::new(params.vault_a, false),
        AccountMeta::new(params.vault_b, false),
        AccountMeta::new_readonly(params.mint_a, false),
        AccountMeta::new_readonly(params.mint_b, false),
        AccountMeta::new_readonly(params.exchange_booth, false),
        AccountMeta::new_readonly(spl_token::ID, false),
    ];
    Instruction::new_with_borsh(params.program_id, &data, accounts)
}

/// Builds a `CloseExchangeBooth` instruction.  The exchange booth’s lamports
/// are credited to `admin`.
pub fn close(
    program_id: Pubkey,
    admin: Pubkey,
    exchange_booth: Pubkey,
) -> Instruction {
    let accounts = vec![
        AccountMeta::new(admin, true),
        AccountMeta::new(exchange_booth, false),
    ];
    Instruction::new_with_borsh(
        program_id,
        &ExchangeBoothInstruction::CloseExchangeBooth,
        accounts,
    )
}

/// Exchange booth record as persisted by the program.
#[derive(Clone, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct ExchangeBooth {
    pub initialized: bool,
    pub admin: Pubkey,
    pub mint_a: Pubkey,
    pub mint_b: Pubkey,
    pub vault_a: Pubkey,
    pub vault_b: Pubkey,
    pub oracle: Pubkey,
}

impl ExchangeBooth {
    /// Size of the account: initialised flag followed by six addresses.
    pub const LEN: usize = 1 + 6 * PUBKEY_BYTES;

    /// Decodes account data.  Bytes past [`Self::LEN`] are ignored.
    pub fn decode(raw: &[u8]) -> Result<Self> {
        if raw.len() < Self::LEN {
            return Err(EncodingError::TooShort {
                got: raw.len(),
                min: Self::LEN,
            }
            .into());
        }
        if raw[0] > 1 {
            return Err(EncodingError::InvalidBool(raw[0]).into());
        }
        Self::deserialize(&mut &raw[..])
            .map_err(|_| EncodingError::Malformed.into())
    }

    /// Serialises the record in the layout the program persists.
    pub fn encode(&self) -> Result<Vec<u8>> {
        borsh::to_vec(self).map_err(|_| ValidationError::Unserializable.into())
    }

    /// Returns the vault on given side.
    pub fn vault(&self, side: VaultSide) -> &Pubkey {
        match side {
            VaultSide::A => &self.vault_a,
            VaultSide::B => &self.vault_b,
        }
    }

    /// Returns the mint of tokens held in the vault on given side.
    pub fn mint(&self, side: VaultSide) -> &Pubkey {
        match side {
            VaultSide::A => &self.mint_a,
            VaultSide::B => &self.mint_b,
        }
    }
}
