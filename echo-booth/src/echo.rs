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

//! Echo program instructions and echo buffer layout.
//!
//! Instruction data is a Borsh-serialised [`EchoInstruction`]: a one-byte
//! discriminant followed by the variant’s fields in little-endian.  Text
//! payloads are length-prefixed with a 32-bit length.
//!
//! The program copies echoed text into a buffer account.  A plain buffer holds
//! nothing but NUL-padded text.  An authorised buffer is a program-derived
//! account which starts with a 9-byte header (bump seed and buffer seed)
//! followed by NUL-padded text.

use borsh::{BorshDeserialize, BorshSerialize};
use solana_program::instruction::{AccountMeta, Instruction};
use solana_program::pubkey::Pubkey;

use crate::{pda, EncodingError, Error, Result, ValidationError};

/// Length of the header of an authorised echo buffer: bump seed followed by
/// the buffer seed.
pub const AUTHORIZED_HEADER_LEN: usize = 1 + 8;

/// Length of the header of a vending machine echo buffer: bump seed, price,
/// mint address and length of the echo data.
pub const VENDING_MACHINE_HEADER_LEN: usize = 1 + 8 + 32 + 4;

/// Length of the `InitializeAuthorizedEcho` instruction data.
pub const INITIALIZE_LEN: usize = 1 + 8 + 8;

/// Maximum size of an account the programs can allocate.
const MAX_BUFFER_SIZE: u64 = solana_system_interface::MAX_PERMITTED_DATA_LENGTH;

/// Instruction discriminants.
pub mod opcode {
    pub const ECHO: u8 = 0;
    pub const INITIALIZE_AUTHORIZED_ECHO: u8 = 1;
    pub const AUTHORIZED_ECHO: u8 = 2;
    pub const INITIALIZE_VENDING_MACHINE_ECHO: u8 = 3;
    pub const VENDING_MACHINE_ECHO: u8 = 4;
}

/// Instruction understood by the Echo program.
#[derive(Clone, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub enum EchoInstruction {
    /// Copies `data` into a plain echo buffer.
    ///
    /// Accounts:
    /// | index | writable | signer | description                       |
    /// |-------|----------|--------|-----------------------------------|
    /// | 0     | ✅       | ❌     | echo_buffer: destination account  |
    Echo { data: Vec<u8> },

    /// Creates an authorised echo buffer of `buffer_size` bytes at the PDA
    /// derived from the authority and `buffer_seed`.
    ///
    /// Accounts:
    /// | index | writable | signer | description                       |
    /// |-------|----------|--------|-----------------------------------|
    /// | 0     | ✅       | ❌     | authorized_buffer: PDA to create  |
    /// | 1     | ❌       | ✅     | authority: owner of the buffer    |
    /// | 2     | ❌       | ❌     | system_program                    |
    InitializeAuthorizedEcho { buffer_seed: u64, buffer_size: u64 },

    /// Overwrites text in an authorised echo buffer.
    ///
    /// Accounts:
    /// | index | writable | signer | description                       |
    /// |-------|----------|--------|-----------------------------------|
    /// | 0     | ✅       | ❌     | authorized_buffer                 |
    /// | 1     | ❌       | ✅     | authority                         |
    AuthorizedEcho { data: Vec<u8> },

    /// Creates a vending machine echo buffer at the PDA derived from the mint
    /// and `price`.
    ///
    /// Accounts:
    /// | index | writable | signer | description                       |
    /// |-------|----------|--------|-----------------------------------|
    /// | 0     | ✅       | ❌     | vending_machine_buffer: PDA       |
    /// | 1     | ❌       | ❌     | vending_machine_mint              |
    /// | 2     | ✅       | ✅     | payer                             |
    /// | 3     | ❌       | ❌     | system_program                    |
    InitializeVendingMachineEcho { price: u64, buffer_size: u64 },

    /// Burns `price` tokens from the user and overwrites text in the vending
    /// machine buffer.
    ///
    /// Accounts:
    /// | index | writable | signer | description                       |
    /// |-------|----------|--------|-----------------------------------|
    /// | 0     | ✅       | ❌     | vending_machine_buffer            |
    /// | 1     | ❌       | ✅     | user                              |
    /// | 2     | ✅       | ❌     | user_token_account                |
    /// | 3     | ✅       | ❌     | vending_machine_mint              |
    /// | 4     | ❌       | ❌     | token_program                     |
    VendingMachineEcho { data: Vec<u8> },
}

impl EchoInstruction {
    /// Returns the instruction’s discriminant.
    pub fn opcode(&self) -> u8 {
        match self {
            Self::Echo { .. } => opcode::ECHO,
            Self::InitializeAuthorizedEcho { .. } => {
                opcode::INITIALIZE_AUTHORIZED_ECHO
            }
            Self::AuthorizedEcho { .. } => opcode::AUTHORIZED_ECHO,
            Self::InitializeVendingMachineEcho { .. } => {
                opcode::INITIALIZE_VENDING_MACHINE_ECHO
            }
            Self::VendingMachineEcho { .. } => opcode::VENDING_MACHINE_ECHO,
        }
    }

    /// Serialises the instruction into instruction data.
    ///
    /// Fails if a text payload doesn’t fit the 32-bit length prefix.
    pub fn encode(&self) -> Result<Vec<u8>> {
        match self {
            Self::Echo { data }
            | Self::AuthorizedEcho { data }
            | Self::VendingMachineEcho { data } => check_len(data)?,
            Self::InitializeAuthorizedEcho { .. }
            | Self::InitializeVendingMachineEcho { .. } => (),
        }
        borsh::to_vec(self).map_err(|_| ValidationError::Unserializable.into())
    }

    /// Parses instruction data.  Trailing bytes are an error.
    pub fn decode(data: &[u8]) -> Result<Self> {
        borsh::from_slice(data).map_err(|_| EncodingError::Malformed.into())
    }
}

/// Encodes `InitializeAuthorizedEcho` instruction data:
/// `[1][buffer_seed LE][buffer_size LE]`.
///
/// `buffer_size` is the size of the whole account and must leave room for the
/// [`AUTHORIZED_HEADER_LEN`]-byte header.  It must also not exceed the maximum
/// account size.
pub fn encode_initialize(
    buffer_seed: u64,
    buffer_size: u64,
) -> Result<[u8; INITIALIZE_LEN]> {
    check_buffer_size(buffer_size, AUTHORIZED_HEADER_LEN)?;
    let mut buf = [0; INITIALIZE_LEN];
    buf[0] = opcode::INITIALIZE_AUTHORIZED_ECHO;
    buf[1..9].copy_from_slice(&buffer_seed.to_le_bytes());
    buf[9..].copy_from_slice(&buffer_size.to_le_bytes());
    Ok(buf)
}

/// Decodes `InitializeAuthorizedEcho` instruction data into
/// `(buffer_seed, buffer_size)`.
pub fn decode_initialize_args(data: &[u8]) -> Result<(u64, u64)> {
    if data.len() != INITIALIZE_LEN {
        return Err(EncodingError::UnexpectedLength {
            got: data.len(),
            want: INITIALIZE_LEN,
        }
        .into());
    }
    check_opcode(data, opcode::INITIALIZE_AUTHORIZED_ECHO)?;
    match EchoInstruction::decode(data)? {
        EchoInstruction::InitializeAuthorizedEcho { buffer_seed, buffer_size } => {
            Ok((buffer_seed, buffer_size))
        }
        _ => Err(EncodingError::Malformed.into()),
    }
}

/// Encodes `AuthorizedEcho` instruction data: `[2][len u32 LE][text]`.
///
/// The text isn’t truncated.  If it doesn’t fit the buffer, the program fails
/// the transaction.
pub fn encode_echo(text: &str) -> Result<Vec<u8>> {
    check_text(text)?;
    EchoInstruction::AuthorizedEcho { data: text.as_bytes().to_vec() }.encode()
}

/// Builds an `Echo` instruction writing `text` into a plain echo buffer.
pub fn echo(
    program_id: Pubkey,
    echo_buffer: Pubkey,
    text: &str,
) -> Result<Instruction> {
    check_text(text)?;
    let data = EchoInstruction::Echo { data: text.as_bytes().to_vec() };
    Ok(Instruction {
        program_id,
        accounts: vec![AccountMeta::new(echo_buffer, false)],
        data: data.encode()?,
    })
}

/// Builds an `InitializeAuthorizedEcho` instruction.
///
/// Derives the authorised buffer address from `authority` and `buffer_seed`.
/// On success returns the instruction together with the buffer’s address and
/// bump seed.
pub fn initialize_authorized_echo(
    program_id: Pubkey,
    authority: Pubkey,
    buffer_seed: u64,
    buffer_size: u64,
) -> Result<(Instruction, Pubkey, u8)> {
    let data = encode_initialize(buffer_seed, buffer_size)?;
    let (buffer, bump) =
        pda::authorized_buffer_address(&authority, buffer_seed, &program_id)?;
    let instruction = Instruction {
        program_id,
        accounts: vec![
            AccountMeta::new(buffer, false),
            AccountMeta::new_readonly(authority, true),
            AccountMeta::new_readonly(solana_program::system_program::ID, false),
        ],
        data: data.to_vec(),
    };
    Ok((instruction, buffer, bump))
}

/// Builds an `AuthorizedEcho` instruction signed by `authority`.
pub fn authorized_echo(
    program_id: Pubkey,
    authorized_buffer: Pubkey,
    authority: Pubkey,
    text: &str,
) -> Result<Instruction> {
    authorized_echo_impl(program_id, authorized_buffer, authority, text, true)
}

/// Builds an `AuthorizedEcho` instruction where the authority is not marked
/// as a signer.
///
/// The program rejects such an instruction.  Useful for checking that it does.
pub fn authorized_echo_unsigned(
    program_id: Pubkey,
    authorized_buffer: Pubkey,
    authority: Pubkey,
    text: &str,
) -> Result<Instruction> {
    authorized_echo_impl(program_id, authorized_buffer, authority, text, false)
}

fn authorized_echo_impl(
    program_id: Pubkey,
    authorized_buffer: Pubkey,
    authority: Pubkey,
    text: &str,
    authority_is_signer: bool,
) -> Result<Instruction> {
    Ok(Instruction {
        program_id,
        accounts: vec![
            AccountMeta::new(authorized_buffer, false),
            AccountMeta::new_readonly(authority, authority_is_signer),
        ],
        data: encode_echo(text)?,
    })
}

/// Builds an `InitializeVendingMachineEcho` instruction.
///
/// Returns the instruction together with the vending machine buffer’s address
/// and bump seed.
pub fn initialize_vending_machine_echo(
    program_id: Pubkey,
    vending_machine_mint: Pubkey,
    payer: Pubkey,
    price: u64,
    buffer_size: u64,
) -> Result<(Instruction, Pubkey, u8)> {
    check_buffer_size(buffer_size, VENDING_MACHINE_HEADER_LEN)?;
    let (buffer, bump) =
        pda::vending_machine_address(&vending_machine_mint, price, &program_id)?;
    let data =
        EchoInstruction::InitializeVendingMachineEcho { price, buffer_size };
    let instruction = Instruction {
        program_id,
        accounts: vec![
            AccountMeta::new(buffer, false),
            AccountMeta::new_readonly(vending_machine_mint, false),
            AccountMeta::new(payer, true),
            AccountMeta::new_readonly(solana_program::system_program::ID, false),
        ],
        data: data.encode()?,
    };
    Ok((instruction, buffer, bump))
}

/// Builds a `VendingMachineEcho` instruction.
pub fn vending_machine_echo(
    program_id: Pubkey,
    vending_machine_buffer: Pubkey,
    user: Pubkey,
    user_token_account: Pubkey,
    vending_machine_mint: Pubkey,
    text: &str,
) -> Result<Instruction> {
    check_text(text)?;
    let data = EchoInstruction::VendingMachineEcho {
        data: text.as_bytes().to_vec(),
    };
    Ok(Instruction {
        program_id,
        accounts: vec![
            AccountMeta::new(vending_machine_buffer, false),
            AccountMeta::new_readonly(user, true),
            AccountMeta::new(user_token_account, false),
            AccountMeta::new(vending_machine_mint, false),
            AccountMeta::new_readonly(spl_token::ID, false),
        ],
        data: data.encode()?,
    })
}

/// Contents of a plain echo buffer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EchoBuffer {
    pub text: String,
}

impl EchoBuffer {
    /// Decodes account data.  The whole data is NUL-padded ASCII text.
    pub fn decode(raw: &[u8]) -> Result<Self> {
        decode_text(raw, 0).map(|text| Self { text })
    }
}

/// Contents of an authorised echo buffer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuthorizedEchoBuffer {
    pub bump_seed: u8,
    pub buffer_seed: u64,
    pub text: String,
}

impl AuthorizedEchoBuffer {
    /// Decodes account data: bump seed, little-endian buffer seed and
    /// NUL-padded ASCII text.
    pub fn decode(raw: &[u8]) -> Result<Self> {
        if raw.len() < AUTHORIZED_HEADER_LEN {
            return Err(EncodingError::TooShort {
                got: raw.len(),
                min: AUTHORIZED_HEADER_LEN,
            }
            .into());
        }
        let (head, text) = raw.split_at(AUTHORIZED_HEADER_LEN);
        let mut buffer_seed = [0; 8];
        buffer_seed.copy_from_slice(&head[1..]);
        Ok(Self {
            bump_seed: head[0],
            buffer_seed: u64::from_le_bytes(buffer_seed),
            text: decode_text(text, AUTHORIZED_HEADER_LEN)?,
        })
    }

    /// Recomputes the buffer’s address from the stored seeds.
    ///
    /// The program performs the same check before writing to the buffer.  An
    /// address different from the account’s is a sign the buffer doesn’t
    /// belong to `authority`.
    pub fn address(
        &self,
        authority: &Pubkey,
        program_id: &Pubkey,
    ) -> Result<Pubkey> {
        pda::create_address(
            &[
                pda::AUTHORITY_SEED,
                authority.as_ref(),
                &self.buffer_seed.to_le_bytes(),
            ],
            self.bump_seed,
            program_id,
        )
    }
}

/// Contents of a vending machine echo buffer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VendingMachineEchoBuffer {
    pub bump_seed: u8,
    pub price: u64,
    pub vending_machine_mint: Pubkey,
    pub text: String,
}

/// Borsh layout of a vending machine buffer as the program writes it.
#[derive(BorshDeserialize)]
struct VendingMachineLayout {
    bump_seed: u8,
    price: u64,
    vending_machine_mint: Pubkey,
    echo_data: Vec<u8>,
}

impl VendingMachineEchoBuffer {
    /// Decodes account data: bump seed, little-endian price, mint address and
    /// length-prefixed NUL-padded ASCII text.  Bytes past the text are
    /// ignored.
    pub fn decode(raw: &[u8]) -> Result<Self> {
        if raw.len() < VENDING_MACHINE_HEADER_LEN {
            return Err(EncodingError::TooShort {
                got: raw.len(),
                min: VENDING_MACHINE_HEADER_LEN,
            }
            .into());
        }
        let layout = VendingMachineLayout::deserialize(&mut &raw[..])
            .map_err(|_| EncodingError::Malformed)?;
        Ok(Self {
            bump_seed: layout.bump_seed,
            price: layout.price,
            vending_machine_mint: layout.vending_machine_mint,
            text: decode_text(&layout.echo_data, VENDING_MACHINE_HEADER_LEN)?,
        })
    }

    /// Recomputes the buffer’s address from the stored price and mint.
    pub fn address(&self, program_id: &Pubkey) -> Result<Pubkey> {
        pda::create_address(
            &[
                pda::VENDING_MACHINE_SEED,
                self.vending_machine_mint.as_ref(),
                &self.price.to_le_bytes(),
            ],
            self.bump_seed,
            program_id,
        )
    }
}

/// Any kind of decoded echo buffer.
#[derive(Clone, Debug, PartialEq, Eq, derive_more::From)]
pub enum DecodedBuffer {
    Plain(EchoBuffer),
    Authorized(AuthorizedEchoBuffer),
    VendingMachine(VendingMachineEchoBuffer),
}

impl DecodedBuffer {
    /// Returns the text stored in the buffer.
    pub fn text(&self) -> &str {
        match self {
            Self::Plain(buf) => &buf.text,
            Self::Authorized(buf) => &buf.text,
            Self::VendingMachine(buf) => &buf.text,
        }
    }
}

/// Decodes echo buffer account data.
///
/// With `authorized` set the data is parsed as an [`AuthorizedEchoBuffer`],
/// otherwise as a plain [`EchoBuffer`].  Trailing NUL bytes are stripped from
/// the text.  Non-ASCII bytes are an [`EncodingError`].
pub fn decode_buffer(raw: &[u8], authorized: bool) -> Result<DecodedBuffer> {
    if authorized {
        AuthorizedEchoBuffer::decode(raw).map(DecodedBuffer::from)
    } else {
        EchoBuffer::decode(raw).map(DecodedBuffer::from)
    }
}

/// Strips trailing NULs and checks the rest is ASCII.  `offset` is only used
/// for error reporting.
fn decode_text(raw: &[u8], offset: usize) -> Result<String> {
    let end = raw.iter().rposition(|byte| *byte != 0).map_or(0, |pos| pos + 1);
    let raw = &raw[..end];
    if let Some(pos) = raw.iter().position(|byte| !byte.is_ascii()) {
        return Err(EncodingError::NonAscii {
            offset: offset + pos,
            byte: raw[pos],
        }
        .into());
    }
    Ok(raw.iter().copied().map(char::from).collect())
}

/// Checks text is ASCII and fits the length prefix.
fn check_text(text: &str) -> Result {
    if let Some(offset) = text.bytes().position(|byte| !byte.is_ascii()) {
        return Err(ValidationError::NonAsciiText { offset }.into());
    }
    check_len(text.as_bytes())
}

fn check_len(data: &[u8]) -> Result {
    match u32::try_from(data.len()) {
        Ok(_) => Ok(()),
        Err(_) => Err(ValidationError::TextTooLong { len: data.len() }.into()),
    }
}

fn check_buffer_size(size: u64, header: usize) -> Result {
    let header = header as u64;
    if size < header {
        Err(ValidationError::BufferTooSmall { size, header }.into())
    } else if size > MAX_BUFFER_SIZE {
        Err(ValidationError::BufferTooLarge { size, max: MAX_BUFFER_SIZE }
            .into())
    } else {
        Ok(())
    }
}

fn check_opcode(data: &[u8], want: u8) -> Result {
    match data.first() {
        Some(&got) if got == want => Ok(()),
        Some(&got) => Err(EncodingError::UnexpectedOpcode { got, want }.into()),
        None => Err(Error::Encoding(EncodingError::UnexpectedLength {
            got: 0,
            want: 1,
        })),
    }
}
