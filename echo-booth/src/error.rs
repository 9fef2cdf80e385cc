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

//! Local error kinds.
//!
//! Only malformed input is detected here.  Everything the on-chain programs
//! check (balances, signers, account ownership) surfaces as a failed
//! transaction reported by whatever submits the instruction.

/// Error returned by the codecs and address derivation.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    derive_more::Display,
    derive_more::From,
    derive_more::Error,
)]
pub enum Error {
    /// Input to an encoder was malformed.
    Validation(ValidationError),
    /// Data being decoded was malformed.
    Encoding(EncodingError),
    /// Program-derived address search went through all 256 bump seeds without
    /// finding an off-curve address.
    #[display("no valid bump seed found for program-derived address")]
    #[from(ignore)]
    NoValidBumpSeed,
    /// Given bump seed puts the address on the curve.
    #[display("bump seed {_0} yields an on-curve address")]
    #[from(ignore)]
    InvalidBumpSeed(#[error(not(source))] u8),
}

/// Malformed input passed to an encoder.
#[derive(Clone, Copy, Debug, PartialEq, Eq, derive_more::Display, derive_more::Error)]
pub enum ValidationError {
    /// Text doesn’t fit the 32-bit length prefix.
    #[display("text of {len} bytes exceeds u32 length prefix")]
    TextTooLong { len: usize },
    /// Text contains a byte outside of the ASCII range.
    #[display("text contains non-ASCII byte at offset {offset}")]
    NonAsciiText { offset: usize },
    /// Requested buffer can’t hold the buffer header.
    #[display("buffer size {size} is smaller than the {header}-byte header")]
    BufferTooSmall { size: u64, header: u64 },
    /// Requested buffer exceeds the maximum account size.
    #[display("buffer size {size} exceeds maximum account size of {max}")]
    BufferTooLarge { size: u64, max: u64 },
    /// A single seed is longer than the ledger allows.
    #[display("seed of {len} bytes exceeds {max}-byte limit")]
    SeedTooLong { len: usize, max: usize },
    /// Too many seeds to leave room for the bump seed.
    #[display("{count} seeds exceed limit of {max}")]
    TooManySeeds { count: usize, max: usize },
    /// Serialiser rejected the value.
    #[display("value couldn’t be serialised")]
    Unserializable,
}

/// Malformed data passed to a decoder.
#[derive(Clone, Copy, Debug, PartialEq, Eq, derive_more::Display, derive_more::Error)]
pub enum EncodingError {
    /// Instruction data starts with a different discriminant.
    #[display("unexpected opcode {got}, expected {want}")]
    UnexpectedOpcode { got: u8, want: u8 },
    /// Instruction data has a different length than the layout requires.
    #[display("unexpected length {got}, expected {want}")]
    UnexpectedLength { got: usize, want: usize },
    /// Account data is shorter than its fixed header.
    #[display("data of {got} bytes is shorter than {min}-byte header")]
    TooShort { got: usize, min: usize },
    /// Text payload contains a byte outside of the ASCII range.
    #[display("non-ASCII byte {byte:#04x} at offset {offset}")]
    NonAscii { offset: usize, byte: u8 },
    /// A boolean flag is neither zero nor one.
    #[display("invalid boolean value {_0}")]
    InvalidBool(#[error(not(source))] u8),
    /// Payload couldn’t be deserialised.
    #[display("malformed instruction payload")]
    Malformed,
}
