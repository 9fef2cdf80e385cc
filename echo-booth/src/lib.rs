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

//! Client-side helpers for talking to the Echo and Exchange Booth Solana
//! programs.
//!
//! Neither program lives in this crate.  What this crate provides is the wire
//! contract with them: the binary layout of instruction data, the order and
//! signer/writable flags of the accounts each instruction expects and the
//! layout of the accounts the programs persist.  Getting any of those wrong
//! doesn’t produce a local error.  The program simply rejects the
//! transaction.
//!
//! The crate is split into three parts:
//!
//! * [`echo`] encodes Echo instructions (plain, authorised and vending machine
//!   variants) and decodes echo buffers,
//! * [`exchange_booth`] encodes Exchange Booth instructions and decodes the
//!   exchange booth record and
//! * [`pda`] derives program-derived addresses using the seed conventions
//!   both programs rely on.
//!
//! All functions are pure.  Submitting the instructions is up to the caller.

pub mod echo;
pub mod error;
pub mod exchange_booth;
pub mod pda;

pub use error::{EncodingError, Error, ValidationError};

pub type Result<T = (), E = Error> = core::result::Result<T, E>;
