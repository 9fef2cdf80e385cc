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

//! Program-derived address derivation.
//!
//! The seed conventions below are baked into the on-chain programs.  Seed order
//! matters; changing it yields a different address which the program rejects.

use solana_program::pubkey::{Pubkey, MAX_SEEDS, MAX_SEED_LEN};

use crate::{Error, Result, ValidationError};

/// Seed prefix of the authorised echo buffer PDA.
pub const AUTHORITY_SEED: &[u8] = b"authority";

/// Seed prefix of the vending machine echo buffer PDA.
pub const VENDING_MACHINE_SEED: &[u8] = b"vending_machine";

/// Maximum number of caller-provided seeds.  One slot is reserved for the bump.
pub const MAX_USER_SEEDS: usize = MAX_SEEDS - 1;

/// One of the two token vaults of an exchange booth.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum VaultSide {
    A,
    B,
}

impl VaultSide {
    /// Returns the domain seed identifying the vault.
    pub const fn seed(self) -> &'static [u8] {
        match self {
            Self::A => b"vault_a",
            Self::B => b"vault_b",
        }
    }
}

/// Finds the canonical program-derived address for given seeds.
///
/// Tries bump seeds from 255 down to 0 and returns the first address which
/// doesn’t lie on the ed25519 curve together with the bump seed used.  The
/// search is deterministic so the same seeds and program always produce the
/// same result.
///
/// Returns a [`ValidationError`] if any seed is longer than [`MAX_SEED_LEN`] or
/// there are more than [`MAX_USER_SEEDS`] seeds, and
/// [`Error::NoValidBumpSeed`] if no bump seed produces a valid address.
pub fn derive_address(
    seeds: &[&[u8]],
    program_id: &Pubkey,
) -> Result<(Pubkey, u8)> {
    check_seeds(seeds)?;
    Pubkey::try_find_program_address(seeds, program_id)
        .ok_or(Error::NoValidBumpSeed)
}

/// Computes the program-derived address for given seeds and a known bump
/// seed.
///
/// This is what the programs do when re-verifying an address against a bump
/// they stored in account data.
pub fn create_address(
    seeds: &[&[u8]],
    bump: u8,
    program_id: &Pubkey,
) -> Result<Pubkey> {
    check_seeds(seeds)?;
    let bump_seed = [bump];
    let seeds = seeds
        .iter()
        .copied()
        .chain(core::iter::once(&bump_seed[..]))
        .collect::<Vec<_>>();
    Pubkey::create_program_address(&seeds, program_id)
        .map_err(|_| Error::InvalidBumpSeed(bump))
}

/// Derives address of the authorised echo buffer owned by `authority`.
///
/// Seeds: `["authority", authority, buffer_seed as u64 LE]`.
pub fn authorized_buffer_address(
    authority: &Pubkey,
    buffer_seed: u64,
    program_id: &Pubkey,
) -> Result<(Pubkey, u8)> {
    derive_address(
        &[AUTHORITY_SEED, authority.as_ref(), &buffer_seed.to_le_bytes()],
        program_id,
    )
}

/// Derives address of the vending machine echo buffer.
///
/// Seeds: `["vending_machine", mint, price as u64 LE]`.
pub fn vending_machine_address(
    mint: &Pubkey,
    price: u64,
    program_id: &Pubkey,
) -> Result<(Pubkey, u8)> {
    derive_address(
        &[VENDING_MACHINE_SEED, mint.as_ref(), &price.to_le_bytes()],
        program_id,
    )
}

/// Derives address of one of the exchange booth’s vaults.
///
/// Seeds: `["vault_a" | "vault_b", exchange_booth]`.
pub fn vault_address(
    side: VaultSide,
    exchange_booth: &Pubkey,
    program_id: &Pubkey,
) -> Result<(Pubkey, u8)> {
    derive_address(&[side.seed(), exchange_booth.as_ref()], program_id)
}

/// Checks seeds against the ledger’s per-seed length and seed count limits.
fn check_seeds(seeds: &[&[u8]]) -> Result {
    if seeds.len() > MAX_USER_SEEDS {
        return Err(ValidationError::TooManySeeds {
            count: seeds.len(),
            max: MAX_USER_SEEDS,
        }
        .into());
    }
    match seeds.iter().find(|seed| seed.len() > MAX_SEED_LEN) {
        Some(seed) => Err(ValidationError::SeedTooLong {
            len: seed.len(),
            max: MAX_SEED_LEN,
        }
        .into()),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_derive_is_deterministic() {
        let program_id = Pubkey::new_unique();
        let seeds: &[&[u8]] = &[b"foo", b"bar"];
        let first = derive_address(seeds, &program_id).unwrap();
        let second = derive_address(seeds, &program_id).unwrap();
        assert_eq!(first, second);
        assert_eq!(Pubkey::find_program_address(seeds, &program_id), first);
    }

    #[test]
    fn test_derive_result_is_off_curve() {
        let program_id = Pubkey::new_unique();
        let (address, _) = derive_address(&[b"seed"], &program_id).unwrap();
        assert!(!address.is_on_curve());
    }

    #[test]
    fn test_create_matches_derive() {
        let program_id = Pubkey::new_unique();
        let authority = Pubkey::new_unique();
        let seed = 42u64.to_le_bytes();
        let seeds: &[&[u8]] = &[AUTHORITY_SEED, authority.as_ref(), &seed];
        let (address, bump) = derive_address(seeds, &program_id).unwrap();
        assert_eq!(Ok(address), create_address(seeds, bump, &program_id));
    }

    #[test]
    fn test_authorized_buffer_seeds() {
        let program_id = Pubkey::new_unique();
        let authority = Pubkey::new_unique();
        let want = Pubkey::find_program_address(
            &[b"authority", authority.as_ref(), &7u64.to_le_bytes()],
            &program_id,
        );
        assert_eq!(
            Ok(want),
            authorized_buffer_address(&authority, 7, &program_id)
        );
        assert_ne!(
            Ok(want),
            authorized_buffer_address(&authority, 8, &program_id)
        );
    }

    #[test]
    fn test_vending_machine_seeds() {
        let program_id = Pubkey::new_unique();
        let mint = Pubkey::new_unique();
        let want = Pubkey::find_program_address(
            &[b"vending_machine", mint.as_ref(), &100u64.to_le_bytes()],
            &program_id,
        );
        assert_eq!(Ok(want), vending_machine_address(&mint, 100, &program_id));
    }

    #[test]
    fn test_vaults_differ() {
        let program_id = Pubkey::new_unique();
        for _ in 0..8 {
            let booth = Pubkey::new_unique();
            let (a, _) = vault_address(VaultSide::A, &booth, &program_id)
                .unwrap();
            let (b, _) = vault_address(VaultSide::B, &booth, &program_id)
                .unwrap();
            assert_ne!(a, b);
        }
    }

    #[test]
    fn test_seed_too_long() {
        let program_id = Pubkey::new_unique();
        let seed = [0u8; MAX_SEED_LEN + 1];
        assert_eq!(
            Err(Error::Validation(ValidationError::SeedTooLong {
                len: 33,
                max: 32
            })),
            derive_address(&[&seed[..]], &program_id)
        );
        // Exactly 32 bytes is fine.
        derive_address(&[&seed[1..]], &program_id).unwrap();
    }

    #[test]
    fn test_too_many_seeds() {
        let program_id = Pubkey::new_unique();
        let seeds = [&b"x"[..]; MAX_SEEDS];
        assert_eq!(
            Err(Error::Validation(ValidationError::TooManySeeds {
                count: 16,
                max: 15
            })),
            derive_address(&seeds, &program_id)
        );
        derive_address(&seeds[1..], &program_id).unwrap();
    }

    #[test]
    fn test_create_rejects_skipped_bumps() {
        let program_id = Pubkey::new_unique();
        // Every bump above the canonical one was skipped by the search because
        // it put the address on the curve.
        let found = (0..64).map(|_| Pubkey::new_unique()).find(|booth| {
            let (_, bump) =
                vault_address(VaultSide::A, booth, &program_id).unwrap();
            bump < u8::MAX
        });
        if let Some(booth) = found {
            let seeds: &[&[u8]] = &[b"vault_a", booth.as_ref()];
            assert_eq!(
                Err(Error::InvalidBumpSeed(u8::MAX)),
                create_address(seeds, u8::MAX, &program_id)
            );
        }
    }
}
