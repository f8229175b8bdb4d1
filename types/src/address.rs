//! Syntactic validation for ledger identifiers.
//!
//! Wallet addresses are Stellar-style account ids: 56 characters, a `G`
//! prefix, and the RFC 4648 base32 alphabet. Transaction hashes are 64 hex
//! characters. Only the shape is checked here; whether an address or
//! transaction actually exists is the ledger gateway's business.

const WALLET_ADDRESS_LENGTH: usize = 56;
const TRANSACTION_HASH_LENGTH: usize = 64;

pub fn is_valid_wallet_address(address: &str) -> bool {
    address.len() == WALLET_ADDRESS_LENGTH
        && address.starts_with('G')
        && address
            .bytes()
            .all(|b| b.is_ascii_uppercase() || (b'2'..=b'7').contains(&b))
}

pub fn is_valid_transaction_hash(hash: &str) -> bool {
    hash.len() == TRANSACTION_HASH_LENGTH && hash.bytes().all(|b| b.is_ascii_hexdigit())
}

#[cfg(test)]
mod tests {
    use super::*;

    const GOOD_ADDRESS: &str = "GBQ3DQOA7NF52FVV7ES3CR3ZMHUEY4LTHDAQKDTO6S546JCLFPEQGCPK";

    #[test]
    fn accepts_well_formed_wallet_address() {
        assert!(is_valid_wallet_address(GOOD_ADDRESS));
    }

    #[test]
    fn rejects_malformed_wallet_addresses() {
        // Wrong prefix
        assert!(!is_valid_wallet_address(
            "SBQ3DQOA7NF52FVV7ES3CR3ZMHUEY4LTHDAQKDTO6S546JCLFPEQGCPK"
        ));
        // Too short
        assert!(!is_valid_wallet_address("GBQ3DQOA"));
        // Digits outside the base32 alphabet
        assert!(!is_valid_wallet_address(
            "G1Q3DQOA7NF52FVV7ES3CR3ZMHUEY4LTHDAQKDTO6S546JCLFPEQGCPK"
        ));
        // Lowercase
        assert!(!is_valid_wallet_address(&GOOD_ADDRESS.to_lowercase()));
        assert!(!is_valid_wallet_address(""));
    }

    #[test]
    fn accepts_well_formed_transaction_hash() {
        assert!(is_valid_transaction_hash(
            "e3f4b6167243118d60284cd18c7d9e16be776a4cec0713516239d49c680928c7"
        ));
        assert!(is_valid_transaction_hash(
            "E3F4B6167243118D60284CD18C7D9E16BE776A4CEC0713516239D49C680928C7"
        ));
    }

    #[test]
    fn rejects_malformed_transaction_hashes() {
        assert!(!is_valid_transaction_hash("e3f4b616"));
        assert!(!is_valid_transaction_hash(
            "z3f4b6167243118d60284cd18c7d9e16be776a4cec0713516239d49c680928c7"
        ));
        assert!(!is_valid_transaction_hash(""));
    }
}
