//! # Identity Registry
//!
//! Stores one [`Identity`] per address and answers the compliance gate.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use fos_core::{Address, ComplianceOracle, CountryCode, FosError, FosResult, Timestamp};

/// A KYC record for one participant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// The participant's account.
    pub address: Address,
    /// Whether the authority currently vouches for this participant.
    pub verified: bool,
    /// When the record was last added.
    pub approved_at: Timestamp,
    /// Verification lapses at this instant.
    pub expiry_date: Timestamp,
    /// Country of residence.
    pub country: CountryCode,
}

impl Identity {
    /// `verified ∧ now < expiry_date`.
    pub fn is_compliant(&self, now: Timestamp) -> bool {
        self.verified && now < self.expiry_date
    }
}

/// The compliance registry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComplianceRegistry {
    authority: Address,
    identities: BTreeMap<Address, Identity>,
}

impl ComplianceRegistry {
    /// Create an empty registry administered by `authority`.
    pub fn new(authority: Address) -> Self {
        Self {
            authority,
            identities: BTreeMap::new(),
        }
    }

    /// The administering authority.
    pub fn authority(&self) -> &Address {
        &self.authority
    }

    /// Verify `address` until `expiry`, overwriting any existing record.
    pub fn add_identity(
        &mut self,
        caller: &Address,
        address: Address,
        expiry: Timestamp,
        country: CountryCode,
        now: Timestamp,
    ) -> FosResult<&Identity> {
        self.require_authority(caller, "add identity")?;
        if expiry <= now {
            tracing::warn!(%address, %expiry, "identity added with an expiry already in the past");
        }
        let identity = Identity {
            address: address.clone(),
            verified: true,
            approved_at: now,
            expiry_date: expiry,
            country,
        };
        tracing::info!(%address, %expiry, country = %identity.country, "identity verified");
        self.identities.insert(address.clone(), identity);
        self.identities
            .get(&address)
            .ok_or_else(|| FosError::NotFound(format!("identity {address}")))
    }

    /// Revoke verification for `address`. The record is retained.
    pub fn remove_identity(&mut self, caller: &Address, address: &Address) -> FosResult<()> {
        self.require_authority(caller, "remove identity")?;
        let identity = self
            .identities
            .get_mut(address)
            .ok_or_else(|| FosError::NotFound(format!("identity {address}")))?;
        identity.verified = false;
        tracing::info!(%address, "identity revoked");
        Ok(())
    }

    /// Extend (or restore) verification for an existing record.
    pub fn renew_identity(
        &mut self,
        caller: &Address,
        address: &Address,
        new_expiry: Timestamp,
    ) -> FosResult<&Identity> {
        self.require_authority(caller, "renew identity")?;
        let identity = self
            .identities
            .get_mut(address)
            .ok_or_else(|| FosError::NotFound(format!("identity {address}")))?;
        identity.expiry_date = new_expiry;
        identity.verified = true;
        tracing::info!(%address, expiry = %new_expiry, "identity renewed");
        Ok(identity)
    }

    /// Whether `address` is verified and unexpired at `now`.
    pub fn is_verified(&self, address: &Address, now: Timestamp) -> bool {
        self.identities
            .get(address)
            .map(|identity| identity.is_compliant(now))
            .unwrap_or(false)
    }

    /// The record for `address`, if one was ever added.
    pub fn get_identity(&self, address: &Address) -> Option<&Identity> {
        self.identities.get(address)
    }

    /// Number of records compliant at `now`.
    pub fn verified_count(&self, now: Timestamp) -> usize {
        self.identities
            .values()
            .filter(|identity| identity.is_compliant(now))
            .count()
    }

    /// All records, ordered by address.
    pub fn identities(&self) -> impl Iterator<Item = &Identity> {
        self.identities.values()
    }

    fn require_authority(&self, caller: &Address, action: &str) -> FosResult<()> {
        if caller != &self.authority {
            return Err(FosError::permission_denied(caller, action));
        }
        Ok(())
    }
}

impl ComplianceOracle for ComplianceRegistry {
    fn is_verified(&self, address: &Address, now: Timestamp) -> bool {
        ComplianceRegistry::is_verified(self, address, now)
    }
}

// ─── Tests ───────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(s: &str) -> Address {
        Address::parse(s).unwrap()
    }

    fn at(s: &str) -> Timestamp {
        Timestamp::parse(s).unwrap()
    }

    fn authority() -> Address {
        addr("0xa0")
    }

    fn us() -> CountryCode {
        CountryCode::parse("US").unwrap()
    }

    fn make_registry() -> ComplianceRegistry {
        ComplianceRegistry::new(authority())
    }

    fn now() -> Timestamp {
        at("2026-01-01T00:00:00Z")
    }

    fn next_year() -> Timestamp {
        at("2027-01-01T00:00:00Z")
    }

    // ── add ──────────────────────────────────────────────────────────

    #[test]
    fn test_add_identity_verifies() {
        let mut reg = make_registry();
        let identity = reg
            .add_identity(&authority(), addr("0x01"), next_year(), us(), now())
            .unwrap();
        assert!(identity.verified);
        assert_eq!(identity.approved_at, now());
        assert!(reg.is_verified(&addr("0x01"), now()));
    }

    #[test]
    fn test_add_identity_requires_authority() {
        let mut reg = make_registry();
        let err = reg
            .add_identity(&addr("0x01"), addr("0x01"), next_year(), us(), now())
            .unwrap_err();
        match err {
            FosError::PermissionDenied { .. } => {}
            other => panic!("Expected PermissionDenied, got: {other:?}"),
        }
        assert!(reg.get_identity(&addr("0x01")).is_none());
    }

    #[test]
    fn test_add_identity_overwrites() {
        let mut reg = make_registry();
        reg.add_identity(&authority(), addr("0x01"), next_year(), us(), now())
            .unwrap();
        reg.remove_identity(&authority(), &addr("0x01")).unwrap();
        let ch = CountryCode::parse("CH").unwrap();
        reg.add_identity(&authority(), addr("0x01"), next_year(), ch.clone(), now())
            .unwrap();
        let identity = reg.get_identity(&addr("0x01")).unwrap();
        assert!(identity.verified);
        assert_eq!(identity.country, ch);
    }

    // ── expiry ───────────────────────────────────────────────────────

    #[test]
    fn test_expiry_is_exclusive() {
        let mut reg = make_registry();
        reg.add_identity(&authority(), addr("0x01"), next_year(), us(), now())
            .unwrap();
        assert!(reg.is_verified(&addr("0x01"), at("2026-12-31T23:59:59Z")));
        assert!(!reg.is_verified(&addr("0x01"), next_year()));
    }

    #[test]
    fn test_unknown_address_not_verified() {
        let reg = make_registry();
        assert!(!reg.is_verified(&addr("0xff"), now()));
    }

    // ── remove ───────────────────────────────────────────────────────

    #[test]
    fn test_remove_retains_record() {
        let mut reg = make_registry();
        reg.add_identity(&authority(), addr("0x01"), next_year(), us(), now())
            .unwrap();
        reg.remove_identity(&authority(), &addr("0x01")).unwrap();
        assert!(!reg.is_verified(&addr("0x01"), now()));
        assert!(reg.get_identity(&addr("0x01")).is_some());
    }

    #[test]
    fn test_remove_unknown_is_not_found() {
        let mut reg = make_registry();
        let err = reg.remove_identity(&authority(), &addr("0x09")).unwrap_err();
        assert_eq!(err.kind(), "NOT_FOUND");
    }

    #[test]
    fn test_remove_requires_authority() {
        let mut reg = make_registry();
        reg.add_identity(&authority(), addr("0x01"), next_year(), us(), now())
            .unwrap();
        let err = reg.remove_identity(&addr("0x01"), &addr("0x01")).unwrap_err();
        assert_eq!(err.kind(), "PERMISSION_DENIED");
        assert!(reg.is_verified(&addr("0x01"), now()));
    }

    // ── renew ────────────────────────────────────────────────────────

    #[test]
    fn test_renew_restores_revoked_identity() {
        let mut reg = make_registry();
        reg.add_identity(&authority(), addr("0x01"), next_year(), us(), now())
            .unwrap();
        reg.remove_identity(&authority(), &addr("0x01")).unwrap();
        let later = at("2028-01-01T00:00:00Z");
        reg.renew_identity(&authority(), &addr("0x01"), later).unwrap();
        assert!(reg.is_verified(&addr("0x01"), at("2027-06-01T00:00:00Z")));
    }

    #[test]
    fn test_renew_expired_identity() {
        let mut reg = make_registry();
        reg.add_identity(&authority(), addr("0x01"), next_year(), us(), now())
            .unwrap();
        let after_expiry = at("2027-02-01T00:00:00Z");
        assert!(!reg.is_verified(&addr("0x01"), after_expiry));
        reg.renew_identity(&authority(), &addr("0x01"), at("2028-01-01T00:00:00Z"))
            .unwrap();
        assert!(reg.is_verified(&addr("0x01"), after_expiry));
    }

    #[test]
    fn test_renew_unknown_is_not_found() {
        let mut reg = make_registry();
        let err = reg
            .renew_identity(&authority(), &addr("0x01"), next_year())
            .unwrap_err();
        assert_eq!(err.kind(), "NOT_FOUND");
    }

    // ── queries ──────────────────────────────────────────────────────

    #[test]
    fn test_verified_count_ignores_revoked_and_expired() {
        let mut reg = make_registry();
        reg.add_identity(&authority(), addr("0x01"), next_year(), us(), now())
            .unwrap();
        reg.add_identity(&authority(), addr("0x02"), next_year(), us(), now())
            .unwrap();
        reg.add_identity(&authority(), addr("0x03"), at("2026-06-01T00:00:00Z"), us(), now())
            .unwrap();
        reg.remove_identity(&authority(), &addr("0x02")).unwrap();
        assert_eq!(reg.verified_count(now()), 2);
        assert_eq!(reg.verified_count(at("2026-07-01T00:00:00Z")), 1);
        assert_eq!(reg.identities().count(), 3);
    }

    #[test]
    fn test_identity_serialization() {
        let mut reg = make_registry();
        reg.add_identity(&authority(), addr("0x01"), next_year(), us(), now())
            .unwrap();
        let json = serde_json::to_string(reg.get_identity(&addr("0x01")).unwrap()).unwrap();
        let parsed: Identity = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.address, addr("0x01"));
        assert_eq!(parsed.country.as_str(), "US");
    }
}
