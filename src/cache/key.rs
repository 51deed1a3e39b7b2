//! Cache key derivation.
//!
//! A key is a namespace prefix followed by the hex encoding of a 128-bit
//! digest (the leading half of SHA-256) over the present parts joined with
//! `:`. Keys are stable across processes, so every instance sharing a store
//! agrees on them.

use std::fmt;
use std::time::Duration;

use sha2::{Digest, Sha256};

/// Digest bytes kept in a key (128 bits).
const KEY_DIGEST_BYTES: usize = 16;

/// Suffix used when every part is absent.
pub const DEFAULT_KEY_SUFFIX: &str = "default";

/// Key-space partitions. Prefixes never overlap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheNamespace {
    Weather,
    FoodRecommendation,
    FoodDetails,
    Geolocation,
}

impl CacheNamespace {
    pub const ALL: [CacheNamespace; 4] = [
        CacheNamespace::Weather,
        CacheNamespace::FoodRecommendation,
        CacheNamespace::FoodDetails,
        CacheNamespace::Geolocation,
    ];

    /// Key prefix, e.g. `w:`.
    pub fn prefix(&self) -> &'static str {
        match self {
            CacheNamespace::Weather => "w:",
            CacheNamespace::FoodRecommendation => "fr:",
            CacheNamespace::FoodDetails => "fd:",
            CacheNamespace::Geolocation => "geo:",
        }
    }

    /// Tag used in logs and metric labels.
    pub fn name(&self) -> &'static str {
        match self {
            CacheNamespace::Weather => "weather",
            CacheNamespace::FoodRecommendation => "food-recommendation",
            CacheNamespace::FoodDetails => "food-details",
            CacheNamespace::Geolocation => "geolocation",
        }
    }

    /// Expiration applied to entries in this namespace.
    pub fn ttl(&self) -> Duration {
        match self {
            CacheNamespace::Weather => Duration::from_secs(600),
            CacheNamespace::FoodRecommendation => Duration::from_secs(6 * 3600),
            CacheNamespace::FoodDetails => Duration::from_secs(24 * 3600),
            CacheNamespace::Geolocation => Duration::from_secs(3600),
        }
    }

    /// Namespace owning `key`, if any.
    pub fn of_key(key: &str) -> Option<CacheNamespace> {
        Self::ALL.into_iter().find(|ns| key.starts_with(ns.prefix()))
    }

    /// Derive a key in this namespace. See [`generate_key`].
    pub fn key<I, P>(&self, parts: I) -> String
    where
        I: IntoIterator<Item = Option<P>>,
        P: fmt::Display,
    {
        generate_key(self.prefix(), parts)
    }
}

impl fmt::Display for CacheNamespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Derive a cache key from a namespace prefix and ordered parts.
///
/// Absent parts are dropped before hashing, keeping the order of the rest.
/// With no parts left the key is `namespace + "default"`.
pub fn generate_key<I, P>(namespace: &str, parts: I) -> String
where
    I: IntoIterator<Item = Option<P>>,
    P: fmt::Display,
{
    let present: Vec<String> = parts.into_iter().flatten().map(|p| p.to_string()).collect();
    if present.is_empty() {
        return format!("{namespace}{DEFAULT_KEY_SUFFIX}");
    }

    let digest = Sha256::digest(present.join(":").as_bytes());
    let mut key = String::with_capacity(namespace.len() + KEY_DIGEST_BYTES * 2);
    key.push_str(namespace);
    for byte in &digest[..KEY_DIGEST_BYTES] {
        key.push_str(&format!("{byte:02x}"));
    }
    key
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deterministic() {
        let a = generate_key("w:", [Some("10.00"), Some("20.00"), Some("vi")]);
        let b = generate_key("w:", [Some("10.00"), Some("20.00"), Some("vi")]);
        assert_eq!(a, b);
    }

    #[test]
    fn absent_parts_are_dropped() {
        let with_gap = generate_key("w:", [Some("10.00"), None, Some("vi")]);
        let without = generate_key("w:", [Some("10.00"), Some("vi")]);
        assert_eq!(with_gap, without);
    }

    #[test]
    fn all_absent_is_default() {
        assert_eq!(generate_key::<_, &str>("geo:", [None, None]), "geo:default");
        assert_eq!(
            generate_key::<_, &str>("fr:", std::iter::empty()),
            "fr:default"
        );
    }

    #[test]
    fn key_is_prefix_plus_128_bit_hex() {
        let key = generate_key("fd:", [Some("pho"), Some("vi")]);
        let hash = key.strip_prefix("fd:").unwrap();
        assert_eq!(hash.len(), 32);
        assert!(hash.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn order_matters() {
        let a = generate_key("fr:", [Some("a"), Some("b")]);
        let b = generate_key("fr:", [Some("b"), Some("a")]);
        assert_ne!(a, b);
    }

    #[test]
    fn namespaces_do_not_collide() {
        let parts = [Some("same")];
        let keys: Vec<String> = CacheNamespace::ALL.iter().map(|ns| ns.key(parts)).collect();
        for (i, a) in keys.iter().enumerate() {
            for b in &keys[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn numeric_parts_stringify() {
        assert_eq!(
            generate_key("w:", [Some(6)]),
            generate_key("w:", [Some("6")])
        );
    }

    #[test]
    fn namespace_lookup_from_key() {
        let key = CacheNamespace::FoodDetails.key([Some("pho")]);
        assert_eq!(CacheNamespace::of_key(&key), Some(CacheNamespace::FoodDetails));
        assert_eq!(CacheNamespace::of_key("other:1"), None);
    }

    #[test]
    fn ttls() {
        assert_eq!(CacheNamespace::Weather.ttl().as_secs(), 600);
        assert_eq!(CacheNamespace::FoodRecommendation.ttl().as_secs(), 21_600);
        assert_eq!(CacheNamespace::FoodDetails.ttl().as_secs(), 86_400);
        assert_eq!(CacheNamespace::Geolocation.ttl().as_secs(), 3_600);
    }
}
