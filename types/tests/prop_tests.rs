use proptest::prelude::*;

use gauge_types::{Address, FeeSide, Timestamp};

proptest! {
    /// Address display/parse agrees for every byte pattern.
    #[test]
    fn address_display_parse(bytes in prop::array::uniform32(0u8..)) {
        let addr = Address::new(bytes);
        let parsed: Address = addr.to_string().parse().unwrap();
        prop_assert_eq!(parsed, addr);
    }

    /// Address::is_zero is true only for all-zero bytes.
    #[test]
    fn address_is_zero_correct(bytes in prop::array::uniform32(0u8..)) {
        let addr = Address::new(bytes);
        prop_assert_eq!(addr.is_zero(), bytes == [0u8; 32]);
    }

    /// Distinct seeds derive distinct addresses.
    #[test]
    fn derived_addresses_differ(a in "[a-z]{1,12}", b in "[a-z]{1,12}") {
        prop_assume!(a != b);
        let da = Address::derive(&[b"voter", a.as_bytes()]);
        let db = Address::derive(&[b"voter", b.as_bytes()]);
        prop_assert_ne!(da, db);
    }

    /// Address survives bincode encoding (the persistence format).
    #[test]
    fn address_bincode_stable(bytes in prop::array::uniform32(0u8..)) {
        let addr = Address::new(bytes);
        let encoded = bincode::serialize(&addr).unwrap();
        let decoded: Address = bincode::deserialize(&encoded).unwrap();
        prop_assert_eq!(decoded, addr);
    }

    /// Timestamp ordering: new(a) <= new(b) iff a <= b.
    #[test]
    fn timestamp_ordering(a in 0u64..u64::MAX, b in 0u64..u64::MAX) {
        let ta = Timestamp::new(a);
        let tb = Timestamp::new(b);
        prop_assert_eq!(ta <= tb, a <= b);
        prop_assert_eq!(ta == tb, a == b);
    }

    /// checked_add_secs only fails past u64::MAX.
    #[test]
    fn timestamp_checked_add(a in 0u64..u64::MAX, d in 0u64..u64::MAX) {
        let t = Timestamp::new(a);
        match t.checked_add_secs(d) {
            Some(shifted) => prop_assert_eq!(shifted.as_secs(), a + d),
            None => prop_assert!(a.checked_add(d).is_none()),
        }
    }
}

#[test]
fn fee_side_indices_are_distinct() {
    assert_eq!(FeeSide::A.index(), 0);
    assert_eq!(FeeSide::B.index(), 1);
    assert_eq!("B".parse::<FeeSide>().unwrap(), FeeSide::B);
    assert!("c".parse::<FeeSide>().is_err());
}
