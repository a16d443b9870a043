//! Property-based tests for thread member set identity

use proptest::prelude::*;
use teamspace::shared::messaging::MemberSet;
use uuid::Uuid;

fn uuids(max: usize) -> impl Strategy<Value = Vec<Uuid>> {
    prop::collection::vec(any::<u128>().prop_map(Uuid::from_u128), 0..max)
}

proptest! {
    #[test]
    fn test_member_set_ignores_order_and_duplicates(
        sender in any::<u128>().prop_map(Uuid::from_u128),
        receivers in uuids(8),
    ) {
        let forward = MemberSet::from_participants(sender, &receivers);

        let mut shuffled = receivers.clone();
        shuffled.reverse();
        shuffled.extend(receivers.iter().copied());
        let backward = MemberSet::from_participants(sender, &shuffled);

        prop_assert_eq!(forward.key(), backward.key());
        prop_assert!(forward.contains(sender));
        prop_assert!(receivers.iter().all(|r| forward.contains(*r)));
        prop_assert!(forward.as_slice().windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_member_set_identity_is_symmetric(a in any::<u128>(), b in any::<u128>(), c in any::<u128>()) {
        let (a, b, c) = (Uuid::from_u128(a), Uuid::from_u128(b), Uuid::from_u128(c));
        let from_a = MemberSet::from_participants(a, &[b, c]);
        let from_c = MemberSet::from_participants(c, &[b, a]);
        prop_assert_eq!(from_a.key(), from_c.key());
    }
}
