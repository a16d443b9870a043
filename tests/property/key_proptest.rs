//! Property-based tests for project key derivation

use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;
use teamspace::shared::project::derive_project_key;

proptest! {
    #[test]
    fn test_key_shape(name in "[a-zA-Z][a-zA-Z ]{0,20}", seed in any::<u64>()) {
        let mut rng = StdRng::seed_from_u64(seed);
        let key = derive_project_key(&name, &mut rng);

        let first = name.chars().next().unwrap().to_ascii_uppercase();
        prop_assert!(key.starts_with(first));
        prop_assert_eq!(key.clone(), key.to_uppercase());

        let pool: Vec<char> = name
            .chars()
            .skip(1)
            .filter(|c| !c.is_whitespace())
            .map(|c| c.to_ascii_uppercase())
            .collect();
        if pool.is_empty() {
            prop_assert_eq!(key.len(), 1);
        } else {
            prop_assert_eq!(key.len(), 3);
            prop_assert!(key.chars().skip(1).all(|c| pool.contains(&c)));
        }
    }
}
