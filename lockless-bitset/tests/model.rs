//! Sequential model check against `HashSet<u64>`.

use lockless_bitset::ShardedBitset;
use proptest::prelude::*;
use std::collections::HashSet;

#[derive(Debug, Clone)]
enum Op {
    Set(u64),
    Reset(u64),
    Test(u64),
    Clear,
}

fn position() -> impl Strategy<Value = u64> {
    // A dense cluster plus far-away positions whose buckets home apart.
    prop_oneof![
        0u64..2048,
        (0u64..64, 0u64..256).prop_map(|(hi, lo)| (hi << 40) | (hi << 8) | lo),
    ]
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => position().prop_map(Op::Set),
        2 => position().prop_map(Op::Reset),
        3 => position().prop_map(Op::Test),
        1 => Just(Op::Clear),
    ]
}

proptest! {
    #[test]
    fn matches_hashset(ops in prop::collection::vec(op(), 0..200)) {
        // Enough slots that no probe chain runs out.
        let bits = ShardedBitset::builder()
            .capacity(4096)
            .bucket_width(8)
            .build()
            .unwrap();
        let mut model = HashSet::new();
        let mut touched = Vec::new();

        for op in ops {
            match op {
                Op::Set(p) => {
                    prop_assert!(bits.set(p).is_ok());
                    model.insert(p);
                    touched.push(p);
                }
                Op::Reset(p) => {
                    prop_assert!(bits.reset(p).is_ok());
                    model.remove(&p);
                }
                Op::Test(p) => {
                    prop_assert_eq!(bits.test(p), Ok(model.contains(&p)));
                }
                Op::Clear => {
                    bits.clear();
                    model.clear();
                }
            }
        }

        for p in touched {
            prop_assert_eq!(bits.test(p), Ok(model.contains(&p)));
        }
        prop_assert_eq!(bits.count_ones(), model.len());
    }
}
