use crate::{
    access::AccessMode,
    key::{AttributeKey, ProductKey},
    store::CacheStore,
};
use proptest::prelude::*;
use std::collections::BTreeMap;

const ROWS: [&str; 4] = ["7", "8", "9", "10"];
const ATTRS: [&str; 3] = ["1", "2", "3"];

fn arb_write() -> impl Strategy<Value = (usize, usize, String)> {
    (0..ROWS.len(), 0..ATTRS.len(), "[a-z]{0,6}")
}

proptest! {
    /// Any interleaving of per-row overlay writes converges to exactly the
    /// last value written per `(attribute, row)` pair; no write ever bleeds
    /// into a sibling row's entry.
    #[test]
    fn overlay_writes_never_bleed_across_rows(writes in prop::collection::vec(arb_write(), 1..40)) {
        let mut store = CacheStore::new(AccessMode::Flat);
        let mut expected: BTreeMap<(usize, usize), String> = BTreeMap::new();

        for (row, attr, value) in &writes {
            store.upsert_attribute_value(
                &AttributeKey::from(ATTRS[*attr]),
                &ProductKey::from(ROWS[*row]),
                value,
            );
            expected.insert((*attr, *row), value.clone());
        }

        for attr in 0..ATTRS.len() {
            let definition = store.attribute(&AttributeKey::from(ATTRS[attr]));
            for row in 0..ROWS.len() {
                let actual = definition
                    .and_then(|d| d.value(&ProductKey::from(ROWS[row])))
                    .map(str::to_string);
                prop_assert_eq!(&actual, &expected.get(&(attr, row)).cloned());
            }
        }
    }
}
