use proptest::prelude::*;

/// Strategy for cache keys shaped like `<collection>:<id>`
pub fn cache_key_strategy() -> impl Strategy<Value = String> {
    ("(product|cart|session|user)", "[A-Z]{2,5}-[0-9]{1,8}")
        .prop_map(|(collection, id)| format!("{collection}:{id}"))
}

/// Strategy for arbitrary non-empty keys
pub fn free_form_key_strategy() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9:_#-]{1,48}"
}

/// Strategy for distinct node id sets of the given size range
pub fn node_ids_strategy(min: usize, max: usize) -> impl Strategy<Value = Vec<String>> {
    prop::collection::btree_set("node-[a-z0-9]{1,6}", min..=max)
        .prop_map(|ids| ids.into_iter().collect())
}
