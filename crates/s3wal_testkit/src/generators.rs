//! Property-based test generators using proptest.

use proptest::prelude::*;

/// Strategy for record payloads, including empty ones.
pub fn payload_strategy() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>(), 0..256)
}

/// Strategy for short batches of payloads.
pub fn payload_batch_strategy(max_len: usize) -> impl Strategy<Value = Vec<Vec<u8>>> {
    prop::collection::vec(payload_strategy(), 0..=max_len)
}

/// Strategy for prefixes, with stray separators that normalization trims.
pub fn prefix_strategy() -> impl Strategy<Value = String> {
    (
        prop::string::string_regex("[a-z][a-z0-9_-]{0,11}(/[a-z0-9_-]{1,8}){0,2}")
            .expect("Invalid regex"),
        prop::bool::ANY,
        prop::bool::ANY,
    )
        .prop_map(|(core, lead, trail)| {
            let mut prefix = String::new();
            if lead {
                prefix.push('/');
            }
            prefix.push_str(&core);
            if trail {
                prefix.push('/');
            }
            prefix
        })
}

/// Strategy for keys that are not valid log keys.
pub fn stray_key_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-zA-Z._-][a-zA-Z0-9._-]{0,15}").expect("Invalid regex")
}
