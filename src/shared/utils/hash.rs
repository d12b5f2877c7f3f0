/// Partitioning key for a record sent without one: the lowercase hex MD5 of the value.
///
/// Hash partitioners assign partitions from this key, so the digest and its
/// formatting must not change. MD5 is used for spread, not for security.
pub fn derive_key(value: &[u8]) -> String {
    hex::encode(md5::compute(value).0)
}
