use crate::value::Value;
use crate::variable::VariableId;

/// Fold `v` into the running hash `h` using `MurmurHash3`'s 64-bit mixing
/// constants. Order-sensitive, so sequences that differ only in ordering
/// produce different keys.
#[inline]
pub(crate) fn mix(h: u64, v: u64) -> u64 {
    h.wrapping_mul(0xff51_afd7_ed55_8ccd)
        .wrapping_add(v)
        .wrapping_mul(0xc4ce_b9fe_1a85_ec53)
        .rotate_left(31)
}

/// `MurmurHash3`'s 64-bit finalizer. Applied once after all components of a
/// key have been mixed in.
#[inline]
pub(crate) fn finalize(mut h: u64) -> u64 {
    h ^= h >> 33;
    h = h.wrapping_mul(0xff51_afd7_ed55_8ccd);
    h ^= h >> 33;
    h = h.wrapping_mul(0xc4ce_b9fe_1a85_ec53);
    h ^= h >> 33;
    h
}

/// FNV-1a over the label bytes, used as the string component of instance
/// keys.
#[inline]
pub(crate) fn hash_str(s: &str) -> u64 {
    let mut h: u64 = 0xcbf2_9ce4_8422_2325;
    for b in s.bytes() {
        h ^= u64::from(b);
        h = h.wrapping_mul(0x0000_0100_0000_01b3);
    }
    h
}

/// Stable fingerprint for an assignment, using variable ids and
/// `f64::to_bits()` for float payloads so that distinct assignments at the
/// same instance key land in distinct history slots.
pub(crate) fn assignment_fingerprint(assignment: &[(VariableId, Value)]) -> u64 {
    let mut h: u64 = assignment.len() as u64;
    for (id, value) in assignment {
        h = mix(h, id.0);
        h = mix(h, value.to_key_bits());
    }
    finalize(h)
}
