const C1: u32 = 0xcc9e_2d51;
const C2: u32 = 0x1b87_3593;

/// Computes the 32-bit x86 variant of MurmurHash3 over the UTF-8 bytes of `key`.
///
/// Every SDK that evaluates the same flag must route a key to the same bucket, so this must stay
/// bit-for-bit identical to the reference implementation.
pub fn hash(key: &str, seed: i32) -> u32 {
    murmur3_32(key.as_bytes(), seed as u32)
}

/// Maps `key` to a bucket in `[1, 100]`.
///
/// Negative seeds are reinterpreted as their 32-bit two's-complement value.
pub fn bucket(key: &str, seed: i32) -> u32 {
    hash(key, seed) % 100 + 1
}

fn murmur3_32(data: &[u8], seed: u32) -> u32 {
    let mut h1 = seed;

    let mut blocks = data.chunks_exact(4);
    for block in &mut blocks {
        let k1 = u32::from_le_bytes([block[0], block[1], block[2], block[3]]);
        h1 ^= mix_k1(k1);
        h1 = h1.rotate_left(13);
        h1 = h1.wrapping_mul(5).wrapping_add(0xe654_6b64);
    }

    let tail = blocks.remainder();
    if !tail.is_empty() {
        let mut k1 = 0u32;
        for (i, byte) in tail.iter().enumerate() {
            k1 ^= u32::from(*byte) << (8 * i);
        }
        h1 ^= mix_k1(k1);
    }

    h1 ^= data.len() as u32;
    fmix32(h1)
}

#[inline]
fn mix_k1(k1: u32) -> u32 {
    k1.wrapping_mul(C1).rotate_left(15).wrapping_mul(C2)
}

#[inline]
fn fmix32(mut h: u32) -> u32 {
    h ^= h >> 16;
    h = h.wrapping_mul(0x85eb_ca6b);
    h ^= h >> 13;
    h = h.wrapping_mul(0xc2b2_ae35);
    h ^= h >> 16;
    h
}
