//! Operations on `f32` embedding vectors.
//!
//! Dataset and topic embeddings are fixed-dimension unit vectors, so the
//! inner product of two embeddings is their cosine similarity. The byte
//! codec matches the persisted layout: each component as a big-endian
//! IEEE-754 `f32`, 4 bytes per dimension.

use crate::error::{Error, Result};

/// Dimension of all embedding vectors.
pub const EMBEDDING_DIM: usize = 300;

/// Adds `src` to `dst` component-wise.
pub fn add(dst: &mut [f32], src: &[f32]) -> Result<()> {
    if dst.len() != src.len() {
        return Err(Error::DimensionMismatch {
            expected: dst.len(),
            found: src.len(),
        });
    }
    for (d, s) in dst.iter_mut().zip(src) {
        *d += s;
    }
    Ok(())
}

/// Scales `v` by `k`.
pub fn scale(v: &mut [f32], k: f32) {
    for x in v.iter_mut() {
        *x *= k;
    }
}

/// Returns the dot product of `a` and `b`.
pub fn dot(a: &[f32], b: &[f32]) -> Result<f32> {
    if a.len() != b.len() {
        return Err(Error::DimensionMismatch {
            expected: a.len(),
            found: b.len(),
        });
    }
    Ok(a.iter().zip(b).map(|(x, y)| x * y).sum())
}

/// Returns the Euclidean norm of `v`.
pub fn norm(v: &[f32]) -> f32 {
    v.iter().map(|x| x * x).sum::<f32>().sqrt()
}

/// Converts `v` to its unit vector.
///
/// A zero-norm vector is left all zeros; cosine against it is undefined
/// and callers skip such vectors.
pub fn normalize(v: &mut [f32]) {
    let n = norm(v);
    if n == 0.0 {
        return;
    }
    scale(v, 1.0 / n);
}

/// Serializes `v` into big-endian bytes.
pub fn to_bytes(v: &[f32]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(v.len() * 4);
    for x in v {
        buf.extend_from_slice(&x.to_be_bytes());
    }
    buf
}

/// Deserializes a big-endian byte slice into a vector.
pub fn from_bytes(data: &[u8]) -> Result<Vec<f32>> {
    if data.len() % 4 != 0 {
        return Err(Error::DimensionMismatch {
            expected: data.len() / 4 * 4,
            found: data.len(),
        });
    }
    Ok(data
        .chunks_exact(4)
        .map(|c| f32::from_be_bytes([c[0], c[1], c[2], c[3]]))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add() {
        let mut a = vec![1.0, 2.0, 3.0];
        add(&mut a, &[0.5, 0.5, 0.5]).unwrap();
        assert_eq!(a, vec![1.5, 2.5, 3.5]);
    }

    #[test]
    fn test_add_dimension_mismatch() {
        let mut a = vec![1.0, 2.0];
        let err = add(&mut a, &[1.0]).unwrap_err();
        assert_eq!(
            err,
            Error::DimensionMismatch {
                expected: 2,
                found: 1
            }
        );
    }

    #[test]
    fn test_dot_of_unit_vectors_is_cosine() {
        let a = vec![1.0, 0.0, 0.0];
        let b = vec![0.0, 1.0, 0.0];
        assert_eq!(dot(&a, &b).unwrap(), 0.0);
        assert_eq!(dot(&a, &a).unwrap(), 1.0);
    }

    #[test]
    fn test_normalize() {
        let mut v = vec![3.0, 4.0];
        normalize(&mut v);
        assert!((norm(&v) - 1.0).abs() < 1e-6);
        assert!((v[0] - 0.6).abs() < 1e-6);
    }

    #[test]
    fn test_normalize_zero_vector_stays_zero() {
        let mut v = vec![0.0; 4];
        normalize(&mut v);
        assert_eq!(v, vec![0.0; 4]);
    }

    #[test]
    fn test_bytes_round_trip() {
        let v = vec![1.0, -0.5, 3.25, f32::MIN_POSITIVE];
        let bytes = to_bytes(&v);
        assert_eq!(bytes.len(), v.len() * 4);
        assert_eq!(from_bytes(&bytes).unwrap(), v);
    }

    #[test]
    fn test_from_bytes_truncated() {
        assert!(from_bytes(&[0, 0, 0]).is_err());
    }
}
