//! On-disk formats: `.npy` matrices, bincode objects and content digests.

use crate::errors::{PipelineError, SerializationError};
use ndarray::Array2;
use serde::de::DeserializeOwned;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::path::Path;

const NPY_MAGIC: &[u8] = b"\x93NUMPY";
const NPY_ALIGN: usize = 64;

/// Encodes a matrix as NPY v1.0 (`<f8`, C order).
#[must_use]
pub fn encode_npy(array: &Array2<f64>) -> Vec<u8> {
    let (rows, cols) = array.dim();
    let mut header =
        format!("{{'descr': '<f8', 'fortran_order': False, 'shape': ({rows}, {cols}), }}");
    // magic + version + header length field
    let preamble = NPY_MAGIC.len() + 2 + 2;
    let unpadded = preamble + header.len() + 1;
    let padding = (NPY_ALIGN - unpadded % NPY_ALIGN) % NPY_ALIGN;
    header.push_str(&" ".repeat(padding));
    header.push('\n');

    let mut out = Vec::with_capacity(preamble + header.len() + rows * cols * 8);
    out.extend_from_slice(NPY_MAGIC);
    out.extend_from_slice(&[1, 0]);
    out.extend_from_slice(&(header.len() as u16).to_le_bytes());
    out.extend_from_slice(header.as_bytes());
    for value in array {
        out.extend_from_slice(&value.to_le_bytes());
    }
    out
}

fn header_field<'a>(header: &'a str, key: &str) -> Option<&'a str> {
    let start = header.find(&format!("'{key}':"))? + key.len() + 3;
    Some(header[start..].trim_start())
}

/// Decodes an NPY v1.0 `<f8` C-order matrix.
///
/// # Errors
///
/// Returns `SerializationError` for any other layout or a truncated buffer.
pub fn decode_npy(bytes: &[u8]) -> Result<Array2<f64>, SerializationError> {
    let bad = |msg: &str| SerializationError::new(format!("invalid npy data: {msg}"));

    if bytes.len() < 10 || &bytes[..6] != NPY_MAGIC {
        return Err(bad("missing magic"));
    }
    if bytes[6] != 1 {
        return Err(bad("unsupported version"));
    }
    let header_len = u16::from_le_bytes([bytes[8], bytes[9]]) as usize;
    let data_start = 10 + header_len;
    let header = bytes
        .get(10..data_start)
        .and_then(|h| std::str::from_utf8(h).ok())
        .ok_or_else(|| bad("truncated header"))?;

    if !header_field(header, "descr").is_some_and(|v| v.starts_with("'<f8'")) {
        return Err(bad("dtype must be <f8"));
    }
    if !header_field(header, "fortran_order").is_some_and(|v| v.starts_with("False")) {
        return Err(bad("fortran order is not supported"));
    }
    let shape = header_field(header, "shape")
        .and_then(|v| v.strip_prefix('('))
        .and_then(|v| v.split(')').next())
        .ok_or_else(|| bad("missing shape"))?;
    let dims = shape
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::parse::<usize>)
        .collect::<Result<Vec<_>, _>>()
        .map_err(|_| bad("malformed shape"))?;
    let (rows, cols) = match dims.as_slice() {
        [r, c] => (*r, *c),
        _ => return Err(bad("expected a 2-d array")),
    };

    let body = &bytes[data_start..];
    if body.len() != rows * cols * 8 {
        return Err(bad("data length does not match shape"));
    }
    let values = body
        .chunks_exact(8)
        .map(|c| f64::from_le_bytes([c[0], c[1], c[2], c[3], c[4], c[5], c[6], c[7]]))
        .collect();
    Array2::from_shape_vec((rows, cols), values).map_err(|e| bad(&e.to_string()))
}

/// Hex SHA-256 of a byte buffer.
#[must_use]
pub fn sha256_hex(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

async fn write_bytes(path: &Path, bytes: &[u8]) -> Result<(), PipelineError> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| PipelineError::io(parent, e))?;
    }
    tokio::fs::write(path, bytes)
        .await
        .map_err(|e| PipelineError::io(path, e))
}

/// Writes a matrix as `.npy` and returns the file's SHA-256.
///
/// # Errors
///
/// Returns an IO error if the file cannot be written.
pub async fn save_numpy_array(path: &Path, array: &Array2<f64>) -> Result<String, PipelineError> {
    let bytes = encode_npy(array);
    write_bytes(path, &bytes).await?;
    Ok(sha256_hex(&bytes))
}

/// Reads a `.npy` matrix.
///
/// # Errors
///
/// Returns an IO error or a `SerializationError`.
pub async fn load_numpy_array(path: &Path) -> Result<Array2<f64>, PipelineError> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| PipelineError::io(path, e))?;
    Ok(decode_npy(&bytes).map_err(|e| e.with_path(path))?)
}

/// Writes any serialisable value with bincode.
///
/// # Errors
///
/// Returns a `SerializationError` or an IO error.
pub async fn save_object<T: Serialize + Sync>(path: &Path, value: &T) -> Result<(), PipelineError> {
    let bytes = bincode::serialize(value).map_err(|e| SerializationError::from(e).with_path(path))?;
    write_bytes(path, &bytes).await
}

/// Reads a bincode value.
///
/// # Errors
///
/// Returns a `SerializationError` or an IO error.
pub async fn load_object<T: DeserializeOwned>(path: &Path) -> Result<T, PipelineError> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| PipelineError::io(path, e))?;
    Ok(bincode::deserialize(&bytes).map_err(|e| SerializationError::from(e).with_path(path))?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_npy_header_is_aligned() {
        let bytes = encode_npy(&array![[1.0, 2.0], [3.0, 4.0]]);
        let header_len = u16::from_le_bytes([bytes[8], bytes[9]]) as usize;

        assert_eq!(&bytes[..6], NPY_MAGIC);
        assert_eq!((10 + header_len) % 64, 0);
        assert_eq!(bytes[10 + header_len - 1], b'\n');
        assert_eq!(bytes.len(), 10 + header_len + 4 * 8);
    }

    #[test]
    fn test_npy_body_is_little_endian_c_order() {
        let bytes = encode_npy(&array![[1.0, 2.0], [3.0, 4.0]]);
        let header_len = u16::from_le_bytes([bytes[8], bytes[9]]) as usize;
        let second = &bytes[10 + header_len + 8..10 + header_len + 16];

        assert_eq!(second, &2.0_f64.to_le_bytes());
    }

    #[test]
    fn test_decode_reads_shape() {
        let original = array![[1.5, -2.0, 0.0]];
        let decoded = decode_npy(&encode_npy(&original)).unwrap();
        assert_eq!(decoded, original);
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(decode_npy(b"not an npy file").is_err());

        let mut bytes = encode_npy(&array![[1.0]]);
        bytes.pop();
        assert!(decode_npy(&bytes).is_err());
    }

    #[test]
    fn test_sha256_hex() {
        assert_eq!(
            sha256_hex(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[tokio::test]
    async fn test_object_save_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("obj/values.bin");

        save_object(&path, &vec![1.0_f64, 2.0]).await.unwrap();
        let back: Vec<f64> = load_object(&path).await.unwrap();

        assert_eq!(back, vec![1.0, 2.0]);
    }
}
