//! `.npz` container for CSR matrices.
//!
//! A zip archive holding one `.npy` array per CSR component, the same member
//! names and dtypes `scipy.sparse.save_npz` produces, so the files open with
//! `scipy.sparse.load_npz` as well as with [`load_npz`].

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use num::Num;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::error::{PreprocessError, Result};
use crate::utils::matrix::CsrMatrix;

const NPY_MAGIC: &[u8] = b"\x93NUMPY";
/// numpy pads the preamble + header to this many bytes
const NPY_ALIGN: usize = 64;
const CSR_FORMAT: &str = "csr";

/// Scalar types that can be stored in a `.npy` payload (little endian).
pub trait NpyElement: Num + Copy {
    /// numpy dtype string
    const DESCR: &'static str;
    const SIZE: usize;
    fn write_le(self, out: &mut Vec<u8>);
    fn read_le(bytes: &[u8]) -> Self;
}

macro_rules! impl_npy_element {
    ($t:ty, $descr:expr) => {
        impl NpyElement for $t {
            const DESCR: &'static str = $descr;
            const SIZE: usize = std::mem::size_of::<$t>();

            #[inline]
            fn write_le(self, out: &mut Vec<u8>) {
                out.extend_from_slice(&self.to_le_bytes());
            }

            #[inline]
            fn read_le(bytes: &[u8]) -> Self {
                let mut raw = [0u8; std::mem::size_of::<$t>()];
                raw.copy_from_slice(bytes);
                <$t>::from_le_bytes(raw)
            }
        }
    };
}

impl_npy_element!(i32, "<i4");
impl_npy_element!(i64, "<i8");

/// Write `matrix` to `path`, replacing any existing file.
pub fn save_npz<N, P>(matrix: &CsrMatrix<N>, path: P) -> Result<()>
where
    N: NpyElement,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let file = File::create(path).map_err(|e| PreprocessError::io(path, e))?;
    let mut zip = ZipWriter::new(BufWriter::new(file));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    let (rows, cols) = matrix.shape();
    // scipy falls back to 64-bit index arrays only when 32 bits cannot hold them
    let wide = matrix.nnz() > i32::MAX as usize || cols > i32::MAX as usize;

    let indices = if wide {
        encode(matrix.indices().iter().map(|&c| c as i64))
    } else {
        encode(matrix.indices().iter().map(|&c| c as i32))
    };
    let indptr = if wide {
        encode(matrix.indptr().iter().map(|&p| p as i64))
    } else {
        encode(matrix.indptr().iter().map(|&p| p as i32))
    };
    let shape = encode([rows as i64, cols as i64]);
    let data = encode(matrix.data().iter().copied());

    let members: [(&str, Vec<u8>); 5] = [
        ("indices.npy", npy_bytes(indices.0, &vector_shape(matrix.nnz()), &indices.1)),
        ("indptr.npy", npy_bytes(indptr.0, &vector_shape(rows + 1), &indptr.1)),
        ("format.npy", npy_bytes("|S3", "()", CSR_FORMAT.as_bytes())),
        ("shape.npy", npy_bytes(shape.0, &vector_shape(2), &shape.1)),
        ("data.npy", npy_bytes(data.0, &vector_shape(matrix.nnz()), &data.1)),
    ];
    for (name, bytes) in members {
        zip.start_file(name, options)?;
        zip.write_all(&bytes).map_err(|e| PreprocessError::io(path, e))?;
    }
    let mut inner = zip.finish()?;
    inner.flush().map_err(|e| PreprocessError::io(path, e))?;
    Ok(())
}

/// Read a CSR matrix written by [`save_npz`] or `scipy.sparse.save_npz`.
pub fn load_npz<N, P>(path: P) -> Result<CsrMatrix<N>>
where
    N: NpyElement,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| PreprocessError::io(path, e))?;
    let mut archive = ZipArchive::new(BufReader::new(file))?;

    let format = read_member(&mut archive, path, "format.npy")?;
    let format = format.as_string().map_err(|m| PreprocessError::format(path, m))?;
    if format != CSR_FORMAT {
        return Err(PreprocessError::format(path, format!("unsupported sparse format '{format}'")));
    }

    let shape = read_member(&mut archive, path, "shape.npy")?
        .as_indices()
        .map_err(|m| PreprocessError::format(path, m))?;
    let &[rows, cols] = shape.as_slice() else {
        return Err(PreprocessError::format(path, format!("shape has {} entries", shape.len())));
    };

    let indptr = read_member(&mut archive, path, "indptr.npy")?
        .as_indices()
        .map_err(|m| PreprocessError::format(path, m))?;
    let indices = read_member(&mut archive, path, "indices.npy")?
        .as_indices()
        .map_err(|m| PreprocessError::format(path, m))?;
    let data = read_member(&mut archive, path, "data.npy")?
        .as_values::<N>()
        .map_err(|m| PreprocessError::format(path, m))?;

    let indices = indices
        .into_iter()
        .map(|c| u32::try_from(c).map_err(|_| PreprocessError::format(path, "column index exceeds u32")))
        .collect::<Result<Vec<u32>>>()?;

    CsrMatrix::from_parts(rows, cols, indptr, indices, data).map_err(|m| PreprocessError::format(path, m))
}

fn encode<N, I>(values: I) -> (&'static str, Vec<u8>)
where
    N: NpyElement,
    I: IntoIterator<Item = N>,
{
    let mut out = Vec::new();
    for v in values {
        v.write_le(&mut out);
    }
    (N::DESCR, out)
}

fn vector_shape(len: usize) -> String {
    format!("({len},)")
}

/// Serialize one array in `.npy` version 1.0 layout.
fn npy_bytes(descr: &str, shape: &str, payload: &[u8]) -> Vec<u8> {
    let mut header = format!("{{'descr': '{descr}', 'fortran_order': False, 'shape': {shape}, }}");
    // magic(6) + version(2) + header_len(2) + header + '\n'
    let unpadded = NPY_MAGIC.len() + 4 + header.len() + 1;
    let padding = (NPY_ALIGN - unpadded % NPY_ALIGN) % NPY_ALIGN;
    header.extend(std::iter::repeat(' ').take(padding));
    header.push('\n');

    let mut out = Vec::with_capacity(NPY_MAGIC.len() + 4 + header.len() + payload.len());
    out.extend_from_slice(NPY_MAGIC);
    out.extend_from_slice(&[1, 0]);
    out.extend_from_slice(&(header.len() as u16).to_le_bytes());
    out.extend_from_slice(header.as_bytes());
    out.extend_from_slice(payload);
    out
}

/// A decoded `.npy` member: dtype, shape and raw little-endian payload.
#[derive(Debug)]
struct NpyArray {
    descr: String,
    shape: Vec<usize>,
    payload: Vec<u8>,
}

impl NpyArray {
    fn parse(bytes: Vec<u8>) -> std::result::Result<Self, String> {
        if bytes.len() < 10 || &bytes[..NPY_MAGIC.len()] != NPY_MAGIC {
            return Err("missing .npy magic".to_string());
        }
        let (header_len, header_start) = match bytes[6] {
            1 => (u16::from_le_bytes([bytes[8], bytes[9]]) as usize, 10),
            2 | 3 if bytes.len() >= 12 => (
                u32::from_le_bytes([bytes[8], bytes[9], bytes[10], bytes[11]]) as usize,
                12,
            ),
            v => return Err(format!("unsupported .npy version {v}")),
        };
        let header_end = header_start + header_len;
        if bytes.len() < header_end {
            return Err("truncated .npy header".to_string());
        }
        let header = std::str::from_utf8(&bytes[header_start..header_end])
            .map_err(|_| "non-text .npy header".to_string())?;

        let descr = header_value(header, "descr")
            .and_then(|v| v.strip_prefix('\'').and_then(|v| v.split('\'').next()))
            .ok_or("header has no descr")?
            .to_string();
        let shape_text = header_value(header, "shape")
            .and_then(|v| v.strip_prefix('('))
            .and_then(|v| v.split(')').next())
            .ok_or("header has no shape")?;
        let shape = shape_text
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| s.parse::<usize>().map_err(|_| format!("bad shape entry '{s}'")))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        if shape.len() > 1 && header_value(header, "fortran_order").is_some_and(|v| v.starts_with("True")) {
            return Err("fortran-ordered arrays are not supported".to_string());
        }

        Ok(Self {
            descr,
            shape,
            payload: bytes[header_end..].to_vec(),
        })
    }

    fn element_count(&self) -> usize {
        self.shape.iter().product()
    }

    fn as_values<N: NpyElement>(&self) -> std::result::Result<Vec<N>, String> {
        if self.descr != N::DESCR {
            return Err(format!("expected dtype {}, found {}", N::DESCR, self.descr));
        }
        if self.payload.len() != self.element_count() * N::SIZE {
            return Err(format!(
                "payload holds {} bytes, shape {:?} needs {}",
                self.payload.len(),
                self.shape,
                self.element_count() * N::SIZE
            ));
        }
        Ok(self.payload.chunks_exact(N::SIZE).map(N::read_le).collect())
    }

    /// Integer array of either index width, as `usize`
    fn as_indices(&self) -> std::result::Result<Vec<usize>, String> {
        let signed: Vec<i64> = match self.descr.as_str() {
            "<i4" => self.as_values::<i32>()?.into_iter().map(i64::from).collect(),
            "<i8" => self.as_values::<i64>()?,
            other => return Err(format!("index arrays must be <i4 or <i8, found {other}")),
        };
        signed
            .into_iter()
            .map(|v| usize::try_from(v).map_err(|_| format!("negative index {v}")))
            .collect()
    }

    /// 0-d byte string (`|S`) or unicode (`<U`) scalar
    fn as_string(&self) -> std::result::Result<String, String> {
        let text = if self.descr.starts_with("|S") {
            String::from_utf8_lossy(&self.payload).into_owned()
        } else if self.descr.starts_with("<U") {
            self.payload
                .chunks_exact(4)
                .filter_map(|c| char::from_u32(u32::from_le_bytes([c[0], c[1], c[2], c[3]])))
                .collect()
        } else {
            return Err(format!("format member has dtype {}", self.descr));
        };
        Ok(text.trim_end_matches('\0').to_string())
    }
}

/// Raw text following `'key':` in a numpy header dict
fn header_value<'a>(header: &'a str, key: &str) -> Option<&'a str> {
    let needle = format!("'{key}':");
    let start = header.find(&needle)? + needle.len();
    Some(header[start..].trim_start())
}

fn read_member<R: Read + std::io::Seek>(
    archive: &mut ZipArchive<R>,
    path: &Path,
    name: &str,
) -> Result<NpyArray> {
    let mut member = archive.by_name(name)?;
    let mut bytes = Vec::new();
    member.read_to_end(&mut bytes).map_err(|e| PreprocessError::io(path, e))?;
    NpyArray::parse(bytes).map_err(|m| PreprocessError::format(path, format!("{name}: {m}")))
}
