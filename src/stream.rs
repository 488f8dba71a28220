//! Stream and file decryption with padding removal on the final block.

use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, ErrorKind, Read, Write};
use std::path::Path;

use crate::block::{Block, Decryptor, BLOCK_LEN};
use crate::error::{DesError, Result};
use crate::key::Key;
use crate::padding::strip_padding;

/// Bytes read per chunk. Must stay a multiple of [`BLOCK_LEN`].
pub const CHUNK_LEN: usize = 64 * 1024;

const TMP_PREFIX: &str = ".desdec.";

impl Decryptor {
    /// Decrypts all of `input` to `output`, stripping the padding from the
    /// last block. Returns the number of plaintext bytes written.
    ///
    /// Each chunk is checked for block alignment before any of it is
    /// decrypted, so an input that fits in one chunk and has a bad length
    /// produces no output at all. On error, whatever was already written to
    /// `output` must be discarded by the caller.
    pub fn decrypt_stream<R: Read, W: Write>(&self, mut input: R, mut output: W) -> Result<u64> {
        let mut buf = vec![0u8; CHUNK_LEN];
        let mut held: Option<Block> = None;
        let mut read_total = 0u64;
        let mut written = 0u64;

        loop {
            let n = fill(&mut input, &mut buf)?;
            read_total += n as u64;
            let eof = n < buf.len();

            if n % BLOCK_LEN != 0 {
                return Err(DesError::InputFormat { len: read_total });
            }

            if n > 0 {
                let chunk = &mut buf[..n];
                self.decrypt_blocks(chunk)?;
                log::trace!("decrypted {} blocks", n / BLOCK_LEN);

                if let Some(prev) = held.take() {
                    output.write_all(&prev)?;
                    written += BLOCK_LEN as u64;
                }
                let (body, last) = chunk.split_at(n - BLOCK_LEN);
                output.write_all(body)?;
                written += body.len() as u64;

                let mut block = [0u8; BLOCK_LEN];
                block.copy_from_slice(last);
                held = Some(block);
            }

            if eof {
                break;
            }
        }

        let last = held.ok_or(DesError::InputFormat { len: read_total })?;
        let data = strip_padding(&last)?;
        output.write_all(data)?;
        written += data.len() as u64;
        output.flush()?;

        log::debug!(
            "decrypted {} blocks, {} padding bytes removed",
            read_total / BLOCK_LEN as u64,
            BLOCK_LEN - data.len()
        );
        Ok(written)
    }
}

/// Reads until `buf` is full or the reader is exhausted.
fn fill<R: Read>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

/// Decrypts the file at `input` into `output`.
///
/// The input length is validated from metadata before anything is decrypted.
/// Plaintext goes to a temporary file next to `output` that is renamed into
/// place only on success, so a failed run never leaves an output file.
pub fn decrypt_file(input: &Path, output: &Path, key: &Key) -> Result<u64> {
    let decryptor = Decryptor::new(key)?;
    decrypt_file_with(&decryptor, input, output)
}

pub fn decrypt_file_with(decryptor: &Decryptor, input: &Path, output: &Path) -> Result<u64> {
    let len = fs::metadata(input)?.len();
    if len == 0 || len % BLOCK_LEN as u64 != 0 {
        return Err(DesError::InputFormat { len });
    }

    let tmp = tempfile::Builder::new()
        .prefix(TMP_PREFIX)
        .tempfile_in(parent_dir(output))?;

    let reader = BufReader::new(File::open(input)?);
    let written = {
        let mut writer = BufWriter::new(tmp.as_file());
        let written = decryptor.decrypt_stream(reader, &mut writer)?;
        writer.flush()?;
        written
    };
    tmp.as_file().sync_all()?;
    tmp.persist(output).map_err(|e| DesError::Io(e.error))?;

    log::debug!(
        "{} -> {} ({} bytes)",
        input.display(),
        output.display(),
        written
    );
    Ok(written)
}

/// Writes `data` to `path` through a temporary file in the same directory.
pub(crate) fn write_atomic(path: &Path, data: &[u8]) -> Result<()> {
    let mut tmp = tempfile::Builder::new()
        .prefix(TMP_PREFIX)
        .tempfile_in(parent_dir(path))?;
    tmp.write_all(data)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| DesError::Io(e.error))?;
    Ok(())
}

fn parent_dir(path: &Path) -> &Path {
    match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    }
}
