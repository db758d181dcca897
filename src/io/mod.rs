//! Input and output utility.
use std::io;
use std::error::Error;
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

/// Helper function for creating `io::Error` with
/// `io::ErrorKind::InvalidData`.
pub fn invalid_data<E: Into<Box<dyn Error + Send + Sync>>>(error: E) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, error)
}

/// Write an 8-byte magic string followed by a little-endian format version.
pub fn write_header<W>(w: &mut W, magic: &[u8; 8], version: u32)
                       -> io::Result<()>
    where W: io::Write + ?Sized,
{
    w.write_all(magic)?;
    w.write_u32::<LittleEndian>(version)
}

/// Read a header written by [`write_header`](fn.write_header.html),
/// checking the magic string.  Returns the format version.
pub fn read_header<R>(r: &mut R, magic: &[u8; 8]) -> io::Result<u32>
    where R: io::Read + ?Sized,
{
    let mut buf = [0; 8];
    r.read_exact(&mut buf)?;
    if &buf != magic {
        return Err(invalid_data(format!(
            "wrong magic string: expected {:?}, got {:?}",
            String::from_utf8_lossy(magic),
            String::from_utf8_lossy(&buf),
        )));
    }
    r.read_u32::<LittleEndian>()
}
