//! SPDX-FileCopyrightText: 2025 CyberDeco
//!
//! SPDX-License-Identifier: MIT
//!
//! Header stream cipher
//!
//! Encrypted headers start with a 32-bit key. Every following byte is XORed
//! with the low byte of a multiplicative-congruential keystream that advances
//! one round per byte. Version 10+ headers may add a whole-stream `0xFF` XOR
//! on top of the keystream.

use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Seek, SeekFrom, Write};
use std::path::Path;

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

use crate::error::Result;

/// Key used by retail headers when none is specified
pub const DEFAULT_KEY: i32 = 0x295E2D5E;

/// Advance the keystream by one round
#[must_use]
pub const fn next_key(key: i32) -> i32 {
    let value = key
        .wrapping_rem(0x1F31D)
        .wrapping_mul(0x41A7)
        .wrapping_sub(key.wrapping_div(0x1F31D).wrapping_mul(0xB14));

    if value <= 0 {
        value.wrapping_add(0x7FFF_FFFF)
    } else {
        value
    }
}

/// Keystream state for encrypting or decrypting a header byte stream.
///
/// Encryption and decryption are the same operation.
#[derive(Debug, Clone)]
pub struct HeaderCipher {
    seed: i32,
    state: i32,
    position: u64,
    xor: u8,
}

impl HeaderCipher {
    /// Create a cipher positioned at the first byte after the key field
    #[must_use]
    pub fn new(key: i32) -> Self {
        Self {
            seed: key,
            state: key,
            position: 0,
            xor: 0,
        }
    }

    /// Apply an additional constant XOR to every byte (`0xFF` for v10+)
    #[must_use]
    pub fn with_xor(mut self, xor: u8) -> Self {
        self.xor = xor;
        self
    }

    /// The key this cipher was seeded with
    pub fn key(&self) -> i32 {
        self.seed
    }

    /// Current stream position relative to the first encrypted byte
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Encrypt or decrypt `buf` in place, advancing the keystream
    pub fn apply(&mut self, buf: &mut [u8]) {
        for byte in buf.iter_mut() {
            self.state = next_key(self.state);
            *byte ^= (self.state as u8) ^ self.xor;
        }
        self.position += buf.len() as u64;
    }

    /// Move to an absolute stream position.
    ///
    /// The keystream has no closed form, so the state is always re-derived
    /// from position 0.
    pub fn seek(&mut self, position: u64) {
        self.state = self.seed;
        for _ in 0..position {
            self.state = next_key(self.state);
        }
        self.position = position;
    }
}

/// Encrypt or decrypt a buffer with a fresh keystream
pub fn crypt_in_place(buf: &mut [u8], key: i32, xor: u8) {
    HeaderCipher::new(key).with_xor(xor).apply(buf);
}

/// Decrypting reader over an encrypted byte stream.
///
/// Position 0 of this reader is the inner stream position at construction
/// time (the first byte after the key field).
pub struct CipherReader<R: Read + Seek> {
    inner: R,
    base: u64,
    cipher: HeaderCipher,
}

impl<R: Read + Seek> CipherReader<R> {
    /// Wrap `inner`, decrypting everything from its current position on
    pub fn new(mut inner: R, key: i32, xor: u8) -> io::Result<Self> {
        let base = inner.stream_position()?;
        Ok(Self {
            inner,
            base,
            cipher: HeaderCipher::new(key).with_xor(xor),
        })
    }

    /// Read the 32-bit key from the start of `inner`, then decrypt the rest
    pub fn from_keyed(mut inner: R, xor: u8) -> io::Result<Self> {
        let key = inner.read_i32::<LittleEndian>()?;
        Self::new(inner, key, xor)
    }

    /// The key used by this reader
    pub fn key(&self) -> i32 {
        self.cipher.key()
    }

    pub fn into_inner(self) -> R {
        self.inner
    }
}

impl<R: Read + Seek> Read for CipherReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let read = self.inner.read(buf)?;
        self.cipher.apply(&mut buf[..read]);
        Ok(read)
    }
}

impl<R: Read + Seek> Seek for CipherReader<R> {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        let target = match pos {
            SeekFrom::Start(offset) => self.inner.seek(SeekFrom::Start(self.base + offset))?,
            SeekFrom::Current(delta) => {
                let current = self.base + self.cipher.position();
                let target = current.checked_add_signed(delta).ok_or_else(|| {
                    io::Error::new(io::ErrorKind::InvalidInput, "seek before start of stream")
                })?;
                self.inner.seek(SeekFrom::Start(target))?
            }
            SeekFrom::End(delta) => self.inner.seek(SeekFrom::End(delta))?,
        };

        let relative = target.checked_sub(self.base).ok_or_else(|| {
            io::Error::new(io::ErrorKind::InvalidInput, "seek before start of stream")
        })?;
        self.cipher.seek(relative);
        Ok(relative)
    }
}

/// Decrypt a keyed file, writing the plaintext (without the key) to `output`.
///
/// Returns the key that was read from the input.
pub fn decrypt_file<P: AsRef<Path>, Q: AsRef<Path>>(input: P, output: Q, xor: u8) -> Result<i32> {
    let mut reader = CipherReader::from_keyed(BufReader::new(File::open(input)?), xor)?;
    let mut writer = BufWriter::new(File::create(output)?);

    io::copy(&mut reader, &mut writer)?;
    writer.flush()?;

    tracing::debug!("Decrypted file with key 0x{:08X}", reader.key());
    Ok(reader.key())
}

/// Encrypt a plaintext file, prefixing the output with `key`
pub fn encrypt_file<P: AsRef<Path>, Q: AsRef<Path>>(
    input: P,
    output: Q,
    key: i32,
    xor: u8,
) -> Result<()> {
    let mut data = std::fs::read(input)?;
    crypt_in_place(&mut data, key, xor);

    let mut writer = BufWriter::new(File::create(output)?);
    writer.write_i32::<LittleEndian>(key)?;
    writer.write_all(&data)?;
    writer.flush()?;

    tracing::debug!("Encrypted {} bytes with key 0x{:08X}", data.len(), key);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_next_key_known_values() {
        assert_eq!(next_key(DEFAULT_KEY), 0x65F4_8B89);
        assert_eq!(next_key(0x65F4_8B89), 0x19F5_03AA);
        assert_eq!(next_key(1), 16807);
        // Non-positive results wrap into the positive range
        assert_eq!(next_key(0), 0x7FFF_FFFF);
        assert_eq!(next_key(-1), 2147466840);
        assert_eq!(next_key(i32::MIN), 2147466840);
    }

    #[test]
    fn test_keystream_bytes() {
        let mut buf = [0u8; 8];
        crypt_in_place(&mut buf, DEFAULT_KEY, 0);
        assert_eq!(buf, [0x89, 0xAA, 0x36, 0x15, 0x32, 0x7B, 0x48, 0x77]);
    }

    #[test]
    fn test_crypt_is_involution() {
        let original: Vec<u8> = (0..=255u8).cycle().take(1000).collect();
        for key in [DEFAULT_KEY, 1, -5, i32::MAX, i32::MIN] {
            for xor in [0x00, 0xFF] {
                let mut data = original.clone();
                crypt_in_place(&mut data, key, xor);
                crypt_in_place(&mut data, key, xor);
                assert_eq!(data, original);
            }
        }
    }

    #[test]
    fn test_crypt_changes_data() {
        let original: Vec<u8> = (0..=255u8).cycle().take(1000).collect();
        for key in [DEFAULT_KEY, 1, -5, i32::MIN] {
            for xor in [0x00, 0xFF] {
                let mut data = original.clone();
                crypt_in_place(&mut data, key, xor);
                assert_ne!(data, original);
            }
        }
    }

    #[test]
    fn test_fixed_point_key_cancels_xor_layer() {
        // 0x7FFFFFFF maps to itself and its low byte is 0xFF
        assert_eq!(next_key(i32::MAX), i32::MAX);

        let original: Vec<u8> = (0..64u8).collect();
        let mut data = original.clone();
        crypt_in_place(&mut data, i32::MAX, 0xFF);
        assert_eq!(data, original);

        crypt_in_place(&mut data, i32::MAX, 0x00);
        assert!(data.iter().zip(&original).all(|(d, o)| *d == o ^ 0xFF));
    }

    #[test]
    fn test_xor_layer_inverts_keystream_output() {
        let mut plain = vec![0u8; 16];
        let mut xored = vec![0u8; 16];
        crypt_in_place(&mut plain, 1234, 0x00);
        crypt_in_place(&mut xored, 1234, 0xFF);
        for (a, b) in plain.iter().zip(&xored) {
            assert_eq!(a ^ 0xFF, *b);
        }
    }

    #[test]
    fn test_seek_rederives_state() {
        let mut cipher = HeaderCipher::new(DEFAULT_KEY);
        let mut first = [0u8; 6];
        cipher.apply(&mut first);

        cipher.seek(3);
        let mut tail = [0u8; 3];
        cipher.apply(&mut tail);
        assert_eq!(tail, first[3..]);
        assert_eq!(cipher.position(), 6);
    }

    #[test]
    fn test_cipher_reader_random_access() {
        let plain: Vec<u8> = (0..64u8).collect();
        let mut encrypted = DEFAULT_KEY.to_le_bytes().to_vec();
        let mut body = plain.clone();
        crypt_in_place(&mut body, DEFAULT_KEY, 0);
        encrypted.extend_from_slice(&body);

        let mut reader = CipherReader::from_keyed(Cursor::new(encrypted), 0).unwrap();
        assert_eq!(reader.key(), DEFAULT_KEY);

        reader.seek(SeekFrom::Start(40)).unwrap();
        let mut buf = [0u8; 8];
        reader.read_exact(&mut buf).unwrap();
        assert_eq!(buf, plain[40..48]);

        reader.seek(SeekFrom::Current(-16)).unwrap();
        reader.read_exact(&mut buf).unwrap();
        assert_eq!(buf, plain[32..40]);

        reader.seek(SeekFrom::End(-4)).unwrap();
        let mut end = [0u8; 4];
        reader.read_exact(&mut end).unwrap();
        assert_eq!(end, plain[60..]);
    }

    #[test]
    fn test_file_helpers_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let plain_path = dir.path().join("main.hdr.dec");
        let enc_path = dir.path().join("main.hdr");
        let out_path = dir.path().join("main.hdr.out");

        std::fs::write(&plain_path, b"\x09\x00\x00\x00 some header bytes").unwrap();
        encrypt_file(&plain_path, &enc_path, 0x1234_5678, 0xFF).unwrap();

        let key = decrypt_file(&enc_path, &out_path, 0xFF).unwrap();
        assert_eq!(key, 0x1234_5678);
        assert_eq!(
            std::fs::read(&out_path).unwrap(),
            std::fs::read(&plain_path).unwrap()
        );
    }
}
