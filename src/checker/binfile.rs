//! Section container shared by the `.r1cs` and `.wtns` artifacts.
//!
//! Layout: 4-byte magic, `u32` version, `u32` section count, then per
//! section a `u32` type, a `u64` byte length and the payload. All integers
//! are little-endian.

use super::errors::{CheckError, CheckResult};
use super::field::{FieldElement, PrimeField};

/// Little-endian cursor over one section payload (or the file preamble).
#[derive(Debug, Clone)]
pub struct SectionReader<'a> {
    artifact: &'static str,
    context: String,
    data: &'a [u8],
    pos: usize,
}

impl<'a> SectionReader<'a> {
    pub fn new(artifact: &'static str, context: impl Into<String>, data: &'a [u8]) -> Self {
        Self {
            artifact,
            context: context.into(),
            data,
            pos: 0,
        }
    }

    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    pub fn error(&self, reason: impl AsRef<str>) -> CheckError {
        CheckError::malformed(
            self.artifact,
            format!("{}: {}", self.context, reason.as_ref()),
        )
    }

    pub fn read_bytes(&mut self, len: usize) -> CheckResult<&'a [u8]> {
        if len > self.remaining() {
            return Err(self.error(format!(
                "needs {} more bytes at offset {} but only {} remain",
                len,
                self.pos,
                self.remaining()
            )));
        }
        let bytes = &self.data[self.pos..self.pos + len];
        self.pos += len;
        Ok(bytes)
    }

    pub fn read_u32(&mut self) -> CheckResult<u32> {
        let mut arr = [0u8; 4];
        arr.copy_from_slice(self.read_bytes(4)?);
        Ok(u32::from_le_bytes(arr))
    }

    pub fn read_u64(&mut self) -> CheckResult<u64> {
        let mut arr = [0u8; 8];
        arr.copy_from_slice(self.read_bytes(8)?);
        Ok(u64::from_le_bytes(arr))
    }

    pub fn read_field(&mut self, field: &PrimeField, n8: usize) -> CheckResult<FieldElement> {
        Ok(field.from_bytes(self.read_bytes(n8)?, true))
    }

    /// Fails unless the payload was consumed exactly.
    pub fn finish(self) -> CheckResult<()> {
        if self.remaining() != 0 {
            return Err(self.error(format!(
                "declared length {} but content ends after {} bytes",
                self.data.len(),
                self.pos
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy)]
struct Section<'a> {
    id: u32,
    payload: &'a [u8],
}

/// A parsed container whose sections still borrow the input bytes.
#[derive(Debug, Clone)]
pub struct BinFile<'a> {
    artifact: &'static str,
    version: u32,
    sections: Vec<Section<'a>>,
}

impl<'a> BinFile<'a> {
    pub fn parse(
        bytes: &'a [u8],
        artifact: &'static str,
        supported_versions: &[u32],
    ) -> CheckResult<Self> {
        let mut reader = SectionReader::new(artifact, "preamble", bytes);
        let magic = reader.read_bytes(4)?;
        if magic != artifact.as_bytes() {
            return Err(reader.error(format!(
                "expected magic {:?}, found {:?}",
                artifact,
                String::from_utf8_lossy(magic)
            )));
        }
        let version = reader.read_u32()?;
        if !supported_versions.contains(&version) {
            return Err(reader.error(format!("unsupported version {version}")));
        }
        let count = reader.read_u32()?;

        let mut sections = Vec::new();
        for _ in 0..count {
            let id = reader.read_u32()?;
            let size = reader.read_u64()?;
            let size = usize::try_from(size)
                .map_err(|_| reader.error(format!("section {id} size {size} overflows")))?;
            let payload = reader.read_bytes(size).map_err(|_| {
                reader.error(format!("section {id} declares {size} bytes past end of file"))
            })?;
            sections.push(Section { id, payload });
        }
        reader.finish()?;

        Ok(Self {
            artifact,
            version,
            sections,
        })
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    /// Section ids in file order.
    pub fn section_ids(&self) -> Vec<u32> {
        self.sections.iter().map(|s| s.id).collect()
    }

    /// Payloads of every section whose id is not in `known`, in file order.
    pub fn other_sections(&self, known: &[u32]) -> Vec<(u32, Vec<u8>)> {
        self.sections
            .iter()
            .filter(|s| !known.contains(&s.id))
            .map(|s| (s.id, s.payload.to_vec()))
            .collect()
    }

    /// The only section with this id, or `None` when absent.
    pub fn optional_section(&self, id: u32) -> CheckResult<Option<SectionReader<'a>>> {
        let mut matching = self.sections.iter().filter(|s| s.id == id);
        let first = matching.next();
        if matching.next().is_some() {
            return Err(CheckError::malformed(
                self.artifact,
                format!("section {id} appears more than once"),
            ));
        }
        Ok(first.map(|s| SectionReader::new(self.artifact, format!("section {id}"), s.payload)))
    }

    pub fn unique_section(&self, id: u32) -> CheckResult<SectionReader<'a>> {
        self.optional_section(id)?.ok_or_else(|| {
            CheckError::malformed(self.artifact, format!("missing section {id}"))
        })
    }
}

/// Appends little-endian values to a section payload.
#[derive(Debug, Default, Clone)]
pub struct SectionWriter {
    buf: Vec<u8>,
}

impl SectionWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put_u32(&mut self, value: u32) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    pub fn put_u64(&mut self, value: u64) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    pub fn put_field(
        &mut self,
        field: &PrimeField,
        value: &FieldElement,
        n8: usize,
        artifact: &str,
    ) -> CheckResult<()> {
        let bytes = field.to_bytes_le(value, n8).ok_or_else(|| {
            CheckError::malformed(artifact, format!("element {value} does not fit in {n8} bytes"))
        })?;
        self.buf.extend_from_slice(&bytes);
        Ok(())
    }

    /// The field modulus, zero-padded to `n8` bytes.
    pub fn put_prime(&mut self, field: &PrimeField, n8: usize, artifact: &str) -> CheckResult<()> {
        let mut bytes = field.modulus().to_bytes_le();
        if bytes.len() > n8 {
            return Err(CheckError::malformed(
                artifact,
                format!("prime does not fit in {n8} bytes"),
            ));
        }
        bytes.resize(n8, 0);
        self.buf.extend_from_slice(&bytes);
        Ok(())
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }
}

/// Reorders `sections` to follow `order`, taking the first unused section
/// with each listed id. Sections `order` does not mention go last.
pub fn arrange_sections(
    order: &[u32],
    mut sections: Vec<(u32, Vec<u8>)>,
) -> Vec<(u32, Vec<u8>)> {
    let mut arranged = Vec::with_capacity(sections.len());
    for id in order {
        if let Some(pos) = sections.iter().position(|(candidate, _)| candidate == id) {
            arranged.push(sections.remove(pos));
        }
    }
    arranged.extend(sections);
    arranged
}

/// Serializes a container; sections are written in insertion order.
pub fn write_bin_file(artifact: &str, version: u32, sections: Vec<(u32, Vec<u8>)>) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(artifact.as_bytes());
    out.extend_from_slice(&version.to_le_bytes());
    out.extend_from_slice(&(sections.len() as u32).to_le_bytes());
    for (id, payload) in sections {
        out.extend_from_slice(&id.to_le_bytes());
        out.extend_from_slice(&(payload.len() as u64).to_le_bytes());
        out.extend_from_slice(&payload);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_sections_in_any_order() {
        let bytes = write_bin_file("wtns", 2, vec![(2, vec![9, 9]), (1, vec![1, 0, 0, 0])]);
        let file = BinFile::parse(&bytes, "wtns", &[1, 2]).unwrap();
        assert_eq!(file.version(), 2);
        assert_eq!(file.section_ids(), vec![2, 1]);
        let mut header = file.unique_section(1).unwrap();
        assert_eq!(header.read_u32().unwrap(), 1);
        header.finish().unwrap();
        assert!(file.optional_section(3).unwrap().is_none());
    }

    #[test]
    fn rejects_wrong_magic_and_version() {
        let bytes = write_bin_file("r1cs", 1, vec![]);
        assert!(BinFile::parse(&bytes, "wtns", &[2]).is_err());
        assert!(BinFile::parse(&bytes, "r1cs", &[2]).is_err());
        assert!(BinFile::parse(&bytes, "r1cs", &[1]).is_ok());
    }

    #[test]
    fn rejects_section_running_past_end() {
        let mut bytes = write_bin_file("wtns", 2, vec![(1, vec![0; 8])]);
        bytes.truncate(bytes.len() - 3);
        let err = BinFile::parse(&bytes, "wtns", &[2]).unwrap_err();
        assert!(err.to_string().contains("past end of file"));
    }

    #[test]
    fn rejects_trailing_garbage() {
        let mut bytes = write_bin_file("wtns", 2, vec![(1, vec![0; 4])]);
        bytes.push(0xff);
        assert!(BinFile::parse(&bytes, "wtns", &[2]).is_err());
    }

    #[test]
    fn duplicate_and_missing_sections() {
        let bytes = write_bin_file("wtns", 2, vec![(1, vec![]), (1, vec![])]);
        let file = BinFile::parse(&bytes, "wtns", &[2]).unwrap();
        assert!(file.unique_section(1).is_err());
        assert!(file.unique_section(2).is_err());
    }

    #[test]
    fn arrange_follows_recorded_order() {
        let sections = vec![(1, vec![1]), (2, vec![2]), (9, vec![9]), (9, vec![10])];
        let arranged = arrange_sections(&[9, 2, 1, 9], sections);
        assert_eq!(
            arranged,
            vec![(9, vec![9]), (2, vec![2]), (1, vec![1]), (9, vec![10])]
        );
        let arranged = arrange_sections(&[2], vec![(1, vec![]), (3, vec![]), (2, vec![])]);
        let ids: Vec<u32> = arranged.iter().map(|(id, _)| *id).collect();
        assert_eq!(ids, vec![2, 1, 3]);
    }

    #[test]
    fn other_sections_keep_payloads() {
        let bytes = write_bin_file("r1cs", 1, vec![(4, vec![7, 7]), (1, vec![]), (5, vec![8])]);
        let file = BinFile::parse(&bytes, "r1cs", &[1]).unwrap();
        assert_eq!(file.other_sections(&[1, 2, 3]), vec![(4, vec![7, 7]), (5, vec![8])]);
    }

    #[test]
    fn unconsumed_payload_is_malformed() {
        let mut reader = SectionReader::new("r1cs", "section 1", &[1, 0, 0, 0, 7]);
        assert_eq!(reader.read_u32().unwrap(), 1);
        assert!(matches!(
            reader.finish(),
            Err(CheckError::MalformedArtifact { .. })
        ));
    }
}
