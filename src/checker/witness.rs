//! Witness artifacts: binary `.wtns`, one-decimal-per-line text, and the
//! JSON array form produced by `snarkjs wej`.

use std::path::Path;

use serde_json::Value;
use tracing::debug;

use super::binfile::{arrange_sections, write_bin_file, BinFile, SectionWriter};
use super::errors::{CheckError, CheckResult};
use super::field::{FieldElement, PrimeField};
use super::r1cs::read_field_header;

const ARTIFACT: &str = "wtns";
const VERSION: u32 = 2;
const HEADER_SECTION: u32 = 1;
const DATA_SECTION: u32 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WitnessFormat {
    Binary,
    Text,
    Json,
}

impl WitnessFormat {
    /// Picks a format from the file extension, falling back to content
    /// sniffing: `wtns` magic is binary, a leading `[` is JSON.
    pub fn detect(path: Option<&Path>, bytes: &[u8]) -> Self {
        match path.and_then(|p| p.extension()).and_then(|e| e.to_str()) {
            Some("wtns") => return WitnessFormat::Binary,
            Some("json") => return WitnessFormat::Json,
            _ => {}
        }
        if bytes.starts_with(ARTIFACT.as_bytes()) {
            WitnessFormat::Binary
        } else if bytes.iter().find(|b| !b.is_ascii_whitespace()) == Some(&b'[') {
            WitnessFormat::Json
        } else {
            WitnessFormat::Text
        }
    }
}

/// Values for every signal of one circuit execution; `values[0]` is 1.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Witness {
    field: PrimeField,
    n8: usize,
    version: u32,
    /// Section ids in the order they were read, so `encode` reproduces them.
    section_order: Vec<u32>,
    values: Vec<FieldElement>,
}

impl Witness {
    pub fn new(field: PrimeField, values: Vec<FieldElement>) -> CheckResult<Self> {
        match values.first() {
            None => return Err(CheckError::malformed(ARTIFACT, "witness is empty")),
            Some(first) if !first.is_one() => {
                return Err(CheckError::malformed(
                    ARTIFACT,
                    format!("witness[0] must be 1, found {first}"),
                ))
            }
            Some(_) => {}
        }
        Ok(Self {
            n8: field.n8(),
            field,
            version: VERSION,
            section_order: vec![HEADER_SECTION, DATA_SECTION],
            values,
        })
    }

    pub fn field(&self) -> &PrimeField {
        &self.field
    }

    pub fn values(&self) -> &[FieldElement] {
        &self.values
    }

    pub fn get(&self, signal: usize) -> Option<&FieldElement> {
        self.values.get(signal)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn from_bytes(
        bytes: &[u8],
        format: WitnessFormat,
        field: &PrimeField,
    ) -> CheckResult<Self> {
        match format {
            WitnessFormat::Binary => Self::decode(bytes),
            WitnessFormat::Text => Self::parse_text(utf8(bytes)?, field),
            WitnessFormat::Json => Self::parse_json(utf8(bytes)?, field),
        }
    }

    /// Reads a witness file; `field` reduces text and JSON values, binary
    /// witnesses carry their own prime.
    pub fn load(path: &Path, field: &PrimeField) -> CheckResult<Self> {
        let bytes = std::fs::read(path).map_err(|e| CheckError::io(path, e))?;
        let format = WitnessFormat::detect(Some(path), &bytes);
        debug!(path = %path.display(), ?format, "loading witness");
        Self::from_bytes(&bytes, format, field)
    }

    pub fn decode(bytes: &[u8]) -> CheckResult<Self> {
        let file = BinFile::parse(bytes, ARTIFACT, &[1, VERSION])?;
        if let Some((id, _)) = file
            .other_sections(&[HEADER_SECTION, DATA_SECTION])
            .first()
        {
            return Err(CheckError::malformed(
                ARTIFACT,
                format!("unexpected section {id}"),
            ));
        }

        let mut reader = file.unique_section(HEADER_SECTION)?;
        let (field, n8) = read_field_header(&mut reader)?;
        let n_witness = reader.read_u32()? as usize;
        reader.finish()?;

        let mut reader = file.unique_section(DATA_SECTION)?;
        if reader.remaining() != n_witness.saturating_mul(n8) {
            return Err(reader.error(format!(
                "header declares {} elements of {} bytes but data holds {} bytes",
                n_witness,
                n8,
                reader.remaining()
            )));
        }
        let mut values = Vec::with_capacity(n_witness);
        for _ in 0..n_witness {
            values.push(reader.read_field(&field, n8)?);
        }
        reader.finish()?;

        let mut witness = Self::new(field, values)?;
        witness.n8 = n8;
        witness.version = file.version();
        witness.section_order = file.section_ids();
        Ok(witness)
    }

    pub fn encode(&self) -> CheckResult<Vec<u8>> {
        let mut header = SectionWriter::new();
        header.put_u32(self.n8 as u32);
        header.put_prime(&self.field, self.n8, ARTIFACT)?;
        header.put_u32(self.values.len() as u32);

        let mut data = SectionWriter::new();
        for value in &self.values {
            data.put_field(&self.field, value, self.n8, ARTIFACT)?;
        }

        let sections = arrange_sections(
            &self.section_order,
            vec![
                (HEADER_SECTION, header.into_bytes()),
                (DATA_SECTION, data.into_bytes()),
            ],
        );
        Ok(write_bin_file(ARTIFACT, self.version, sections))
    }

    /// One decimal integer per line, line `i` holding signal `i`. Blank
    /// lines are only allowed after the last value.
    pub fn parse_text(text: &str, field: &PrimeField) -> CheckResult<Self> {
        let lines: Vec<&str> = text.lines().map(str::trim).collect();
        let end = lines
            .iter()
            .rposition(|line| !line.is_empty())
            .map_or(0, |last| last + 1);
        let values = lines[..end]
            .iter()
            .enumerate()
            .map(|(idx, line)| {
                if line.is_empty() {
                    return Err(CheckError::malformed(
                        "witness text",
                        format!("line {} is blank", idx + 1),
                    ));
                }
                parse_value(field, idx, line)
            })
            .collect::<CheckResult<Vec<_>>>()?;
        Self::new(field.clone(), values)
    }

    /// A JSON array of decimal strings or integers.
    pub fn parse_json(text: &str, field: &PrimeField) -> CheckResult<Self> {
        let entries: Vec<Value> = serde_json::from_str(text)
            .map_err(|e| CheckError::malformed("witness json", e.to_string()))?;
        let values = entries
            .iter()
            .enumerate()
            .map(|(idx, entry)| match entry {
                Value::String(s) => parse_value(field, idx, s),
                Value::Number(n) => parse_value(field, idx, &n.to_string()),
                other => Err(CheckError::malformed(
                    "witness json",
                    format!("entry {idx} is not a number: {other}"),
                )),
            })
            .collect::<CheckResult<Vec<_>>>()?;
        Self::new(field.clone(), values)
    }
}

fn utf8(bytes: &[u8]) -> CheckResult<&str> {
    std::str::from_utf8(bytes).map_err(|e| CheckError::malformed("witness text", e.to_string()))
}

fn parse_value(field: &PrimeField, idx: usize, text: &str) -> CheckResult<FieldElement> {
    field.from_decimal(text).ok_or_else(|| {
        CheckError::malformed(
            "witness text",
            format!("entry {idx} is not a decimal integer: {text:?}"),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_bigint::BigUint;
    use rand::RngCore;

    fn small_field() -> PrimeField {
        PrimeField::new(BigUint::from(13u8)).unwrap()
    }

    fn values(field: &PrimeField, raw: &[u64]) -> Vec<FieldElement> {
        raw.iter().map(|v| field.from_u64(*v)).collect()
    }

    #[test]
    fn binary_roundtrip_reproduces_bytes() {
        let field = PrimeField::bn254();
        let mut rng = rand::thread_rng();
        let mut elems = vec![field.one()];
        for _ in 0..16 {
            let mut bytes = [0u8; 32];
            rng.fill_bytes(&mut bytes);
            elems.push(field.from_bytes(&bytes, true));
        }
        let bytes = Witness::new(field, elems).unwrap().encode().unwrap();
        let decoded = Witness::decode(&bytes).unwrap();
        assert_eq!(decoded.len(), 17);
        assert_eq!(decoded.encode().unwrap(), bytes);
    }

    #[test]
    fn version_one_files_roundtrip_too() {
        let field = small_field();
        let mut witness = Witness::new(field.clone(), values(&field, &[1, 3, 4, 12])).unwrap();
        witness.version = 1;
        let bytes = witness.encode().unwrap();
        assert_eq!(Witness::decode(&bytes).unwrap().encode().unwrap(), bytes);
    }

    #[test]
    fn short_data_section_is_malformed() {
        let field = small_field();
        let witness = Witness::new(field.clone(), values(&field, &[1, 3, 4])).unwrap();
        let mut bytes = witness.encode().unwrap();
        // Header payload: n8 (4) + prime (8) + nWitness (4), after 12 + 12 bytes of framing.
        let n_witness_offset = 12 + 12 + 4 + 8;
        bytes[n_witness_offset..n_witness_offset + 4].copy_from_slice(&4u32.to_le_bytes());
        let err = Witness::decode(&bytes).unwrap_err();
        assert!(matches!(err, CheckError::MalformedArtifact { .. }));
        assert!(err.to_string().contains("declares 4 elements"));
    }

    #[test]
    fn first_value_must_be_one() {
        let field = small_field();
        assert!(Witness::new(field.clone(), values(&field, &[2, 3])).is_err());
        assert!(Witness::new(field.clone(), Vec::new()).is_err());
        assert!(Witness::parse_text("0\n1\n", &field).is_err());
    }

    #[test]
    fn text_witness_reduces_values() {
        let field = small_field();
        let witness = Witness::parse_text("1\n 3\n17\r\n-1\n\n\n", &field).unwrap();
        assert_eq!(witness.values(), values(&field, &[1, 3, 4, 12]).as_slice());
        let err = Witness::parse_text("1\nabc\n", &field).unwrap_err();
        assert!(err.to_string().contains("entry 1"));
    }

    #[test]
    fn interior_blank_line_is_malformed() {
        let field = small_field();
        let err = Witness::parse_text("1\n3\n\n4\n12\n", &field).unwrap_err();
        assert!(matches!(err, CheckError::MalformedArtifact { .. }));
        assert!(err.to_string().contains("line 3 is blank"));
        assert!(Witness::parse_text("\n1\n3\n", &field).is_err());
    }

    #[test]
    fn data_section_first_roundtrips() {
        let field = small_field();
        let witness = Witness::new(field.clone(), values(&field, &[1, 3, 4, 12])).unwrap();
        let canonical = witness.encode().unwrap();
        let file = BinFile::parse(&canonical, ARTIFACT, &[VERSION]).unwrap();
        let mut header = file.unique_section(HEADER_SECTION).unwrap();
        let header = header.read_bytes(header.remaining()).unwrap().to_vec();
        let mut data = file.unique_section(DATA_SECTION).unwrap();
        let data = data.read_bytes(data.remaining()).unwrap().to_vec();

        let reordered =
            write_bin_file(ARTIFACT, VERSION, vec![(DATA_SECTION, data), (HEADER_SECTION, header)]);
        let decoded = Witness::decode(&reordered).unwrap();
        assert_eq!(decoded.values(), witness.values());
        assert_eq!(decoded.encode().unwrap(), reordered);
    }

    #[test]
    fn unknown_section_is_malformed() {
        let field = small_field();
        let witness = Witness::new(field.clone(), values(&field, &[1, 2])).unwrap();
        let canonical = witness.encode().unwrap();
        let file = BinFile::parse(&canonical, ARTIFACT, &[VERSION]).unwrap();
        let mut sections: Vec<(u32, Vec<u8>)> = [HEADER_SECTION, DATA_SECTION]
            .into_iter()
            .map(|id| {
                let mut reader = file.unique_section(id).unwrap();
                (id, reader.read_bytes(reader.remaining()).unwrap().to_vec())
            })
            .collect();
        sections.push((7, vec![0]));
        let err = Witness::decode(&write_bin_file(ARTIFACT, VERSION, sections)).unwrap_err();
        assert!(err.to_string().contains("unexpected section 7"));
    }

    #[test]
    fn json_witness_accepts_strings_and_numbers() {
        let field = PrimeField::bn254();
        let big = (field.modulus() - 1u8).to_string();
        let text = format!(r#"["1", 5, "{big}"]"#);
        let witness = Witness::parse_json(&text, &field).unwrap();
        assert_eq!(witness.get(1), Some(&field.from_u64(5)));
        assert_eq!(witness.get(2).unwrap().to_string(), big);
        assert!(Witness::parse_json(r#"["1", true]"#, &field).is_err());
        assert!(Witness::parse_json("{}", &field).is_err());
    }

    #[test]
    fn format_detection() {
        assert_eq!(
            WitnessFormat::detect(Some(Path::new("w.json")), b"1\n"),
            WitnessFormat::Json
        );
        assert_eq!(
            WitnessFormat::detect(Some(Path::new("w.wtns")), b""),
            WitnessFormat::Binary
        );
        assert_eq!(WitnessFormat::detect(None, b"wtns\x02"), WitnessFormat::Binary);
        assert_eq!(WitnessFormat::detect(None, b"  [\"1\"]"), WitnessFormat::Json);
        assert_eq!(WitnessFormat::detect(None, b"1\n2\n"), WitnessFormat::Text);
    }
}
