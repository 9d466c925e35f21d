//! Rank-1 constraint systems as emitted by circom (`.r1cs`).

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use num_bigint::BigUint;
use sha2::{Digest, Sha256};
use tracing::debug;

use super::binfile::{arrange_sections, write_bin_file, BinFile, SectionReader, SectionWriter};
use super::errors::CheckResult;
use super::field::{FieldElement, PrimeField};

const ARTIFACT: &str = "r1cs";
const VERSION: u32 = 1;
const HEADER_SECTION: u32 = 1;
const CONSTRAINTS_SECTION: u32 = 2;
const WIRE_TO_LABEL_SECTION: u32 = 3;
const KNOWN_SECTIONS: [u32; 3] = [HEADER_SECTION, CONSTRAINTS_SECTION, WIRE_TO_LABEL_SECTION];

/// A constraint references a signal the witness does not have.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SignalOutOfRange {
    pub signal: usize,
    pub witness_len: usize,
}

impl fmt::Display for SignalOutOfRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "signal {} is out of range for a witness of {} values",
            self.signal, self.witness_len
        )
    }
}

/// Weighted sum of signals. Terms are keyed by signal index, so iteration
/// is in ascending signal order and each signal appears at most once.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinearCombination {
    terms: BTreeMap<usize, FieldElement>,
}

impl LinearCombination {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the coefficient of `signal`, replacing any previous one.
    pub fn insert(&mut self, signal: usize, coefficient: FieldElement) {
        self.terms.insert(signal, coefficient);
    }

    pub fn with_term(mut self, signal: usize, coefficient: FieldElement) -> Self {
        self.insert(signal, coefficient);
        self
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn terms(&self) -> impl Iterator<Item = (usize, &FieldElement)> {
        self.terms.iter().map(|(idx, coeff)| (*idx, coeff))
    }

    pub fn max_signal(&self) -> Option<usize> {
        self.terms.keys().next_back().copied()
    }

    pub fn evaluate(
        &self,
        field: &PrimeField,
        values: &[FieldElement],
    ) -> Result<FieldElement, SignalOutOfRange> {
        let mut acc = field.zero();
        for (idx, coeff) in self.terms() {
            let value = values.get(idx).ok_or(SignalOutOfRange {
                signal: idx,
                witness_len: values.len(),
            })?;
            acc = field.add(&acc, &field.mul(coeff, value));
        }
        Ok(acc)
    }
}

/// Describes a single R1CS constraint `<a, w> * <b, w> = <c, w>`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct R1csConstraint {
    pub a: LinearCombination,
    pub b: LinearCombination,
    pub c: LinearCombination,
}

impl R1csConstraint {
    pub fn new(a: LinearCombination, b: LinearCombination, c: LinearCombination) -> Self {
        Self { a, b, c }
    }

    pub fn evaluate(
        &self,
        field: &PrimeField,
        values: &[FieldElement],
    ) -> Result<(FieldElement, FieldElement, FieldElement), SignalOutOfRange> {
        Ok((
            self.a.evaluate(field, values)?,
            self.b.evaluate(field, values)?,
            self.c.evaluate(field, values)?,
        ))
    }

    /// Every signal with a term in `a`, `b` or `c`, ascending.
    pub fn support(&self) -> BTreeSet<usize> {
        self.a
            .terms()
            .chain(self.b.terms())
            .chain(self.c.terms())
            .map(|(idx, _)| idx)
            .collect()
    }

    pub fn max_signal(&self) -> Option<usize> {
        [self.a.max_signal(), self.b.max_signal(), self.c.max_signal()]
            .into_iter()
            .flatten()
            .max()
    }
}

/// Header section of an `.r1cs` file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct R1csHeader {
    pub n8: usize,
    pub n_wires: u32,
    pub n_pub_out: u32,
    pub n_pub_in: u32,
    pub n_prv_in: u32,
    pub n_labels: u64,
    pub n_constraints: u32,
}

/// Decoded constraint system. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConstraintSystem {
    field: PrimeField,
    header: R1csHeader,
    constraints: Vec<R1csConstraint>,
    wire_to_label: Option<Vec<u64>>,
    /// Section ids in file order, so `encode` reproduces the layout.
    section_order: Vec<u32>,
    /// Sections this crate does not interpret (e.g. custom gates), kept raw.
    other_sections: Vec<(u32, Vec<u8>)>,
}

impl ConstraintSystem {
    /// Builds a system in memory with no declared inputs or outputs.
    pub fn new(field: PrimeField, n_wires: u32, constraints: Vec<R1csConstraint>) -> Self {
        let header = R1csHeader {
            n8: field.n8(),
            n_wires,
            n_pub_out: 0,
            n_pub_in: 0,
            n_prv_in: 0,
            n_labels: u64::from(n_wires),
            n_constraints: constraints.len() as u32,
        };
        Self {
            field,
            header,
            constraints,
            wire_to_label: None,
            section_order: vec![HEADER_SECTION, CONSTRAINTS_SECTION],
            other_sections: Vec::new(),
        }
    }

    pub fn with_io_counts(mut self, n_pub_out: u32, n_pub_in: u32, n_prv_in: u32) -> Self {
        self.header.n_pub_out = n_pub_out;
        self.header.n_pub_in = n_pub_in;
        self.header.n_prv_in = n_prv_in;
        self
    }

    pub fn with_wire_to_label(mut self, map: Vec<u64>) -> Self {
        self.wire_to_label = Some(map);
        if !self.section_order.contains(&WIRE_TO_LABEL_SECTION) {
            self.section_order.push(WIRE_TO_LABEL_SECTION);
        }
        self
    }

    pub fn field(&self) -> &PrimeField {
        &self.field
    }

    pub fn header(&self) -> &R1csHeader {
        &self.header
    }

    pub fn constraints(&self) -> &[R1csConstraint] {
        &self.constraints
    }

    pub fn num_constraints(&self) -> usize {
        self.constraints.len()
    }

    pub fn wire_to_label(&self) -> Option<&[u64]> {
        self.wire_to_label.as_deref()
    }

    pub fn max_signal(&self) -> Option<usize> {
        self.constraints.iter().filter_map(|c| c.max_signal()).max()
    }

    pub fn digest(&self) -> [u8; 32] {
        let mut hasher = Sha256::new();
        hasher.update(self.field.modulus().to_bytes_le());
        hasher.update(self.header.n_wires.to_le_bytes());
        for constraint in &self.constraints {
            absorb_lc(&mut hasher, &constraint.a);
            absorb_lc(&mut hasher, &constraint.b);
            absorb_lc(&mut hasher, &constraint.c);
        }
        hasher.finalize().into()
    }

    pub fn decode(bytes: &[u8]) -> CheckResult<Self> {
        let file = BinFile::parse(bytes, ARTIFACT, &[VERSION])?;

        let mut reader = file.unique_section(HEADER_SECTION)?;
        let (field, header) = read_header(&mut reader)?;
        reader.finish()?;

        let mut reader = file.unique_section(CONSTRAINTS_SECTION)?;
        // Each constraint needs at least three u32 counts.
        let mut constraints =
            Vec::with_capacity((header.n_constraints as usize).min(reader.remaining() / 12));
        for _ in 0..header.n_constraints {
            let a = read_lc(&mut reader, &field, header.n8)?;
            let b = read_lc(&mut reader, &field, header.n8)?;
            let c = read_lc(&mut reader, &field, header.n8)?;
            constraints.push(R1csConstraint::new(a, b, c));
        }
        reader.finish()?;

        let wire_to_label = match file.optional_section(WIRE_TO_LABEL_SECTION)? {
            Some(mut reader) => {
                let mut map =
                    Vec::with_capacity((header.n_wires as usize).min(reader.remaining() / 8));
                for _ in 0..header.n_wires {
                    map.push(reader.read_u64()?);
                }
                reader.finish()?;
                Some(map)
            }
            None => None,
        };

        debug!(
            n8 = header.n8,
            wires = header.n_wires,
            constraints = header.n_constraints,
            "decoded constraint system"
        );

        Ok(Self {
            field,
            header,
            constraints,
            wire_to_label,
            section_order: file.section_ids(),
            other_sections: file.other_sections(&KNOWN_SECTIONS),
        })
    }

    pub fn encode(&self) -> CheckResult<Vec<u8>> {
        let n8 = self.header.n8;
        let mut header = SectionWriter::new();
        header.put_u32(n8 as u32);
        header.put_prime(&self.field, n8, ARTIFACT)?;
        header.put_u32(self.header.n_wires);
        header.put_u32(self.header.n_pub_out);
        header.put_u32(self.header.n_pub_in);
        header.put_u32(self.header.n_prv_in);
        header.put_u64(self.header.n_labels);
        header.put_u32(self.constraints.len() as u32);

        let mut body = SectionWriter::new();
        for constraint in &self.constraints {
            for lc in [&constraint.a, &constraint.b, &constraint.c] {
                body.put_u32(lc.len() as u32);
                for (idx, coeff) in lc.terms() {
                    body.put_u32(idx as u32);
                    body.put_field(&self.field, coeff, n8, ARTIFACT)?;
                }
            }
        }

        let mut sections = vec![
            (HEADER_SECTION, header.into_bytes()),
            (CONSTRAINTS_SECTION, body.into_bytes()),
        ];
        if let Some(map) = &self.wire_to_label {
            let mut labels = SectionWriter::new();
            for label in map {
                labels.put_u64(*label);
            }
            sections.push((WIRE_TO_LABEL_SECTION, labels.into_bytes()));
        }
        sections.extend(self.other_sections.iter().cloned());
        let sections = arrange_sections(&self.section_order, sections);
        Ok(write_bin_file(ARTIFACT, VERSION, sections))
    }
}

/// Reads `n8` and the prime shared by both artifact headers.
pub(crate) fn read_field_header(
    reader: &mut SectionReader<'_>,
) -> CheckResult<(PrimeField, usize)> {
    let n8 = reader.read_u32()? as usize;
    if n8 == 0 {
        return Err(reader.error("n8 must be positive"));
    }
    let prime = BigUint::from_bytes_le(reader.read_bytes(n8)?);
    let field = PrimeField::new(prime)
        .ok_or_else(|| reader.error("field prime must be odd and greater than 2"))?;
    Ok((field, n8))
}

fn read_header(reader: &mut SectionReader<'_>) -> CheckResult<(PrimeField, R1csHeader)> {
    let (field, n8) = read_field_header(reader)?;
    let header = R1csHeader {
        n8,
        n_wires: reader.read_u32()?,
        n_pub_out: reader.read_u32()?,
        n_pub_in: reader.read_u32()?,
        n_prv_in: reader.read_u32()?,
        n_labels: reader.read_u64()?,
        n_constraints: reader.read_u32()?,
    };
    Ok((field, header))
}

fn read_lc(
    reader: &mut SectionReader<'_>,
    field: &PrimeField,
    n8: usize,
) -> CheckResult<LinearCombination> {
    let count = reader.read_u32()?;
    let mut lc = LinearCombination::new();
    for _ in 0..count {
        let signal = reader.read_u32()? as usize;
        let coeff = reader.read_field(field, n8)?;
        lc.insert(signal, coeff);
    }
    Ok(lc)
}

fn absorb_lc(hasher: &mut Sha256, lc: &LinearCombination) {
    hasher.update((lc.len() as u32).to_le_bytes());
    for (idx, coeff) in lc.terms() {
        hasher.update((idx as u32).to_le_bytes());
        hasher.update(coeff.value().to_bytes_le());
    }
}
