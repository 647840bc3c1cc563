use super::ids::StructureKey;
use super::interaction::{AMINO_ACID_COUNT, InteractionType};
use std::collections::BTreeMap;
use std::collections::btree_map::Entry;

/// Reduced content of one report file.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Measurement {
    Energy(f64),
    PerResidue([f64; AMINO_ACID_COUNT]),
}

impl Measurement {
    pub fn values(&self) -> &[f64] {
        match self {
            Measurement::Energy(value) => std::slice::from_ref(value),
            Measurement::PerResidue(values) => values,
        }
    }

    /// Total over the amino-acid block; the energy itself for binding energies.
    pub fn total(&self) -> f64 {
        self.values().iter().sum()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StructureRecord {
    pub key: StructureKey,
    pub measurement: Measurement,
}

/// All records of one interaction type, unique per [`StructureKey`].
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    interaction: InteractionType,
    records: BTreeMap<StructureKey, Measurement>,
}

impl Dataset {
    pub fn new(interaction: InteractionType) -> Self {
        Self {
            interaction,
            records: BTreeMap::new(),
        }
    }

    pub fn interaction(&self) -> InteractionType {
        self.interaction
    }

    /// Inserts a record, refusing to overwrite an existing key.
    ///
    /// Returns the rejected record when the key is already present.
    pub fn insert(&mut self, record: StructureRecord) -> Result<(), StructureRecord> {
        match self.records.entry(record.key) {
            Entry::Vacant(slot) => {
                slot.insert(record.measurement);
                Ok(())
            }
            Entry::Occupied(_) => Err(record),
        }
    }

    pub fn get(&self, key: &StructureKey) -> Option<&Measurement> {
        self.records.get(key)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = StructureRecord> + '_ {
        self.records.iter().map(|(key, measurement)| StructureRecord {
            key: *key,
            measurement: *measurement,
        })
    }

    pub fn keys(&self) -> impl Iterator<Item = &StructureKey> {
        self.records.keys()
    }

    pub fn filter(&self, mut predicate: impl FnMut(&StructureKey) -> bool) -> Dataset {
        Dataset {
            interaction: self.interaction,
            records: self
                .records
                .iter()
                .filter(|(key, _)| predicate(key))
                .map(|(key, measurement)| (*key, *measurement))
                .collect(),
        }
    }
}

/// Row-per-structure table with named, possibly missing, measurement columns.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct WideTable {
    pub(crate) columns: Vec<String>,
    pub(crate) rows: BTreeMap<StructureKey, Vec<Option<f64>>>,
}

impl WideTable {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: BTreeMap::new(),
        }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> impl Iterator<Item = (&StructureKey, &[Option<f64>])> {
        self.rows.iter().map(|(key, values)| (key, values.as_slice()))
    }

    pub fn row(&self, key: &StructureKey) -> Option<&[Option<f64>]> {
        self.rows.get(key).map(Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }
}

impl From<&Dataset> for WideTable {
    fn from(dataset: &Dataset) -> Self {
        let mut table = WideTable::new(dataset.interaction.column_names());
        for record in dataset.iter() {
            table.rows.insert(
                record.key,
                record.measurement.values().iter().copied().map(Some).collect(),
            );
        }
        table
    }
}
