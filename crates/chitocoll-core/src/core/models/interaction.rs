use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Number of amino-acid categories reported by the per-residue analyses.
pub const AMINO_ACID_COUNT: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AminoAcid {
    Ala,
    Arg,
    Gln,
    Glu,
    Gly,
    Hyp,
    Leu,
    Pro,
}

impl AminoAcid {
    /// Column order of the per-residue block in an analysis report.
    pub const ALL: [AminoAcid; AMINO_ACID_COUNT] = [
        Self::Ala,
        Self::Arg,
        Self::Gln,
        Self::Glu,
        Self::Gly,
        Self::Hyp,
        Self::Leu,
        Self::Pro,
    ];

    pub fn code(&self) -> &'static str {
        match self {
            Self::Ala => "ALA",
            Self::Arg => "ARG",
            Self::Gln => "GLN",
            Self::Glu => "GLU",
            Self::Gly => "GLY",
            Self::Hyp => "HYP",
            Self::Leu => "LEU",
            Self::Pro => "PRO",
        }
    }
}

impl fmt::Display for AminoAcid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum InteractionType {
    BindingEnergy,
    HydrogenBonds,
    HydrophobicInteractions,
    IonicInteractions,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("Unknown interaction type '{0}'")]
pub struct ParseInteractionTypeError(pub String);

impl InteractionType {
    pub const ALL: [InteractionType; 4] = [
        Self::BindingEnergy,
        Self::HydrogenBonds,
        Self::HydrophobicInteractions,
        Self::IonicInteractions,
    ];

    /// Human-readable label used in plot titles and axis captions.
    pub fn label(&self) -> &'static str {
        match self {
            Self::BindingEnergy => "Binding Energy",
            Self::HydrogenBonds => "Hydrogen Bonds",
            Self::HydrophobicInteractions => "Hydrophobic Interactions",
            Self::IonicInteractions => "Ionic Interactions",
        }
    }

    /// Name used in configuration files and on the command line.
    pub fn config_name(&self) -> &'static str {
        match self {
            Self::BindingEnergy => "binding-energy",
            Self::HydrogenBonds => "hydrogen-bonds",
            Self::HydrophobicInteractions => "hydrophobic-interactions",
            Self::IonicInteractions => "ionic-interactions",
        }
    }

    /// Prefix of the exported column names (and of the JSON export file).
    pub fn column_prefix(&self) -> &'static str {
        match self {
            Self::BindingEnergy => "Binding_Energy",
            Self::HydrogenBonds => "Hydrogen_Bonds",
            Self::HydrophobicInteractions => "Hydrophobic_Interactions",
            Self::IonicInteractions => "Ionic_Interactions",
        }
    }

    /// Sub-directory of a case directory holding this type's reports.
    pub fn subdirectory(&self) -> &'static str {
        match self {
            Self::BindingEnergy => "Bindenergy",
            _ => "Analysis",
        }
    }

    pub fn is_per_residue(&self) -> bool {
        !matches!(self, Self::BindingEnergy)
    }

    pub fn measurement_width(&self) -> usize {
        if self.is_per_residue() {
            AMINO_ACID_COUNT
        } else {
            1
        }
    }

    pub fn column_names(&self) -> Vec<String> {
        if self.is_per_residue() {
            AminoAcid::ALL
                .iter()
                .map(|aa| format!("{}_{}", self.column_prefix(), aa.code()))
                .collect()
        } else {
            vec![self.column_prefix().to_string()]
        }
    }

    /// Fixed window of the upstream report format for this interaction type.
    pub fn default_layout(&self) -> ReportLayout {
        match self {
            Self::BindingEnergy => ReportLayout::new(0, 1, 1),
            Self::HydrogenBonds => ReportLayout::new(70, 27, AMINO_ACID_COUNT),
            Self::HydrophobicInteractions => ReportLayout::new(70, 35, AMINO_ACID_COUNT),
            Self::IonicInteractions => ReportLayout::new(70, 43, AMINO_ACID_COUNT),
        }
    }
}

impl FromStr for InteractionType {
    type Err = ParseInteractionTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_lowercase();
        match normalized.as_str() {
            "bindingenergy" | "bindenergy" | "energy" => Ok(Self::BindingEnergy),
            "hydrogenbonds" | "hbonds" => Ok(Self::HydrogenBonds),
            "hydrophobicinteractions" | "hydrophobic" => Ok(Self::HydrophobicInteractions),
            "ionicinteractions" | "ionic" => Ok(Self::IonicInteractions),
            _ => Err(ParseInteractionTypeError(s.to_string())),
        }
    }
}

impl fmt::Display for InteractionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

pub const DEFAULT_MAX_ROWS: usize = 31;

/// Row/column window read from one report file.
///
/// `header_row` counts non-blank lines from zero; data rows follow it directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportLayout {
    pub header_row: usize,
    pub first_column: usize,
    pub column_count: usize,
    pub max_rows: usize,
}

impl ReportLayout {
    pub fn new(header_row: usize, first_column: usize, column_count: usize) -> Self {
        Self {
            header_row,
            first_column,
            column_count,
            max_rows: DEFAULT_MAX_ROWS,
        }
    }

    pub fn with_max_rows(mut self, max_rows: usize) -> Self {
        self.max_rows = max_rows;
        self
    }

    pub fn columns(&self) -> std::ops::Range<usize> {
        self.first_column..self.first_column + self.column_count
    }
}
