use std::fmt;
use thiserror::Error;

/// Number of hydroxylable proline sites in the collagen model; HD codes are numerators over it.
pub const HD_DENOMINATOR: u32 = 42;
/// DD codes are per-mille numerators.
pub const DD_DENOMINATOR: u32 = 1000;

const CASE_DIR_PREFIX: &str = "Wyniki_";
const CASE_DIR_MARKER: &str = "HYP";

/// Composite key of one simulated structure.
///
/// Ordering is lexicographic over (HD, DD, Variant_HD, Variant_DD, Position),
/// which is the order rows appear in every exported table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StructureKey {
    pub hd_code: u32,
    pub dd_code: u32,
    pub variant_hd: u32,
    pub variant_dd: u32,
    pub position: u32,
}

impl StructureKey {
    pub fn hd(&self) -> f64 {
        self.hd_code as f64 / HD_DENOMINATOR as f64
    }

    pub fn dd(&self) -> f64 {
        self.dd_code as f64 / DD_DENOMINATOR as f64
    }

    /// The case directory this structure's report is expected to live under.
    pub fn case_id(&self) -> CaseId {
        CaseId::for_structure(self.hd_code, self.variant_hd)
    }
}

impl fmt::Display for StructureKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "HD={}/{} DD={}/{} variant=({}, {}) position={}",
            self.hd_code,
            HD_DENOMINATOR,
            self.dd_code,
            DD_DENOMINATOR,
            self.variant_hd,
            self.variant_dd,
            self.position
        )
    }
}

/// One hydroxylation condition, i.e. one `Wyniki_*` directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CaseId {
    pub hd_code: u32,
    pub variant: Option<u32>,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("Directory name '{0}' does not match 'Wyniki_<HD>HYP[_<variant>]'")]
pub struct ParseCaseIdError(pub String);

impl CaseId {
    pub fn new(hd_code: u32, variant: Option<u32>) -> Self {
        Self { hd_code, variant }
    }

    /// Fully unhydroxylated and fully hydroxylated collagen have a single
    /// hydroxylation pattern, so their directories carry no variant suffix.
    pub fn for_structure(hd_code: u32, variant_hd: u32) -> Self {
        if hd_code == 0 || hd_code == HD_DENOMINATOR {
            Self::new(hd_code, None)
        } else {
            Self::new(hd_code, Some(variant_hd))
        }
    }

    pub fn hd(&self) -> f64 {
        self.hd_code as f64 / HD_DENOMINATOR as f64
    }

    pub fn directory_name(&self) -> String {
        match self.variant {
            Some(variant) => format!(
                "{CASE_DIR_PREFIX}{}{CASE_DIR_MARKER}_{variant}",
                self.hd_code
            ),
            None => format!("{CASE_DIR_PREFIX}{}{CASE_DIR_MARKER}", self.hd_code),
        }
    }

    pub fn parse_directory_name(name: &str) -> Result<Self, ParseCaseIdError> {
        let err = || ParseCaseIdError(name.to_string());

        let rest = name.strip_prefix(CASE_DIR_PREFIX).ok_or_else(err)?;
        let (hd_str, tail) = rest.split_once(CASE_DIR_MARKER).ok_or_else(err)?;
        let hd_code = parse_digits(hd_str).ok_or_else(err)?;
        if hd_code > HD_DENOMINATOR {
            return Err(err());
        }

        let variant = match tail {
            "" => None,
            _ => {
                let variant_str = tail.strip_prefix('_').ok_or_else(err)?;
                Some(parse_digits(variant_str).ok_or_else(err)?)
            }
        };

        Ok(Self { hd_code, variant })
    }
}

impl fmt::Display for CaseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.directory_name())
    }
}

fn parse_digits(s: &str) -> Option<u32> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}
