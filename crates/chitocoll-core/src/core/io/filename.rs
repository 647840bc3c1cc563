use crate::core::models::ids::{DD_DENOMINATOR, HD_DENOMINATOR, StructureKey};
use crate::core::models::interaction::InteractionType;
use thiserror::Error;

/// Number of integer fields embedded in a report filename.
pub const FILENAME_TOKEN_COUNT: usize = 5;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FilenameError {
    #[error("Expected {expected} digit groups, found {found}", expected = FILENAME_TOKEN_COUNT)]
    TooFewTokens { found: usize },
    #[error("Expected {expected} digit groups, found {found} (ambiguous)", expected = FILENAME_TOKEN_COUNT)]
    TooManyTokens { found: usize },
    #[error("Digit group '{token}' does not fit in an integer")]
    InvalidToken { token: String },
    #[error("Hydroxylation code {value} exceeds {max}", max = HD_DENOMINATOR)]
    HydroxylationOutOfRange { value: u32 },
    #[error("Deacetylation code {value} is outside 1..={max}", max = DD_DENOMINATOR)]
    DeacetylationOutOfRange { value: u32 },
}

/// Splits `name` into its maximal runs of ASCII digits.
fn digit_runs(name: &str) -> Vec<&str> {
    let mut runs = Vec::new();
    let mut start = None;
    for (idx, byte) in name.bytes().enumerate() {
        match (byte.is_ascii_digit(), start) {
            (true, None) => start = Some(idx),
            (false, Some(s)) => {
                runs.push(&name[s..idx]);
                start = None;
            }
            _ => {}
        }
    }
    if let Some(s) = start {
        runs.push(&name[s..]);
    }
    runs
}

/// Decodes `<hd> <variant_hd> <dd> <variant_dd> <position>` from a report filename.
///
/// The five digit groups are read strictly in that order; any other count is
/// rejected rather than guessed at.
pub fn decode(name: &str) -> Result<StructureKey, FilenameError> {
    let runs = digit_runs(name);
    match runs.len() {
        n if n < FILENAME_TOKEN_COUNT => return Err(FilenameError::TooFewTokens { found: n }),
        n if n > FILENAME_TOKEN_COUNT => return Err(FilenameError::TooManyTokens { found: n }),
        _ => {}
    }

    let mut tokens = [0u32; FILENAME_TOKEN_COUNT];
    for (slot, run) in tokens.iter_mut().zip(&runs) {
        *slot = run.parse().map_err(|_| FilenameError::InvalidToken {
            token: run.to_string(),
        })?;
    }
    let [hd_code, variant_hd, dd_code, variant_dd, position] = tokens;

    if hd_code > HD_DENOMINATOR {
        return Err(FilenameError::HydroxylationOutOfRange { value: hd_code });
    }
    if dd_code == 0 || dd_code > DD_DENOMINATOR {
        return Err(FilenameError::DeacetylationOutOfRange { value: dd_code });
    }

    Ok(StructureKey {
        hd_code,
        dd_code,
        variant_hd,
        variant_dd,
        position,
    })
}

/// Filename the simulation pipeline generates for `key`.
pub fn encode(key: &StructureKey, interaction: InteractionType) -> String {
    let suffix = match interaction {
        InteractionType::BindingEnergy => "bindenergy_Mg",
        _ => "analysis",
    };
    format!(
        "col_{}HYP_{}_chit_{}DD_{}_pos{}_{}.tab",
        key.hd_code, key.variant_hd, key.dd_code, key.variant_dd, key.position, suffix
    )
}
