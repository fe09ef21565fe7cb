//! Reconciliation of fields reported redundantly by more than one part of a source.
//!
//! A mismatch never aborts assembly. Known benign mismatches resolve silently to
//! the more specific value; anything else resolves to the primary value and is
//! returned as a diagnostic for the caller to log.

use serde::Serialize;

use casa_types::EnergyLabel;

/// Disagreement between the primary and secondary value of one logical field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Mismatch<T> {
    /// Logical field name.
    pub field: &'static str,
    /// Value from the designated primary field (kept).
    pub primary: T,
    /// Value from the secondary field (discarded).
    pub secondary: T,
}

/// A resolved value plus an optional diagnostic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reconciled<T> {
    /// Accepted value.
    pub value: T,
    /// Present only for unexplained disagreements.
    pub mismatch: Option<Mismatch<T>>,
}

/// A coarse tier in one source that stands for several finer tiers in the other.
struct Collapse {
    coarse: EnergyLabel,
    covers: fn(EnergyLabel) -> bool,
}

fn any_known(label: EnergyLabel) -> bool {
    label != EnergyLabel::Unknown
}

/// Known benign energy-label mismatches.
///
/// - The metadata block reports every `A+` .. `A+++++` tier as plain `A`.
/// - A missing label on one side says nothing about the label on the other.
const LABEL_COLLAPSES: &[Collapse] = &[
    Collapse {
        coarse: EnergyLabel::A,
        covers: EnergyLabel::is_a_plus_tier,
    },
    Collapse {
        coarse: EnergyLabel::Unknown,
        covers: any_known,
    },
];

fn finer_of(a: EnergyLabel, b: EnergyLabel) -> Option<EnergyLabel> {
    LABEL_COLLAPSES.iter().find_map(|c| {
        if a == c.coarse && (c.covers)(b) {
            Some(b)
        } else if b == c.coarse && (c.covers)(a) {
            Some(a)
        } else {
            None
        }
    })
}

/// Reconcile the page-badge label (`primary`) with the metadata label (`secondary`).
#[must_use]
pub fn reconcile_energy_label(
    primary: EnergyLabel,
    secondary: Option<EnergyLabel>,
) -> Reconciled<EnergyLabel> {
    let Some(secondary) = secondary else {
        return Reconciled {
            value: primary,
            mismatch: None,
        };
    };
    if primary == secondary {
        return Reconciled {
            value: primary,
            mismatch: None,
        };
    }
    if let Some(value) = finer_of(primary, secondary) {
        return Reconciled {
            value,
            mismatch: None,
        };
    }
    Reconciled {
        value: primary,
        mismatch: Some(Mismatch {
            field: "energy_label",
            primary,
            secondary,
        }),
    }
}
