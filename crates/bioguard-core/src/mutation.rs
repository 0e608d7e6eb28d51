//! Change segments between a current sample and a prior sample.
//!
//! The mutation history compares the current sample sequence against each
//! prior sample of the same patient and reports how the sequences relate,
//! using inclusive start/end indices:
//!
//! - `previous` contains `current`: the non-matching prefix/suffix of the
//!   previous sequence are reported as left/right reductions.
//! - `current` contains `previous`: the non-matching prefix/suffix of the
//!   current sequence are reported as left/right additions.
//! - Identical sequences produce a single `sin_cambios` row.
//! - Anything else (including substitutions and interior edits) produces a
//!   single `sin_coincidencia` row. The algorithm intentionally detects
//!   prefix/suffix containment only.

/// Kind of change observed between two samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    /// The previous sequence has extra bases before the current one.
    ReduccionIzquierda,
    /// The previous sequence has extra bases after the current one.
    ReduccionDerecha,
    /// The current sequence gained bases before the previous one.
    AgregadoIzquierda,
    /// The current sequence gained bases after the previous one.
    AgregadoDerecha,
    /// Both sequences are identical.
    SinCambios,
    /// Neither sequence contains the other.
    SinCoincidencia,
}

impl ChangeKind {
    /// The wire form written into the history CSV.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ReduccionIzquierda => "reduccion_izquierda",
            Self::ReduccionDerecha => "reduccion_derecha",
            Self::AgregadoIzquierda => "agregado_izquierda",
            Self::AgregadoDerecha => "agregado_derecha",
            Self::SinCambios => "sin_cambios",
            Self::SinCoincidencia => "sin_coincidencia",
        }
    }
}

/// One change row: an inclusive index range and its kind.
///
/// The sentinel kinds (`sin_cambios`, `sin_coincidencia`) carry `(-1, -1)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChangeSegment {
    /// Inclusive start index, or `-1` for sentinel rows.
    pub start: i64,
    /// Inclusive end index, or `-1` for sentinel rows.
    pub end: i64,
    /// Kind of change.
    pub kind: ChangeKind,
}

impl ChangeSegment {
    const fn sentinel(kind: ChangeKind) -> Self {
        Self {
            start: -1,
            end: -1,
            kind,
        }
    }
}

/// Computes the change segments between `current` and `previous`.
///
/// Either input being blank yields a single `sin_coincidencia` row.
#[must_use]
#[allow(clippy::cast_possible_wrap)] // sequence lengths are bounded well below i64::MAX
pub fn change_segments(current: &str, previous: &str) -> Vec<ChangeSegment> {
    let mut rows = Vec::new();
    if current.trim().is_empty() || previous.trim().is_empty() {
        rows.push(ChangeSegment::sentinel(ChangeKind::SinCoincidencia));
        return rows;
    }

    if let Some(start) = previous.find(current) {
        let end = start + current.len() - 1;
        push_segment(&mut rows, 0, start as i64 - 1, ChangeKind::ReduccionIzquierda);
        push_segment(
            &mut rows,
            end as i64 + 1,
            previous.len() as i64 - 1,
            ChangeKind::ReduccionDerecha,
        );
        if rows.is_empty() {
            rows.push(ChangeSegment::sentinel(ChangeKind::SinCambios));
        }
        return rows;
    }

    if let Some(start) = current.find(previous) {
        let end = start + previous.len() - 1;
        push_segment(&mut rows, 0, start as i64 - 1, ChangeKind::AgregadoIzquierda);
        push_segment(
            &mut rows,
            end as i64 + 1,
            current.len() as i64 - 1,
            ChangeKind::AgregadoDerecha,
        );
        if rows.is_empty() {
            rows.push(ChangeSegment::sentinel(ChangeKind::SinCambios));
        }
        return rows;
    }

    rows.push(ChangeSegment::sentinel(ChangeKind::SinCoincidencia));
    rows
}

/// Appends a segment when its inclusive range is nonempty.
fn push_segment(rows: &mut Vec<ChangeSegment>, start: i64, end: i64, kind: ChangeKind) {
    if start > end {
        return;
    }
    rows.push(ChangeSegment { start, end, kind });
}
