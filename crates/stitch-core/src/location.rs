//! # Location Resolution
//!
//! Documents such as material consumption slips need an outlet, but callers
//! do not always name one. The outlet is taken from the first source that
//! provides it:
//!
//! ```text
//! 1. explicit outlet on the request
//! 2. outlet of the register session the request was made from
//! 3. home outlet of the employee making the request
//! ──────────────────────────────────────────────────
//! none → CoreError::LocationUnresolved
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};

/// Everything a caller may know about where a document belongs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationHints {
    pub explicit_outlet_id: Option<String>,
    pub session_outlet_id: Option<String>,
    pub employee_home_outlet_id: Option<String>,
}

/// Which hint the outlet came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LocationSource {
    Explicit,
    RegisterSession,
    EmployeeHome,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedLocation {
    pub outlet_id: String,
    pub source: LocationSource,
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// Resolves the outlet for `document` (used in the error message).
///
/// Blank strings count as absent.
///
/// ## Example
/// ```rust
/// use stitch_core::location::{resolve_location, LocationHints, LocationSource};
///
/// let hints = LocationHints {
///     explicit_outlet_id: None,
///     session_outlet_id: Some("outlet-2".into()),
///     employee_home_outlet_id: Some("outlet-9".into()),
/// };
/// let resolved = resolve_location("material consumption", &hints).unwrap();
/// assert_eq!(resolved.outlet_id, "outlet-2");
/// assert_eq!(resolved.source, LocationSource::RegisterSession);
/// ```
pub fn resolve_location(document: &str, hints: &LocationHints) -> CoreResult<ResolvedLocation> {
    let candidates = [
        (&hints.explicit_outlet_id, LocationSource::Explicit),
        (&hints.session_outlet_id, LocationSource::RegisterSession),
        (&hints.employee_home_outlet_id, LocationSource::EmployeeHome),
    ];

    candidates
        .into_iter()
        .find_map(|(value, source)| {
            present(value).map(|outlet_id| ResolvedLocation {
                outlet_id: outlet_id.to_string(),
                source,
            })
        })
        .ok_or_else(|| CoreError::LocationUnresolved {
            document: document.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_wins() {
        let hints = LocationHints {
            explicit_outlet_id: Some("a".into()),
            session_outlet_id: Some("b".into()),
            employee_home_outlet_id: Some("c".into()),
        };
        let r = resolve_location("doc", &hints).unwrap();
        assert_eq!(r.outlet_id, "a");
        assert_eq!(r.source, LocationSource::Explicit);
    }

    #[test]
    fn test_falls_back_to_employee_home() {
        let hints = LocationHints {
            explicit_outlet_id: Some("  ".into()),
            session_outlet_id: None,
            employee_home_outlet_id: Some("c".into()),
        };
        let r = resolve_location("doc", &hints).unwrap();
        assert_eq!(r.outlet_id, "c");
        assert_eq!(r.source, LocationSource::EmployeeHome);
    }

    #[test]
    fn test_nothing_known_is_an_error() {
        let err = resolve_location("material consumption", &LocationHints::default()).unwrap_err();
        assert!(matches!(err, CoreError::LocationUnresolved { .. }));
        assert_eq!(
            err.to_string(),
            "Cannot determine the outlet for material consumption"
        );
    }
}
