use crate::{ModelError, ServerKind};

use std::str::FromStr;

#[test]
fn given_kind_names_when_parsed_then_match_variants() {
    for kind in ServerKind::ALL {
        assert_eq!(ServerKind::from_str(kind.as_str()).unwrap(), kind);
    }
    assert_eq!(ServerKind::from_str(" DATA ").unwrap(), ServerKind::Data);
}

#[test]
fn given_unknown_kind_when_parsed_then_returns_validation_error() {
    assert!(matches!(
        ServerKind::from_str("weather"),
        Err(ModelError::Validation { .. })
    ));
}

#[test]
fn given_kinds_when_asked_for_storage_then_only_time_needs_none() {
    assert!(ServerKind::Data.needs_storage());
    assert!(ServerKind::Log.needs_storage());
    assert!(!ServerKind::Time.needs_storage());
}
