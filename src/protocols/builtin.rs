use crate::models::{Protocol, ProtocolCategory, ProtocolError};

/// Protocols bundled with the crate, one per supported disease category.
const BUILTIN: &[(&str, &str)] = &[
    ("cancer.json", include_str!("../../resources/protocols/cancer.json")),
    ("heart_failure.json", include_str!("../../resources/protocols/heart_failure.json")),
    ("copd.json", include_str!("../../resources/protocols/copd.json")),
    ("fit.json", include_str!("../../resources/protocols/fit.json")),
];

pub fn builtin_protocols() -> Result<Vec<Protocol>, ProtocolError> {
    BUILTIN
        .iter()
        .map(|(name, json)| {
            Protocol::from_json_str(json).map_err(|e| match e {
                ProtocolError::Parse(_, reason) => ProtocolError::Parse((*name).to_string(), reason),
                other => other,
            })
        })
        .collect()
}

/// The bundled protocol for a category, if one ships.
pub fn builtin_protocol(category: ProtocolCategory) -> Result<Option<Protocol>, ProtocolError> {
    Ok(builtin_protocols()?.into_iter().find(|p| p.category == category))
}
