#![allow(clippy::missing_errors_doc)]

use std::{error::Error, fmt};

use base64::{engine::general_purpose::STANDARD_NO_PAD, Engine as _};
use serde::{Deserialize, Serialize};

const SNAPSHOT_DOMAIN: &str = "horde";
const SNAPSHOT_VERSION: &str = "v1";

/// Identifier prefix emitted before the encoded scenario payload.
pub(crate) const SNAPSHOT_HEADER: &str = "horde:v1";
/// Delimiter used to separate the prefix, species count and payload.
const FIELD_DELIMITER: char = ':';

/// One species entry in a transferable scenario.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub(crate) struct ScenarioSpecies {
    /// Numeric species identifier.
    pub id: u32,
    /// Opaque template token bound to the species.
    pub template: u64,
    /// Pooled slot capacity for the species.
    pub capacity: u32,
}

/// Snapshot of every knob required to reproduce a spawn scenario.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct ScenarioSnapshot {
    /// Species composing the scenario's pools.
    pub species: Vec<ScenarioSpecies>,
    /// Interval between spawns when an assault begins, in milliseconds.
    pub initial_interval_ms: u64,
    /// Lower bound on the spawn interval, in milliseconds.
    pub floor_interval_ms: u64,
    /// Per-spawn geometric shrink factor applied to the interval.
    pub decay: f64,
    /// Half extent of the square arena along each axis, in world units.
    pub arena_half_extent: f32,
    /// Spacing between boundary spawn candidates, in world units.
    pub boundary_spacing: f32,
}

impl ScenarioSnapshot {
    /// Encodes the scenario into a single-line string suitable for sharing.
    #[must_use]
    pub(crate) fn encode(&self) -> String {
        let payload = SerializableScenario {
            initial_interval_ms: self.initial_interval_ms,
            floor_interval_ms: self.floor_interval_ms,
            decay: self.decay,
            arena_half_extent: self.arena_half_extent,
            boundary_spacing: self.boundary_spacing,
            species: self.species.clone(),
        };
        let json = serde_json::to_vec(&payload).expect("scenario serialization never fails");
        let encoded = STANDARD_NO_PAD.encode(json);
        format!("{SNAPSHOT_HEADER}:{}:{encoded}", self.species.len())
    }

    /// Decodes a scenario from the provided string representation.
    pub(crate) fn decode(value: &str) -> Result<Self, ScenarioTransferError> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(ScenarioTransferError::EmptyPayload);
        }

        let mut parts = trimmed.split(FIELD_DELIMITER);
        let domain = parts.next().ok_or(ScenarioTransferError::MissingPrefix)?;
        let version = parts.next().ok_or(ScenarioTransferError::MissingVersion)?;
        let count = parts.next().ok_or(ScenarioTransferError::MissingCount)?;
        let payload = parts.next().ok_or(ScenarioTransferError::MissingPayload)?;

        if domain != SNAPSHOT_DOMAIN {
            return Err(ScenarioTransferError::InvalidPrefix(domain.to_owned()));
        }
        if version != SNAPSHOT_VERSION {
            return Err(ScenarioTransferError::UnsupportedVersion(version.to_owned()));
        }

        let expected: usize = count
            .parse()
            .map_err(ScenarioTransferError::InvalidCount)?;
        let bytes = STANDARD_NO_PAD
            .decode(payload.as_bytes())
            .map_err(ScenarioTransferError::InvalidEncoding)?;
        let decoded: SerializableScenario =
            serde_json::from_slice(&bytes).map_err(ScenarioTransferError::InvalidPayload)?;

        if decoded.species.len() != expected {
            return Err(ScenarioTransferError::SpeciesCountMismatch {
                expected,
                actual: decoded.species.len(),
            });
        }

        Ok(Self {
            species: decoded.species,
            initial_interval_ms: decoded.initial_interval_ms,
            floor_interval_ms: decoded.floor_interval_ms,
            decay: decoded.decay,
            arena_half_extent: decoded.arena_half_extent,
            boundary_spacing: decoded.boundary_spacing,
        })
    }
}

#[derive(Serialize, Deserialize)]
struct SerializableScenario {
    initial_interval_ms: u64,
    floor_interval_ms: u64,
    decay: f64,
    arena_half_extent: f32,
    boundary_spacing: f32,
    species: Vec<ScenarioSpecies>,
}

/// Reasons a scenario string fails to decode.
#[derive(Debug)]
pub(crate) enum ScenarioTransferError {
    /// The provided string was empty after trimming.
    EmptyPayload,
    /// The domain prefix was absent.
    MissingPrefix,
    /// The version field was absent.
    MissingVersion,
    /// The species-count field was absent.
    MissingCount,
    /// The payload field was absent.
    MissingPayload,
    /// The domain prefix did not match [`SNAPSHOT_HEADER`].
    InvalidPrefix(String),
    /// The version field named an unsupported snapshot version.
    UnsupportedVersion(String),
    /// The species-count field was not a number.
    InvalidCount(std::num::ParseIntError),
    /// The payload was not valid base64.
    InvalidEncoding(base64::DecodeError),
    /// The payload JSON did not describe a scenario.
    InvalidPayload(serde_json::Error),
    /// The species-count field disagreed with the payload.
    SpeciesCountMismatch {
        /// Count carried in the header field.
        expected: usize,
        /// Number of species found in the payload.
        actual: usize,
    },
}

impl fmt::Display for ScenarioTransferError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyPayload => write!(f, "scenario string is empty"),
            Self::MissingPrefix => write!(f, "scenario string lacks a domain prefix"),
            Self::MissingVersion => write!(f, "scenario string lacks a version field"),
            Self::MissingCount => write!(f, "scenario string lacks a species count"),
            Self::MissingPayload => write!(f, "scenario string lacks a payload"),
            Self::InvalidPrefix(domain) => write!(f, "unknown scenario domain `{domain}`"),
            Self::UnsupportedVersion(version) => {
                write!(f, "unsupported scenario version `{version}`")
            }
            Self::InvalidCount(error) => write!(f, "invalid species count: {error}"),
            Self::InvalidEncoding(error) => write!(f, "payload is not valid base64: {error}"),
            Self::InvalidPayload(error) => write!(f, "payload is not a scenario: {error}"),
            Self::SpeciesCountMismatch { expected, actual } => write!(
                f,
                "species count field says {expected} but payload holds {actual}"
            ),
        }
    }
}

impl Error for ScenarioTransferError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidCount(error) => Some(error),
            Self::InvalidEncoding(error) => Some(error),
            Self::InvalidPayload(error) => Some(error),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{ScenarioSnapshot, ScenarioSpecies, ScenarioTransferError, SNAPSHOT_HEADER};

    fn sample() -> ScenarioSnapshot {
        ScenarioSnapshot {
            species: vec![
                ScenarioSpecies {
                    id: 1,
                    template: 100,
                    capacity: 3,
                },
                ScenarioSpecies {
                    id: 2,
                    template: 200,
                    capacity: 1,
                },
            ],
            initial_interval_ms: 2000,
            floor_interval_ms: 500,
            decay: 0.9,
            arena_half_extent: 40.0,
            boundary_spacing: 4.0,
        }
    }

    #[test]
    fn scenario_round_trips_through_encoding() {
        let snapshot = sample();
        let encoded = snapshot.encode();
        assert!(encoded.starts_with(SNAPSHOT_HEADER));
        let decoded = ScenarioSnapshot::decode(&encoded).expect("decode");
        assert_eq!(decoded, snapshot);
    }

    #[test]
    fn decode_rejects_empty_input() {
        assert!(matches!(
            ScenarioSnapshot::decode("   "),
            Err(ScenarioTransferError::EmptyPayload)
        ));
    }

    #[test]
    fn decode_rejects_foreign_domain() {
        let encoded = sample().encode().replacen("horde", "swarm", 1);
        assert!(matches!(
            ScenarioSnapshot::decode(&encoded),
            Err(ScenarioTransferError::InvalidPrefix(domain)) if domain == "swarm"
        ));
    }

    #[test]
    fn decode_rejects_unsupported_version() {
        let encoded = sample().encode().replacen(":v1:", ":v2:", 1);
        assert!(matches!(
            ScenarioSnapshot::decode(&encoded),
            Err(ScenarioTransferError::UnsupportedVersion(version)) if version == "v2"
        ));
    }

    #[test]
    fn decode_rejects_count_mismatch() {
        let snapshot = sample();
        let encoded = snapshot.encode();
        let tampered = encoded.replacen(":2:", ":3:", 1);
        assert!(matches!(
            ScenarioSnapshot::decode(&tampered),
            Err(ScenarioTransferError::SpeciesCountMismatch {
                expected: 3,
                actual: 2
            })
        ));
    }

    #[test]
    fn decode_rejects_garbage_payload() {
        let garbage = format!("{SNAPSHOT_HEADER}:1:!!!not-base64!!!");
        assert!(matches!(
            ScenarioSnapshot::decode(&garbage),
            Err(ScenarioTransferError::InvalidEncoding(_))
        ));
    }
}
