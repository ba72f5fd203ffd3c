use serde::{Deserialize, Deserializer, Serialize};

use super::ProtocolError;

/// Macro to generate enum with as_str + std::str::FromStr pattern.
/// Parsing is case-insensitive so stored upper-case names ("HEART_FAILURE")
/// resolve to the same variant as their snake-case values.
macro_rules! str_enum {
    ($name:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $s),+
                }
            }
        }

        impl std::str::FromStr for $name {
            type Err = ProtocolError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim().to_ascii_lowercase().as_str() {
                    $($s => Ok(Self::$variant)),+,
                    _ => Err(ProtocolError::InvalidEnum {
                        field: stringify!($name).into(),
                        value: s.into(),
                    }),
                }
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let raw = String::deserialize(deserializer)?;
                raw.parse().map_err(serde::de::Error::custom)
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

str_enum!(ProtocolCategory {
    Cancer => "cancer",
    HeartFailure => "heart_failure",
    Copd => "copd",
    Fit => "fit",
    General => "general",
});

str_enum!(AnswerType {
    Numeric => "numeric",
    Boolean => "boolean",
    Choice => "choice",
    Text => "text",
});

// Variant order is the escalation order; derived Ord relies on it.
str_enum!(InterventionPriority {
    Low => "low",
    Medium => "medium",
    High => "high",
    Urgent => "urgent",
});

str_enum!(UrgencyTier {
    Routine => "routine",
    Moderate => "moderate",
    Urgent => "urgent",
});

str_enum!(FollowUpPriority {
    Low => "low",
    Medium => "medium",
    High => "high",
});

impl ProtocolCategory {
    /// Display name used on dashboards and in call scripts.
    pub fn standard_name(&self) -> &'static str {
        match self {
            Self::Cancer => "Cancer Palliative Care Protocol",
            Self::HeartFailure => "Heart Failure Palliative Care Protocol",
            Self::Copd => "COPD Palliative Care Protocol",
            Self::Fit => "FIT Protocol - Wellness Monitoring",
            Self::General => "General Palliative Care Protocol",
        }
    }
}

impl UrgencyTier {
    /// Follow-up priority mirrored from the tier. Routine carries none.
    pub fn follow_up_priority(&self) -> Option<FollowUpPriority> {
        match self {
            Self::Urgent => Some(FollowUpPriority::High),
            Self::Moderate => Some(FollowUpPriority::Medium),
            Self::Routine => None,
        }
    }
}
