//! Status enums mapping to SMALLSERIAL/SMALLINT lookup tables.
//!
//! Each enum variant's discriminant matches the seed data order (1-based)
//! in the corresponding lookup table, and its name matches the `name` column.

use serde::{Deserialize, Serialize};

/// Status ID type matching SMALLINT/SMALLSERIAL in the database.
pub type StatusId = i16;

/// A status id read from the database that has no matching variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("Unknown {kind} id {id}")]
pub struct UnknownStatusId {
    pub kind: &'static str,
    pub id: StatusId,
}

macro_rules! define_status_enum {
    (
        $(#[$meta:meta])*
        $name:ident {
            $( $(#[$vmeta:meta])* $variant:ident = $val:literal => $label:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[repr(i16)]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $( $(#[$vmeta])* $variant = $val ),+
        }

        impl $name {
            /// Every variant, in seed data order.
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// Return the database status ID.
            pub fn id(self) -> StatusId {
                self as StatusId
            }

            /// Return the lookup-table name.
            pub fn name(self) -> &'static str {
                match self {
                    $( $name::$variant => $label ),+
                }
            }

            /// Resolve a database status ID.
            pub fn from_id(id: StatusId) -> Option<Self> {
                match id {
                    $( $val => Some($name::$variant), )+
                    _ => None,
                }
            }
        }

        impl From<$name> for StatusId {
            fn from(value: $name) -> Self {
                value as StatusId
            }
        }

        impl TryFrom<StatusId> for $name {
            type Error = UnknownStatusId;

            fn try_from(id: StatusId) -> Result<Self, Self::Error> {
                $name::from_id(id).ok_or(UnknownStatusId {
                    kind: stringify!($name),
                    id,
                })
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.name())
            }
        }
    };
}

define_status_enum! {
    /// Service request lifecycle status.
    RequestStatus {
        Pending = 1 => "pending",
        Accepted = 2 => "accepted",
        InProgress = 3 => "in_progress",
        AwaitingConfirmation = 4 => "awaiting_confirmation",
        Completed = 5 => "completed",
        Rejected = 6 => "rejected",
        Cancelled = 7 => "cancelled",
    }
}

define_status_enum! {
    /// OTP audit log event type.
    ///
    /// Only `sent` marks a code delivery; an allowed resend check is logged
    /// as `resend_allowed` and the delivery that follows adds its own `sent`.
    OtpEventType {
        Sent = 1 => "sent",
        Verified = 2 => "verified",
        Failed = 3 => "failed",
        Expired = 4 => "expired",
        ResendAllowed = 5 => "resend_allowed",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_status_ids_match_seed_data() {
        assert_eq!(RequestStatus::Pending.id(), 1);
        assert_eq!(RequestStatus::Accepted.id(), 2);
        assert_eq!(RequestStatus::InProgress.id(), 3);
        assert_eq!(RequestStatus::AwaitingConfirmation.id(), 4);
        assert_eq!(RequestStatus::Completed.id(), 5);
        assert_eq!(RequestStatus::Rejected.id(), 6);
        assert_eq!(RequestStatus::Cancelled.id(), 7);
    }

    #[test]
    fn otp_event_type_ids_match_seed_data() {
        assert_eq!(OtpEventType::Sent.id(), 1);
        assert_eq!(OtpEventType::Verified.id(), 2);
        assert_eq!(OtpEventType::Failed.id(), 3);
        assert_eq!(OtpEventType::Expired.id(), 4);
        assert_eq!(OtpEventType::ResendAllowed.id(), 5);
    }

    #[test]
    fn from_id_resolves_every_variant() {
        for status in RequestStatus::ALL {
            assert_eq!(RequestStatus::from_id(status.id()), Some(*status));
        }
        assert_eq!(RequestStatus::from_id(0), None);
        assert_eq!(RequestStatus::from_id(8), None);
    }

    #[test]
    fn try_from_reports_unknown_id() {
        let err = OtpEventType::try_from(9).unwrap_err();
        assert_eq!(err.id, 9);
        assert_eq!(err.to_string(), "Unknown OtpEventType id 9");
    }

    #[test]
    fn status_into_status_id() {
        let id: StatusId = RequestStatus::AwaitingConfirmation.into();
        assert_eq!(id, 4);
    }

    #[test]
    fn serde_and_display_use_lookup_names() {
        let json = serde_json::to_string(&RequestStatus::AwaitingConfirmation).unwrap();
        assert_eq!(json, "\"awaiting_confirmation\"");
        assert_eq!(RequestStatus::InProgress.to_string(), "in_progress");
        assert_eq!(OtpEventType::Verified.name(), "verified");
    }
}
