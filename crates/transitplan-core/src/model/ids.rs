// ── Opaque identifier types ──
//
// Every handle the provisioning layer hands us (spoke names, attachment ids,
// route-table ids, the transit gateway itself) is threaded through the model
// as a plain string newtype. The core never dereferences or validates them;
// the distinct types only keep a spoke id from being passed where an
// attachment id is expected.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

macro_rules! opaque_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(raw: impl Into<String>) -> Self {
                Self(raw.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl FromStr for $name {
            type Err = std::convert::Infallible;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(Self::new(s))
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_owned())
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

opaque_id! {
    /// Caller-chosen name of a spoke. Unique within a topology and used as
    /// the deterministic tie-breaker when ordering plan operations.
    SpokeId
}

opaque_id! {
    /// Hub attachment handle supplied by the provisioning layer.
    AttachmentId
}

opaque_id! {
    /// Route-table handle: one of the three hub tables, or a spoke's own
    /// local route table.
    RouteTableId
}

opaque_id! {
    /// Handle of the hub itself (the transit gateway).
    HubId
}

opaque_id! {
    /// Firewall endpoint inside the inspection segment. Traffic arriving from
    /// the hub on the attachment side is routed to it.
    EndpointId
}

impl Default for HubId {
    fn default() -> Self {
        Self::new("hub")
    }
}

/// Render a list of identifiers as `a, b, c` for error messages.
pub(crate) fn join_ids<T: fmt::Display>(ids: &[T]) -> String {
    ids.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn ids_display_raw_value() {
        let id = AttachmentId::new("tgw-attach-0abc");
        assert_eq!(id.to_string(), "tgw-attach-0abc");
    }

    #[test]
    fn ids_parse_from_str() {
        let id: SpokeId = "vpc-a".parse().unwrap();
        assert_eq!(id.as_str(), "vpc-a");
    }

    #[test]
    fn ids_order_lexicographically() {
        let mut ids = vec![SpokeId::from("fw"), SpokeId::from("a"), SpokeId::from("egress")];
        ids.sort();
        assert_eq!(join_ids(&ids), "a, egress, fw");
    }

    #[test]
    fn ids_serialize_transparently() {
        let json = serde_json::to_string(&RouteTableId::from("tgw-rtb-1")).unwrap();
        assert_eq!(json, "\"tgw-rtb-1\"");
    }

    #[test]
    fn hub_id_defaults_to_hub() {
        assert_eq!(HubId::default().as_str(), "hub");
    }
}
