//! Session ledger domain types.
//!
//! Exchange- and storage-agnostic records for strategy sessions, their leg
//! positions, snapshots, broker orders, audit events, the merged timeline
//! view, and retention policies.

/// Declares a fieldless enum persisted as an upper-case text column.
macro_rules! text_enum {
    (
        $(#[$meta:meta])*
        $name:ident, $kind:literal {
            $($(#[$vmeta:meta])* $variant:ident => $text:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
        pub enum $name {
            $($(#[$vmeta])* #[serde(rename = $text)] $variant),+
        }

        impl $name {
            /// Every variant, in declaration order.
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// Stored text form.
            #[must_use]
            pub const fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = $crate::domain::error::DomainError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim().to_ascii_uppercase().as_str() {
                    $($text => Ok($name::$variant),)+
                    _ => Err($crate::domain::error::DomainError::UnknownVariant {
                        kind: $kind,
                        value: s.to_string(),
                    }),
                }
            }
        }
    };
}

pub mod error;
pub mod event;
pub mod id;
pub mod order;
pub mod position;
pub mod report;
pub mod retention;
pub mod session;
pub mod time;
pub mod timeline;

pub use event::{Event, EventFilter, NewEvent};
pub use id::{EventId, OrderId, PositionId, SessionId, SessionKey, SnapshotId};
pub use order::{NewOrder, Order, OrderExecution, OrderFilter, OrderSide, OrderStatus, OrderType};
pub use position::{
    NewPosition, NewSnapshot, Position, PositionEntry, PositionExit, PositionFilter, PositionMark,
    PositionStatus, Snapshot,
};
pub use report::{CrashedSession, ExpiryPerformance, LegSummary, SessionSummary};
pub use retention::{PurgeReport, RetentionPolicy};
pub use session::{NewSession, Session, SessionCounters, SessionFilter, SessionStatus};
pub use timeline::{Timeline, TimelineEntry, TimelineSource};
