/// Declarative macro generating [`EventType`], [`EventPayload`],
/// `ALL_EVENT_TYPES`, wire-format helpers, and typed payload access from a
/// single table.
///
/// Each row is `Variant => "wire.string" => PayloadType`. Payloads are
/// deserialized with `serde_json::from_value`, so unknown fields are ignored
/// and missing optional fields become `None`.
macro_rules! define_events {
    (
        $(
            $(#[doc = $doc:literal])*
            $variant:ident => $wire:literal => $payload_ty:ty
        ),* $(,)?
    ) => {
        // ── EventType enum ──────────────────────────────────────────

        /// Discriminator for every persisted event type.
        ///
        /// Each variant serializes to its dot-separated wire string
        /// (e.g. `"block.created"`).
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum EventType {
            $(
                $(#[doc = $doc])*
                #[serde(rename = $wire)]
                $variant,
            )*
        }

        // ── ALL_EVENT_TYPES constant ────────────────────────────────

        /// All event type variants in definition order.
        pub const ALL_EVENT_TYPES: [EventType; { [$($wire,)*].len() }] = [
            $(EventType::$variant,)*
        ];

        // ── EventType methods ───────────────────────────────────────

        impl EventType {
            /// Canonical wire string (e.g. `"block.created"`).
            #[must_use]
            pub fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $wire,)*
                }
            }

            /// Domain prefix (e.g. `"block"`, `"github"`).
            #[must_use]
            pub fn domain(self) -> &'static str {
                let s = self.as_str();
                match s.find('.') {
                    Some(i) => &s[..i],
                    None => s,
                }
            }
        }

        impl std::fmt::Display for EventType {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for EventType {
            type Err = String;

            fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
                match s {
                    $($wire => Ok(Self::$variant),)*
                    _ => Err(format!("unknown event type: {s}")),
                }
            }
        }

        // ── EventPayload enum ───────────────────────────────────────

        /// Typed payload, one variant per [`EventType`].
        ///
        /// Obtained via [`Event::typed_payload()`].
        #[derive(Clone, Debug, PartialEq)]
        pub enum EventPayload {
            $(
                $(#[doc = $doc])*
                $variant($payload_ty),
            )*
        }

        impl EventPayload {
            /// The event type this payload belongs to.
            #[must_use]
            pub fn event_type(&self) -> EventType {
                match self {
                    $(Self::$variant(_) => EventType::$variant,)*
                }
            }
        }

        // ── Event::typed_payload ────────────────────────────────────

        impl Event {
            /// Deserialize the payload into its typed variant.
            pub fn typed_payload(&self) -> std::result::Result<EventPayload, serde_json::Error> {
                match self.event_type {
                    $(
                        EventType::$variant => Ok(EventPayload::$variant(
                            serde_json::from_value(self.payload.clone())?,
                        )),
                    )*
                }
            }
        }
    };
}
