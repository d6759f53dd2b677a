//! JSON serialization glue shared by persistence backends.

/// Types that can round-trip through a JSON string with a domain error.
///
/// A blanket implementation for all serde-capable types lives next to
/// [`GatewayError`](crate::gateway::GatewayError), so persisted shapes gain
/// `to_json_string`/`from_json_str` without per-type boilerplate.
pub trait JsonSerializable<E>: Sized {
    fn to_json_string(&self) -> Result<String, E>;
    fn from_json_str(s: &str) -> Result<Self, E>;
}
