//! Context - dispatch に渡される任意の key/value

/// Context は JSON object そのもの
///
/// DeferredNotification には値としてコピーされます。
pub type Context = serde_json::Map<String, serde_json::Value>;
