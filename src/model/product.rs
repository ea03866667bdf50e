//! Products registered with the offers service.

// self
use crate::_prelude::*;

/// Product submitted to `register_product`.
///
/// Serializes to the registration payload `{id, name, description}`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
	/// Client-generated identifier; the service keys offers by it.
	pub id: Uuid,
	/// Display name.
	pub name: String,
	/// Free-form description.
	pub description: String,
}
impl Product {
	/// Creates a product with a freshly generated v4 identifier.
	pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
		Self { id: Uuid::new_v4(), name: name.into(), description: description.into() }
	}

	/// Replaces the generated identifier with a caller-chosen one.
	pub fn with_id(mut self, id: Uuid) -> Self {
		self.id = id;

		self
	}
}
