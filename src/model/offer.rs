//! Offers returned for a registered product.

// self
use crate::_prelude::*;

/// Immutable offer attached to a product.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Offer {
	id: Uuid,
	price: i64,
	items_in_stock: i64,
}
impl Offer {
	/// Builds an offer from its wire fields.
	pub fn new(id: Uuid, price: i64, items_in_stock: i64) -> Self {
		Self { id, price, items_in_stock }
	}

	/// Offer identifier.
	pub fn id(&self) -> Uuid {
		self.id
	}

	/// Price in the smallest currency unit.
	pub fn price(&self) -> i64 {
		self.price
	}

	/// Units currently available.
	pub fn items_in_stock(&self) -> i64 {
		self.items_in_stock
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn deserializes_wire_shape() {
		let offers: Vec<Offer> = serde_json::from_str(
			r#"[{"id":"6f1c3a52-8d0b-4a43-9f3e-6f8f1b0c2d11","price":12990,"items_in_stock":4}]"#,
		)
		.expect("Offer payload should deserialize.");

		assert_eq!(offers.len(), 1);
		assert_eq!(offers[0].price(), 12990);
		assert_eq!(offers[0].items_in_stock(), 4);
		assert_eq!(offers[0].id().to_string(), "6f1c3a52-8d0b-4a43-9f3e-6f8f1b0c2d11");
	}
}
