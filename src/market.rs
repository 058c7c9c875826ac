//! Marketplace collaborator boundary.
//!
//! The canonical action target is an external collectible marketplace with a
//! two-method interface: a free price query and a paid buy. Calls are
//! selector-dispatched CBOR (see `codec`); this module fixes the wire shapes
//! plus the payload understood by the cooperative's privileged purchase
//! helper, and provides a stateful mock for tests.

use crate::codec::{from_cbor, selector, split_call, to_cbor};
use crate::env::{CallError, CallResult};
use crate::identity::Address;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Textual signature of the marketplace price query.
pub const GET_PRICE_SIG: &str = "get_price(collection,item)";

/// Textual signature of the marketplace buy call.
pub const BUY_SIG: &str = "buy(collection,item)";

/// Textual signature of the privileged purchase helper on the cooperative.
pub const PURCHASE_SIG: &str = "purchase(marketplace,collection,item,budget)";

/// Textual signature of the inbound asset-receipt callback.
pub const ON_ASSET_RECEIVED_SIG: &str = "on_asset_received(operator,from,item,data)";

/// Fixed acknowledgement token returned by the asset-receipt callback.
///
/// The sending party's safe-transfer logic requires this exact value back
/// or it treats the transfer as rejected.
pub fn asset_received_ack() -> [u8; 4] {
    selector(ON_ASSET_RECEIVED_SIG)
}

/// Arguments of a `get_price` query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceQuery {
    pub collection: Address,
    pub item_id: u64,
}

/// Arguments of a `buy` call. Payment rides as the attached call value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuyOrder {
    pub collection: Address,
    pub item_id: u64,
}

/// Payload of the cooperative's privileged purchase helper.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseRequest {
    /// Marketplace to buy from.
    pub marketplace: Address,
    /// Collection holding the item.
    pub collection: Address,
    pub item_id: u64,
    /// Upper bound the vote authorized for this purchase.
    pub budget: u64,
}

/// Stateful mock marketplace for tests and the demo.
///
/// Listed items carry a fixed price; a successful buy marks the item sold
/// and rejects any second purchase.
#[derive(Debug, Clone)]
pub struct MockMarketplace {
    address: Address,
    listings: HashMap<(Address, u64), u64>,
    sold: HashSet<(Address, u64)>,
}

impl MockMarketplace {
    pub fn new(address: Address) -> Self {
        Self {
            address,
            listings: HashMap::new(),
            sold: HashSet::new(),
        }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    /// List an item at a fixed price (test setup).
    pub fn list(&mut self, collection: Address, item_id: u64, price: u64) {
        self.listings.insert((collection, item_id), price);
    }

    pub fn is_sold(&self, collection: Address, item_id: u64) -> bool {
        self.sold.contains(&(collection, item_id))
    }

    fn price_of(&self, collection: Address, item_id: u64) -> Result<u64, CallError> {
        self.listings
            .get(&(collection, item_id))
            .copied()
            .ok_or_else(|| CallError::Reverted(format!("item {} not listed", item_id)))
    }

    /// Handle a selector-dispatched call addressed to this marketplace.
    pub fn handle(&mut self, value: u64, data: &[u8]) -> CallResult {
        let (sel, payload) = split_call(data)
            .ok_or_else(|| CallError::Reverted("call data too short".to_string()))?;

        if sel == selector(GET_PRICE_SIG) {
            let query: PriceQuery = from_cbor(payload)
                .map_err(|e| CallError::Reverted(e.to_string()))?;
            let price = self.price_of(query.collection, query.item_id)?;
            to_cbor(&price).map_err(|e| CallError::Reverted(e.to_string()))
        } else if sel == selector(BUY_SIG) {
            let order: BuyOrder = from_cbor(payload)
                .map_err(|e| CallError::Reverted(e.to_string()))?;
            let price = self.price_of(order.collection, order.item_id)?;
            if self.sold.contains(&(order.collection, order.item_id)) {
                return Err(CallError::Reverted(format!(
                    "item {} already sold",
                    order.item_id
                )));
            }
            if value < price {
                return Err(CallError::Reverted(format!(
                    "underpaid: sent {}, price {}",
                    value, price
                )));
            }
            self.sold.insert((order.collection, order.item_id));
            to_cbor(&true).map_err(|e| CallError::Reverted(e.to_string()))
        } else {
            Err(CallError::Reverted(format!(
                "unknown selector {}",
                hex::encode(sel)
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::encode_call;

    fn setup() -> (MockMarketplace, Address) {
        let collection = Address::from_bytes([2u8; 20]);
        let mut market = MockMarketplace::new(Address::from_bytes([1u8; 20]));
        market.list(collection, 7, 500);
        (market, collection)
    }

    #[test]
    fn price_query_returns_listing_price() {
        let (mut market, collection) = setup();
        let data = encode_call(GET_PRICE_SIG, &PriceQuery { collection, item_id: 7 }).unwrap();
        let price: u64 = from_cbor(&market.handle(0, &data).unwrap()).unwrap();
        assert_eq!(price, 500);
    }

    #[test]
    fn buy_requires_full_payment() {
        let (mut market, collection) = setup();
        let data = encode_call(BUY_SIG, &BuyOrder { collection, item_id: 7 }).unwrap();

        assert!(market.handle(499, &data).is_err());
        assert!(!market.is_sold(collection, 7));

        market.handle(500, &data).unwrap();
        assert!(market.is_sold(collection, 7));
    }

    #[test]
    fn sold_item_cannot_be_bought_twice() {
        let (mut market, collection) = setup();
        let data = encode_call(BUY_SIG, &BuyOrder { collection, item_id: 7 }).unwrap();
        market.handle(500, &data).unwrap();
        assert!(market.handle(500, &data).is_err());
    }

    #[test]
    fn unlisted_item_reverts() {
        let (mut market, collection) = setup();
        let data = encode_call(GET_PRICE_SIG, &PriceQuery { collection, item_id: 99 }).unwrap();
        assert!(market.handle(0, &data).is_err());
    }
}
