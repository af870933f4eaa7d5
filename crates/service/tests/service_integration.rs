//! Integration tests for the application services over the in-memory
//! catalog and stores.

use std::time::Duration;

use catalog::{InMemoryCatalog, Product};
use common::{BuyerId, Money, ProductId, SellerId};
use domain::{
    AccessError, Actor, CartError, OrderDetails, OrderError, OrderStatus, PaymentMethod,
    PaymentStatus,
};
use service::{CartService, CheckoutService, OrderService, ServiceError};
use store::{CartStore, InMemoryCartStore, InMemoryOrderStore};

struct World {
    catalog: InMemoryCatalog,
    carts: InMemoryCartStore,
    orders: InMemoryOrderStore,
    cart_service: CartService<InMemoryCatalog, InMemoryCartStore>,
    checkout: CheckoutService<InMemoryCatalog, InMemoryCartStore, InMemoryOrderStore>,
    order_service: OrderService<InMemoryOrderStore>,
}

fn world() -> World {
    let catalog = InMemoryCatalog::new();
    let carts = InMemoryCartStore::new();
    let orders = InMemoryOrderStore::new();
    World {
        cart_service: CartService::new(catalog.clone(), carts.clone()),
        checkout: CheckoutService::new(catalog.clone(), carts.clone(), orders.clone()),
        order_service: OrderService::new(orders.clone()),
        catalog,
        carts,
        orders,
    }
}

fn seed(world: &World, id: &str, seller_id: SellerId, dollars: i64) -> ProductId {
    let product_id = ProductId::new(id);
    world.catalog.upsert(Product::new(
        product_id.clone(),
        format!("Listing {id}"),
        seller_id,
        Money::from_dollars(dollars),
    ));
    product_id
}

/// Polls the catalog until the detached sales tally lands.
async fn wait_for_sales(catalog: &InMemoryCatalog, product_id: &ProductId, expected: u64) {
    for _ in 0..100 {
        if catalog.sales(product_id) == expected {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!(
        "sales for {product_id} never reached {expected}, got {}",
        catalog.sales(product_id)
    );
}

// -- Cart behavior --

#[tokio::test]
async fn duplicate_add_merges_quantities() {
    let w = world();
    let buyer_id = BuyerId::new();
    let product_id = seed(&w, "SKU-001", SellerId::new(), 10);

    w.cart_service
        .add_item(buyer_id, product_id.clone(), 2)
        .await
        .unwrap();
    let cart = w
        .cart_service
        .add_item(buyer_id, product_id.clone(), 3)
        .await
        .unwrap();

    assert_eq!(cart.items().len(), 1);
    assert_eq!(cart.item(&product_id).unwrap().quantity, 5);
}

#[tokio::test]
async fn adding_unknown_or_inactive_product_fails() {
    let w = world();
    let buyer_id = BuyerId::new();

    let missing = w
        .cart_service
        .add_item(buyer_id, ProductId::new("SKU-404"), 1)
        .await;
    assert!(matches!(missing, Err(ServiceError::ProductNotFound { .. })));

    let seller_id = SellerId::new();
    let inactive_id = ProductId::new("SKU-OFF");
    w.catalog.upsert(
        Product::new(inactive_id.clone(), "Retired", seller_id, Money::from_dollars(5))
            .deactivated(),
    );
    let inactive = w.cart_service.add_item(buyer_id, inactive_id, 1).await;
    assert!(matches!(inactive, Err(ServiceError::ProductInactive { .. })));

    // Nothing was stored either way.
    assert!(w.carts.fetch(buyer_id).await.unwrap().is_none());
}

#[tokio::test]
async fn removal_is_idempotent_for_all_buyers_and_products() {
    let w = world();
    let buyer_id = BuyerId::new();
    let product_id = seed(&w, "SKU-001", SellerId::new(), 10);

    // Removing from a cart that was never created.
    let cart = w
        .cart_service
        .remove_item(buyer_id, product_id.clone())
        .await
        .unwrap();
    assert!(cart.is_empty());

    // Removing a product the cart never held leaves it unchanged.
    w.cart_service
        .add_item(buyer_id, product_id.clone(), 2)
        .await
        .unwrap();
    let cart = w
        .cart_service
        .remove_item(buyer_id, ProductId::new("SKU-OTHER"))
        .await
        .unwrap();
    assert_eq!(cart.item(&product_id).unwrap().quantity, 2);

    // Removing twice succeeds both times.
    w.cart_service
        .remove_item(buyer_id, product_id.clone())
        .await
        .unwrap();
    let cart = w
        .cart_service
        .remove_item(buyer_id, product_id)
        .await
        .unwrap();
    assert!(cart.is_empty());
}

#[tokio::test]
async fn set_quantity_to_zero_removes_and_absent_fails() {
    let w = world();
    let buyer_id = BuyerId::new();
    let product_id = seed(&w, "SKU-001", SellerId::new(), 10);

    w.cart_service
        .add_item(buyer_id, product_id.clone(), 2)
        .await
        .unwrap();
    let cart = w
        .cart_service
        .set_quantity(buyer_id, product_id.clone(), 0)
        .await
        .unwrap();
    assert!(cart.is_empty());

    let result = w.cart_service.set_quantity(buyer_id, product_id, 1).await;
    assert!(matches!(
        result,
        Err(ServiceError::Cart(CartError::ItemNotInCart { .. }))
    ));
}

#[tokio::test]
async fn cart_view_hides_vanished_products_without_touching_storage() {
    let w = world();
    let buyer_id = BuyerId::new();
    let kept = seed(&w, "SKU-001", SellerId::new(), 10);
    let doomed = seed(&w, "SKU-002", SellerId::new(), 20);

    w.cart_service
        .add_item(buyer_id, kept.clone(), 1)
        .await
        .unwrap();
    w.cart_service
        .add_item(buyer_id, doomed.clone(), 1)
        .await
        .unwrap();

    w.catalog.remove(&doomed);

    let view = w.cart_service.get(buyer_id).await.unwrap();
    assert_eq!(view.items.len(), 1);
    assert_eq!(view.items[0].product.id, kept);
    assert_eq!(view.total_amount.cents(), 1000);

    // Storage still holds both entries; the filter is display-time only.
    let stored = w.carts.fetch(buyer_id).await.unwrap().unwrap();
    assert_eq!(stored.items().len(), 2);
}

#[tokio::test]
async fn cart_view_surfaces_catalog_outage() {
    let w = world();
    let buyer_id = BuyerId::new();
    let product_id = seed(&w, "SKU-001", SellerId::new(), 10);
    w.cart_service.add_item(buyer_id, product_id, 1).await.unwrap();

    w.catalog.set_unavailable(true);
    let result = w.cart_service.get(buyer_id).await;
    assert!(matches!(result, Err(ServiceError::Unavailable(_))));
}

#[tokio::test]
async fn count_sums_quantities() {
    let w = world();
    let buyer_id = BuyerId::new();
    let p1 = seed(&w, "SKU-001", SellerId::new(), 10);
    let p2 = seed(&w, "SKU-002", SellerId::new(), 20);

    assert_eq!(w.cart_service.count(buyer_id).await.unwrap(), 0);

    w.cart_service.add_item(buyer_id, p1, 2).await.unwrap();
    w.cart_service.add_item(buyer_id, p2, 3).await.unwrap();

    assert_eq!(w.cart_service.count(buyer_id).await.unwrap(), 5);
}

// -- Checkout --

#[tokio::test]
async fn checkout_freezes_prices_and_clears_the_cart() {
    let w = world();
    let buyer_id = BuyerId::new();
    let seller_id = SellerId::new();
    let product_id = seed(&w, "SKU-001", seller_id, 100);

    w.cart_service
        .add_item(buyer_id, product_id.clone(), 2)
        .await
        .unwrap();

    let order = w
        .checkout
        .checkout(buyer_id, OrderDetails::default())
        .await
        .unwrap();

    assert_eq!(order.status(), OrderStatus::Pending);
    assert_eq!(order.payment_status(), PaymentStatus::Pending);
    assert_eq!(order.total_amount().cents(), 20000);
    assert_eq!(order.items().len(), 1);
    assert_eq!(order.items()[0].seller_id, seller_id);
    assert_eq!(order.items()[0].subtotal.cents(), 20000);

    // Cart is cleared, record preserved.
    let cart = w.carts.fetch(buyer_id).await.unwrap().unwrap();
    assert!(cart.is_empty());

    // The tally lands on the catalog side.
    wait_for_sales(&w.catalog, &product_id, 2).await;
}

#[tokio::test]
async fn order_totals_are_immune_to_later_price_changes() {
    let w = world();
    let buyer_id = BuyerId::new();
    let product_id = seed(&w, "SKU-001", SellerId::new(), 100);

    w.cart_service
        .add_item(buyer_id, product_id.clone(), 2)
        .await
        .unwrap();
    let order = w
        .checkout
        .checkout(buyer_id, OrderDetails::default())
        .await
        .unwrap();
    assert_eq!(order.total_amount().cents(), 20000);

    // The catalog price moves; the stored order must not.
    w.catalog.set_price(&product_id, Money::from_dollars(150));

    let refetched = w
        .order_service
        .get(&Actor::Buyer(buyer_id), order.reference().as_str())
        .await
        .unwrap();
    assert_eq!(refetched.items()[0].subtotal.cents(), 20000);
    assert_eq!(refetched.total_amount().cents(), 20000);
}

#[tokio::test]
async fn empty_cart_checkout_changes_nothing() {
    let w = world();
    let buyer_id = BuyerId::new();

    let result = w.checkout.checkout(buyer_id, OrderDetails::default()).await;
    assert!(matches!(result, Err(ServiceError::EmptyCart)));
    assert_eq!(w.orders.order_count().await, 0);

    // A cart cleared down to zero items counts as empty too.
    let product_id = seed(&w, "SKU-001", SellerId::new(), 10);
    w.cart_service
        .add_item(buyer_id, product_id.clone(), 1)
        .await
        .unwrap();
    w.cart_service.clear(buyer_id).await.unwrap();

    let result = w.checkout.checkout(buyer_id, OrderDetails::default()).await;
    assert!(matches!(result, Err(ServiceError::EmptyCart)));
    assert_eq!(w.orders.order_count().await, 0);
    assert_eq!(w.catalog.sales(&product_id), 0);
}

#[tokio::test]
async fn vanished_product_fails_the_whole_conversion() {
    let w = world();
    let buyer_id = BuyerId::new();
    let kept = seed(&w, "SKU-001", SellerId::new(), 10);
    let doomed = seed(&w, "SKU-002", SellerId::new(), 20);

    w.cart_service.add_item(buyer_id, kept, 1).await.unwrap();
    w.cart_service
        .add_item(buyer_id, doomed.clone(), 1)
        .await
        .unwrap();

    w.catalog.remove(&doomed);

    let result = w.checkout.checkout(buyer_id, OrderDetails::default()).await;
    assert!(
        matches!(result, Err(ServiceError::ProductNotFound { ref product_id }) if *product_id == doomed)
    );

    // No partial order, cart untouched.
    assert_eq!(w.orders.order_count().await, 0);
    let cart = w.carts.fetch(buyer_id).await.unwrap().unwrap();
    assert_eq!(cart.items().len(), 2);
}

#[tokio::test]
async fn order_store_outage_leaves_the_cart_intact() {
    let w = world();
    let buyer_id = BuyerId::new();
    let product_id = seed(&w, "SKU-001", SellerId::new(), 10);
    w.cart_service
        .add_item(buyer_id, product_id.clone(), 2)
        .await
        .unwrap();

    w.orders.set_unavailable(true);
    let result = w.checkout.checkout(buyer_id, OrderDetails::default()).await;
    assert!(matches!(result, Err(ServiceError::Unavailable(_))));

    // The defining safety property: no order, cart not cleared.
    let cart = w.carts.fetch(buyer_id).await.unwrap().unwrap();
    assert_eq!(cart.item(&product_id).unwrap().quantity, 2);
    assert_eq!(w.catalog.sales(&product_id), 0);
}

#[tokio::test]
async fn checkout_carries_details_onto_the_order() {
    let w = world();
    let buyer_id = BuyerId::new();
    let product_id = seed(&w, "SKU-001", SellerId::new(), 10);
    w.cart_service.add_item(buyer_id, product_id, 1).await.unwrap();

    let details = OrderDetails {
        shipping_address: Some(domain::ShippingAddress {
            address: "1 Main St".into(),
            city: "Springfield".into(),
            state: "IL".into(),
            country: "US".into(),
            zip_code: "62701".into(),
        }),
        payment_method: Some(PaymentMethod::Card),
        notes: Some("leave at the door".into()),
    };

    let order = w.checkout.checkout(buyer_id, details).await.unwrap();
    assert_eq!(order.shipping_address().unwrap().city, "Springfield");
    assert_eq!(order.payment_method(), Some(PaymentMethod::Card));
    assert_eq!(order.notes(), Some("leave at the door"));
}

#[tokio::test]
async fn concurrent_checkouts_get_distinct_references() {
    let w = world();
    let seller_id = SellerId::new();
    let product_id = seed(&w, "SKU-001", seller_id, 10);

    let mut handles = Vec::new();
    for _ in 0..8 {
        let cart_service = CartService::new(w.catalog.clone(), w.carts.clone());
        let checkout =
            CheckoutService::new(w.catalog.clone(), w.carts.clone(), w.orders.clone());
        let product_id = product_id.clone();
        handles.push(tokio::spawn(async move {
            let buyer_id = BuyerId::new();
            cart_service
                .add_item(buyer_id, product_id, 1)
                .await
                .unwrap();
            checkout
                .checkout(buyer_id, OrderDetails::default())
                .await
                .unwrap()
        }));
    }

    let mut references = std::collections::HashSet::new();
    for handle in handles {
        let order = handle.await.unwrap();
        assert!(references.insert(order.reference().to_string()));
    }
    assert_eq!(references.len(), 8);
    assert_eq!(w.orders.order_count().await, 8);
}

// -- Gated order access --

/// The concrete end-to-end scenario: two sellers, one order, projected
/// views, a seller confirmation, and a late buyer cancellation.
#[tokio::test]
async fn multi_seller_order_lifecycle() {
    let w = world();
    let buyer_id = BuyerId::new();
    let seller_1 = SellerId::new();
    let seller_2 = SellerId::new();
    let p1 = seed(&w, "SKU-P1", seller_1, 40);
    let p2 = seed(&w, "SKU-P2", seller_2, 60);

    w.cart_service.add_item(buyer_id, p1, 1).await.unwrap();
    w.cart_service.add_item(buyer_id, p2, 2).await.unwrap();

    let order = w
        .checkout
        .checkout(buyer_id, OrderDetails::default())
        .await
        .unwrap();
    assert_eq!(order.total_amount().cents(), 16000);
    assert_eq!(order.items().len(), 2);

    // Seller 2 lists their orders and sees only their $120 slice.
    let listed = w
        .order_service
        .list(&Actor::Seller(seller_2), None)
        .await
        .unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].items().len(), 1);
    assert_eq!(listed[0].items()[0].subtotal.cents(), 12000);
    assert_eq!(listed[0].total_amount().cents(), 12000);

    // Seller 1's view is the complementary $40 slice.
    let view_1 = w
        .order_service
        .get(&Actor::Seller(seller_1), order.reference().as_str())
        .await
        .unwrap();
    assert_eq!(view_1.items().len(), 1);
    assert_eq!(view_1.total_amount().cents(), 4000);

    // Seller 2 confirms the order.
    let confirmed = w
        .order_service
        .update_status(
            &Actor::Seller(seller_2),
            order.reference().as_str(),
            OrderStatus::Confirmed,
            None,
        )
        .await
        .unwrap();
    assert_eq!(confirmed.status(), OrderStatus::Confirmed);

    // The buyer is too late to cancel.
    let result = w
        .order_service
        .update_status(
            &Actor::Buyer(buyer_id),
            order.reference().as_str(),
            OrderStatus::Cancelled,
            Some("changed my mind".into()),
        )
        .await;
    assert!(matches!(
        result,
        Err(ServiceError::Forbidden(AccessError::Forbidden))
    ));

    // The buyer still reads the full, unprojected order.
    let full = w
        .order_service
        .get(&Actor::Buyer(buyer_id), order.reference().as_str())
        .await
        .unwrap();
    assert_eq!(full.items().len(), 2);
    assert_eq!(full.total_amount().cents(), 16000);
}

#[tokio::test]
async fn admin_bypasses_authorization_but_not_the_state_machine() {
    let w = world();
    let buyer_id = BuyerId::new();
    let product_id = seed(&w, "SKU-001", SellerId::new(), 10);
    w.cart_service.add_item(buyer_id, product_id, 1).await.unwrap();
    let order = w
        .checkout
        .checkout(buyer_id, OrderDetails::default())
        .await
        .unwrap();

    let result = w
        .order_service
        .update_status(
            &Actor::Admin,
            order.reference().as_str(),
            OrderStatus::Completed,
            None,
        )
        .await;
    assert!(matches!(
        result,
        Err(ServiceError::Order(OrderError::InvalidTransition { .. }))
    ));

    // On-graph moves work fine for the admin.
    let confirmed = w
        .order_service
        .update_status(
            &Actor::Admin,
            order.reference().as_str(),
            OrderStatus::Confirmed,
            None,
        )
        .await
        .unwrap();
    assert_eq!(confirmed.status(), OrderStatus::Confirmed);
}

#[tokio::test]
async fn buyer_cancels_own_pending_order_with_reason() {
    let w = world();
    let buyer_id = BuyerId::new();
    let product_id = seed(&w, "SKU-001", SellerId::new(), 10);
    w.cart_service.add_item(buyer_id, product_id, 1).await.unwrap();
    let order = w
        .checkout
        .checkout(buyer_id, OrderDetails::default())
        .await
        .unwrap();

    let cancelled = w
        .order_service
        .update_status(
            &Actor::Buyer(buyer_id),
            order.reference().as_str(),
            OrderStatus::Cancelled,
            Some("found a better deal".into()),
        )
        .await
        .unwrap();
    assert_eq!(cancelled.status(), OrderStatus::Cancelled);
    assert_eq!(cancelled.cancel_reason(), Some("found a better deal"));
}

#[tokio::test]
async fn foreign_actors_are_forbidden() {
    let w = world();
    let buyer_id = BuyerId::new();
    let product_id = seed(&w, "SKU-001", SellerId::new(), 10);
    w.cart_service.add_item(buyer_id, product_id, 1).await.unwrap();
    let order = w
        .checkout
        .checkout(buyer_id, OrderDetails::default())
        .await
        .unwrap();
    let reference = order.reference().as_str();

    let other_buyer = Actor::Buyer(BuyerId::new());
    assert!(matches!(
        w.order_service.get(&other_buyer, reference).await,
        Err(ServiceError::Forbidden(_))
    ));

    let uninvolved_seller = Actor::Seller(SellerId::new());
    assert!(matches!(
        w.order_service.get(&uninvolved_seller, reference).await,
        Err(ServiceError::Forbidden(_))
    ));
    assert!(matches!(
        w.order_service
            .update_status(&uninvolved_seller, reference, OrderStatus::Confirmed, None)
            .await,
        Err(ServiceError::Forbidden(_))
    ));
}

#[tokio::test]
async fn listing_honors_the_status_filter() {
    let w = world();
    let buyer_id = BuyerId::new();
    let seller_id = SellerId::new();
    let product_id = seed(&w, "SKU-001", seller_id, 10);

    for _ in 0..2 {
        w.cart_service
            .add_item(buyer_id, product_id.clone(), 1)
            .await
            .unwrap();
        w.checkout
            .checkout(buyer_id, OrderDetails::default())
            .await
            .unwrap();
    }
    let orders = w
        .order_service
        .list(&Actor::Buyer(buyer_id), None)
        .await
        .unwrap();
    assert_eq!(orders.len(), 2);

    w.order_service
        .update_status(
            &Actor::Seller(seller_id),
            orders[0].reference().as_str(),
            OrderStatus::Confirmed,
            None,
        )
        .await
        .unwrap();

    let pending = w
        .order_service
        .list(&Actor::Buyer(buyer_id), Some(OrderStatus::Pending))
        .await
        .unwrap();
    assert_eq!(pending.len(), 1);

    let confirmed = w
        .order_service
        .list(&Actor::Admin, Some(OrderStatus::Confirmed))
        .await
        .unwrap();
    assert_eq!(confirmed.len(), 1);
}

#[tokio::test]
async fn unknown_reference_is_not_found() {
    let w = world();
    let result = w.order_service.get(&Actor::Admin, "ORD-999999").await;
    assert!(matches!(result, Err(ServiceError::OrderNotFound { .. })));
}
