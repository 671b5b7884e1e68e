//! Cart store: the authoritative view of the current shopping cart.
//!
//! Carts are namespaced per identity (guest or a specific profile) and
//! written through to durable storage on every mutation, so the persisted
//! representation never drifts from the in-memory one. Switching identity
//! swaps the cart wholesale for whatever the new namespace had persisted -
//! guest and authenticated carts are never merged.
//!
//! The storage backend is injected via [`CartRepository`] so tests can run
//! against an in-memory store.

pub mod repository;

pub use repository::{CartRepository, InMemoryCartRepository, PgCartRepository};

use serde::{Deserialize, Serialize};

use mangaba_core::{Money, ProductId, ProfileId};

use crate::db::RepositoryError;

/// The identity partition a cart belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Namespace {
    /// Anonymous visitor.
    Guest,
    /// Authenticated shopper.
    Profile(ProfileId),
}

impl Namespace {
    /// The durable storage key for this namespace.
    #[must_use]
    pub fn storage_key(&self) -> String {
        match self {
            Self::Guest => "cart-guest".to_owned(),
            Self::Profile(id) => format!("cart-{id}"),
        }
    }
}

impl From<Option<ProfileId>> for Namespace {
    fn from(id: Option<ProfileId>) -> Self {
        id.map_or(Self::Guest, Self::Profile)
    }
}

/// One product entry in a cart.
///
/// Identity is the product id; name, price and image are snapshots taken
/// from the catalog when the item was added.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    pub product_id: ProductId,
    pub name: String,
    /// Unit price in minor currency units.
    pub unit_price: Money,
    pub image: Option<String>,
    /// Always >= 1; a line reaching zero is removed from the cart.
    pub quantity: u32,
}

impl LineItem {
    /// Line subtotal: unit price times quantity.
    #[must_use]
    pub fn subtotal(&self) -> Money {
        self.unit_price * self.quantity
    }
}

/// The cart store for one active namespace.
///
/// Every mutating operation persists the full cart under the active
/// namespace's storage key before returning.
#[derive(Debug)]
pub struct CartStore<R: CartRepository> {
    repository: R,
    namespace: Namespace,
    items: Vec<LineItem>,
}

impl<R: CartRepository> CartStore<R> {
    /// Open the cart for a namespace, loading whatever was persisted under
    /// its key (empty if nothing was).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the load fails.
    pub async fn open(repository: R, namespace: Namespace) -> Result<Self, RepositoryError> {
        let items = repository.load(&namespace.storage_key()).await?;
        Ok(Self {
            repository,
            namespace,
            items,
        })
    }

    /// Switch the active namespace.
    ///
    /// If the namespace key changes, the in-memory cart is replaced by the
    /// cart persisted under the new key. No merge is performed; the old
    /// namespace's persisted cart is left untouched.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if loading the new namespace fails.
    pub async fn set_identity(&mut self, namespace: Namespace) -> Result<(), RepositoryError> {
        if namespace == self.namespace {
            return Ok(());
        }
        self.items = self.repository.load(&namespace.storage_key()).await?;
        self.namespace = namespace;
        Ok(())
    }

    /// Add an item to the cart.
    ///
    /// If a line with the same product id exists, its quantity is
    /// incremented by the incoming quantity; otherwise the line is appended.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if persisting fails.
    pub async fn add_item(&mut self, item: LineItem) -> Result<(), RepositoryError> {
        match self
            .items
            .iter_mut()
            .find(|line| line.product_id == item.product_id)
        {
            Some(line) => line.quantity += item.quantity,
            None => self.items.push(item),
        }
        self.persist().await
    }

    /// Decrement an item's quantity by one, removing the line at quantity 1.
    ///
    /// Deliberately asymmetric with [`add_item`](Self::add_item): the
    /// storefront only exposes single-step decrement.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if persisting fails.
    pub async fn remove_item(&mut self, product_id: &ProductId) -> Result<(), RepositoryError> {
        if let Some(pos) = self
            .items
            .iter()
            .position(|line| &line.product_id == product_id)
        {
            if let Some(line) = self.items.get_mut(pos) {
                if line.quantity > 1 {
                    line.quantity -= 1;
                } else {
                    self.items.remove(pos);
                }
            }
        }
        self.persist().await
    }

    /// Remove a line unconditionally, whatever its quantity.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if persisting fails.
    pub async fn clear_item(&mut self, product_id: &ProductId) -> Result<(), RepositoryError> {
        self.items.retain(|line| &line.product_id != product_id);
        self.persist().await
    }

    /// Empty the cart and delete the persisted entry for the namespace.
    ///
    /// Invoked after a successful payment.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the delete fails.
    pub async fn clear_cart(&mut self) -> Result<(), RepositoryError> {
        self.items.clear();
        self.repository.delete(&self.namespace.storage_key()).await
    }

    /// The current line items.
    #[must_use]
    pub fn items(&self) -> &[LineItem] {
        &self.items
    }

    /// The active namespace.
    #[must_use]
    pub const fn namespace(&self) -> Namespace {
        self.namespace
    }

    /// Whether the cart holds no items.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Total number of units across all lines.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.items.iter().map(|line| line.quantity).sum()
    }

    /// Sum of line subtotals.
    #[must_use]
    pub fn subtotal(&self) -> Money {
        self.items.iter().map(LineItem::subtotal).sum()
    }

    /// Write the full cart under the active namespace's key.
    async fn persist(&self) -> Result<(), RepositoryError> {
        self.repository
            .save(&self.namespace.storage_key(), &self.items)
            .await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn item(id: &str, price: i64, quantity: u32) -> LineItem {
        LineItem {
            product_id: ProductId::from(id),
            name: format!("Product {id}"),
            unit_price: Money::from_minor_units(price),
            image: None,
            quantity,
        }
    }

    async fn guest_cart(repo: &InMemoryCartRepository) -> CartStore<InMemoryCartRepository> {
        CartStore::open(repo.clone(), Namespace::Guest)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_persisted_matches_in_memory_after_every_mutation() {
        let repo = InMemoryCartRepository::new();
        let mut cart = guest_cart(&repo).await;

        cart.add_item(item("prod_a", 1000, 2)).await.unwrap();
        assert_eq!(repo.persisted("cart-guest"), Some(cart.items().to_vec()));

        cart.add_item(item("prod_b", 500, 1)).await.unwrap();
        assert_eq!(repo.persisted("cart-guest"), Some(cart.items().to_vec()));

        cart.remove_item(&ProductId::from("prod_a")).await.unwrap();
        assert_eq!(repo.persisted("cart-guest"), Some(cart.items().to_vec()));

        cart.clear_item(&ProductId::from("prod_b")).await.unwrap();
        assert_eq!(repo.persisted("cart-guest"), Some(cart.items().to_vec()));
    }

    #[tokio::test]
    async fn test_add_item_merges_by_product_id() {
        let repo = InMemoryCartRepository::new();
        let mut cart = guest_cart(&repo).await;

        cart.add_item(item("prod_a", 1000, 1)).await.unwrap();
        cart.add_item(item("prod_a", 1000, 3)).await.unwrap();

        assert_eq!(cart.items().len(), 1);
        assert_eq!(cart.items()[0].quantity, 4);
    }

    #[tokio::test]
    async fn test_remove_item_decrements_then_removes() {
        let repo = InMemoryCartRepository::new();
        let mut cart = guest_cart(&repo).await;
        let id = ProductId::from("prod_a");

        cart.add_item(item("prod_a", 1000, 2)).await.unwrap();

        cart.remove_item(&id).await.unwrap();
        assert_eq!(cart.items()[0].quantity, 1);

        cart.remove_item(&id).await.unwrap();
        assert!(cart.is_empty());
    }

    #[tokio::test]
    async fn test_remove_item_unknown_product_is_noop() {
        let repo = InMemoryCartRepository::new();
        let mut cart = guest_cart(&repo).await;

        cart.add_item(item("prod_a", 1000, 1)).await.unwrap();
        cart.remove_item(&ProductId::from("prod_zzz")).await.unwrap();
        assert_eq!(cart.items().len(), 1);
    }

    #[tokio::test]
    async fn test_clear_cart_empties_and_deletes_persisted_entry() {
        let repo = InMemoryCartRepository::new();
        let mut cart = guest_cart(&repo).await;

        cart.add_item(item("prod_a", 1000, 2)).await.unwrap();
        cart.clear_cart().await.unwrap();

        assert!(cart.is_empty());
        assert_eq!(repo.persisted("cart-guest"), None);
    }

    #[tokio::test]
    async fn test_identity_switch_swaps_without_merging() {
        let repo = InMemoryCartRepository::new();
        let profile = ProfileId::new(42);

        // Persist a cart under the profile namespace ahead of time.
        {
            let mut cart = CartStore::open(repo.clone(), Namespace::Profile(profile))
                .await
                .unwrap();
            cart.add_item(item("prod_old", 700, 1)).await.unwrap();
        }

        let mut cart = guest_cart(&repo).await;
        cart.add_item(item("prod_guest", 1000, 2)).await.unwrap();

        cart.set_identity(Namespace::Profile(profile)).await.unwrap();

        // Exactly what was persisted under the new key - no merge.
        assert_eq!(cart.items().len(), 1);
        assert_eq!(cart.items()[0].product_id, ProductId::from("prod_old"));

        // Guest cart is still persisted untouched.
        let guest = repo.persisted("cart-guest").unwrap();
        assert_eq!(guest.len(), 1);
        assert_eq!(guest[0].product_id, ProductId::from("prod_guest"));
    }

    #[tokio::test]
    async fn test_identity_switch_to_empty_namespace_yields_empty_cart() {
        let repo = InMemoryCartRepository::new();
        let mut cart = guest_cart(&repo).await;

        cart.add_item(item("prod_guest", 1000, 2)).await.unwrap();
        cart.set_identity(Namespace::Profile(ProfileId::new(7)))
            .await
            .unwrap();

        assert!(cart.is_empty());
    }

    #[tokio::test]
    async fn test_subtotal_and_count() {
        let repo = InMemoryCartRepository::new();
        let mut cart = guest_cart(&repo).await;

        cart.add_item(item("prod_a", 2500, 4)).await.unwrap();
        cart.add_item(item("prod_b", 10000, 1)).await.unwrap();

        assert_eq!(cart.subtotal(), Money::from_minor_units(20000));
        assert_eq!(cart.item_count(), 5);
    }

    #[test]
    fn test_storage_keys() {
        assert_eq!(Namespace::Guest.storage_key(), "cart-guest");
        assert_eq!(
            Namespace::Profile(ProfileId::new(12)).storage_key(),
            "cart-12"
        );
    }
}
