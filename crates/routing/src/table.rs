//! Subscription table for O(1) address→routes lookup
//!
//! The table is compiled once at startup from configuration. Lookups
//! return slices into storage allocated at compile time.

use std::collections::HashMap;

use civic_protocol::Address;

use crate::error::{Result, RoutingError};
use crate::RouteId;

/// Pre-compiled subscriptions
///
/// ```
/// use civic_routing::{Address, RouteId, RoutingTable};
///
/// let mut table = RoutingTable::new();
/// let positions = table.register_route("vix_positions");
/// table.subscribe(Address::new("feedmaker.vix"), positions);
///
/// assert_eq!(table.route(&Address::new("feedmaker.vix")), &[RouteId::new(0)]);
/// assert_eq!(table.route_name(positions), Some("vix_positions"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct RoutingTable {
    /// address → subscribed routes, in registration order
    subscriptions: HashMap<Address, Vec<RouteId>>,

    /// Route names (indexed by RouteId)
    route_names: Vec<String>,
}

impl RoutingTable {
    /// Create an empty table
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a table with pre-allocated capacity
    #[inline]
    #[must_use]
    pub fn with_capacity(addresses: usize, routes: usize) -> Self {
        Self {
            subscriptions: HashMap::with_capacity(addresses),
            route_names: Vec::with_capacity(routes),
        }
    }

    /// Register a route name and get its ID
    ///
    /// IDs are assigned sequentially. Names are not checked for duplicates;
    /// use [`RoutingTableBuilder`] for validated construction.
    #[inline]
    pub fn register_route(&mut self, name: impl Into<String>) -> RouteId {
        let id = RouteId::new(self.route_names.len() as u16);
        self.route_names.push(name.into());
        id
    }

    /// Subscribe a route to an address
    ///
    /// Subscribing the same route twice has no further effect.
    pub fn subscribe(&mut self, address: Address, route: RouteId) {
        let routes = self.subscriptions.entry(address).or_default();
        if !routes.contains(&route) {
            routes.push(route);
        }
    }

    /// Routes subscribed to `address`
    ///
    /// Empty if nothing subscribes.
    #[inline]
    pub fn route(&self, address: &Address) -> &[RouteId] {
        self.subscriptions
            .get(address)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Check if anything subscribes to `address`
    #[inline]
    pub fn has_subscribers(&self, address: &Address) -> bool {
        self.subscriptions.contains_key(address)
    }

    /// Name of a route
    #[inline]
    pub fn route_name(&self, id: RouteId) -> Option<&str> {
        self.route_names.get(id.as_usize()).map(String::as_str)
    }

    /// Number of registered routes
    #[inline]
    pub fn route_count(&self) -> usize {
        self.route_names.len()
    }

    /// Number of addresses with subscribers
    #[inline]
    pub fn address_count(&self) -> usize {
        self.subscriptions.len()
    }

    /// Check if no route is registered
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.route_names.is_empty()
    }

    /// Iterate over all subscriptions
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = (&Address, &[RouteId])> {
        self.subscriptions.iter().map(|(k, v)| (k, v.as_slice()))
    }

    /// All route names, in ID order
    #[inline]
    pub fn route_names(&self) -> &[String] {
        &self.route_names
    }
}

/// Validated construction of a [`RoutingTable`] from configured routes
#[derive(Debug, Default)]
pub struct RoutingTableBuilder {
    /// Registered routes: name → id
    route_ids: HashMap<String, RouteId>,

    table: RoutingTable,
}

impl RoutingTableBuilder {
    /// Create a new builder
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a route subscribed to `address`
    ///
    /// # Errors
    ///
    /// Fails on a duplicate name, an empty address, or when `RouteId`
    /// space is exhausted.
    pub fn add_route(
        &mut self,
        name: impl Into<String>,
        address: impl Into<Address>,
    ) -> Result<RouteId> {
        let name = name.into();
        let address = address.into();

        if self.route_ids.contains_key(&name) {
            return Err(RoutingError::duplicate_route(name));
        }
        if address.as_str().is_empty() {
            return Err(RoutingError::empty_address(name));
        }
        if self.table.route_count() > RouteId::MAX as usize {
            return Err(RoutingError::TooManyRoutes {
                max: RouteId::MAX as usize + 1,
            });
        }

        let id = self.table.register_route(name.clone());
        self.table.subscribe(address, id);
        self.route_ids.insert(name, id);
        Ok(id)
    }

    /// Get the ID of a registered route
    #[inline]
    pub fn get_route_id(&self, name: &str) -> Option<RouteId> {
        self.route_ids.get(name).copied()
    }

    /// Build the table
    #[must_use]
    pub fn build(self) -> RoutingTable {
        self.table
    }
}
