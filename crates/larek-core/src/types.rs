//! # Domain Types
//!
//! The application state and the entities it is made of.
//!
//! ## State Shape
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                            AppState                                     │
//! │                                                                         │
//! │  ┌─────────────────┐ ┌─────────────────┐ ┌──────────────┐ ┌──────────┐ │
//! │  │    catalog      │ │     basket      │ │    order     │ │    ui    │ │
//! │  │  ─────────────  │ │  ─────────────  │ │  ──────────  │ │ ──────── │ │
//! │  │  items          │ │  items (lines)  │ │  payment     │ │  modal   │ │
//! │  │  loading        │ │  total          │ │  address     │ │  notifs  │ │
//! │  │  error          │ │                 │ │  email/phone │ │          │ │
//! │  └─────────────────┘ └─────────────────┘ │  validation  │ └──────────┘ │
//! │                                          │  last total  │              │
//! │                                          └──────────────┘              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every partition is a plain value. The engine never mutates a partition in
//! place; it derives a new one from the old and swaps the whole snapshot, so
//! the helpers below all take `&self` and return a fresh value.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, ValidationError};
use crate::money::Money;
use crate::validation;

// =============================================================================
// Product
// =============================================================================

/// A catalog product as delivered by the catalog API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Product {
    /// Catalog identifier.
    pub id: String,

    /// Display title.
    pub title: String,

    /// Long description shown in the preview modal.
    #[serde(default)]
    pub description: String,

    /// Image path or absolute URL.
    #[serde(default)]
    pub image: String,

    /// Category label ("soft skill", "hard skill", ...).
    #[serde(default)]
    pub category: String,

    /// Price, `None` for priceless products that cannot be bought.
    pub price: Option<Money>,
}

impl Product {
    /// Creates a product with only the fields the basket cares about.
    pub fn new(id: impl Into<String>, title: impl Into<String>, price: Option<Money>) -> Self {
        Product {
            id: id.into(),
            title: title.into(),
            description: String::new(),
            image: String::new(),
            category: String::new(),
            price,
        }
    }

    /// The price a basket line freezes; priceless products count as zero.
    #[inline]
    pub fn price_or_zero(&self) -> Money {
        self.price.unwrap_or_default()
    }

    /// Returns a copy whose relative image path is prefixed with `cdn`.
    ///
    /// Absolute URLs (anything starting with `http`) are left untouched.
    ///
    /// ## Example
    /// ```rust
    /// use larek_core::Product;
    ///
    /// let mut p = Product::new("p1", "Widget", None);
    /// p.image = "/Shell.svg".into();
    /// let p = p.with_image_base("https://cdn.example/content");
    /// assert_eq!(p.image, "https://cdn.example/content/Shell.svg");
    /// ```
    pub fn with_image_base(mut self, cdn: &str) -> Self {
        if !self.image.starts_with("http") {
            self.image = format!("{}{}", cdn, self.image);
        }
        self
    }
}

// =============================================================================
// Basket
// =============================================================================

/// A line in the basket.
///
/// ## Price Freezing
/// `price` is copied from the product when the line is created. A later
/// catalog refresh never changes a line, so totals never move retroactively.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct BasketLine {
    /// Product id.
    pub id: String,

    /// 1-based display position, contiguous across the basket.
    pub index: usize,

    /// Product title at the time of adding (frozen).
    pub title: String,

    /// Product price at the time of adding (frozen).
    pub price: Money,
}

impl BasketLine {
    /// Creates a line for `product_id` from the product's title and price.
    /// `product.id` is not consulted; the payload may carry only a title
    /// and a price.
    pub fn from_product(product_id: impl Into<String>, product: &Product, index: usize) -> Self {
        BasketLine {
            id: product_id.into(),
            index,
            title: product.title.clone(),
            price: product.price_or_zero(),
        }
    }
}

/// The basket partition.
///
/// ## Invariants
/// - `total` equals the sum of `items[].price`
/// - `items[i].index == i + 1`
/// - Lines are unique by product id
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct BasketState {
    pub items: Vec<BasketLine>,
    pub total: Money,
}

impl BasketState {
    /// Returns true if a line for this product exists.
    pub fn contains(&self, product_id: &str) -> bool {
        self.position(product_id).is_some()
    }

    /// Returns the 0-based position of the product's line.
    pub fn position(&self, product_id: &str) -> Option<usize> {
        self.items.iter().position(|line| line.id == product_id)
    }

    /// Returns the product's line.
    pub fn line(&self, product_id: &str) -> Option<&BasketLine> {
        self.items.iter().find(|line| line.id == product_id)
    }

    /// Appends a line for `product_id`, or returns an unchanged copy if that
    /// id is already in the basket.
    pub fn with_product(&self, product_id: &str, product: &Product) -> Self {
        if self.contains(product_id) {
            return self.clone();
        }

        let line = BasketLine::from_product(product_id, product, self.items.len() + 1);
        let mut next = self.clone();
        next.total += line.price;
        next.items.push(line);
        next
    }

    /// Removes the product's line and re-indexes the rest.
    ///
    /// ## Returns
    /// - `Ok(basket)` without the line, total reduced by its price
    /// - `Err(CoreError::NotInBasket)` if no such line exists
    pub fn without(&self, product_id: &str) -> Result<Self, CoreError> {
        let position = self
            .position(product_id)
            .ok_or_else(|| CoreError::NotInBasket(product_id.to_string()))?;

        let mut items = self.items.clone();
        let removed = items.remove(position);
        Ok(BasketState {
            items: reindex(items),
            total: self.total - removed.price,
        })
    }

    /// Inserts a line at `position` (clamped to the end) and re-indexes.
    pub fn with_line_at(&self, position: usize, line: BasketLine) -> Self {
        let mut items = self.items.clone();
        let total = self.total + line.price;
        items.insert(position.min(items.len()), line);
        BasketState {
            items: reindex(items),
            total,
        }
    }

    /// Sum of the line prices (what `total` must always equal).
    pub fn lines_total(&self) -> Money {
        self.items.iter().map(|line| line.price).sum()
    }

    /// Checks both basket invariants.
    pub fn is_consistent(&self) -> bool {
        self.total == self.lines_total()
            && self
                .items
                .iter()
                .enumerate()
                .all(|(i, line)| line.index == i + 1)
    }

    /// Number of lines.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Checks if the basket is empty.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

fn reindex(items: Vec<BasketLine>) -> Vec<BasketLine> {
    items
        .into_iter()
        .enumerate()
        .map(|(i, line)| BasketLine { index: i + 1, ..line })
        .collect()
}

// =============================================================================
// Catalog
// =============================================================================

/// The catalog partition.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CatalogState {
    pub items: Vec<Product>,
    pub loading: bool,
    pub error: Option<String>,
}

impl CatalogState {
    /// Looks up a catalog product by id.
    pub fn product(&self, id: &str) -> Option<&Product> {
        self.items.iter().find(|p| p.id == id)
    }
}

// =============================================================================
// Order
// =============================================================================

/// A field of the two-step checkout form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum OrderField {
    /// Step 1: payment method.
    Payment,
    /// Step 1: delivery address.
    Address,
    /// Step 2: contact email.
    Email,
    /// Step 2: contact phone.
    Phone,
}

impl OrderField {
    /// Every field, in form order.
    pub const ALL: [OrderField; 4] = [
        OrderField::Payment,
        OrderField::Address,
        OrderField::Email,
        OrderField::Phone,
    ];

    /// Wire name of the field.
    pub const fn as_str(&self) -> &'static str {
        match self {
            OrderField::Payment => "payment",
            OrderField::Address => "address",
            OrderField::Email => "email",
            OrderField::Phone => "phone",
        }
    }
}

impl fmt::Display for OrderField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderField {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OrderField::ALL
            .into_iter()
            .find(|field| field.as_str() == s)
            .ok_or_else(|| CoreError::UnknownOrderField(s.to_string()))
    }
}

/// Accepted payment methods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Online card payment.
    Card,
    /// Cash on delivery.
    Cash,
}

impl PaymentMethod {
    pub const fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Card => "card",
            PaymentMethod::Cash => "cash",
        }
    }
}

impl FromStr for PaymentMethod {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "card" => Ok(PaymentMethod::Card),
            "cash" => Ok(PaymentMethod::Cash),
            other => Err(CoreError::UnknownPaymentMethod(other.to_string())),
        }
    }
}

/// Per-field validation messages; `None` means the field is valid or
/// untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct OrderValidation {
    pub payment: Option<String>,
    pub address: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
}

impl OrderValidation {
    /// The stored message for `field`.
    pub fn get(&self, field: OrderField) -> Option<&str> {
        match field {
            OrderField::Payment => self.payment.as_deref(),
            OrderField::Address => self.address.as_deref(),
            OrderField::Email => self.email.as_deref(),
            OrderField::Phone => self.phone.as_deref(),
        }
    }

    /// Replaces the message for `field`.
    pub fn set(&mut self, field: OrderField, message: Option<String>) {
        let slot = match field {
            OrderField::Payment => &mut self.payment,
            OrderField::Address => &mut self.address,
            OrderField::Email => &mut self.email,
            OrderField::Phone => &mut self.phone,
        };
        *slot = message;
    }
}

/// The order partition (checkout form).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct OrderState {
    pub payment: String,
    pub address: String,
    pub email: String,
    pub phone: String,
    pub validation: OrderValidation,
    /// Total of the most recently submitted order (for the success screen).
    pub last_order_total: Money,
}

impl OrderState {
    /// Current value of `field`.
    pub fn value(&self, field: OrderField) -> &str {
        match field {
            OrderField::Payment => &self.payment,
            OrderField::Address => &self.address,
            OrderField::Email => &self.email,
            OrderField::Phone => &self.phone,
        }
    }

    /// Returns a copy with `field` set to `value` and its stored message
    /// replaced by `error`.
    pub fn with_field(&self, field: OrderField, value: String, error: Option<String>) -> Self {
        let mut next = self.clone();
        match field {
            OrderField::Payment => next.payment = value,
            OrderField::Address => next.address = value,
            OrderField::Email => next.email = value,
            OrderField::Phone => next.phone = value,
        }
        next.validation.set(field, error);
        next
    }

    /// Validation failures blocking the payment/address step.
    pub fn payment_step_errors(&self) -> Vec<ValidationError> {
        [OrderField::Payment, OrderField::Address]
            .into_iter()
            .filter_map(|field| validation::validate_field(field, self.value(field)).err())
            .collect()
    }

    /// Validation failures blocking the contacts step.
    pub fn contacts_step_errors(&self) -> Vec<ValidationError> {
        validation::validate_contacts(&self.email, &self.phone)
    }

    /// True once both checkout steps pass validation.
    pub fn is_complete(&self) -> bool {
        self.payment_step_errors().is_empty() && self.contacts_step_errors().is_empty()
    }
}

// =============================================================================
// UI
// =============================================================================

/// Modal kinds the renderers know how to draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum ModalKind {
    Order,
    Contacts,
    Success,
    Preview,
    Basket,
}

impl ModalKind {
    pub const fn as_str(&self) -> &'static str {
        match self {
            ModalKind::Order => "order",
            ModalKind::Contacts => "contacts",
            ModalKind::Success => "success",
            ModalKind::Preview => "preview",
            ModalKind::Basket => "basket",
        }
    }
}

/// The single modal slot of the page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ModalState {
    pub is_open: bool,
    pub content: Option<String>,
    pub product: Option<Product>,
}

impl ModalState {
    /// An open modal showing `content`.
    pub fn open(content: impl Into<String>, product: Option<Product>) -> Self {
        ModalState {
            is_open: true,
            content: Some(content.into()),
            product,
        }
    }

    /// The closed modal (`content` and `product` cleared).
    pub fn closed() -> Self {
        ModalState::default()
    }
}

/// Severity tag of a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    Success,
    Error,
    Warning,
    Info,
}

/// A toast shown over the page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Notification {
    pub id: String,
    pub kind: NotificationKind,
    pub message: String,
    /// Auto-dismiss delay; `None` keeps the toast until dismissed.
    pub duration_ms: Option<u32>,
    #[ts(as = "String")]
    pub timestamp: DateTime<Utc>,
}

/// A notification before the store assigns its id and timestamp.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewNotification {
    pub kind: NotificationKind,
    pub message: String,
    pub duration_ms: Option<u32>,
}

impl NewNotification {
    pub fn new(kind: NotificationKind, message: impl Into<String>) -> Self {
        NewNotification {
            kind,
            message: message.into(),
            duration_ms: None,
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::new(NotificationKind::Success, message)
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(NotificationKind::Info, message)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(NotificationKind::Error, message)
    }

    /// Sets the auto-dismiss delay.
    pub fn dismiss_after_ms(mut self, duration_ms: u32) -> Self {
        self.duration_ms = Some(duration_ms);
        self
    }
}

/// The ui partition.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct UiState {
    pub modal: ModalState,
    pub notifications: Vec<Notification>,
}

// =============================================================================
// Application State
// =============================================================================

/// The full snapshot owned by the store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct AppState {
    pub catalog: CatalogState,
    pub basket: BasketState,
    pub order: OrderState,
    pub ui: UiState,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn product(id: &str, price: i64) -> Product {
        Product::new(id, format!("Product {id}"), Some(Money::from_units(price)))
    }

    #[test]
    fn test_with_product_appends_and_freezes_price() {
        let mut p = product("p1", 500);
        let basket = BasketState::default().with_product("p1", &p);

        p.price = Some(Money::from_units(9_000));

        assert_eq!(basket.items[0].price, Money::from_units(500));
        assert_eq!(basket.items[0].index, 1);
        assert_eq!(basket.total, Money::from_units(500));
    }

    #[test]
    fn test_with_product_is_idempotent() {
        let p = product("p1", 500);
        let once = BasketState::default().with_product("p1", &p);
        let twice = once.with_product("p1", &p);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_priceless_product_counts_as_zero() {
        let p = Product::new("free", "Free", None);
        let basket = BasketState::default().with_product("free", &p);
        assert_eq!(basket.total, Money::zero());
        assert!(basket.is_consistent());
    }

    #[test]
    fn test_without_reindexes() {
        let basket = BasketState::default()
            .with_product("a", &product("a", 100))
            .with_product("b", &product("b", 200))
            .with_product("c", &product("c", 300));

        let basket = basket.without("a").unwrap();

        assert_eq!(basket.items[0].id, "b");
        assert_eq!(basket.items[0].index, 1);
        assert_eq!(basket.items[1].index, 2);
        assert_eq!(basket.total, Money::from_units(500));
        assert!(basket.is_consistent());
    }

    #[test]
    fn test_line_is_keyed_by_given_id() {
        let anonymous = Product::new("", "Widget", Some(Money::from_units(500)));

        let basket = BasketState::default().with_product("p1", &anonymous);

        assert_eq!(
            basket.items,
            vec![BasketLine {
                id: "p1".into(),
                index: 1,
                title: "Widget".into(),
                price: Money::from_units(500),
            }]
        );
        assert!(basket.contains("p1"));
        assert!(!basket.contains(""));
    }

    #[test]
    fn test_without_missing_product() {
        let err = BasketState::default().without("ghost").unwrap_err();
        assert_eq!(err, CoreError::NotInBasket("ghost".to_string()));
    }

    #[test]
    fn test_with_line_at_restores_position() {
        let original = BasketState::default()
            .with_product("a", &product("a", 100))
            .with_product("b", &product("b", 200))
            .with_product("c", &product("c", 300));

        let position = original.position("b").unwrap();
        let line = original.line("b").cloned().unwrap();
        let restored = original.without("b").unwrap().with_line_at(position, line);

        assert_eq!(restored, original);
    }

    #[test]
    fn test_order_field_parsing() {
        assert_eq!("email".parse::<OrderField>().unwrap(), OrderField::Email);
        assert!("nickname".parse::<OrderField>().is_err());
        assert_eq!(OrderField::Phone.to_string(), "phone");
    }

    #[test]
    fn test_payment_method_parsing() {
        assert_eq!("card".parse::<PaymentMethod>().unwrap(), PaymentMethod::Card);
        assert_eq!("cash".parse::<PaymentMethod>().unwrap(), PaymentMethod::Cash);
        assert!("crypto".parse::<PaymentMethod>().is_err());
    }

    #[test]
    fn test_order_with_field_sets_error() {
        let order = OrderState::default().with_field(
            OrderField::Email,
            "bad".into(),
            Some("Invalid email format".into()),
        );
        assert_eq!(order.email, "bad");
        assert_eq!(order.validation.get(OrderField::Email), Some("Invalid email format"));
        assert_eq!(order.validation.get(OrderField::Phone), None);
    }

    #[test]
    fn test_order_completeness() {
        let mut order = OrderState::default();
        assert!(!order.is_complete());
        assert_eq!(order.payment_step_errors().len(), 2);

        order.payment = "card".into();
        order.address = "Lenina 1, Moscow".into();
        assert!(order.payment_step_errors().is_empty());
        assert_eq!(order.contacts_step_errors().len(), 2);

        order.email = "a@b.com".into();
        order.phone = "+7 (900) 123-45-67".into();
        assert!(order.is_complete());
    }

    #[test]
    fn test_image_base_keeps_absolute_urls() {
        let mut p = product("p1", 1);
        p.image = "https://elsewhere/x.png".into();
        let p = p.with_image_base("https://cdn");
        assert_eq!(p.image, "https://elsewhere/x.png");
    }

    #[test]
    fn test_modal_states() {
        let open = ModalState::open("basket", None);
        assert!(open.is_open);
        assert_eq!(open.content.as_deref(), Some("basket"));
        assert_eq!(ModalState::closed(), ModalState::default());
    }
}
