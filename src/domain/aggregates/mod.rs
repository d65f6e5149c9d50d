//! Aggregates module
pub mod product;
pub mod order;
pub mod cart;

pub use product::{Category, CategoryDraft, Product, ProductDraft, ProductQuery, ProductStatus, ProductWithCategories};
pub use order::{
    NewOrder, NewOrderItem, Order, OrderItem, OrderLine, OrderQuery, OrderStatus, OrderWithItems, PaymentStatus,
    PlaceOrder, StatusUpdate,
};
pub use cart::{Cart, CartItem, CartProduct, UserInfo, UserInfoPatch};
