//! Domain models for admin.

pub mod admin_user;
pub mod listing;
pub mod product;

pub use admin_user::{AdminAccount, AdminRole, AdminSummary, NewAdmin, ProfileUpdate, StoredAdmin};
pub use listing::{ListParams, OrderSort, Page, Paged, ProductSort, SortOrder};
pub use product::{NewProduct, ProductInput, ProductPatch};
