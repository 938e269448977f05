//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async query methods
//! that accept `&PgPool` as the first argument.

pub mod category_repo;
pub mod dish_repo;
pub mod order_repo;
pub mod restaurant_repo;
pub mod user_repo;

pub use category_repo::CategoryRepo;
pub use dish_repo::DishRepo;
pub use order_repo::OrderRepo;
pub use restaurant_repo::RestaurantRepo;
pub use user_repo::UserRepo;
