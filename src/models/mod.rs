pub mod deal;
pub mod lenient;
pub mod product;
pub mod row;

pub use deal::{Deal, DealResponse};
pub use product::{
    CategoryNode, Extreme, Offer, OfferCondition, Product, ProductResponse, Stats, StatsPeriod,
};
pub use row::{OutputRow, MISSING};
