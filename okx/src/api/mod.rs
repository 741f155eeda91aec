pub mod api_trait;
pub mod market;

pub use api_trait::OkxApiTrait;
pub use market::OkxMarket;
