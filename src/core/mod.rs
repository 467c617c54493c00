pub mod actions;
pub mod address;
pub mod assets;
pub mod depreciation;
pub mod identifier;
pub mod providers;
pub mod rounding;
pub mod sentiment;

// Flat public surface for the domain enumerations.
pub use actions::{ActionType, SecurityRequirement, TransactionType};
pub use address::Address;
pub use assets::{AssetClass, AssetSubclass};
pub use depreciation::{
    Convention, DepreciationClass, DepreciationMethod, DepreciationParams, DepreciationSystem,
    PropertyClass,
};
pub use identifier::{generate_id, IdentifierError, IdentifierSource};
pub use providers::{Provider, TaxCategory};
pub use rounding::{round_dp, round_money, RoundFields};
pub use sentiment::SentimentLabel;
