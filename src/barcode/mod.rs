pub mod locator;
pub mod seed_index;
pub mod trim;
pub mod whitelist;

pub use locator::BarcodeLocator;
pub use locator::BarcodeMatch;
pub use locator::ReadClass;
pub use locator::Strand;
pub use locator::StrandPolicy;
pub use locator::DEFAULT_ADAPTER_SLACK;

pub use whitelist::AmbiguityPolicy;
pub use whitelist::BarcodeWhitelist;
pub use whitelist::LocateContext;
pub use whitelist::LocateResult;
pub use whitelist::MAX_BARCODE_LEN;

pub use trim::trimmed_record;
