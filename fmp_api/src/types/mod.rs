mod lenient;

mod profile;
pub use self::profile::CompanyProfile;

mod price;
pub use self::price::HistoricalPrice;

mod screener;
pub use self::screener::ScreenerEntry;
