mod common;
pub use self::common::{Query, SymbolQuery};

mod screener;
pub use self::screener::ScreenerQuery;
