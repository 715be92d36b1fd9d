//! 数据源实现。

pub mod eastmoney;

pub use eastmoney::EastmoneyClient;
