pub mod icons;
pub mod output;
pub mod progress;
pub mod table;
pub mod theme;

pub use icons::Icons;
pub use output::{header, success, timing, warn};
pub use progress::Spinner;
pub use table::{entity_table, stats_table, TableBuilder};
pub use theme::{theme, Theme};
